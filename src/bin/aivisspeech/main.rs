pub(crate) mod output;

use aivisspeech_node::{
    self as aivis,
    dictionary::parse_word_uuid,
    guide,
    DictionaryWord,
    EngineClient,
    EngineConfig,
    FailurePolicy,
    ItemParameters,
    Node,
    Operation,
    Segment,
    SpeakerDescriptor,
    SynthesisParameters,
    TextSplitter,
    WordType,
};

use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(about = "AivisSpeech (VOICEVOX互換) テキスト読み上げ", long_about = None, version)]
struct Cli {
    /// Engine base URL
    #[arg(long, global = true, env = aivis::client::BASE_URL_ENV, default_value = aivis::client::DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    subcommand: Command,
}

#[derive(Debug, Args)]
struct ParamArgs {
    /// Speed scale (0.5 - 2.0)
    #[arg(long)]
    speed_scale: Option<f64>,

    /// Pitch scale (-0.15 - 0.15)
    #[arg(long, allow_hyphen_values = true)]
    pitch_scale: Option<f64>,

    /// Intonation scale (0.0 - 2.0)
    #[arg(long)]
    intonation_scale: Option<f64>,

    /// Volume scale (0.0 - 2.0)
    #[arg(long)]
    volume_scale: Option<f64>,

    /// Silence before speech, in seconds
    #[arg(long)]
    pre_phoneme_length: Option<f64>,

    /// Silence after speech, in seconds
    #[arg(long)]
    post_phoneme_length: Option<f64>,

    /// Tempo dynamics (AivisSpeech only)
    #[arg(long)]
    tempo_dynamics_scale: Option<f64>,

    /// Output sampling rate (24000, 44100 or 48000)
    #[arg(long)]
    output_sampling_rate: Option<u32>,

    /// Stereo output
    #[arg(long)]
    output_stereo: Option<bool>,
}

impl From<ParamArgs> for SynthesisParameters {
    fn from(args: ParamArgs) -> Self {
        SynthesisParameters {
            speed_scale: args.speed_scale,
            pitch_scale: args.pitch_scale,
            intonation_scale: args.intonation_scale,
            volume_scale: args.volume_scale,
            pre_phoneme_length: args.pre_phoneme_length,
            post_phoneme_length: args.post_phoneme_length,
            tempo_dynamics_scale: args.tempo_dynamics_scale,
            output_sampling_rate: args.output_sampling_rate,
            output_stereo: args.output_stereo,
        }
    }
}

#[derive(Debug, Args)]
struct WordArgs {
    /// Written form
    #[arg(long)]
    surface: String,

    /// Reading in katakana
    #[arg(long)]
    pronunciation: String,

    /// Accent nucleus position
    #[arg(long, default_value_t = 0)]
    accent_type: u32,

    #[arg(long, value_enum, default_value_t = WordType::default())]
    word_type: WordType,

    /// Priority (0 - 10)
    #[arg(long, default_value_t = DictionaryWord::DEFAULT_PRIORITY)]
    priority: u8,
}

impl From<WordArgs> for DictionaryWord {
    fn from(args: WordArgs) -> Self {
        DictionaryWord {
            surface: args.surface,
            pronunciation: args.pronunciation,
            accent_type: args.accent_type,
            word_type: args.word_type,
            priority: args.priority,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List speakers and their style ids
    Speakers {
        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Print the audio query for text (reads stdin unless --text is given)
    Query {
        #[arg(long)]
        text: Option<String>,

        /// Speaker (style) ID
        #[arg(long, default_value_t = aivis::DEFAULT_SPEAKER_ID)]
        speaker_id: u32,
    },

    /// One-shot synthesis (reads stdin unless --text is given)
    Synthesize {
        #[arg(long)]
        text: Option<String>,

        /// Speaker (style) ID
        #[arg(long, default_value_t = aivis::DEFAULT_SPEAKER_ID)]
        speaker_id: u32,

        #[command(flatten)]
        params: ParamArgs,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Synthesize from an audio query JSON file ("-" for stdin)
    SynthesizeQuery {
        query: PathBuf,

        /// Speaker (style) ID
        #[arg(long, default_value_t = aivis::DEFAULT_SPEAKER_ID)]
        speaker_id: u32,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Synthesize several segments and join them into one file
    Multi {
        /// Segment JSON array file ("-" for stdin)
        #[arg(long, conflicts_with = "split")]
        segments: Option<PathBuf>,

        /// Read plain text from stdin and make one segment per sentence
        #[arg(long)]
        split: bool,

        /// Base speaker (style) ID
        #[arg(long, default_value_t = aivis::DEFAULT_SPEAKER_ID)]
        speaker_id: u32,

        #[command(flatten)]
        params: ParamArgs,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// User dictionary management
    #[command(subcommand)]
    Dict(DictCommand),

    /// Print the parameter or JSON format guide
    #[command(subcommand)]
    Guide(GuideCommand),

    /// Run an operation over a JSON array of item parameters ("-" for stdin)
    Run {
        /// Operation name, e.g. multiSynthesis
        #[arg(long, value_enum)]
        operation: Operation,

        items: PathBuf,

        /// Record failed items as { error } instead of stopping
        #[arg(long)]
        continue_on_fail: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DictCommand {
    /// List registered words
    List,

    /// Add a word and print its UUID
    Add(WordArgs),

    /// Replace a word
    Update {
        #[arg(long)]
        uuid: String,

        #[command(flatten)]
        word: WordArgs,
    },

    /// Delete a word
    Delete {
        #[arg(long)]
        uuid: String,
    },
}

#[derive(Debug, Subcommand)]
enum GuideCommand {
    Parameters,
    Format,
    /// JSON schema for multi-segment input
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    let config = EngineConfig::new(&args.base_url)?;
    log::debug!("Engine: {}", config.base_url());
    let client = EngineClient::new(config)?;

    match args.subcommand {
        Command::Speakers { json } => {
            let speakers = client.speakers().await?;

            if json {
                output::print_json(&speakers)?;
            } else {
                println!("SPEAKER_ID\tSPEAKER_NAME\tSTYLE_NAME");
                for speaker in &speakers {
                    for style in &speaker.styles {
                        println!("{}\t{}\t{}", style.id, speaker.name, style.name);
                    }
                }
            }
        },

        Command::Query { text, speaker_id } => {
            let text = text_or_stdin(text)?;
            let query = client.audio_query_raw(&text, speaker_id).await?;
            output::print_json(&query)?;
        },

        Command::Synthesize { text, speaker_id, params, output: out_path } => {
            let text = text_or_stdin(text)?;
            announce_speaker(&client, speaker_id).await;

            let params = SynthesisParameters::from(params);
            let wav = client.synthesize(&text, speaker_id, Some(&params)).await?;
            output::write_audio(&wav, out_path.as_deref())?;
        },

        Command::SynthesizeQuery { query, speaker_id, output: out_path } => {
            let raw = read_source(&query)?;
            let query: serde_json::Value = serde_json::from_str(&raw)?;
            let wav = client.synthesis(&query, speaker_id).await?;
            output::write_audio(&wav, out_path.as_deref())?;
        },

        Command::Multi { segments, split, speaker_id, params, output: out_path } => {
            let segments: Vec<Segment> = match segments {
                Some(path) => serde_json::from_str(&read_source(&path)?)?,
                None if split => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    TextSplitter::new().segments(&text)
                },
                None => {
                    return Err(anyhow::anyhow!("either --segments or --split is required"));
                },
            };
            log::info!("{} segments", segments.len());
            announce_speaker(&client, speaker_id).await;

            let params = SynthesisParameters::from(params);
            let wav = client.synthesize_multi(&segments, speaker_id, Some(&params)).await?;
            output::write_audio(&wav, out_path.as_deref())?;
        },

        Command::Dict(DictCommand::List) => {
            let words = client.user_dict().await?;
            output::print_json(&words)?;
        },

        Command::Dict(DictCommand::Add(word)) => {
            let uuid = client.add_user_dict_word(&word.into()).await?;
            println!("{}", uuid);
        },

        Command::Dict(DictCommand::Update { uuid, word }) => {
            let uuid = parse_word_uuid(&uuid)?;
            client.update_user_dict_word(&uuid, &word.into()).await?;
            log::info!("Updated {}", uuid);
        },

        Command::Dict(DictCommand::Delete { uuid }) => {
            let uuid = parse_word_uuid(&uuid)?;
            client.delete_user_dict_word(&uuid).await?;
            log::info!("Deleted {}", uuid);
        },

        Command::Guide(GuideCommand::Parameters) => {
            println!("{}", guide::PARAMETER_GUIDE);
        },

        Command::Guide(GuideCommand::Format) => {
            println!("{}", guide::FORMAT_GUIDE);
        },

        Command::Guide(GuideCommand::Schema) => {
            output::print_json(&guide::segment_schema())?;
        },

        Command::Run { operation, items, continue_on_fail } => {
            let items: Vec<ItemParameters> = serde_json::from_str(&read_source(&items)?)?;
            let policy = if continue_on_fail {
                FailurePolicy::ContinueOnFail
            } else {
                FailurePolicy::AbortOnFail
            };

            log::info!("Running {} over {} items", operation, items.len());
            let node = Node::new(client, operation);
            let outputs = node.execute(&items, policy).await?;
            output::print_json(&outputs)?;
        },
    }

    Ok(())
}

fn text_or_stdin(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        },
    }
}

fn read_source(path: &std::path::Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Logs the speaker name; an unknown id is left for the engine to reject.
async fn announce_speaker(client: &EngineClient, speaker_id: u32) {
    match client.speakers().await {
        Ok(speakers) => match SpeakerDescriptor::find_style(&speakers, speaker_id) {
            Some((speaker, style)) => log::info!("Speaker: {}、スタイル {}", speaker.name, style.name),
            None => log::warn!("Speaker ID {} not found in the engine's speaker list.", speaker_id),
        },
        Err(e) => log::debug!("Could not fetch speaker list: {}", e),
    }
}
