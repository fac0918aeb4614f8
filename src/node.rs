//! Host-facing operations: one selected [`Operation`] applied to a list of
//! per-item parameter records, in order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::audio::BinaryData;
use crate::client::EngineClient;
use crate::dictionary::{parse_word_uuid, DictionaryWord, WordType};
use crate::error::{NodeError, Result};
use crate::guide;
use crate::params::SynthesisParameters;
use crate::synthesis::{Segment, DEFAULT_SPEAKER_ID};

pub const DEFAULT_BINARY_PROPERTY: &str = "data";

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "camelCase")]
#[value(rename_all = "camelCase")]
pub enum Operation {
    GetSpeakers,
    Synthesize,
    AudioQuery,
    SynthesisFromQuery,
    MultiSynthesis,
    GetUserDict,
    AddUserDictWord,
    UpdateUserDictWord,
    DeleteUserDictWord,
    GetParameterGuide,
    GetFormatGuide,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Self::GetSpeakers,
        Self::Synthesize,
        Self::AudioQuery,
        Self::SynthesisFromQuery,
        Self::MultiSynthesis,
        Self::GetUserDict,
        Self::AddUserDictWord,
        Self::UpdateUserDictWord,
        Self::DeleteUserDictWord,
        Self::GetParameterGuide,
        Self::GetFormatGuide,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetSpeakers => "getSpeakers",
            Self::Synthesize => "synthesize",
            Self::AudioQuery => "audioQuery",
            Self::SynthesisFromQuery => "synthesisFromQuery",
            Self::MultiSynthesis => "multiSynthesis",
            Self::GetUserDict => "getUserDict",
            Self::AddUserDictWord => "addUserDictWord",
            Self::UpdateUserDictWord => "updateUserDictWord",
            Self::DeleteUserDictWord => "deleteUserDictWord",
            Self::GetParameterGuide => "getParameterGuide",
            Self::GetFormatGuide => "getFormatGuide",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| NodeError::validation(format!("unknown operation `{}`", s)))
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Gui,
    Json,
}

/// A segment entered through the form UI. A negative speaker id means
/// "use the base speaker".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuiTextItem {
    pub text: String,
    #[serde(default = "GuiTextItem::unset_speaker")]
    pub speaker_id: i64,
    #[serde(default)]
    pub overrides: SynthesisParameters,
}

impl GuiTextItem {
    fn unset_speaker() -> i64 {
        -1
    }

    fn into_segment(self) -> Segment {
        Segment {
            text: self.text,
            speaker_id: u32::try_from(self.speaker_id).ok(),
            overrides: self.overrides,
        }
    }
}

/// Parameters of one input item. Which fields matter depends on the operation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemParameters {
    pub text: Option<String>,
    pub speaker_id: Option<u32>,
    pub binary_property_name: Option<String>,
    /// Node-level synthesis settings.
    #[serde(flatten)]
    pub params: SynthesisParameters,
    /// Base tier for multi-segment synthesis, layered over `params`.
    pub base_audio_params: Option<SynthesisParameters>,
    #[serde(default)]
    pub input_mode: InputMode,
    #[serde(default)]
    pub texts: Vec<GuiTextItem>,
    /// Segment array, or a string holding one.
    pub texts_json: Option<Value>,
    /// Query object, or a string holding one.
    pub audio_query_json: Option<Value>,
    pub word_uuid: Option<String>,
    pub surface: Option<String>,
    pub pronunciation: Option<String>,
    pub accent_type: Option<u32>,
    pub word_type: Option<WordType>,
    pub priority: Option<u8>,
}

impl ItemParameters {
    pub fn speaker_id(&self) -> u32 {
        self.speaker_id.unwrap_or(DEFAULT_SPEAKER_ID)
    }

    pub fn binary_property_name(&self) -> &str {
        match self.binary_property_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_BINARY_PROPERTY,
        }
    }

    pub fn require_text(&self) -> Result<&str> {
        required(self.text.as_deref(), "text")
    }

    /// Base tier for multi-segment synthesis.
    pub fn base_params(&self) -> SynthesisParameters {
        match &self.base_audio_params {
            Some(base) => self.params.overlay(base),
            None => self.params,
        }
    }

    pub fn segments(&self) -> Result<Vec<Segment>> {
        match self.input_mode {
            InputMode::Gui => Ok(self.texts.iter().cloned().map(GuiTextItem::into_segment).collect()),
            InputMode::Json => {
                let value = parse_json_param(self.texts_json.as_ref(), "textsJson")?;
                if !value.is_array() {
                    return Err(NodeError::validation("textsJson must be a JSON array"));
                }
                serde_json::from_value(value)
                    .map_err(|e| NodeError::validation(format!("invalid segment in textsJson: {}", e)))
            },
        }
    }

    pub fn audio_query(&self) -> Result<Value> {
        let value = parse_json_param(self.audio_query_json.as_ref(), "audioQueryJson")?;
        if !value.is_object() {
            return Err(NodeError::validation("audioQueryJson must be a JSON object"));
        }
        Ok(value)
    }

    pub fn dictionary_word(&self) -> Result<DictionaryWord> {
        Ok(DictionaryWord {
            surface: required(self.surface.as_deref(), "surface")?.to_string(),
            pronunciation: required(self.pronunciation.as_deref(), "pronunciation")?.to_string(),
            accent_type: self.accent_type.unwrap_or(0),
            word_type: self.word_type.unwrap_or_default(),
            priority: self.priority.unwrap_or(DictionaryWord::DEFAULT_PRIORITY),
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(NodeError::validation(format!("parameter `{}` is required", name))),
    }
}

fn parse_json_param(value: Option<&Value>, name: &str) -> Result<Value> {
    match value {
        None | Some(Value::Null) => Err(NodeError::validation(format!("parameter `{}` is required", name))),
        Some(Value::String(raw)) => serde_json::from_str(raw)
            .map_err(|e| NodeError::validation(format!("parameter `{}` is not valid JSON: {}", name, e))),
        Some(other) => Ok(other.clone()),
    }
}

/// One result item: a JSON record plus optional binary attachments.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NodeOutput {
    pub json: Value,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub binary: BTreeMap<String, BinaryData>,
}

impl NodeOutput {
    pub fn json(json: Value) -> Self {
        Self { json, binary: BTreeMap::new() }
    }

    pub fn with_binary(mut self, name: &str, data: BinaryData) -> Self {
        self.binary.insert(name.to_string(), data);
        self
    }

    pub fn error(error: &NodeError) -> Self {
        Self::json(json!({ "error": error.to_string() }))
    }

    pub fn binary(&self, name: &str) -> Option<&BinaryData> {
        self.binary.get(name)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failed item.
    #[default]
    AbortOnFail,
    /// Record `{ error }` for the failed item and carry on.
    ContinueOnFail,
}

#[derive(Debug)]
pub struct ItemFailure {
    pub item_index: usize,
    pub error: NodeError,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {}: {}", self.item_index, self.error)
    }
}

impl std::error::Error for ItemFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The node: an engine client plus the operation selected for this run.
#[derive(Debug, Clone)]
pub struct Node {
    client: EngineClient,
    operation: Operation,
}

impl Node {
    pub fn new(client: EngineClient, operation: Operation) -> Self {
        Self { client, operation }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn client(&self) -> &EngineClient {
        &self.client
    }

    /// Runs the items one after another, keeping every outcome.
    pub async fn execute_each(&self, items: &[ItemParameters]) -> Vec<Result<NodeOutput>> {
        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            outcomes.push(self.run_item(item).await);
        }
        outcomes
    }

    /// Runs the items one after another under `policy`.
    pub async fn execute(
        &self,
        items: &[ItemParameters],
        policy: FailurePolicy,
    ) -> std::result::Result<Vec<NodeOutput>, ItemFailure> {
        let mut outputs = Vec::with_capacity(items.len());
        for (item_index, item) in items.iter().enumerate() {
            match self.run_item(item).await {
                Ok(output) => outputs.push(output),
                Err(error) => match policy {
                    FailurePolicy::ContinueOnFail => {
                        log::warn!("{} failed for item {}: {}", self.operation, item_index, error);
                        outputs.push(NodeOutput::error(&error));
                    },
                    FailurePolicy::AbortOnFail => {
                        return Err(ItemFailure { item_index, error });
                    },
                },
            }
        }
        Ok(outputs)
    }

    pub async fn run_item(&self, item: &ItemParameters) -> Result<NodeOutput> {
        match self.operation {
            Operation::GetSpeakers => self.get_speakers().await,
            Operation::Synthesize => self.synthesize(item).await,
            Operation::AudioQuery => self.audio_query(item).await,
            Operation::SynthesisFromQuery => self.synthesis_from_query(item).await,
            Operation::MultiSynthesis => self.multi_synthesis(item).await,
            Operation::GetUserDict => self.get_user_dict().await,
            Operation::AddUserDictWord => self.add_user_dict_word(item).await,
            Operation::UpdateUserDictWord => self.update_user_dict_word(item).await,
            Operation::DeleteUserDictWord => self.delete_user_dict_word(item).await,
            Operation::GetParameterGuide => Ok(NodeOutput::json(json!({
                "parameterGuide": guide::PARAMETER_GUIDE,
                "formatGuide": guide::FORMAT_GUIDE,
                "jsonSchema": guide::segment_schema(),
            }))),
            Operation::GetFormatGuide => Ok(NodeOutput::json(json!({
                "formatGuide": guide::FORMAT_GUIDE,
            }))),
        }
    }

    async fn get_speakers(&self) -> Result<NodeOutput> {
        let speakers = self.client.speakers().await?;
        Ok(NodeOutput::json(json!({ "speakers": speakers })))
    }

    async fn synthesize(&self, item: &ItemParameters) -> Result<NodeOutput> {
        let text = item.require_text()?;
        let speaker_id = item.speaker_id();

        let wav = self.client.synthesize(text, speaker_id, Some(&item.params)).await?;

        Ok(NodeOutput::json(json!({ "success": true, "text": text, "speakerId": speaker_id }))
            .with_binary(item.binary_property_name(), BinaryData::wav(wav, "tts")))
    }

    async fn audio_query(&self, item: &ItemParameters) -> Result<NodeOutput> {
        let text = item.require_text()?;
        let speaker_id = item.speaker_id();

        let query = self.client.audio_query_raw(text, speaker_id).await?;

        Ok(NodeOutput::json(json!({ "audioQuery": query, "text": text, "speakerId": speaker_id })))
    }

    async fn synthesis_from_query(&self, item: &ItemParameters) -> Result<NodeOutput> {
        let query = item.audio_query()?;
        let speaker_id = item.speaker_id();

        let wav = self.client.synthesis(&query, speaker_id).await?;

        Ok(NodeOutput::json(json!({ "success": true, "speakerId": speaker_id }))
            .with_binary(item.binary_property_name(), BinaryData::wav(wav, "tts")))
    }

    async fn multi_synthesis(&self, item: &ItemParameters) -> Result<NodeOutput> {
        let segments = item.segments()?;
        let speaker_id = item.speaker_id();
        let base = item.base_params();

        let wav = self.client.synthesize_multi(&segments, speaker_id, Some(&base)).await?;

        Ok(NodeOutput::json(json!({
            "success": true,
            "textCount": segments.len(),
            "speakerId": speaker_id,
        }))
        .with_binary(item.binary_property_name(), BinaryData::wav(wav, "tts_multi")))
    }

    async fn get_user_dict(&self) -> Result<NodeOutput> {
        let user_dict = self.client.user_dict().await?;
        Ok(NodeOutput::json(json!({ "userDict": user_dict })))
    }

    async fn add_user_dict_word(&self, item: &ItemParameters) -> Result<NodeOutput> {
        let word = item.dictionary_word()?;
        let uuid = self.client.add_user_dict_word(&word).await?;

        Ok(NodeOutput::json(json!({
            "success": true,
            "wordUuid": uuid,
            "surface": word.surface,
            "pronunciation": word.pronunciation,
        })))
    }

    async fn update_user_dict_word(&self, item: &ItemParameters) -> Result<NodeOutput> {
        let uuid = parse_word_uuid(required(item.word_uuid.as_deref(), "wordUuid")?)?;
        let word = item.dictionary_word()?;
        self.client.update_user_dict_word(&uuid, &word).await?;

        Ok(NodeOutput::json(json!({
            "success": true,
            "wordUuid": uuid,
            "surface": word.surface,
            "pronunciation": word.pronunciation,
        })))
    }

    async fn delete_user_dict_word(&self, item: &ItemParameters) -> Result<NodeOutput> {
        let uuid = parse_word_uuid(required(item.word_uuid.as_deref(), "wordUuid")?)?;
        self.client.delete_user_dict_word(&uuid).await?;

        Ok(NodeOutput::json(json!({ "success": true, "wordUuid": uuid, "deleted": true })))
    }
}
