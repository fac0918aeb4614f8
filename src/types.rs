
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prosody query returned by `/audio_query` and consumed by `/synthesis`.
///
/// Fields this crate does not tune (`pauseLength`, `pauseLengthScale`, anything
/// newer engines add) are kept in `extra`, as are unknown fields of each phrase
/// and mora, so the query goes back to the engine exactly as it came, apart
/// from the overwritten scales.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioQuery {
    #[serde(rename = "accent_phrases")]
    pub accent_phrases: Vec<AccentPhrase>,
    pub speed_scale: f64,
    pub pitch_scale: f64,
    pub intonation_scale: f64,
    pub volume_scale: f64,
    pub pre_phoneme_length: f64,
    pub post_phoneme_length: f64,
    /// Only reported by AivisSpeech; plain VOICEVOX engines omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_dynamics_scale: Option<f64>,
    pub output_sampling_rate: u32,
    pub output_stereo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kana: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccentPhrase {
    pub moras: Vec<Mora>,
    pub accent: i32,
    #[serde(default)]
    pub pause_mora: Option<Mora>,
    #[serde(default)]
    pub is_interrogative: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Mora {
    pub text: String,
    pub vowel: String,
    pub vowel_length: f64,
    pub pitch: f64,
    #[serde(default)]
    pub consonant: Option<String>,
    #[serde(default)]
    pub consonant_length: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
