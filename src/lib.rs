
pub mod audio;
pub mod client;
pub mod dictionary;
pub mod error;
pub mod guide;
pub mod node;
pub mod params;
pub mod speakers;
pub mod synthesis;
pub mod types;

pub mod deps {
    pub use serde_json;
    pub use serde;
    pub use uuid;
}

pub use audio::{BinaryData, WavSummary};
pub use client::{EngineCall, EngineClient, EngineConfig};
pub use dictionary::{DictionaryWord, UserDictEntry, WordType};
pub use error::{
    ErrorDescription,
    GenericError,
    NodeError,
    NodeErrorDescription,
};
pub use node::{FailurePolicy, ItemFailure, ItemParameters, Node, NodeOutput, Operation};
pub use params::SynthesisParameters;
pub use speakers::{SpeakerDescriptor, SpeakerStyle};
pub use synthesis::{Segment, DEFAULT_SPEAKER_ID};
pub use types::AudioQuery;

/// Splits running text into sentence-sized pieces for segment synthesis.
pub struct TextSplitter {
    sentence_splitter: Vec<String>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            sentence_splitter: vec!["。".to_string(), "？".to_string(), "！".to_string(), "!".to_string(), "?".to_string(), "\n".to_string()],
        }
    }
}

impl TextSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sentences with their terminator kept, so the engine still sees
    /// the question mark that drives rising intonation.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.sentence_splitter.iter().fold(vec![text.to_owned()], |acc, splitter| {
            acc.iter()
                .flat_map(|sentence| sentence.split_inclusive(splitter.as_str()))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && !self.is_only_terminators(s))
                .collect::<Vec<String>>()
        })
    }

    pub fn segments(&self, text: &str) -> Vec<Segment> {
        self.split_text(text).into_iter().map(Segment::new).collect()
    }

    fn is_only_terminators(&self, s: &str) -> bool {
        s.chars().all(|c| self.sentence_splitter.iter().any(|t| t.starts_with(c) && t.chars().count() == 1))
    }
}
