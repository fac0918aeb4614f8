use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::client::{EngineCall, EngineClient};
use crate::error::{NodeError, Result};

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WordType {
    #[default]
    ProperNoun,
    CommonNoun,
    Verb,
    Adjective,
    Suffix,
}

impl WordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProperNoun => "PROPER_NOUN",
            Self::CommonNoun => "COMMON_NOUN",
            Self::Verb => "VERB",
            Self::Adjective => "ADJECTIVE",
            Self::Suffix => "SUFFIX",
        }
    }
}

/// A word as sent on add and update. Updates replace every field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryWord {
    pub surface: String,
    /// Katakana reading.
    pub pronunciation: String,
    pub accent_type: u32,
    #[serde(default)]
    pub word_type: WordType,
    #[serde(default = "DictionaryWord::default_priority")]
    pub priority: u8,
}

impl DictionaryWord {
    pub const DEFAULT_PRIORITY: u8 = 5;

    fn default_priority() -> u8 {
        Self::DEFAULT_PRIORITY
    }

    pub fn new(surface: impl Into<String>, pronunciation: impl Into<String>, accent_type: u32) -> Self {
        Self {
            surface: surface.into(),
            pronunciation: pronunciation.into(),
            accent_type,
            word_type: WordType::default(),
            priority: Self::DEFAULT_PRIORITY,
        }
    }

    fn to_query<'a>(&self, call: EngineCall<'a>) -> EngineCall<'a> {
        call.query("surface", &self.surface)
            .query("pronunciation", &self.pronunciation)
            .query("accent_type", self.accent_type)
            .query("word_type", self.word_type.as_str())
            .query("priority", self.priority)
    }
}

/// A word as listed by `/user_dict`. Engine-side details stay in `extra`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserDictEntry {
    pub surface: String,
    pub pronunciation: String,
    pub accent_type: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_type: Option<WordType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub fn parse_word_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|e| NodeError::validation(format!("invalid word UUID `{}`: {}", value, e)))
}

impl EngineClient {
    /// `GET /user_dict`.
    pub async fn user_dict(&self) -> Result<BTreeMap<Uuid, UserDictEntry>> {
        self.call_json(EngineCall::get("user_dict", "failed to fetch user dictionary"))
            .await
    }

    /// `POST /user_dict_word`, returning the id the engine assigned.
    pub async fn add_user_dict_word(&self, word: &DictionaryWord) -> Result<Uuid> {
        let call = word.to_query(EngineCall::post("user_dict_word", "failed to add word"));
        let uuid = self.call_json(call).await?;
        log::debug!("Added word {} as {}", word.surface, uuid);
        Ok(uuid)
    }

    /// `PUT /user_dict_word/{uuid}`.
    pub async fn update_user_dict_word(&self, uuid: &Uuid, word: &DictionaryWord) -> Result<()> {
        let call = word.to_query(EngineCall::put(format!("user_dict_word/{}", uuid), "failed to update word"));
        self.call(call).await?;
        Ok(())
    }

    /// `DELETE /user_dict_word/{uuid}`.
    pub async fn delete_user_dict_word(&self, uuid: &Uuid) -> Result<()> {
        self.call(EngineCall::delete(format!("user_dict_word/{}", uuid), "failed to delete word"))
            .await?;
        Ok(())
    }
}
