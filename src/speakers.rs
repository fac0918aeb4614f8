use serde::{Deserialize, Serialize};

use crate::client::{EngineCall, EngineClient};
use crate::error::Result;

/// Speaker entry as the engine reports it on `/speakers`.
#[derive(Deserialize, Debug, Clone)]
struct EngineSpeaker {
    name: String,
    speaker_uuid: String,
    styles: Vec<SpeakerStyle>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SpeakerStyle {
    pub name: String,
    /// What callers pass as `speakerId` everywhere else.
    pub id: u32,
    #[serde(rename = "type", default = "SpeakerStyle::default_type")]
    pub style_type: String,
}

impl SpeakerStyle {
    fn default_type() -> String {
        "talk".to_string()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SpeakerDescriptor {
    pub name: String,
    pub uuid: String,
    pub styles: Vec<SpeakerStyle>,
}

impl From<EngineSpeaker> for SpeakerDescriptor {
    fn from(speaker: EngineSpeaker) -> Self {
        Self {
            name: speaker.name,
            uuid: speaker.speaker_uuid,
            styles: speaker.styles,
        }
    }
}

impl SpeakerDescriptor {
    pub fn find_style(speakers: &[SpeakerDescriptor], style_id: u32) -> Option<(&SpeakerDescriptor, &SpeakerStyle)> {
        speakers.iter().find_map(|speaker| {
            speaker
                .styles
                .iter()
                .find(|style| style.id == style_id)
                .map(|style| (speaker, style))
        })
    }
}

impl EngineClient {
    /// `GET /speakers`, in engine order.
    pub async fn speakers(&self) -> Result<Vec<SpeakerDescriptor>> {
        let speakers: Vec<EngineSpeaker> = self
            .call_json(EngineCall::get("speakers", "failed to fetch speaker list"))
            .await?;
        Ok(speakers.into_iter().map(SpeakerDescriptor::from).collect())
    }
}
