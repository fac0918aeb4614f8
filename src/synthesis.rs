use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::client::{EngineCall, EngineClient};
use crate::error::{NodeError, Result};
use crate::params::{self, SynthesisParameters};
use crate::types::AudioQuery;

/// Style id used by the node when none is given (AivisSpeech's bundled "まい").
pub const DEFAULT_SPEAKER_ID: u32 = 888753760;

/// One piece of text in a multi-segment request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<u32>,
    #[serde(flatten)]
    pub overrides: SynthesisParameters,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker_id: None,
            overrides: SynthesisParameters::default(),
        }
    }

    pub fn with_speaker(mut self, speaker_id: u32) -> Self {
        self.speaker_id = Some(speaker_id);
        self
    }

    pub fn with_overrides(mut self, overrides: SynthesisParameters) -> Self {
        self.overrides = overrides;
        self
    }
}

impl EngineClient {
    /// `POST /audio_query`: derives the prosody query for `text`.
    pub async fn audio_query(&self, text: &str, speaker_id: u32) -> Result<AudioQuery> {
        self.call_json(self.audio_query_call(text, speaker_id, "failed to fetch audio query".into()))
            .await
    }

    /// Same as [`audio_query`](Self::audio_query), without interpreting the body.
    pub async fn audio_query_raw(&self, text: &str, speaker_id: u32) -> Result<serde_json::Value> {
        self.call_json(self.audio_query_call(text, speaker_id, "failed to fetch audio query".into()))
            .await
    }

    fn audio_query_call<'a>(&self, text: &str, speaker_id: u32, action: String) -> EngineCall<'a> {
        EngineCall::post("audio_query", action)
            .query("text", text)
            .query("speaker", speaker_id)
    }

    /// `POST /synthesis`: renders a query into audio bytes, returned unmodified.
    pub async fn synthesis<Q>(&self, query: &Q, speaker_id: u32) -> Result<Vec<u8>>
    where
        Q: Serialize + ?Sized,
    {
        self.synthesis_with_action(query, speaker_id, "failed to synthesize audio".into())
            .await
    }

    async fn synthesis_with_action<Q>(&self, query: &Q, speaker_id: u32, action: String) -> Result<Vec<u8>>
    where
        Q: Serialize + ?Sized,
    {
        let call = EngineCall::post("synthesis", action)
            .query("speaker", speaker_id)
            .json(query)?;
        self.call_bytes(call).await
    }

    /// Query, tune, synthesize. `params` is applied over the engine's values.
    pub async fn synthesize(
        &self,
        text: &str,
        speaker_id: u32,
        params: Option<&SynthesisParameters>,
    ) -> Result<Vec<u8>> {
        self.synthesize_layered(text, speaker_id, None, params, None).await
    }

    async fn synthesize_layered(
        &self,
        text: &str,
        speaker_id: u32,
        base: Option<&SynthesisParameters>,
        over: Option<&SynthesisParameters>,
        label: Option<&str>,
    ) -> Result<Vec<u8>> {
        let (query_action, synthesis_action) = match label {
            Some(label) => (
                format!("failed to fetch audio query: {}", label),
                format!("failed to synthesize audio: {}", label),
            ),
            None => (
                "failed to fetch audio query".to_string(),
                "failed to synthesize audio".to_string(),
            ),
        };

        let query: AudioQuery = self
            .call_json(self.audio_query_call(text, speaker_id, query_action))
            .await?;
        let query = params::resolve(base, over, query);

        self.synthesis_with_action(&query, speaker_id, synthesis_action).await
    }

    /// `POST /connect_waves`: joins WAV buffers in the given order.
    pub async fn connect_waves<B: AsRef<[u8]>>(&self, waves: &[B]) -> Result<Vec<u8>> {
        if waves.is_empty() {
            return Err(NodeError::validation("no audio to connect"));
        }

        let encoded = waves
            .iter()
            .map(|wave| STANDARD.encode(wave.as_ref()))
            .collect::<Vec<String>>();

        let call = EngineCall::post("connect_waves", "failed to connect audio").json(&encoded)?;
        self.call_bytes(call).await
    }

    /// Synthesizes every segment in order and joins the results.
    ///
    /// Segment parameters win over `base_params` field by field. The first
    /// failure aborts the whole request; nothing partial is returned.
    pub async fn synthesize_multi(
        &self,
        segments: &[Segment],
        base_speaker_id: u32,
        base_params: Option<&SynthesisParameters>,
    ) -> Result<Vec<u8>> {
        if segments.is_empty() {
            return Err(NodeError::validation("at least one text segment is required"));
        }
        if let Some(index) = segments.iter().position(|s| s.text.trim().is_empty()) {
            return Err(NodeError::validation(format!("segment {} has no text", index)));
        }

        let mut waves = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            let speaker_id = segment.speaker_id.unwrap_or(base_speaker_id);
            log::info!("Synthesizing segment {}/{} (speaker {})", index + 1, segments.len(), speaker_id);

            let wave = self
                .synthesize_layered(
                    &segment.text,
                    speaker_id,
                    base_params,
                    Some(&segment.overrides),
                    Some(&segment.text),
                )
                .await?;
            waves.push(wave);
        }

        log::debug!("Connecting {} segments", waves.len());
        self.connect_waves(&waves).await
    }
}
