use serde::{Deserialize, Serialize};

use crate::types::AudioQuery;

/// Tunable synthesis settings. Every field is optional; an unset field
/// defers to the next tier and finally to the engine's own value.
///
/// No range checks happen here. The engine is the authority on bounds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intonation_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_phoneme_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_phoneme_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_dynamics_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_sampling_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_stereo: Option<bool>,
}

impl SynthesisParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layers `over` on top of `self`, field by field.
    pub fn overlay(&self, over: &SynthesisParameters) -> SynthesisParameters {
        SynthesisParameters {
            speed_scale: over.speed_scale.or(self.speed_scale),
            pitch_scale: over.pitch_scale.or(self.pitch_scale),
            intonation_scale: over.intonation_scale.or(self.intonation_scale),
            volume_scale: over.volume_scale.or(self.volume_scale),
            pre_phoneme_length: over.pre_phoneme_length.or(self.pre_phoneme_length),
            post_phoneme_length: over.post_phoneme_length.or(self.post_phoneme_length),
            tempo_dynamics_scale: over.tempo_dynamics_scale.or(self.tempo_dynamics_scale),
            output_sampling_rate: over.output_sampling_rate.or(self.output_sampling_rate),
            output_stereo: over.output_stereo.or(self.output_stereo),
        }
    }

    /// Writes every set field into `query`, leaving the rest untouched.
    pub fn apply_to(&self, query: &mut AudioQuery) {
        if let Some(v) = self.speed_scale {
            query.speed_scale = v;
        }
        if let Some(v) = self.pitch_scale {
            query.pitch_scale = v;
        }
        if let Some(v) = self.intonation_scale {
            query.intonation_scale = v;
        }
        if let Some(v) = self.volume_scale {
            query.volume_scale = v;
        }
        if let Some(v) = self.pre_phoneme_length {
            query.pre_phoneme_length = v;
        }
        if let Some(v) = self.post_phoneme_length {
            query.post_phoneme_length = v;
        }
        if let Some(v) = self.tempo_dynamics_scale {
            query.tempo_dynamics_scale = Some(v);
        }
        if let Some(v) = self.output_sampling_rate {
            query.output_sampling_rate = v;
        }
        if let Some(v) = self.output_stereo {
            query.output_stereo = v;
        }
    }
}

/// Resolves the effective query: override, then base, then the engine's value.
pub fn resolve(
    base: Option<&SynthesisParameters>,
    over: Option<&SynthesisParameters>,
    mut query: AudioQuery,
) -> AudioQuery {
    let base = base.copied().unwrap_or_default();
    let merged = match over {
        Some(over) => base.overlay(over),
        None => base,
    };
    merged.apply_to(&mut query);
    query
}
