use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hound::WavReader;
use serde::{Serialize, Serializer};

pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Format details read from a RIFF/WAVE header.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WavSummary {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub duration_seconds: f64,
}

impl WavSummary {
    pub fn read(bytes: &[u8]) -> Result<Self, hound::Error> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();
        // per-channel sample count
        let frames = reader.duration();

        Ok(Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            duration_seconds: if spec.sample_rate == 0 {
                0.0
            } else {
                f64::from(frames) / f64::from(spec.sample_rate)
            },
        })
    }
}

/// Binary attachment of a result item, in the host's binary data shape.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    #[serde(serialize_with = "serialize_base64")]
    pub data: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    pub file_extension: String,
    pub file_size: usize,
    #[serde(flatten)]
    pub wav: Option<WavSummary>,
}

impl BinaryData {
    /// Wraps engine audio as `<prefix>_<unix millis>.wav`.
    pub fn wav(data: Vec<u8>, prefix: &str) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        let wav = match WavSummary::read(&data) {
            Ok(summary) => Some(summary),
            Err(e) => {
                log::debug!("Audio is not a readable WAV ({}), passing it through", e);
                None
            },
        };

        Self {
            file_size: data.len(),
            data,
            mime_type: WAV_MIME_TYPE.to_string(),
            file_name: format!("{}_{}.wav", prefix, millis),
            file_extension: "wav".to_string(),
            wav,
        }
    }
}

fn serialize_base64<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(sample_rate: u32, channels: u16, frames: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames * u32::from(channels) {
                writer.write_sample((i % 100) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn summary_reads_header() {
        let summary = WavSummary::read(&tone(24000, 1, 12000)).unwrap();
        assert_eq!(summary.sample_rate, 24000);
        assert_eq!(summary.channels, 1);
        assert_eq!(summary.bits_per_sample, 16);
        assert!((summary.duration_seconds - 0.5).abs() < 1e-9);
    }

    #[test]
    fn binary_data_shape() {
        let wav = tone(44100, 2, 441);
        let binary = BinaryData::wav(wav.clone(), "tts");
        assert_eq!(binary.file_size, wav.len());
        assert!(binary.file_name.starts_with("tts_"));
        assert!(binary.file_name.ends_with(".wav"));

        let json = serde_json::to_value(&binary).unwrap();
        assert_eq!(json["mimeType"], "audio/wav");
        assert_eq!(json["data"], STANDARD.encode(&wav));
        assert_eq!(json["sampleRate"], 44100);
        assert_eq!(json["channels"], 2);
    }

    #[test]
    fn opaque_audio_passes_through() {
        let binary = BinaryData::wav(b"not a wave".to_vec(), "tts_multi");
        assert_eq!(binary.wav, None);
        let json = serde_json::to_value(&binary).unwrap();
        assert!(json.get("sampleRate").is_none());
        assert_eq!(json["fileSize"], 10);
    }
}
