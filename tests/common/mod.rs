#![allow(dead_code)]

use aivisspeech_node::{EngineClient, EngineConfig};
use serde_json::{json, Value};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub fn engine_client(server: &MockServer) -> EngineClient {
    EngineClient::new(EngineConfig::new(&server.uri()).unwrap()).unwrap()
}

/// Prosody query as the engine returns it, with `kana` set to `kana`.
pub fn prosody_query(kana: &str) -> Value {
    json!({
        "accent_phrases": [{
            "moras": [
                { "text": "コ", "consonant": "k", "consonant_length": 0.06, "vowel": "o", "vowel_length": 0.09, "pitch": 5.8 },
                { "text": "ン", "consonant": null, "consonant_length": null, "vowel": "N", "vowel_length": 0.07, "pitch": 5.9 }
            ],
            "accent": 5,
            "pause_mora": null,
            "is_interrogative": false
        }],
        "speedScale": 1.0,
        "pitchScale": 0.0,
        "intonationScale": 1.0,
        "volumeScale": 1.0,
        "prePhonemeLength": 0.1,
        "postPhonemeLength": 0.1,
        "pauseLength": null,
        "pauseLengthScale": 1.0,
        "tempoDynamicsScale": 1.0,
        "outputSamplingRate": 44100,
        "outputStereo": false,
        "kana": kana
    })
}

/// Canonical 44-byte PCM header with an empty data chunk.
pub fn wav_header(sample_rate: u32, channels: u16) -> Vec<u8> {
    let block_align = channels * 2;
    let mut wav = Vec::with_capacity(44);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&36u32.to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&0u32.to_le_bytes());
    wav
}

/// Audio the mock engine "renders" for a query whose kana is `kana`.
pub fn rendered(kana: &str) -> Vec<u8> {
    format!("WAV:{}", kana).into_bytes()
}

pub fn query_value(request: &Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// `/audio_query` that echoes the text into `kana`. Texts listed in
/// `reject` get a 422.
pub struct EchoAudioQuery {
    pub reject: Vec<String>,
}

impl EchoAudioQuery {
    pub fn new() -> Self {
        Self { reject: Vec::new() }
    }

    pub fn rejecting(text: &str) -> Self {
        Self { reject: vec![text.to_string()] }
    }
}

impl Respond for EchoAudioQuery {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let text = query_value(request, "text").unwrap_or_default();
        if self.reject.contains(&text) {
            return ResponseTemplate::new(422).set_body_json(json!({ "detail": "rejected" }));
        }
        ResponseTemplate::new(200).set_body_json(prosody_query(&text))
    }
}

/// `/synthesis` that renders `kana` into marker bytes. Kana listed in
/// `fail` get a 500.
pub struct MarkerSynthesis {
    pub fail: Vec<String>,
}

impl MarkerSynthesis {
    pub fn new() -> Self {
        Self { fail: Vec::new() }
    }

    pub fn failing(kana: &str) -> Self {
        Self { fail: vec![kana.to_string()] }
    }
}

impl Respond for MarkerSynthesis {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query: Value = match request.body_json() {
            Ok(query) => query,
            Err(_) => return ResponseTemplate::new(422),
        };
        let kana = query["kana"].as_str().unwrap_or_default().to_string();
        if self.fail.contains(&kana) {
            return ResponseTemplate::new(500).set_body_string("synthesis failed");
        }
        ResponseTemplate::new(200).set_body_raw(rendered(&kana), "audio/wav")
    }
}

/// Paths of everything the mock engine received, in arrival order.
pub async fn received_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}
