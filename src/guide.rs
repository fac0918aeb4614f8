//! Reference material handed to callers (and to LLMs writing segment JSON).
//! Returned verbatim; nothing here talks to the engine.

use serde_json::{json, Value};

pub const PARAMETER_GUIDE: &str = include_str!("guide/parameter_guide.md");

pub const FORMAT_GUIDE: &str = include_str!("guide/format_guide.md");

/// JSON Schema for the segment array accepted by multi-segment synthesis.
pub fn segment_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "AivisSpeech MultiSynthesis TextItems",
        "description": "AivisSpeech 複数テキスト音声合成（multiSynthesis）の JSON 入力スキーマ",
        "type": "array",
        "items": {
            "type": "object",
            "required": ["text"],
            "additionalProperties": false,
            "properties": {
                "text": {
                    "type": "string",
                    "description": "合成するテキスト"
                },
                "speakerId": {
                    "type": "integer",
                    "description": "話者ID（省略時はベース話者IDを使用）"
                },
                "speedScale": {
                    "type": "number",
                    "description": "話速",
                    "minimum": 0.5,
                    "maximum": 2.0,
                    "default": 1.0
                },
                "pitchScale": {
                    "type": "number",
                    "description": "音高（0.0以外は音質劣化）",
                    "minimum": -0.15,
                    "maximum": 0.15,
                    "default": 0.0
                },
                "intonationScale": {
                    "type": "number",
                    "description": "感情表現の強さ（1.0超は非線形に増幅、上げすぎると破綻）",
                    "minimum": 0.0,
                    "maximum": 2.0,
                    "default": 1.0
                },
                "volumeScale": {
                    "type": "number",
                    "description": "音量（1.5超はクリッピングのリスク）",
                    "minimum": 0.0,
                    "maximum": 2.0,
                    "default": 1.0
                },
                "prePhonemeLength": {
                    "type": "number",
                    "description": "開始無音（秒）",
                    "minimum": 0.0,
                    "maximum": 1.5,
                    "default": 0.1
                },
                "postPhonemeLength": {
                    "type": "number",
                    "description": "終了無音（秒）",
                    "minimum": 0.0,
                    "maximum": 1.5,
                    "default": 0.1
                },
                "tempoDynamicsScale": {
                    "type": "number",
                    "description": "テンポの緩急（AivisSpeech専用、自然さ向上には1.2〜1.5が効果的）",
                    "minimum": 0.0,
                    "maximum": 2.0,
                    "default": 1.0
                },
                "outputSamplingRate": {
                    "type": "integer",
                    "description": "出力サンプリングレート（Hz）",
                    "enum": [24000, 44100, 48000],
                    "default": 44100
                },
                "outputStereo": {
                    "type": "boolean",
                    "description": "ステレオ出力",
                    "default": false
                }
            }
        },
        "examples": [[
            { "text": "こんにちは、今日はいい天気ですね。" },
            {
                "text": "それでは、本題に入りましょう。",
                "speedScale": 0.9,
                "tempoDynamicsScale": 1.3
            },
            {
                "text": "これはとても重要なポイントです！",
                "speakerId": 888753760,
                "intonationScale": 1.2,
                "prePhonemeLength": 0.3
            }
        ]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SynthesisParameters;
    use crate::synthesis::Segment;

    #[test]
    fn guides_are_embedded() {
        assert!(PARAMETER_GUIDE.starts_with("# AivisSpeech パラメータ設定ガイド"));
        assert!(FORMAT_GUIDE.starts_with("# AivisSpeech 音声合成 JSON 生成ガイド"));
        assert!(FORMAT_GUIDE.contains("tempoDynamicsScale"));
    }

    #[test]
    fn schema_example_parses_as_segments() {
        let schema = segment_schema();
        assert_eq!(schema["items"]["required"][0], "text");

        let segments: Vec<Segment> = serde_json::from_value(schema["examples"][0].clone()).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].overrides.tempo_dynamics_scale, Some(1.3));
        assert_eq!(segments[2].speaker_id, Some(888753760));
    }

    #[test]
    fn schema_properties_match_segment_fields() {
        let segment = Segment::new("全部入り").with_speaker(1).with_overrides(SynthesisParameters {
            speed_scale: Some(1.0),
            pitch_scale: Some(0.0),
            intonation_scale: Some(1.0),
            volume_scale: Some(1.0),
            pre_phoneme_length: Some(0.1),
            post_phoneme_length: Some(0.1),
            tempo_dynamics_scale: Some(1.0),
            output_sampling_rate: Some(44100),
            output_stereo: Some(false),
        });
        let serialized = serde_json::to_value(&segment).unwrap();
        let mut segment_keys = serialized.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        segment_keys.sort();

        let schema = segment_schema();
        let mut schema_keys = schema["items"]["properties"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        schema_keys.sort();

        assert_eq!(schema_keys, segment_keys);
        assert_eq!(schema["items"]["additionalProperties"], false);
    }
}
