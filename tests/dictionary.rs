mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use aivisspeech_node::{DictionaryWord, WordType};
use parking_lot::Mutex;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use common::{engine_client, query_value};

/// In-memory user dictionary speaking the engine's wire format.
#[derive(Clone, Default)]
struct DictionaryEngine {
    words: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl DictionaryEngine {
    fn entry(request: &Request) -> Option<Value> {
        let accent_type = query_value(request, "accent_type")?.parse::<u32>().ok()?;
        Some(json!({
            "surface": query_value(request, "surface")?,
            "pronunciation": query_value(request, "pronunciation")?,
            "accent_type": accent_type,
            "word_type": query_value(request, "word_type").unwrap_or_else(|| "PROPER_NOUN".to_string()),
            "priority": query_value(request, "priority").and_then(|p| p.parse::<u8>().ok()).unwrap_or(5),
            "mora_count": null,
            "part_of_speech": "名詞"
        }))
    }

    fn word_id(request: &Request) -> Option<String> {
        request
            .url
            .path()
            .strip_prefix("/user_dict_word/")
            .map(str::to_string)
    }
}

impl Respond for DictionaryEngine {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut words = self.words.lock();

        match (request.method.as_str(), request.url.path()) {
            ("GET", "/user_dict") => ResponseTemplate::new(200).set_body_json(&*words),
            ("POST", "/user_dict_word") => match Self::entry(request) {
                Some(entry) => {
                    let id = Uuid::new_v4().to_string();
                    words.insert(id.clone(), entry);
                    ResponseTemplate::new(200).set_body_json(id)
                },
                None => ResponseTemplate::new(422),
            },
            ("PUT", _) => match (Self::word_id(request), Self::entry(request)) {
                (Some(id), Some(entry)) if words.contains_key(&id) => {
                    words.insert(id, entry);
                    ResponseTemplate::new(204)
                },
                (Some(_), Some(_)) => ResponseTemplate::new(404),
                _ => ResponseTemplate::new(422),
            },
            ("DELETE", _) => match Self::word_id(request) {
                Some(id) if words.remove(&id).is_some() => ResponseTemplate::new(204),
                _ => ResponseTemplate::new(404),
            },
            _ => ResponseTemplate::new(405),
        }
    }
}

async fn dictionary_server() -> (MockServer, DictionaryEngine) {
    let server = MockServer::start().await;
    let engine = DictionaryEngine::default();
    Mock::given(path_regex("^/user_dict"))
        .respond_with(engine.clone())
        .mount(&server)
        .await;
    (server, engine)
}

#[tokio::test]
async fn added_word_is_listed_and_update_replaces_it() {
    let (server, engine) = dictionary_server().await;
    let client = engine_client(&server);

    let uuid = client
        .add_user_dict_word(&DictionaryWord::new("東北", "トーホク", 1))
        .await
        .unwrap();

    let listed = client.user_dict().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[&uuid].pronunciation, "トーホク");
    assert_eq!(listed[&uuid].word_type, Some(WordType::ProperNoun));

    let replacement = DictionaryWord {
        word_type: WordType::CommonNoun,
        priority: 9,
        ..DictionaryWord::new("東北", "トウホク", 0)
    };
    client.update_user_dict_word(&uuid, &replacement).await.unwrap();

    let listed = client.user_dict().await.unwrap();
    let entry = &listed[&uuid];
    assert_eq!(entry.pronunciation, "トウホク");
    assert_eq!(entry.accent_type, 0);
    assert_eq!(entry.priority, Some(9));
    assert_eq!(entry.word_type, Some(WordType::CommonNoun));
    assert_eq!(entry.extra["part_of_speech"], "名詞");

    assert_eq!(engine.words.lock().len(), 1);
}

#[tokio::test]
async fn deleted_word_disappears() {
    let (server, engine) = dictionary_server().await;
    let client = engine_client(&server);

    let keep = client
        .add_user_dict_word(&DictionaryWord::new("仙台", "センダイ", 0))
        .await
        .unwrap();
    let gone = client
        .add_user_dict_word(&DictionaryWord::new("盛岡", "モリオカ", 0))
        .await
        .unwrap();

    client.delete_user_dict_word(&gone).await.unwrap();

    let listed = client.user_dict().await.unwrap();
    assert!(listed.contains_key(&keep));
    assert!(!listed.contains_key(&gone));
    assert!(!engine.words.lock().contains_key(&gone.to_string()));
}

#[tokio::test]
async fn unknown_word_is_an_engine_error() {
    let (server, _engine) = dictionary_server().await;
    let client = engine_client(&server);
    let missing = Uuid::new_v4();

    let err = client
        .update_user_dict_word(&missing, &DictionaryWord::new("秋田", "アキタ", 1))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "HTTP 404: failed to update word");

    let err = client.delete_user_dict_word(&missing).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 404: failed to delete word");
}

#[tokio::test]
async fn empty_dictionary_lists_nothing() {
    let (server, _engine) = dictionary_server().await;
    let client = engine_client(&server);

    assert!(client.user_dict().await.unwrap().is_empty());
}
