use std::borrow::Cow;
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::{NodeError, Result};

/// AivisSpeech Engine listens here unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "http://localhost:10101";

pub const BASE_URL_ENV: &str = "AIVISSPEECH_BASE_URL";

/// Where the engine lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    base_url: Url,
}

impl EngineConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut url = Url::parse(base_url.trim())
            .map_err(|e| NodeError::config(format!("invalid engine base URL `{}`: {}", base_url, e)))?;

        match url.scheme() {
            "http" | "https" => {},
            other => {
                return Err(NodeError::config(format!("unsupported engine URL scheme `{}`", other)));
            },
        }

        // endpoint paths are joined relative to the base, so keep any prefix
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self { base_url: url })
    }

    /// Reads `AIVISSPEECH_BASE_URL`, falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Result<Self> {
        match std::env::var(BASE_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::new(&value),
            _ => Self::new(DEFAULT_BASE_URL),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| NodeError::config(format!("invalid endpoint path `{}`: {}", path, e)))
    }
}

/// One request against the engine, plus the wording used if it fails.
#[derive(Debug, Clone)]
pub struct EngineCall<'a> {
    method: Method,
    path: Cow<'a, str>,
    query: Vec<(&'static str, String)>,
    body: Option<Vec<u8>>,
    action: Cow<'a, str>,
}

impl<'a> EngineCall<'a> {
    pub fn new(method: Method, path: impl Into<Cow<'a, str>>, action: impl Into<Cow<'a, str>>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            action: action.into(),
        }
    }

    pub fn get(path: impl Into<Cow<'a, str>>, action: impl Into<Cow<'a, str>>) -> Self {
        Self::new(Method::GET, path, action)
    }

    pub fn post(path: impl Into<Cow<'a, str>>, action: impl Into<Cow<'a, str>>) -> Self {
        Self::new(Method::POST, path, action)
    }

    pub fn put(path: impl Into<Cow<'a, str>>, action: impl Into<Cow<'a, str>>) -> Self {
        Self::new(Method::PUT, path, action)
    }

    pub fn delete(path: impl Into<Cow<'a, str>>, action: impl Into<Cow<'a, str>>) -> Self {
        Self::new(Method::DELETE, path, action)
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let body = serde_json::to_vec(body)
            .map_err(|e| NodeError::decode(format!("cannot encode request body for {}", self.path), e))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

/// HTTP client for a VOICEVOX-protocol engine.
///
/// Every call is a single attempt: no retries and no timeout beyond what
/// the transport does by default.
#[derive(Debug, Clone)]
pub struct EngineClient {
    http: Client,
    config: EngineConfig,
}

impl EngineClient {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let http = Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(5)))
            .tcp_nodelay(true)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .map_err(|e| NodeError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn with_client(http: Client, config: EngineConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Sends `call` and fails with an engine error on any non-2xx status.
    pub async fn call(&self, call: EngineCall<'_>) -> Result<Response> {
        let url = self.config.endpoint(&call.path)?;
        log::debug!("{} {}", call.method, url.path());

        let mut request = self.http.request(call.method.clone(), url);
        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        if let Some(body) = call.body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let response = request.send().await.map_err(|e| {
            log::error!("request to engine failed ({} {}): {}", call.method, call.path, e);
            NodeError::transport(&*call.action, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            log::error!("engine rejected {} {} ({}): {}", call.method, call.path, status, detail);
            return Err(NodeError::engine(status.as_u16(), call.action));
        }

        Ok(response)
    }

    /// Like [`call`](Self::call), returning the raw response body.
    pub async fn call_bytes(&self, call: EngineCall<'_>) -> Result<Vec<u8>> {
        let action = call.action.to_string();
        let response = self.call(call).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| NodeError::transport(action, e))?;
        Ok(bytes.to_vec())
    }

    /// Like [`call`](Self::call), decoding the body as JSON.
    pub async fn call_json<T: DeserializeOwned>(&self, call: EngineCall<'_>) -> Result<T> {
        let action = call.action.to_string();
        let body = self.call_bytes(call).await?;
        serde_json::from_slice(&body).map_err(|e| NodeError::decode(action, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = EngineConfig::new("http://localhost:10101").unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:10101/");
        assert_eq!(config.endpoint("/speakers").unwrap().as_str(), "http://localhost:10101/speakers");
    }

    #[test]
    fn path_prefix_is_preserved() {
        let config = EngineConfig::new("https://tts.example.com/aivis").unwrap();
        assert_eq!(
            config.endpoint("user_dict_word/abc").unwrap().as_str(),
            "https://tts.example.com/aivis/user_dict_word/abc"
        );
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(EngineConfig::new("not a url").is_err());
        let err = EngineConfig::new("ftp://localhost:10101").unwrap_err();
        assert_eq!(err.error_name(), "ConfigError");
    }

    #[test]
    fn call_builder_collects_query() {
        let call = EngineCall::post("audio_query", "failed to fetch audio query")
            .query("text", "こんにちは")
            .query("speaker", 888753760u32);
        assert_eq!(call.method(), &Method::POST);
        assert_eq!(call.path(), "audio_query");
        assert_eq!(call.action(), "failed to fetch audio query");
        assert_eq!(call.query[1], ("speaker", "888753760".to_string()));
    }
}
