use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shopdb_core::config::ResponderSettings;
use shopdb_core::error::{Error, Result};
use shopdb_core::traits::Responder;

#[derive(Serialize)]
struct GenerateReq<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}

#[derive(Debug, Default, Deserialize)]
struct RespPart {
    #[serde(default)]
    text: String,
}

impl GenerateResp {
    /// Concatenated text parts of the first candidate; empty if there is none.
    pub(crate) fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect::<String>())
            .unwrap_or_default()
    }
}

/// Blocking client for the hosted `generateContent` text endpoint.
pub struct GeminiResponder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    attempts: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for GeminiResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the key
        f.debug_struct("GeminiResponder").field("endpoint", &self.endpoint).field("model", &self.model).finish()
    }
}

impl GeminiResponder {
    pub fn new(settings: &ResponderSettings, api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            attempts: settings.retries.max(1),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        })
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }

    fn call(&self, prompt: &str) -> anyhow::Result<String> {
        let req = GenerateReq { contents: [Content { parts: [Part { text: prompt }] }] };
        let resp = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .context("generateContent request failed")?
            .error_for_status()
            .context("generateContent non-200")?;
        let body: GenerateResp = resp.json().context("invalid generateContent response")?;
        Ok(body.text())
    }
}

impl Responder for GeminiResponder {
    /// Up to `retries` attempts with a fixed delay in between. An empty
    /// answer is returned as-is and not retried.
    fn generate(&self, prompt: &str) -> Result<String> {
        let mut last_err = anyhow!("no attempt made");
        for attempt in 1..=self.attempts {
            debug!(model = %self.model, attempt, "calling responder");
            match self.call(prompt) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(attempt, attempts = self.attempts, error = %format!("{e:#}"), "responder call failed");
                    last_err = e;
                }
            }
            if attempt < self.attempts {
                thread::sleep(self.retry_delay);
            }
        }
        Err(Error::Responder(format!("{last_err:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let req = GenerateReq { contents: [Content { parts: [Part { text: "hi" }] }] };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]}));
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let body: GenerateResp = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello"},{"text":" there"}],"role":"model"}},
                {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.text(), "Hello there");

        let empty: GenerateResp = serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn url_strips_trailing_slash() {
        let settings = ResponderSettings { endpoint: "http://localhost/v1/models/".into(), ..Default::default() };
        let r = GeminiResponder::new(&settings, "k".into()).unwrap();
        assert_eq!(r.url(), "http://localhost/v1/models/gemini-1.5-flash:generateContent");
        assert!(!format!("{r:?}").contains("\"k\""));
    }

    #[test]
    fn unreachable_endpoint_is_a_responder_error() {
        let settings = ResponderSettings {
            endpoint: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            retries: 2,
            retry_delay_ms: 0,
            ..Default::default()
        };
        let r = GeminiResponder::new(&settings, "k".into()).unwrap();
        assert!(matches!(r.generate("hello"), Err(Error::Responder(_))));
    }
}
