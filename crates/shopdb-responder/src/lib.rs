//! shopdb-responder
//!
//! Fallback text generation for chat messages the catalog cannot answer:
//! an HTTP client for the hosted model, a no-op stand-in, and an optional
//! formal-tone rewrite of whatever comes back.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod formal;
pub mod gemini;

use tracing::{info, warn};

use shopdb_core::config::{ResponderKind, ResponderSettings, Tone};
use shopdb_core::error::{Error, Result};
pub use shopdb_core::traits::Responder;

pub use formal::formalize;
pub use gemini::GeminiResponder;

/// Keys that are shipped in sample env files and never valid.
const PLACEHOLDER_KEYS: &[&str] = &["YOUR_API_KEY", "DUMMY_KEY_BECAUSE_WE_HAVE_TO"];

/// Responder used when no generator is configured. Always fails with
/// [`Error::ResponderNotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResponder;

impl Responder for NoopResponder {
    fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::ResponderNotConfigured)
    }
}

/// Applies the formal-tone rewrite to non-empty output of `inner`.
pub struct FormalResponder<R> {
    inner: R,
}

impl<R: Responder> FormalResponder<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Responder> Responder for FormalResponder<R> {
    fn generate(&self, prompt: &str) -> Result<String> {
        let text = self.inner.generate(prompt)?;
        Ok(if text.trim().is_empty() { text } else { formalize(&text) })
    }
}

fn usable_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(&k.as_str()))
}

/// Builds the configured responder, reading the API key from the
/// environment variable named by `settings.api_key_env`.
pub fn get_default_responder(settings: &ResponderSettings) -> Box<dyn Responder> {
    responder_with_key(settings, std::env::var(&settings.api_key_env).ok())
}

/// Like [`get_default_responder`] with an explicit key. A missing or
/// placeholder key, or an HTTP client that cannot be built, selects
/// [`NoopResponder`] with a warning.
pub fn responder_with_key(settings: &ResponderSettings, api_key: Option<String>) -> Box<dyn Responder> {
    let base: Box<dyn Responder> = match settings.kind {
        ResponderKind::Noop => {
            info!("using no-op responder");
            Box::new(NoopResponder)
        }
        ResponderKind::Gemini => match usable_key(api_key) {
            None => {
                warn!(env = %settings.api_key_env, "API key missing; generative fallback disabled");
                Box::new(NoopResponder)
            }
            Some(key) => match GeminiResponder::new(settings, key) {
                Ok(r) => {
                    info!(model = %settings.model, "using generative responder");
                    Box::new(r)
                }
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "responder client unavailable; generative fallback disabled");
                    Box::new(NoopResponder)
                }
            },
        },
    };
    match settings.tone {
        Tone::Formal => Box::new(FormalResponder::new(base)),
        Tone::Casual => base,
    }
}
