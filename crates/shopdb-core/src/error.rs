use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// One category's source table could not be read. Callers skip the
    /// category and keep loading the rest.
    #[error("Failed to load category '{category}': {reason}")]
    LoadFailure { category: String, reason: String },

    #[error("No catalog category could be loaded")]
    EmptyCatalog,

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Unknown category '{category}'. Must be one of: {}", known.join(","))]
    UnknownCategory { category: String, known: Vec<String> },

    #[error("Responder unavailable: {0}")]
    Responder(String),

    /// No generator is configured (no API key, or the no-op kind).
    #[error("No generative responder configured")]
    ResponderNotConfigured,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
