use crate::core::{Domain, GenerationError, Provider};
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid session id: {0:?}")]
    #[diagnostic(help("use 1-64 characters from A-Z, a-z, 0-9, '-' and '_'"))]
    InvalidSessionId(String),

    #[error("No policy registered for the {0} domain")]
    MissingPolicy(Domain),

    #[error("No agent registered for the {0} domain")]
    MissingAgent(Domain),

    #[error("Missing API key for {0}")]
    #[diagnostic(help(
        "pass --api-key, or set ANTHROPIC_API_KEY / CLAUDE_API_KEY / CLAUDE_KEY for claude, OPENAI_API_KEY for openai"
    ))]
    MissingApiKey(Provider),

    #[error("Could not parse policy file {}: {source}", path.display())]
    PolicyFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// whether the caller sent something wrong, as opposed to us failing
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::InvalidSessionId(_))
    }
}
