// guardrails around one generation call
// check the question, ask the model, check the answer

use crate::Error;
use crate::core::ai::{DEFAULT_TIMEOUT, Generator, generate_within};
use crate::core::{Domain, PolicySet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// What the user sees when the model could not be reached.
pub const GENERIC_FAILURE: &str =
    "I'm sorry, but I encountered an error while processing your request. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded {
    /// the model's answer, passed through untouched
    Allowed(String),
    /// the question hit a blocked term, the model was never called
    InputBlocked { term: String, refusal: String },
    /// the answer hit a blocked term and was thrown away
    OutputBlocked { term: String, refusal: String },
    /// generation failed, carries the generic failure text
    Failed(String),
}

impl Guarded {
    pub fn text(&self) -> &str {
        match self {
            Guarded::Allowed(text) | Guarded::Failed(text) => text,
            Guarded::InputBlocked { refusal, .. } | Guarded::OutputBlocked { refusal, .. } => {
                refusal
            }
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Guarded::Allowed(text) | Guarded::Failed(text) => text,
            Guarded::InputBlocked { refusal, .. } | Guarded::OutputBlocked { refusal, .. } => {
                refusal
            }
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            Guarded::InputBlocked { .. } | Guarded::OutputBlocked { .. }
        )
    }
}

pub struct Guard {
    generator: Arc<dyn Generator>,
    policies: PolicySet,
    timeout: Duration,
}

impl Guard {
    pub fn new(generator: Arc<dyn Generator>, policies: PolicySet) -> Self {
        Self {
            generator,
            policies,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Applies `domain`'s policy around one call with `persona` as the system prompt.
    pub async fn enforce(&self, domain: Domain, persona: &str, text: &str) -> Result<Guarded, Error> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("query is empty".to_string()));
        }

        let policy = self
            .policies
            .get(domain)
            .ok_or(Error::MissingPolicy(domain))?;

        if let Some(term) = policy.blocks_input(text) {
            warn!(%domain, term, "input blocked by policy");
            return Ok(Guarded::InputBlocked {
                term: term.to_string(),
                refusal: policy.refusal().to_string(),
            });
        }

        let raw = match generate_within(self.generator.as_ref(), self.timeout, persona, text).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(%domain, error = %e, "generation failed");
                return Ok(Guarded::Failed(GENERIC_FAILURE.to_string()));
            }
        };

        // no partial redaction - the whole answer goes
        if let Some(term) = policy.blocks_output(&raw) {
            warn!(%domain, term, "output blocked by policy");
            return Ok(Guarded::OutputBlocked {
                term: term.to_string(),
                refusal: policy.refusal().to_string(),
            });
        }

        debug!(%domain, chars = raw.len(), "output passed policy");
        Ok(Guarded::Allowed(raw))
    }
}
