// orchestrator - asks the model which agent should take a question

use crate::core::Domain;
use crate::core::agent::Agent;
use crate::core::ai::{DEFAULT_TIMEOUT, Generator, generate_within};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const ORCHESTRATOR_INSTRUCTION: &str = "You route user queries to the specialist best placed to \
answer them. When evaluating a query:

1. Identify its core subject matter.
2. Look for key terms that point to a legal, financial, or general knowledge focus.
3. If a query mixes several elements, pick the most prominent one.
4. Route everything that is neither legal nor financial to the general knowledge specialist.
5. Always begin your answer with the single keyword of the chosen specialist.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Routed { domain: Domain, rationale: String },
    Unknown(Unresolved),
}

/// Why a query could not be routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// the reply did not start with a registered keyword
    Unrecognized { reply: String },
    /// the classification call itself failed
    Unavailable,
}

impl Classification {
    pub fn domain(&self) -> Option<Domain> {
        match self {
            Classification::Routed { domain, .. } => Some(*domain),
            Classification::Unknown(_) => None,
        }
    }
}

pub struct Orchestrator {
    generator: Arc<dyn Generator>,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// One generation call, never an error. Identical queries may route differently.
    pub async fn classify<'a>(
        &self,
        query: &str,
        agents: impl IntoIterator<Item = &'a Agent>,
    ) -> Classification {
        let agents: Vec<&Agent> = agents.into_iter().collect();
        let prompt = classification_prompt(query, &agents);

        let reply = match generate_within(
            self.generator.as_ref(),
            self.timeout,
            ORCHESTRATOR_INSTRUCTION,
            &prompt,
        )
        .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "classification failed");
                return Classification::Unknown(Unresolved::Unavailable);
            }
        };

        let known: Vec<Domain> = agents.iter().map(|a| a.domain()).collect();
        let classification = parse_reply(&reply, &known);
        match &classification {
            Classification::Routed { domain, rationale } => {
                info!(%domain, rationale = rationale.as_str(), "query routed")
            }
            Classification::Unknown(_) => warn!(reply = reply.as_str(), "unrecognized classification"),
        }
        classification
    }
}

pub fn classification_prompt(query: &str, agents: &[&Agent]) -> String {
    let mut prompt = format!(
        "Analyze the following query and determine which specialist should answer it.\n\n\
         Query: {query}\n\nThe available specialists are:\n\n"
    );

    for (i, agent) in agents.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {} ({}): {}\n",
            i + 1,
            agent.name(),
            agent.domain().keyword(),
            agent.description()
        ));
    }

    let keywords: Vec<String> = agents
        .iter()
        .map(|a| format!("'{}'", a.domain().keyword()))
        .collect();
    prompt.push_str(&format!(
        "\nRespond with exactly one of {}, followed by a brief explanation of your reasoning.",
        keywords.join(", ")
    ));

    prompt
}

/// Decodes a classifier reply: the first whitespace-separated token, lower-cased and
/// stripped of surrounding punctuation, must name one of `known`.
pub fn parse_reply(reply: &str, known: &[Domain]) -> Classification {
    let reply = reply.trim();
    let (head, rest) = match reply.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest),
        None => (reply, ""),
    };

    let token = head
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();

    match token.parse::<Domain>() {
        Ok(domain) if known.contains(&domain) => Classification::Routed {
            domain,
            rationale: rest
                .trim()
                .trim_start_matches(|c: char| matches!(c, '-' | ':' | ',' | '.'))
                .trim()
                .to_string(),
        },
        _ => Classification::Unknown(Unresolved::Unrecognized {
            reply: reply.to_string(),
        }),
    }
}
