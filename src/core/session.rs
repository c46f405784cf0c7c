// conversations - ordered turns per session, one submit at a time

use crate::Error;
use crate::core::Domain;
use crate::core::agent::Agents;
use crate::core::guard::GENERIC_FAILURE;
use crate::core::router::{Classification, Orchestrator, Unresolved};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

pub const CLARIFICATION: &str = "I'm not sure how to categorize this question. \
Could you please provide more context or rephrase it?";

const MAX_SESSION_ID_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            domain: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, domain: Option<Domain>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            domain,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.len() <= MAX_SESSION_ID_LEN
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidSessionId(s.to_string()))
        }
    }
}

impl TryFrom<String> for SessionId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the assistant says back to one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub domain: Option<Domain>,
}

/// Classifier plus agents: everything needed to answer a query, shared by all sessions.
pub struct Assistant {
    orchestrator: Orchestrator,
    agents: Agents,
}

impl Assistant {
    pub fn new(orchestrator: Orchestrator, agents: Agents) -> Self {
        Self {
            orchestrator,
            agents,
        }
    }

    pub fn agents(&self) -> &Agents {
        &self.agents
    }

    pub async fn reply(&self, query: &str) -> Result<Reply, Error> {
        let classification = self.orchestrator.classify(query, self.agents.iter()).await;

        let domain = match classification {
            Classification::Routed { domain, .. } => domain,
            Classification::Unknown(Unresolved::Unrecognized { .. }) => {
                return Ok(Reply {
                    content: CLARIFICATION.to_string(),
                    domain: None,
                });
            }
            Classification::Unknown(Unresolved::Unavailable) => {
                return Ok(Reply {
                    content: GENERIC_FAILURE.to_string(),
                    domain: None,
                });
            }
        };

        let guarded = self.agents.get(domain)?.respond(query).await?;
        debug!(%domain, blocked = guarded.is_blocked(), "agent responded");
        Ok(Reply {
            content: guarded.into_text(),
            domain: Some(domain),
        })
    }
}

/// One conversation's history. Not safe for concurrent submits on its own;
/// `Sessions` serializes them with a per-session lock.
#[derive(Debug, Default)]
pub struct Session {
    turns: Vec<Turn>,
}

impl Session {
    /// Records the user turn, asks the assistant, records and returns its reply.
    ///
    /// The assistant runs in its own task. If this future is dropped before it
    /// finishes, that task still runs to completion (or timeout) but its reply is
    /// discarded and the user turn is rolled back, so a retry starts clean. The
    /// same rollback happens when an error is returned.
    pub async fn submit(&mut self, assistant: &Arc<Assistant>, text: &str) -> Result<Turn, Error> {
        let query = non_empty(text)?;

        let pending = Pending::begin(&mut self.turns, Turn::user(query));

        let assistant = Arc::clone(assistant);
        let owned = query.to_string();
        let reply = tokio::spawn(async move { assistant.reply(&owned).await })
            .await
            .map_err(|e| Error::Internal(e.to_string()))??;

        Ok(pending.commit(Turn::assistant(reply.content, reply.domain)))
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn export(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    fn len(&self) -> usize {
        self.turns.len()
    }
}

fn non_empty(text: &str) -> Result<&str, Error> {
    let query = text.trim();
    if query.is_empty() {
        return Err(Error::InvalidInput("query is empty".to_string()));
    }
    Ok(query)
}

// user turn appended but not yet answered - truncated on drop unless committed
struct Pending<'a> {
    turns: &'a mut Vec<Turn>,
    mark: usize,
    committed: bool,
}

impl<'a> Pending<'a> {
    fn begin(turns: &'a mut Vec<Turn>, user: Turn) -> Self {
        let mark = turns.len();
        turns.push(user);
        Self {
            turns,
            mark,
            committed: false,
        }
    }

    fn commit(mut self, reply: Turn) -> Turn {
        self.turns.push(reply.clone());
        self.committed = true;
        reply
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.committed {
            debug!(mark = self.mark, "rolling back unanswered turn");
            self.turns.truncate(self.mark);
        }
    }
}

/// Every live session, keyed by id. A session is created by its first submit.
pub struct Sessions {
    assistant: Arc<Assistant>,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl Sessions {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self {
            assistant,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn assistant(&self) -> &Arc<Assistant> {
        &self.assistant
    }

    pub async fn submit(&self, id: &SessionId, text: &str) -> Result<Turn, Error> {
        // rejected queries never create a session
        non_empty(text)?;
        let session = self.session(id).await;
        let mut session = session.lock().await;
        let turn = session.submit(&self.assistant, text).await?;
        info!(session = %id, domain = ?turn.domain, turns = session.len(), "turn recorded");
        Ok(turn)
    }

    /// Clears an existing session's history. An unseen id is left unseen.
    pub async fn reset(&self, id: &SessionId) {
        let session = self.sessions.read().await.get(id).cloned();
        if let Some(session) = session {
            session.lock().await.reset();
            info!(session = %id, "session reset");
        }
    }

    /// Snapshot of the session's turns in order, empty for an unseen id.
    pub async fn export(&self, id: &SessionId) -> Vec<Turn> {
        let session = self.sessions.read().await.get(id).cloned();
        match session {
            Some(session) => session.lock().await.export(),
            None => Vec::new(),
        }
    }

    async fn session(&self, id: &SessionId) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(id.clone()).or_default())
    }
}
