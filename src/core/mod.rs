// core logic - generation, guardrails, routing, and conversations

pub mod agent;
pub mod ai;
pub mod analysis;
mod domain;
pub mod guard;
mod policy;
pub mod router;
pub mod session;

pub use agent::{Agent, AgentInfo, AgentSpec, Agents};
pub use ai::{Ai, GenerationError, Generator, Provider};
pub use analysis::{Analyst, CompanyAnalysis, CompanyDocument, DocumentLoader, Report, TextLoader};
pub use domain::Domain;
pub use guard::{Guard, Guarded};
pub use policy::{Policy, PolicySet};
pub use router::{Classification, Orchestrator, Unresolved};
pub use session::{Assistant, Reply, Role, Session, SessionId, Sessions, Turn};
