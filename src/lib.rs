// agentrail library - route questions to guarded domain agents

mod app;
pub mod cli;
pub mod core;
mod error;
pub mod logging;
pub mod output;
mod server;

pub use app::{App, Settings};
pub use self::core::{
    Agents, Ai, Analyst, Assistant, Classification, Domain, GenerationError, Generator, Guard,
    Guarded, Orchestrator, Policy, PolicySet, Provider, Role, Session, SessionId, Sessions, Turn,
};
pub use error::Error;
pub use server::Server;
