// wiring - build the generation client, registry, and session store once at startup

use crate::Error;
use crate::core::{
    Agents, Ai, Analyst, Assistant, Generator, Guard, Orchestrator, PolicySet, Provider, Sessions,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout: Duration,
    pub policies: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: None,
            model: None,
            timeout: crate::core::ai::DEFAULT_TIMEOUT,
            policies: None,
        }
    }
}

pub struct App {
    pub sessions: Arc<Sessions>,
    pub analyst: Arc<Analyst>,
}

impl App {
    pub fn from_settings(settings: &Settings) -> Result<Self, Error> {
        let policies = match &settings.policies {
            Some(path) => PolicySet::load(path)?,
            None => PolicySet::defaults(),
        };

        let mut ai = Ai::new(settings.provider, settings.api_key.clone())?
            .with_timeout(settings.timeout)?;
        if let Some(model) = &settings.model {
            ai = ai.with_model(model);
        }
        info!(provider = %ai.provider(), model = ai.model(), "generation client ready");

        Self::with_generator(Arc::new(ai), policies, settings.timeout)
    }

    /// Everything shares one generator; fails if any domain lacks a policy.
    pub fn with_generator(
        generator: Arc<dyn Generator>,
        policies: PolicySet,
        timeout: Duration,
    ) -> Result<Self, Error> {
        policies.ensure_complete()?;

        let guard = Arc::new(Guard::new(Arc::clone(&generator), policies).with_timeout(timeout));
        let agents = Agents::new(guard)?;
        let orchestrator = Orchestrator::new(Arc::clone(&generator)).with_timeout(timeout);
        let assistant = Arc::new(Assistant::new(orchestrator, agents));

        Ok(Self {
            sessions: Arc::new(Sessions::new(assistant)),
            analyst: Arc::new(Analyst::new(generator).with_timeout(timeout)),
        })
    }
}
