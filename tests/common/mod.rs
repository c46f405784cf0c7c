// scripted generator shared by the integration tests

#![allow(dead_code)]

use agentrail::{App, GenerationError, Generator, PolicySet};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub enum Step {
    Reply(String),
    Fail,
    Slow(Duration, String),
}

pub fn reply(text: &str) -> Step {
    Step::Reply(text.to_string())
}

/// Answers from a queue in call order and records every (system, user) pair.
#[derive(Default)]
pub struct Scripted {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl Scripted {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for Scripted {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail) => Err(GenerationError::Malformed("scripted failure".to_string())),
            Some(Step::Slow(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            None => Err(GenerationError::Malformed("script exhausted".to_string())),
        }
    }
}

pub fn app(generator: &Arc<Scripted>) -> App {
    App::with_generator(
        generator.clone(),
        PolicySet::defaults(),
        Duration::from_secs(1),
    )
    .unwrap()
}
