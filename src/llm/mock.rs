//! Mock text generator for testing.
//!
//! Replays scripted responses in order and records every prompt it receives.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{AgentError, Result};
use crate::llm::TextGenerator;

/// Mock generator that returns canned responses.
///
/// Each call consumes the next scripted response. Once the script runs out,
/// calls fail with a gateway error.
#[derive(Debug, Clone, Default)]
pub struct MockTextGenerator {
    responses: Vec<std::result::Result<String, String>>,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockTextGenerator {
    /// Creates a mock that returns the given responses in order.
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self {
            responses: responses.into_iter().map(|r| Ok(r.into())).collect(),
            ..Self::default()
        }
    }

    /// Creates a mock whose every call fails, simulating an unreachable service.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Appends a failing response to the script.
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.responses.push(Err(message.into()));
        self
    }

    /// Returns the number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns a handle to the prompts received so far.
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match self.responses.get(index) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(AgentError::gateway(message.clone())),
            None => Err(AgentError::gateway("Mock generator unavailable")),
        }
    }
}
