//! Scripted provider for tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{CompletionOptions, LlmProvider, LlmResponse, TokenUsage};
use crate::types::{ForgeError, Result};

/// Returns queued responses in order; errors once the queue is empty
#[derive(Default)]
pub struct MockLlmProvider {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(content.into()));
        self
    }

    pub fn with_error(self, error: ForgeError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, prompt: &str, _options: &CompletionOptions) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => {
                let mut response = LlmResponse::content_only(content);
                response.usage = TokenUsage::new(100, 200);
                Ok(response)
            }
            Some(Err(e)) => Err(e),
            None => Err(ForgeError::LlmApi("mock exhausted".to_string())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
