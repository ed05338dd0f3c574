//! Scripted image provider for tests

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::ImageProvider;
use crate::types::{ForgeError, GeneratedImage, ImageStyle, PlacementSize, Result};

pub enum MockImageOutcome {
    Image,
    Fail(ForgeError),
    Hang(Duration),
}

/// Plays back scripted outcomes; succeeds once the script is exhausted
#[derive(Default)]
pub struct MockImageProvider {
    script: Mutex<VecDeque<MockImageOutcome>>,
    calls: Mutex<Vec<(String, ImageStyle)>>,
}

impl MockImageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, outcome: MockImageOutcome) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn styles(&self) -> Vec<ImageStyle> {
        self.calls.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }

    /// Deterministic payload so repeated prompts yield identical bytes
    pub fn payload_for(prompt: &str) -> String {
        BASE64.encode(format!("png:{}", prompt))
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate_image(
        &self,
        prompt: &str,
        _size: &PlacementSize,
        style: ImageStyle,
    ) -> Result<GeneratedImage> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), style));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(MockImageOutcome::Fail(e)) => Err(e),
            Some(MockImageOutcome::Hang(duration)) => {
                tokio::time::sleep(duration).await;
                Err(ForgeError::ImageApi("hung".to_string()))
            }
            Some(MockImageOutcome::Image) | None => Ok(GeneratedImage {
                base64_data: Self::payload_for(prompt),
                media_type: "image/png".to_string(),
                width: 1024,
                height: 1024,
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
