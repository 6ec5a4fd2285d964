//! Mock backend for testing
//!
//! Returns a canned, well-formed insight response by default. Tests can
//! queue scripted replies (failures, delays, malformed text) that are
//! consumed one per call before falling back to the default.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

/// Canned response following the section grammar the insight prompt asks for
pub const MOCK_INSIGHT_RESPONSE: &str = "\
## Narrative
Revenue held steady across the period, with enterprise software leading sales.

## Recommendations
- Expand the partner channel in Europe
- Bundle Cloud Storage Plus with CloudSync Pro
- Run a retention campaign for customers with a single purchase

## Trends Analysis
Sales peak in November and December and dip over the summer months.
";

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text
    Text(String),
    /// Fail as if the server answered with this HTTP status
    Status(u16),
    /// Wait, then return this text
    Delayed(Duration, String),
}

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    model: String,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<AtomicU32>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            model: "mock".to_string(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Create a mock that plays `replies` in order, then the default response
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let mock = Self::new();
        if let Ok(mut script) = mock.script.lock() {
            script.extend(replies);
        }
        mock
    }

    /// Number of `generate` calls made so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Option<MockReply> {
        self.script.lock().ok().and_then(|mut s| s.pop_front())
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.next_reply() {
            None => Ok(MOCK_INSIGHT_RESPONSE.to_string()),
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Status(status)) => Err(Error::Backend {
                status,
                body: "scripted failure".to_string(),
            }),
            Some(MockReply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_response() {
        let mock = MockBackend::new();
        let text = mock.generate("s", "p").await.unwrap();
        assert_eq!(text, MOCK_INSIGHT_RESPONSE);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_script_plays_in_order() {
        let mock = MockBackend::scripted([
            MockReply::Status(503),
            MockReply::Text("hello".into()),
        ]);

        let err = mock.generate("s", "p").await.unwrap_err();
        assert!(matches!(err, Error::Backend { status: 503, .. }));
        assert_eq!(mock.generate("s", "p").await.unwrap(), "hello");
        assert_eq!(mock.generate("s", "p").await.unwrap(), MOCK_INSIGHT_RESPONSE);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let healthy = MockBackend::new();
        assert!(healthy.health_check().await);

        let unhealthy = MockBackend::unhealthy();
        assert!(!unhealthy.health_check().await);
    }
}
