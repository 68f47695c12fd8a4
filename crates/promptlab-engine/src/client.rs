//! Model client boundary
//!
//! The outbound call to a language-model endpoint lives outside this core;
//! only the request/response shapes and the async trait are defined here,
//! plus a mock implementation for tests. Classification only ever sees the
//! response string, never the transport details.

use async_trait::async_trait;

use crate::error::EngineResult;

/// Request to a model endpoint
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// The concrete prompt to send
    pub prompt: String,

    /// Model identifier
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl ModelRequest {
    /// Create a new request
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Response from a model endpoint
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// The generated text
    pub content: String,

    /// Model that produced it
    pub model: String,

    /// Wall-clock latency of the call
    pub latency_ms: u64,
}

/// Async boundary trait for the outbound model call
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one prompt and return the text response
    async fn send(&self, request: ModelRequest) -> EngineResult<ModelResponse>;

    /// Name of this client, for result attribution
    fn name(&self) -> &str;
}

/// Mock client for tests: returns canned responses in rotation
pub struct MockModelClient {
    name: String,
    responses: Vec<String>,
    next: std::sync::atomic::AtomicUsize,
}

impl MockModelClient {
    /// Create a mock returning one fixed response
    pub fn new() -> Self {
        Self::with_responses(vec!["Mock model response".to_string()])
    }

    /// Create a mock cycling through the given responses
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            name: "mock".to_string(),
            responses,
            next: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn send(&self, request: ModelRequest) -> EngineResult<ModelResponse> {
        let index = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let content = self
            .responses
            .get(index % self.responses.len().max(1))
            .cloned()
            .unwrap_or_default();
        Ok(ModelResponse {
            content,
            model: request.model,
            latency_ms: 0,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_cycles_responses() {
        let client =
            MockModelClient::with_responses(vec!["one".to_string(), "two".to_string()]);

        let first = client
            .send(ModelRequest::new("p", "mock-model"))
            .await
            .unwrap();
        let second = client
            .send(ModelRequest::new("p", "mock-model"))
            .await
            .unwrap();
        let third = client
            .send(ModelRequest::new("p", "mock-model"))
            .await
            .unwrap();

        assert_eq!(first.content, "one");
        assert_eq!(second.content, "two");
        assert_eq!(third.content, "one");
    }
}
