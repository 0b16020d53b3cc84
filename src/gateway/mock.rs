use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::GatewayError;
use super::{JsonRequest, JsonResponse, LlmGateway};
use crate::ledger::TokenUsage;

type Handler =
    Box<dyn Fn(&JsonRequest) -> Result<serde_json::Value, GatewayError> + Send + Sync>;

/// Scripted gateway for tests: a handler closure inspects each request and
/// returns canned JSON. Every call is recorded.
pub struct MockLlmGateway {
    handler: Handler,
    calls: Mutex<Vec<JsonRequest>>,
    usage_per_call: TokenUsage,
}

impl MockLlmGateway {
    /// Creates a mock that answers every request through `handler`.
    pub fn new(
        handler: impl Fn(&JsonRequest) -> Result<serde_json::Value, GatewayError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            usage_per_call: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
            },
        }
    }

    /// Overrides the usage reported per call.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage_per_call = usage;
        self
    }

    /// All requests seen so far.
    pub fn calls(&self) -> Vec<JsonRequest> {
        self.calls.lock().clone()
    }

    /// Number of calls for one operation label.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }
}

#[async_trait]
impl LlmGateway for MockLlmGateway {
    async fn complete_json(&self, request: JsonRequest) -> Result<JsonResponse, GatewayError> {
        let value = (self.handler)(&request)?;
        self.calls.lock().push(request);
        Ok(JsonResponse {
            value,
            usage: self.usage_per_call,
        })
    }
}
