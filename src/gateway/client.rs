use std::time::Duration;

use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use tracing::{debug, error};

use super::error::GatewayError;
use super::{JsonRequest, JsonResponse, LlmGateway, strip_code_fence};
use crate::ledger::TokenUsage;
use crate::retry::{RetryPolicy, retry_with_backoff};

/// Multi-provider inference client (via `genai`), JSON-validated.
pub struct GenaiGateway {
    client: Client,
    model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GenaiGateway {
    /// Creates a gateway for `model` using provider credentials from the
    /// environment.
    pub fn new(model: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
            timeout,
            retry,
        }
    }

    /// Creates a gateway with an explicit client.
    pub fn with_client(
        client: Client,
        model: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            timeout,
            retry,
        }
    }

    async fn exec_once(&self, request: &JsonRequest) -> Result<JsonResponse, GatewayError> {
        let chat_request = ChatRequest::new(vec![
            ChatMessage::system(request.system.clone()),
            ChatMessage::user(request.user.clone()),
        ]);

        let response = tokio::time::timeout(
            self.timeout,
            self.client.exec_chat(&self.model, chat_request, None),
        )
        .await
        .map_err(|_| GatewayError::Provider {
            operation: request.operation.to_string(),
            message: format!("timed out after {:?}", self.timeout),
        })?
        .map_err(|e| {
            error!(operation = request.operation, error = %e, "provider call failed");
            GatewayError::Provider {
                operation: request.operation.to_string(),
                message: e.to_string(),
            }
        })?;

        let usage = TokenUsage {
            prompt_tokens: response.usage.prompt_tokens.unwrap_or(0).max(0) as u64,
            completion_tokens: response.usage.completion_tokens.unwrap_or(0).max(0) as u64,
        };

        let text = response
            .first_text()
            .map(str::to_string)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GatewayError::EmptyResponse {
                operation: request.operation.to_string(),
            })?;

        let value: serde_json::Value =
            serde_json::from_str(strip_code_fence(&text)).map_err(|e| {
                GatewayError::InvalidJson {
                    operation: request.operation.to_string(),
                    reason: e.to_string(),
                }
            })?;

        debug!(
            operation = request.operation,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "inference call completed"
        );

        Ok(JsonResponse { value, usage })
    }
}

#[async_trait::async_trait]
impl LlmGateway for GenaiGateway {
    async fn complete_json(&self, request: JsonRequest) -> Result<JsonResponse, GatewayError> {
        retry_with_backoff(request.operation, self.retry, || self.exec_once(&request)).await
    }
}
