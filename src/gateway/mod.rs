//! LLM inference gateway: structured prompt in, validated JSON out.
//!
//! The model is a fallible black box. Every response is parsed and
//! validated here; schema violations surface as [`GatewayError`] values for
//! call sites to treat as stage failures.

pub mod client;
pub mod error;
pub mod prompts;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::GenaiGateway;
pub use error::GatewayError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockLlmGateway;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::ledger::TokenUsage;

/// One structured-JSON inference request.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    /// Operation label used in logs and error messages.
    pub operation: &'static str,
    /// System instruction (includes the expected output shape).
    pub system: String,
    /// User content.
    pub user: String,
}

/// Parsed JSON plus the usage the call consumed.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    /// Parsed response body.
    pub value: serde_json::Value,
    /// Token usage reported by the provider.
    pub usage: TokenUsage,
}

/// Async inference interface used by the pipeline.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Executes `request` and returns parsed JSON.
    async fn complete_json(&self, request: JsonRequest) -> Result<JsonResponse, GatewayError>;
}

/// Deserializes a gateway response into the call site's expected schema.
/// Mismatches become [`GatewayError::SchemaViolation`].
pub fn parse_structured<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::SchemaViolation {
        reason: e.to_string(),
    })
}

/// Strips a Markdown code fence if the model wrapped its JSON in one.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Verdict {
        relevant: bool,
    }

    #[test]
    fn test_parse_structured_accepts_matching_shape() {
        let value = serde_json::json!({ "relevant": true });
        let verdict: Verdict = parse_structured(value).unwrap();
        assert!(verdict.relevant);
    }

    #[test]
    fn test_parse_structured_rejects_mismatch() {
        let value = serde_json::json!({ "relevant": "yes" });
        let err = parse_structured::<Verdict>(value).unwrap_err();
        assert!(matches!(err, GatewayError::SchemaViolation { .. }));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }
}
