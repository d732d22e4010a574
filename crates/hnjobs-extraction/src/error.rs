//! Extraction error types and provider error classification.

use thiserror::Error;

use hnjobs_core::error::{AppError, ErrorKind};

/// Result type for extraction operations.
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;

/// Extraction client errors.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The batch was empty.
    #[error("no inputs provided")]
    NoInputs,

    /// The batch exceeded the per-request limit.
    #[error("batch of {size} exceeds the maximum of {max}")]
    MaxBatch {
        /// Number of inputs supplied.
        size: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// The model returned no candidates or an empty body.
    #[error("no response from model")]
    NoResponse,

    /// The model's output was not the expected JSON.
    #[error("failed to decode model response: {0}")]
    Decode(#[from] serde_json::Error),

    /// HTTP 429 or an equivalent provider message.
    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    /// The account's quota is used up.
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    /// The provider is overloaded or down.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other provider error.
    #[error("provider error ({status:?}): {message}")]
    Api {
        /// HTTP status, if there was a response.
        status: Option<u16>,
        /// Provider message.
        message: String,
    },

    /// Transport failure without a classified cause.
    #[error("network error: {0}")]
    Network(String),

    /// The client is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ExtractionError {
    /// Provider-side failures that clear up on their own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimit(_) | Self::QuotaExhausted(_) | Self::ServiceUnavailable(_) | Self::Network(_)
        )
    }

    /// The model answered, but not with usable JSON.
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Self::NoResponse | Self::Decode(_))
    }

    /// The caller built an invalid batch.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::NoInputs | Self::MaxBatch { .. })
    }
}

/// Map a provider failure to an error class.
///
/// Rate limiting is checked first, then quota, then availability.
/// Anything else is returned as [`ExtractionError::Api`].
pub fn classify(status: Option<u16>, message: &str) -> ExtractionError {
    let lower = message.to_lowercase();

    if status == Some(429) || lower.contains("rate limit") || lower.contains("too many requests") {
        return ExtractionError::RateLimit(message.to_string());
    }
    if (status == Some(403) && lower.contains("quota")) || lower.contains("quota exceeded") {
        return ExtractionError::QuotaExhausted(message.to_string());
    }
    if status == Some(503) || lower.contains("resource_exhausted") {
        return ExtractionError::ServiceUnavailable(message.to_string());
    }

    ExtractionError::Api {
        status,
        message: message.to_string(),
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        let kind = match &err {
            ExtractionError::NoInputs | ExtractionError::MaxBatch { .. } => ErrorKind::Validation,
            ExtractionError::NoResponse | ExtractionError::Decode(_) => ErrorKind::Serialization,
            ExtractionError::RateLimit(_) | ExtractionError::QuotaExhausted(_) => ErrorKind::RateLimit,
            ExtractionError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            ExtractionError::Configuration(_) => ErrorKind::Configuration,
            ExtractionError::Api { .. } | ExtractionError::Network(_) => ErrorKind::ExternalService,
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        assert!(matches!(classify(Some(429), "slow down"), ExtractionError::RateLimit(_)));
        assert!(matches!(
            classify(None, "Too Many Requests"),
            ExtractionError::RateLimit(_)
        ));
        assert!(matches!(
            classify(Some(400), "rate limit hit for project"),
            ExtractionError::RateLimit(_)
        ));
    }

    #[test]
    fn test_classify_quota() {
        assert!(matches!(
            classify(Some(403), "Quota for this project is used up"),
            ExtractionError::QuotaExhausted(_)
        ));
        assert!(matches!(
            classify(Some(400), "Quota exceeded for metric"),
            ExtractionError::QuotaExhausted(_)
        ));
        // 403 without a quota message is just a permission error.
        assert!(matches!(
            classify(Some(403), "API key not valid"),
            ExtractionError::Api { status: Some(403), .. }
        ));
    }

    #[test]
    fn test_classify_unavailable() {
        assert!(matches!(
            classify(Some(503), "The model is overloaded"),
            ExtractionError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            classify(Some(500), "RESOURCE_EXHAUSTED"),
            ExtractionError::ServiceUnavailable(_)
        ));
    }

    #[test]
    fn test_classify_passes_through() {
        let err = classify(Some(400), "Invalid JSON payload");
        match err {
            ExtractionError::Api { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "Invalid JSON payload");
            }
            other => panic!("unexpected class: {other:?}"),
        }
    }

    #[test]
    fn test_predicates() {
        assert!(ExtractionError::RateLimit(String::new()).is_transient());
        assert!(ExtractionError::NoResponse.is_malformed_response());
        assert!(ExtractionError::NoInputs.is_contract_violation());
        assert!(ExtractionError::MaxBatch { size: 31, max: 30 }.is_contract_violation());
        assert!(!ExtractionError::NoResponse.is_transient());
    }

    #[test]
    fn test_into_app_error() {
        let err: AppError = ExtractionError::MaxBatch { size: 31, max: 30 }.into();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "batch of 31 exceeds the maximum of 30");
    }
}
