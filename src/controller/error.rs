//! Error types for the ContentDeliveryNetwork controller

use std::time::Duration;

use thiserror::Error;

use crate::controller::pipeline::Step;

/// Error variants are named with the `Error` suffix for clarity (e.g., `KubeError`, `ValidationError`).
#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing object key: {0}")]
    MissingObjectKey(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Step {step} failed: {source}")]
    StepFailed {
        step: Step,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error with the pipeline step that produced it
    pub fn in_step(self, step: Step) -> Self {
        match self {
            already @ Error::StepFailed { .. } => already,
            other => Error::StepFailed {
                step,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, looking through step wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// The step that failed, if this error came out of the pipeline
    pub fn failed_step(&self) -> Option<Step> {
        match self {
            Error::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }

    fn api_status(&self) -> Option<(u16, &str)> {
        match self.root() {
            Error::KubeError(kube::Error::Api(resp)) => Some((resp.code, resp.reason.as_str())),
            _ => None,
        }
    }

    /// The object (or the namespace holding it) does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self.api_status(), Some((404, _)))
    }

    /// A create raced with another writer that already created the object
    pub fn is_already_exists(&self) -> bool {
        matches!(self.api_status(), Some((409, "AlreadyExists")))
    }

    /// An update carried a stale resourceVersion
    pub fn is_conflict(&self) -> bool {
        matches!(self.api_status(), Some((409, reason)) if reason != "AlreadyExists")
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self.root() {
            Error::KubeError(kube::Error::Api(api_err)) => {
                // 4xx errors (except 409 Conflict, 429 TooManyRequests) are usually not retryable
                let code = api_err.code;
                if (400..500).contains(&code) {
                    return code == 409 || code == 429;
                }
                true
            }
            // Network and other transport errors
            Error::KubeError(_) => true,
            Error::ValidationError(_) => false,
            Error::SerializationError(_) => false,
            Error::MissingObjectKey(_) => false,
            Error::StepFailed { .. } => true,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Build the `kube::Error` the API server returns for a failed request.
///
/// Used by store implementations that do not talk to a real API server.
pub fn api_error(code: u16, reason: &str, message: impl Into<String>) -> kube::Error {
    kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: message.into(),
        reason: reason.to_string(),
        code,
    })
}

/// Exponential backoff configuration
#[derive(Clone, Debug)]
pub struct BackoffConfig {
    /// Initial delay for first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for each subsequent retry
    pub multiplier: f64,
    /// Random jitter factor (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Calculate the backoff delay for a given retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay_secs =
            self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);

        let jitter_range = base_delay_secs * self.jitter;
        let jitter = rand::random::<f64>() * jitter_range * 2.0 - jitter_range;
        let delay_with_jitter = (base_delay_secs + jitter).max(0.0);

        let capped_delay = delay_with_jitter.min(self.max_delay.as_secs_f64());

        Duration::from_secs_f64(capped_delay)
    }

    /// Get the delay for an error, with different handling for retryable vs non-retryable
    pub fn delay_for_error(&self, error: &Error, attempt: u32) -> Duration {
        if error.is_retryable() {
            self.delay_for_attempt(attempt)
        } else {
            // Non-retryable errors wait for a spec change or manual intervention
            self.max_delay
        }
    }
}
