pub mod auth_service;
pub mod channel_service;
pub mod video_service;

pub use auth_service::AuthService;
pub use channel_service::ChannelService;
pub use video_service::VideoService;

use std::collections::HashMap;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::store::StoreError;

/// Typed errors raised by the service layer. The HTTP boundary maps each
/// variant to a status code in exactly one place (`error.rs`).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Validation failure attributed to a single field
    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), message.clone());
        ServiceError::Validation {
            message,
            field_errors: Some(field_errors),
        }
    }
}

/// Resolve skip/limit against the configured defaults and upper bound
pub(crate) fn page_params(api: &ApiConfig, skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let skip = skip.unwrap_or(0).max(0);
    let limit = limit
        .unwrap_or(api.default_page_limit)
        .clamp(1, api.max_page_limit);
    (skip, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn page_params_apply_defaults_and_bounds() {
        let api = AppConfig::default().api;
        assert_eq!(page_params(&api, None, None), (0, 100));
        assert_eq!(page_params(&api, Some(-5), Some(0)), (0, 1));
        assert_eq!(page_params(&api, Some(10), Some(5)), (10, 5));
        assert_eq!(page_params(&api, None, Some(100_000)), (0, 100));
    }
}
