use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("record not found")]
    NotFound,

    #[error("no signed-in user")]
    Unauthenticated,

    #[error("store error: {message}")]
    Store { message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            details: Some(details),
        }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::store", "record not found");
        AppError::NotFound
    }

    pub fn unauthenticated() -> Self {
        warn!(target: "app::auth", "no signed-in user");
        AppError::Unauthenticated
    }

    pub fn store(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::store", %message, "store error");
        AppError::Store { message }
    }

    pub fn config(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::config", %message, "configuration error");
        AppError::Config { message }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation { .. })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AppError::store(format!("request timed out: {error}"))
        } else {
            AppError::store(error.to_string())
        }
    }
}
