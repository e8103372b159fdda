use std::sync::OnceLock;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    db::StoreError,
    envelope::{Envelope, FieldErrors},
};

static HIDE_INTERNAL_ERRORS: OnceLock<bool> = OnceLock::new();

/// Called once at startup; production hides 500 details from clients.
pub fn hide_internal_errors(hide: bool) {
    let _ = HIDE_INTERNAL_ERRORS.set(hide);
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: FieldErrors,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    pub fn invalid_fields(errors: FieldErrors) -> Self {
        Self::Validation {
            message: "Validation failed".into(),
            errors,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected request body");
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected query string");
        Self::validation(rejection.body_text())
    }
}

pub(crate) fn internal_message(err: &anyhow::Error, hide: bool) -> String {
    if hide {
        "Internal server error".into()
    } else {
        format!("{err:#}")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation { message, errors } => Envelope::failure(message, Some(errors)),
            Self::Internal(err) => {
                error!(error = ?err, "unhandled error");
                let hide = HIDE_INTERNAL_ERRORS.get().copied().unwrap_or(false);
                Envelope::failure(internal_message(&err, hide), None)
            }
            other => Envelope::failure(other.to_string(), None),
        };
        (status, Json(body)).into_response()
    }
}
