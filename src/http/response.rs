//! Response envelope and HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StoreError;
use crate::model::ConfigItem;

/// Envelope wrapping every data response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse<T = ConfigItem> {
    pub status: u16,
    pub message: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> ConfigResponse<T> {
    pub fn ok(message: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            data,
        }
    }
}

/// Errors surfaced by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Undecodable request body
    #[error("{message}")]
    BadRequest { message: String },

    /// Store failure, passed through unchanged
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ConfigResponse::<ConfigItem> {
            status: status.as_u16(),
            message: format!("Error: {}", self),
            data: Vec::new(),
        };

        (status, Json(body)).into_response()
    }
}
