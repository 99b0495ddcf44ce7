//! HTTP error mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kem_session::ExchangeError;
use kex_protocol::{ErrorBody, ErrorCode, ProtocolError};
use thiserror::Error;
use tracing::{error, warn};

/// Error returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Exchange(e) => e.code(),
            Self::Protocol(e) => e.code(),
        }
    }
}

/// HTTP status for each stable error code
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::SessionNotFound => StatusCode::NOT_FOUND,
        ErrorCode::MissingPrivateKey
        | ErrorCode::InvalidKeyMaterial
        | ErrorCode::InvalidEncoding => StatusCode::BAD_REQUEST,
        ErrorCode::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::KemOperationFailed | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = status_for(code);

        if status.is_server_error() {
            error!("Request failed ({}): {}", code, self);
        } else {
            warn!("Request rejected ({}): {}", code, self);
        }

        let body = ErrorBody {
            error: code,
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
