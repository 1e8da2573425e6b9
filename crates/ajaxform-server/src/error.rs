// File: src/error.rs
// Purpose: Handler error type mapped onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Lets handlers use `?` on anything convertible to `anyhow::Error`
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal(err) => {
                tracing::error!("Internal server error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        AppError::Internal(err.into())
    }
}
