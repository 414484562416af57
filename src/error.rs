use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::analysis::GatewayError;
use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Too many analysis requests. Please wait a minute and try again.")]
    RateLimited,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Analysis error: {0}")]
    Analysis(GatewayError),
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::EmptyInput => AppError::Validation(e.to_string()),
            other => AppError::Analysis(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string(), None),
            AppError::Store(StoreError::NotConfigured(reason)) => {
                tracing::error!(%reason, "Document store not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Journal storage is not configured.".into(),
                    None,
                )
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Journal storage is unavailable. Please try again later.".into(),
                    None,
                )
            }
            AppError::Analysis(e) => {
                tracing::error!(kind = e.kind(), detail = %e.detail().unwrap_or_default(), "Analysis error");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), e.detail())
            }
        };

        let mut body = json!({
            "error": message,
            "code": status.as_u16(),
        });
        if let Some(details) = details {
            body["details"] = details.into();
        }

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
