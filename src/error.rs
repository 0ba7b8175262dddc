use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The upstream dataset could not be used as a whole. Nothing is written.
    #[error("Upstream fetch error: {0}")]
    Upstream(String),

    /// JSON has no encoding for NaN or infinity; serde_json would write `null`.
    #[error("Refusing to persist non-finite {0}")]
    NonFinite(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("No data available")]
    EmptyDataset,

    #[error("Not enough data yet")]
    InsufficientHistory,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::EmptyDataset => StatusCode::NOT_FOUND,
            AppError::InsufficientHistory => StatusCode::BAD_REQUEST,
            AppError::Http(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
