pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod layers;
pub mod structs;
pub mod transformations;
pub mod zoom;

use crate::db::IndexedStore;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Tile coordinates, bounding box, limit or query string the caller got wrong.
    #[error("{0}")]
    OutOfRange(String),
    #[error("Unknown table `{0}`")]
    UnknownTable(String),
    #[error("Unknown column `{column}` for table `{table}`")]
    UnknownColumn { table: &'static str, column: String },
    #[error("Store query failed: {0}")]
    Store(#[from] sqlx::Error),
    #[error("Store returned malformed geometry: {0}")]
    Geometry(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::OutOfRange(_)
            | AppError::UnknownTable(_)
            | AppError::UnknownColumn { .. } => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Geometry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
            (status, format!("Something went wrong: {}", self)).into_response()
        } else {
            warn!(error = %self, "rejected request");
            (status, self.to_string()).into_response()
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IndexedStore>,
}
