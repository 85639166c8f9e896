//! The OKR board: store-backed reads and mutations, the JSON API and the HTML
//! fragments served to the browser.

pub mod api;
pub mod service;
pub mod ui;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::store::StoreError;

pub use service::{BoardService, BoardSnapshot, Refreshed};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BoardError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Store(err) => err.user_message(),
        }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Rejected { status, .. }) if *status == 401 || *status == 403 => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Store(_) => StatusCode::BAD_GATEWAY,
        };
        if let Self::Store(err) = &self {
            log::error!("Store request failed: {err}");
        }
        (status, Json(serde_json::json!({ "error": self.user_message() }))).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient, dismissible message shown after a user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Error".to_string(),
            message: message.into(),
        }
    }

    pub fn failure(action: &str, err: &BoardError) -> Self {
        Self::error(format!("{action}: {}", err.user_message()))
    }
}
