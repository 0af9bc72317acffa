// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use wheretomeetup::error::{AccountError, ApiError, StoreError, SyncError};

use crate::persistence::PersistenceError;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Account(#[from] AccountError),
    #[error("Mail delivery failed: {0}")]
    Mail(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl NodeError {
    fn status(&self) -> StatusCode {
        match self {
            NodeError::Sync(SyncError::Api(ApiError::Status { status: 404, .. })) => StatusCode::NOT_FOUND,
            NodeError::Sync(SyncError::Api(_)) => StatusCode::BAD_GATEWAY,
            NodeError::Sync(SyncError::MissingField { .. } | SyncError::MalformedField { .. } | SyncError::Shape { .. }) => StatusCode::BAD_GATEWAY,
            NodeError::Store(StoreError::InvalidPattern { .. }) => StatusCode::BAD_REQUEST,
            NodeError::Account(AccountError::NotFound { .. }) => StatusCode::NOT_FOUND,
            NodeError::Account(AccountError::NoVenues | AccountError::MissingContact(_)) => StatusCode::BAD_REQUEST,
            NodeError::Account(AccountError::Store(StoreError::InvalidPattern { .. })) => StatusCode::BAD_REQUEST,
            NodeError::Mail(_) => StatusCode::BAD_GATEWAY,
            NodeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let message = match &self {
            // Remote payload details stay in the log.
            NodeError::Sync(SyncError::MissingField { .. } | SyncError::MalformedField { .. } | SyncError::Shape { .. }) => {
                "Could not sync with Meetup, please try again".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
