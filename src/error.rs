// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A collection lock was poisoned by a panicking writer.
    #[error("store lock poisoned for collection {0}")]
    Poisoned(String),
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("document in {0} has no _id")]
    MissingId(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("meetup api returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{kind} record is missing field {field:?}")]
    MissingField { kind: &'static str, field: &'static str },
    #[error("{kind} record has malformed field {field:?}")]
    MalformedField { kind: &'static str, field: &'static str },
    /// A field is present but has the wrong type for the record.
    #[error("{kind} record does not fit its schema: {reason}")]
    Shape { kind: &'static str, reason: String },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("remote error: {0}")]
    Api(#[from] ApiError),
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("no venues picked")]
    NoVenues,
    #[error("venue {0} has no contact email")]
    MissingContact(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type SyncResult<T> = std::result::Result<T, SyncError>;
