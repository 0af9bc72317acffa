// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Stored record shapes.
//!
//! Each record names its collection and builds itself from a raw stored
//! document. Fields the Meetup API sends that we do not model are kept in
//! `extra` so a record round-trips without loss.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::store::Document;

pub mod event;
pub mod group;
pub mod user;
pub mod venue;

pub use event::{Event, EventVenue};
pub use group::Group;
pub use user::User;
pub use venue::{Contact, Venue};

pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn from_document(doc: Document) -> StoreResult<Self> {
        Ok(serde_json::from_value(Value::Object(doc))?)
    }

    fn to_document(&self) -> StoreResult<Document> {
        match serde_json::to_value(self)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(StoreError::MissingId(Self::COLLECTION.to_string())),
        }
    }
}
