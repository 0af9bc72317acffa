// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::store::Document;
use crate::types::{GroupId, Location, MemberId};

use super::Record;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: MemberId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
    #[serde(default)]
    pub member_of: Vec<GroupId>,
    #[serde(default)]
    pub organizer_of: Vec<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Document,
}

impl Record for User {
    const COLLECTION: &'static str = "users";
}

impl User {
    pub fn new(id: MemberId) -> Self {
        Self {
            id,
            name: None,
            loc: None,
            member_of: Vec::new(),
            organizer_of: Vec::new(),
            email: None,
            phone: None,
            last_synced: None,
            extra: Document::new(),
        }
    }

    /// Whether the record was synced less than `maximum_staleness` before `now`.
    /// A sync stamp in the future counts as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, maximum_staleness: Duration) -> bool {
        match self.last_synced {
            Some(synced) => match (now - synced).to_std() {
                Ok(age) => age < maximum_staleness,
                Err(_) => true,
            },
            None => false,
        }
    }

    pub fn is_organizer_of(&self, group_id: GroupId) -> bool {
        self.organizer_of.contains(&group_id)
    }
}
