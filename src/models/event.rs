// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Document;
use crate::types::{EventId, GroupId, VenueId};

use super::Record;

/// Venue block the Meetup API embeds in an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventVenue {
    pub id: VenueId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: EventId,
    pub group_id: GroupId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Scheduled start, milliseconds since the epoch on the wire.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsvp_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<EventVenue>,
    #[serde(flatten)]
    pub extra: Document,
}

impl Record for Event {
    const COLLECTION: &'static str = "events";
}

impl Event {
    pub fn has_venue(&self) -> bool {
        self.venue.is_some()
    }
}
