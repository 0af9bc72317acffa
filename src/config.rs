// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants.

use std::time::Duration;

/// Self-roles that make a member an organizer of a group.
pub const ORGANIZER_ROLES: [&str; 2] = ["Organizer", "Co-Organizer"];

/// Page length requested from the Meetup API.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Maximum age of a cached user record before a remote re-sync (seconds).
pub const DEFAULT_MAXIMUM_STALENESS_SECS: u64 = 3600;

/// Event statuses pulled during a sync.
pub const EVENT_STATUSES: [&str; 3] = ["upcoming", "proposed", "suggested"];

/// Optional fields requested per collection.
pub const GROUP_FIELDS: [&str; 1] = ["self"];
pub const VENUE_FIELDS: [&str; 1] = ["taglist"];
pub const EVENT_FIELDS: [&str; 1] = ["rsvp_limit"];

/// Subject line of outbound space requests.
pub const SPACE_REQUEST_SUBJECT: &str = "WhereToMeetup Request for Use of Your Space";

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub maximum_staleness: Duration,
    pub page_size: u32,
    /// Persist venue blocks embedded in events when the store has not seen them.
    pub resolve_event_venues: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            maximum_staleness: Duration::from_secs(DEFAULT_MAXIMUM_STALENESS_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            resolve_event_venues: true,
        }
    }
}
