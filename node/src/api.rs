// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Deserialize, Serialize};
use wheretomeetup::account::OutboundMessage;
use wheretomeetup::models::{Contact, Event, Group, User, Venue};
use wheretomeetup::types::VenueId;

#[derive(Serialize, Deserialize, Debug)]
pub struct SyncResponse {
    pub user: User,
    pub refreshed: bool,
    pub groups: usize,
    pub venues: usize,
    pub events: usize,
    pub event_venues: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProfileResponse {
    pub user: User,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct UnclaimedQuery {
    pub name: Option<String>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct VenueListResponse {
    pub venues: Vec<Venue>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GroupListResponse {
    pub groups: Vec<Group>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EventListResponse {
    pub group: Group,
    /// In listing order: events without a venue first.
    pub events: Vec<Event>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct MemberQuery {
    pub member_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClaimDefaultsResponse {
    pub venue: Venue,
    pub contact: Contact,
    pub editing: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ClaimRequest {
    pub member_id: i64,
    pub contact_name: String,
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClaimResponse {
    pub venue: Venue,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SpaceRequestDefaults {
    pub from: Option<String>,
    pub body: String,
    pub event_size_known: bool,
    pub event_time_known: bool,
    pub venues: Vec<Venue>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SpaceRequestForm {
    pub member_id: i64,
    pub venue_ids: Vec<VenueId>,
    pub email: String,
    pub body: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SpaceRequestResponse {
    pub sent: usize,
    pub message: String,
    pub messages: Vec<OutboundMessage>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SnapshotSaveResponse {
    pub success: bool,
    pub path: String,
    pub bytes: u64,
}
