// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Raw Meetup records -> stored records.
//!
//! Every transform renames `id` to `_id`, reshapes a few keys, checks the
//! result parses as the typed record and then persists the reshaped
//! document. A missing or malformed key fails the whole batch.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ORGANIZER_ROLES;
use crate::error::{StoreError, SyncError, SyncResult};
use crate::models::{Event, Group, Record, User, Venue};
use crate::store::{Document, RecordStore, ID_FIELD};
use crate::types::{GroupId, Location, MemberId, VenueId};

/// Group ids collected while syncing a member's groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Membership {
    pub member_of: Vec<GroupId>,
    pub organizer_of: Vec<GroupId>,
}

pub fn is_organizer_role(role: Option<&str>) -> bool {
    role.map_or(false, |r| ORGANIZER_ROLES.contains(&r))
}

/// Moves `id` to `_id` and returns it parsed.
fn rename_id<T: DeserializeOwned>(kind: &'static str, raw: &mut Document) -> SyncResult<T> {
    let id = raw
        .remove("id")
        .ok_or(SyncError::MissingField { kind, field: "id" })?;
    let parsed = serde_json::from_value(id.clone()).map_err(|_| SyncError::MalformedField { kind, field: "id" })?;
    raw.insert(ID_FIELD.to_string(), id);
    Ok(parsed)
}

fn take_coordinate(kind: &'static str, raw: &mut Document, field: &'static str) -> SyncResult<f64> {
    raw.remove(field)
        .ok_or(SyncError::MissingField { kind, field })?
        .as_f64()
        .ok_or(SyncError::MalformedField { kind, field })
}

/// Replaces separate `lon`/`lat` keys with a `loc` pair.
fn collapse_location(kind: &'static str, raw: &mut Document) -> SyncResult<Location> {
    let lon = take_coordinate(kind, raw, "lon")?;
    let lat = take_coordinate(kind, raw, "lat")?;
    let loc = Location::new(lon, lat);
    raw.insert("loc".to_string(), loc.into());
    Ok(loc)
}

/// Parses the reshaped document as `R` without consuming it.
fn check_shape<R: Record>(kind: &'static str, raw: &Document) -> SyncResult<R> {
    R::from_document(raw.clone()).map_err(|e| SyncError::Shape {
        kind,
        reason: e.to_string(),
    })
}

pub fn normalize_group(mut raw: Document) -> SyncResult<(Document, GroupId, bool)> {
    let group_id: GroupId = rename_id("group", &mut raw)?;
    let own = raw.remove("self");
    let role = own.as_ref().and_then(|s| s.get("role")).and_then(Value::as_str);
    let organizer = is_organizer_role(role);
    check_shape::<Group>("group", &raw)?;
    Ok((raw, group_id, organizer))
}

/// Upserts each group and returns the membership it implies for the syncing member.
pub fn sync_groups(store: &dyn RecordStore, groups: Vec<Document>) -> SyncResult<Membership> {
    let mut membership = Membership::default();

    for raw in groups {
        let (doc, group_id, organizer) = normalize_group(raw)?;
        // Pages can overlap; membership lists stay sets.
        if !membership.member_of.contains(&group_id) {
            membership.member_of.push(group_id);
        }
        if organizer && !membership.organizer_of.contains(&group_id) {
            membership.organizer_of.push(group_id);
        }
        store.replace(Group::COLLECTION, doc)?;
    }

    tracing::debug!(
        "Synced {} groups ({} organized)",
        membership.member_of.len(),
        membership.organizer_of.len()
    );
    Ok(membership)
}

pub fn normalize_venue(mut raw: Document) -> SyncResult<(Document, VenueId)> {
    let venue_id: VenueId = rename_id("venue", &mut raw)?;
    collapse_location("venue", &mut raw)?;
    check_shape::<Venue>("venue", &raw)?;
    Ok((raw, venue_id))
}

/// Upserts venues field-by-field so claim state set locally survives a re-sync.
pub fn create_venues(store: &dyn RecordStore, venues: Vec<Document>) -> SyncResult<Vec<VenueId>> {
    let mut ids = Vec::with_capacity(venues.len());
    for raw in venues {
        let (doc, venue_id) = normalize_venue(raw)?;
        store.merge(Venue::COLLECTION, doc)?;
        ids.push(venue_id);
    }
    tracing::debug!("Synced {} venues", ids.len());
    Ok(ids)
}

pub fn normalize_event(mut raw: Document) -> SyncResult<(Document, Event)> {
    rename_id::<Value>("event", &mut raw)?;
    let group = raw
        .remove("group")
        .ok_or(SyncError::MissingField { kind: "event", field: "group" })?;
    let group_id = group
        .get("id")
        .cloned()
        .ok_or(SyncError::MissingField { kind: "event", field: "group.id" })?;
    raw.insert("group_id".to_string(), group_id);
    let event = check_shape::<Event>("event", &raw)?;
    Ok((raw, event))
}

pub fn create_events(store: &dyn RecordStore, events: Vec<Document>) -> SyncResult<Vec<Event>> {
    let mut created = Vec::with_capacity(events.len());
    for raw in events {
        let (doc, event) = normalize_event(raw)?;
        store.replace(Event::COLLECTION, doc)?;
        created.push(event);
    }
    tracing::debug!("Synced {} events", created.len());
    Ok(created)
}

/// Persists venue blocks embedded in `events` that the store has not seen yet.
/// Blocks without coordinates are skipped.
pub fn resolve_event_venues(store: &dyn RecordStore, events: &[Event]) -> SyncResult<Vec<VenueId>> {
    let mut added = Vec::new();

    for venue in events.iter().filter_map(|e| e.venue.as_ref()) {
        if store.get(Venue::COLLECTION, &venue.id.into())?.is_some() {
            continue;
        }
        let raw = match serde_json::to_value(venue).map_err(StoreError::from)? {
            Value::Object(raw) => raw,
            _ => continue,
        };
        if !(raw.contains_key("lon") && raw.contains_key("lat")) {
            tracing::warn!("Event venue {} has no coordinates, not stored", venue.id);
            continue;
        }
        let (doc, venue_id) = normalize_venue(raw)?;
        store.merge(Venue::COLLECTION, doc)?;
        added.push(venue_id);
    }

    if !added.is_empty() {
        tracing::debug!("Stored {} venues first seen on events", added.len());
    }
    Ok(added)
}

/// Builds the user record from a fresh member profile. Fields owned locally
/// (contact details, membership) are carried over from `cached`.
pub fn normalize_member(mut raw: Document, cached: Option<&User>) -> SyncResult<User> {
    let member_id: MemberId = rename_id("member", &mut raw)?;
    collapse_location("member", &mut raw)?;

    let mut user: User = check_shape("member", &raw)?;
    user.id = member_id;
    if let Some(cached) = cached {
        user.email = user.email.or_else(|| cached.email.clone());
        user.phone = user.phone.or_else(|| cached.phone.clone());
        user.member_of = cached.member_of.clone();
        user.organizer_of = cached.organizer_of.clone();
    }
    Ok(user)
}
