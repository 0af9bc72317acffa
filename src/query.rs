// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Read queries over stored records.
//!
//! Every query returns a fresh iterator that builds typed records from the
//! matching documents as it is advanced.

use std::cmp::Ordering;

use crate::error::StoreResult;
use crate::models::{Event, Group, Record, Venue};
use crate::store::{Filter, RecordStore};
use crate::types::{Location, MemberId};

pub type Records<T> = Box<dyn Iterator<Item = StoreResult<T>>>;

fn get_list<T: Record + 'static>(store: &dyn RecordStore, filter: &Filter, sort: Option<&str>) -> StoreResult<Records<T>> {
    let docs = store.find(T::COLLECTION, filter, sort)?;
    Ok(Box::new(docs.into_iter().map(T::from_document)))
}

/// Venues claimed by `user_id`, by name.
pub fn users_venues(store: &dyn RecordStore, user_id: MemberId) -> StoreResult<Records<Venue>> {
    get_list(store, &Filter::new().eq("user_id", user_id), Some("name"))
}

/// Venues nobody has claimed yet, by name. `name` is a case-insensitive
/// pattern; `location` restricts to venues with a position, nearest first
/// before the name ordering applies.
pub fn unclaimed_venues(
    store: &dyn RecordStore,
    name: Option<&str>,
    location: Option<Location>,
) -> StoreResult<Records<Venue>> {
    let mut filter = Filter::new().eq("claimed", false);
    if let Some(name) = name {
        filter = filter.regex("name", name)?;
    }
    if let Some(location) = location {
        filter = filter.near("loc", location);
    }
    get_list(store, &filter, Some("name"))
}

/// Claimed, live venues nearest to `location`.
pub fn available_venues(store: &dyn RecordStore, location: Location) -> StoreResult<Records<Venue>> {
    let filter = Filter::new()
        .near("loc", location)
        .eq("claimed", true)
        .eq("deleted", false);
    get_list(store, &filter, None)
}

pub fn groups(store: &dyn RecordStore, filter: &Filter, sort: Option<&str>) -> StoreResult<Records<Group>> {
    get_list(store, filter, sort)
}

pub fn events(store: &dyn RecordStore, filter: &Filter, sort: Option<&str>) -> StoreResult<Records<Event>> {
    get_list(store, filter, sort)
}

pub fn venues(store: &dyn RecordStore, filter: &Filter, sort: Option<&str>) -> StoreResult<Records<Venue>> {
    get_list(store, filter, sort)
}

/// Listing order for events: events still needing a venue first, then dated
/// before undated, then earliest first. Undated events are interchangeable.
pub fn event_order(a: &Event, b: &Event) -> Ordering {
    listing_key(a).cmp(&listing_key(b))
}

fn listing_key(event: &Event) -> (bool, bool, Option<i64>) {
    let when = event.time.map(|t| t.timestamp_millis());
    (event.has_venue(), when.is_none(), when)
}

/// Stable sort by [`event_order`]; ties keep their relative order.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(event_order);
}
