// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Member-driven writes: profile edits, venue claims and space requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SPACE_REQUEST_SUBJECT;
use crate::error::{AccountError, StoreError};
use crate::models::{Contact, Event, Group, Record, User, Venue};
use crate::query;
use crate::store::{Document, Filter, RecordStore, ID_FIELD};
use crate::sync::load_user;
use crate::types::{MemberId, VenueId};

pub type AccountResult<T> = std::result::Result<T, AccountError>;

fn not_found(kind: &'static str, id: impl ToString) -> AccountError {
    AccountError::NotFound { kind, id: id.to_string() }
}

pub fn require_user(store: &dyn RecordStore, member_id: MemberId) -> AccountResult<User> {
    load_user(store, member_id)?.ok_or_else(|| not_found("member", member_id))
}

pub fn require<R: Record>(store: &dyn RecordStore, kind: &'static str, id: impl Into<Value> + ToString + Clone) -> AccountResult<R> {
    let doc = store
        .get(R::COLLECTION, &id.clone().into())?
        .ok_or_else(|| not_found(kind, id))?;
    Ok(R::from_document(doc)?)
}

fn to_value<T: Serialize>(value: &T) -> AccountResult<Value> {
    serde_json::to_value(value).map_err(|e| AccountError::Store(StoreError::from(e)))
}

pub fn update_profile(
    store: &dyn RecordStore,
    member_id: MemberId,
    email: Option<String>,
    phone: Option<String>,
) -> AccountResult<User> {
    let mut user = require_user(store, member_id)?;

    let mut fields = Document::new();
    fields.insert(ID_FIELD.to_string(), member_id.into());
    fields.insert("email".to_string(), to_value(&email)?);
    fields.insert("phone".to_string(), to_value(&phone)?);
    store.merge(User::COLLECTION, fields)?;

    user.email = email;
    user.phone = phone;
    Ok(user)
}

/// Pre-filled claim form for `venue_id` as seen by `member_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimDefaults {
    pub venue: Venue,
    pub contact: Contact,
    /// True when the venue is already claimed and the form edits it.
    pub editing: bool,
}

/// Contact fields come from the venue; any it lacks fall back to the member,
/// whose own blanks are first filled from the venue's public email/phone.
pub fn claim_form_defaults(store: &dyn RecordStore, venue_id: VenueId, member_id: MemberId) -> AccountResult<ClaimDefaults> {
    let venue: Venue = require(store, "venue", venue_id)?;
    let mut user = require_user(store, member_id)?;

    if user.email.is_none() {
        user.email = venue.email.clone();
    }
    if user.phone.is_none() {
        user.phone = venue.phone.clone();
    }

    let current = venue.contact.clone().unwrap_or_default();
    let contact = Contact {
        name: current.name.or(user.name),
        email: current.email.or(user.email),
        phone: current.phone.or(user.phone),
    };

    Ok(ClaimDefaults {
        editing: venue.claimed,
        venue,
        contact,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueClaim {
    pub user_id: MemberId,
    pub contact: Contact,
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// Marks the venue claimed by `claim.user_id`. Claiming a claimed venue edits it.
/// Returns the updated venue and whether it was already claimed.
pub fn claim_venue(store: &dyn RecordStore, venue_id: VenueId, claim: VenueClaim) -> AccountResult<(Venue, bool)> {
    let mut venue: Venue = require(store, "venue", venue_id)?;
    let was_claimed = venue.claimed;

    let mut fields = Document::new();
    fields.insert(ID_FIELD.to_string(), venue_id.into());
    fields.insert("claimed".to_string(), Value::Bool(true));
    fields.insert("contact".to_string(), to_value(&claim.contact)?);
    fields.insert("capacity".to_string(), to_value(&claim.capacity)?);
    fields.insert("user_id".to_string(), claim.user_id.into());
    store.merge(Venue::COLLECTION, fields)?;

    tracing::info!(
        "Venue {} {} by member {}",
        venue_id,
        if was_claimed { "updated" } else { "claimed" },
        claim.user_id
    );

    venue.claimed = true;
    venue.contact = Some(claim.contact);
    venue.capacity = claim.capacity;
    venue.user_id = Some(claim.user_id);
    Ok((venue, was_claimed))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceRequest {
    pub venue_ids: Vec<VenueId>,
    /// Reply-to address of the organizer.
    pub from: String,
    /// Body template; `{{host}}` and `{{venue_name}}` are filled per venue.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub venue_id: VenueId,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

pub fn render_request_body(template: &str, venue: &Venue) -> String {
    template
        .replace("{{host}}", venue.contact_name().unwrap_or_default())
        .replace("{{venue_name}}", &venue.name)
}

/// Starting text for a request about `event` of `group`.
pub fn initial_request_body(user: &User, group: &Group, event: &Event) -> String {
    let mut body = String::from("Hi {{host}},\n\n");
    body.push_str(&format!(
        "I organize {} and we are looking for a space for our event \"{}\"",
        group.name,
        event.name.as_deref().unwrap_or("(untitled)")
    ));
    if let Some(time) = event.time {
        body.push_str(&format!(" on {}", time.format("%A, %B %-d %Y at %H:%M UTC")));
    }
    body.push('.');
    if let Some(limit) = event.rsvp_limit {
        body.push_str(&format!(" We expect up to {} attendees.", limit));
    }
    body.push_str("\n\nWould {{venue_name}} be available for us?\n\nThanks,\n");
    body.push_str(user.name.as_deref().unwrap_or_default());
    body
}

/// One message per picked venue that is claimed and not deleted, addressed
/// to its contact email.
pub fn compose_space_requests(store: &dyn RecordStore, request: &SpaceRequest) -> AccountResult<Vec<OutboundMessage>> {
    if request.venue_ids.is_empty() {
        return Err(AccountError::NoVenues);
    }

    let filter = Filter::new()
        .is_in(ID_FIELD, request.venue_ids.iter().copied())
        .eq("claimed", true)
        .eq("deleted", false);

    let mut messages = Vec::new();
    for venue in query::venues(store, &filter, None)? {
        let venue = venue?;
        let to = venue
            .contact_email()
            .ok_or_else(|| AccountError::MissingContact(venue.id.to_string()))?
            .to_string();
        messages.push(OutboundMessage {
            venue_id: venue.id,
            to,
            from: request.from.clone(),
            subject: SPACE_REQUEST_SUBJECT.to_string(),
            body: render_request_body(&request.body, &venue),
        });
    }

    if messages.is_empty() {
        return Err(AccountError::NoVenues);
    }
    Ok(messages)
}
