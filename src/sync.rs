// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Full refresh of one member from the Meetup API.
//!
//! Order: freshness check, member profile, groups, user record, venues,
//! venue default backfill, events, venues first seen on events. Each step's
//! writes are upserts, so a failed sync is retried from the top. The sync
//! stamp is written last: a member whose sync failed stays stale.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::{SyncOptions, EVENT_FIELDS, EVENT_STATUSES, GROUP_FIELDS, VENUE_FIELDS};
use crate::error::{StoreError, StoreResult, SyncResult};
use crate::models::{Record, User, Venue};
use crate::normalize::{create_events, create_venues, normalize_member, resolve_event_venues, sync_groups};
use crate::remote::MeetupApi;
use crate::store::{Document, Filter, RecordStore, ID_FIELD};
use crate::types::MemberId;

/// Flags every venue must carry, with their default.
const VENUE_DEFAULTS: [(&str, bool); 2] = [("claimed", false), ("deleted", false)];

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub user: User,
    /// False when the cached record was fresh and nothing was fetched.
    pub refreshed: bool,
    pub groups: usize,
    pub venues: usize,
    pub events: usize,
    pub event_venues: usize,
    pub backfilled: usize,
}

impl SyncReport {
    fn cached(user: User) -> Self {
        Self {
            user,
            refreshed: false,
            groups: 0,
            venues: 0,
            events: 0,
            event_venues: 0,
            backfilled: 0,
        }
    }
}

/// Sets `claimed` and `deleted` to false on venues that lack them.
/// Returns the number of fields written; zero once every venue has both.
pub fn backfill_venue_defaults(store: &dyn RecordStore) -> StoreResult<usize> {
    let mut touched = 0;
    for (field, default) in VENUE_DEFAULTS {
        let mut fields = Document::new();
        fields.insert(field.to_string(), Value::Bool(default));
        touched += store.update_many(Venue::COLLECTION, &Filter::new().exists(field, false), &fields)?;
    }
    Ok(touched)
}

pub fn load_user(store: &dyn RecordStore, member_id: MemberId) -> StoreResult<Option<User>> {
    store
        .get(User::COLLECTION, &member_id.into())?
        .map(User::from_document)
        .transpose()
}

pub struct Syncer<'a> {
    store: &'a dyn RecordStore,
    api: &'a dyn MeetupApi,
    options: SyncOptions,
}

impl<'a> Syncer<'a> {
    pub fn new(store: &'a dyn RecordStore, api: &'a dyn MeetupApi, options: SyncOptions) -> Self {
        Self { store, api, options }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub async fn sync_user(&self, member_id: MemberId, now: DateTime<Utc>) -> SyncResult<SyncReport> {
        let cached = load_user(self.store, member_id)?;
        if let Some(user) = cached.as_ref().filter(|u| u.is_fresh(now, self.options.maximum_staleness)) {
            tracing::debug!("Member {} synced at {:?}, using cached record", member_id, user.last_synced);
            return Ok(SyncReport::cached(user.clone()));
        }

        tracing::info!("Syncing member {} from Meetup", member_id);
        let page = self.options.page_size;

        let profile = self.api.member(member_id).await?;
        let mut user = normalize_member(profile, cached.as_ref())?;

        let groups = self.api.groups(member_id, &GROUP_FIELDS, page).await?;
        let membership = sync_groups(self.store, groups)?;
        user.member_of = membership.member_of;
        user.organizer_of = membership.organizer_of;
        user.last_synced = cached.as_ref().and_then(|u| u.last_synced);
        self.store.replace(User::COLLECTION, user.to_document()?)?;

        let mut report = SyncReport {
            groups: user.member_of.len(),
            ..SyncReport::cached(user.clone())
        };
        report.refreshed = true;

        if !user.member_of.is_empty() {
            let venues = self.api.venues(&user.member_of, &VENUE_FIELDS, page).await?;
            report.venues = create_venues(self.store, venues)?.len();
        }
        report.backfilled = backfill_venue_defaults(self.store)?;

        if !user.member_of.is_empty() {
            let events = self
                .api
                .events(&user.member_of, &EVENT_STATUSES, &EVENT_FIELDS, page)
                .await?;
            let events = create_events(self.store, events)?;
            report.events = events.len();

            if self.options.resolve_event_venues {
                report.event_venues = resolve_event_venues(self.store, &events)?.len();
                if report.event_venues > 0 {
                    report.backfilled += backfill_venue_defaults(self.store)?;
                }
            }
        }

        let mut stamp = Document::new();
        stamp.insert(ID_FIELD.to_string(), member_id.into());
        stamp.insert("last_synced".to_string(), serde_json::to_value(now).map_err(StoreError::from)?);
        self.store.merge(User::COLLECTION, stamp)?;
        report.user.last_synced = Some(now);

        tracing::info!(
            "Member {} synced: {} groups, {} venues, {} events",
            member_id,
            report.groups,
            report.venues,
            report.events
        );
        Ok(report)
    }
}
