// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::{
    extract::{Path, Query, Request as AxumRequest, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use wheretomeetup::account::{self, SpaceRequest, VenueClaim};
use wheretomeetup::config::SyncOptions;
use wheretomeetup::models::{Contact, Event, Group, Venue};
use wheretomeetup::query;
use wheretomeetup::remote::MeetupApi;
use wheretomeetup::store::{Filter, MemoryStore, RecordStore, ID_FIELD};
use wheretomeetup::sync::Syncer;
use wheretomeetup::types::{EventId, GroupId, Location, MemberId, VenueId};

use crate::api::*;
use crate::errors::NodeError;
use crate::mail::{self, Mailer};
use crate::persistence::SnapshotManager;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub api: Arc<dyn MeetupApi>,
    pub mailer: Arc<dyn Mailer>,
    pub sync_options: SyncOptions,
    pub snapshot_path: Option<PathBuf>,
}

impl AppState {
    fn records(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }
}

async fn auth_guard(
    State(token): State<Arc<String>>,
    req: AxumRequest,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "));

    match provided {
        Some(provided) if provided == token.as_str() => Ok(next.run(req).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

pub fn build_router(state: AppState, auth_token: Option<String>) -> Router {
    let mut app = Router::new()
        .route("/v1/members/:member_id/sync", post(sync_member))
        .route("/v1/members/:member_id/profile", get(get_profile).put(update_profile))
        .route("/v1/members/:member_id/groups", get(organized_groups))
        .route("/v1/members/:member_id/venues", get(members_venues))
        .route("/v1/members/:member_id/venues/nearby", get(nearby_venues))
        .route("/v1/groups/:group_id/events", get(group_events))
        .route(
            "/v1/groups/:group_id/events/:event_id/request",
            get(space_request_defaults).post(send_space_request),
        )
        .route("/v1/venues/unclaimed", get(unclaimed_venues))
        .route("/v1/venues/:venue_id/claim", get(claim_defaults).post(claim_venue))
        // Admin
        .route("/v1/snapshot/save", post(snapshot_save))
        // Observability
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    if let Some(token) = auth_token {
        tracing::info!("Auth Enabled: Bearer token required");
        app = app.layer(from_fn_with_state(Arc::new(token), auth_guard));
    } else {
        tracing::warn!("Auth Disabled: No token configured");
    }

    app.layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive())
}

fn validate_email(email: &str) -> Result<(), NodeError> {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((user, host)) if !user.is_empty() && host.contains('.') && !trimmed.contains(char::is_whitespace) => Ok(()),
        _ => Err(NodeError::InvalidInput(format!("{:?} is not an email address", email))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn sync_member(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
) -> Result<Json<SyncResponse>, NodeError> {
    let start = Instant::now();
    let syncer = Syncer::new(state.records(), state.api.as_ref(), state.sync_options.clone());

    let report = match syncer.sync_user(MemberId(member_id), Utc::now()).await {
        Ok(report) => report,
        Err(e) => {
            metrics::counter!("wtm_sync_failures_total", 1);
            return Err(e.into());
        }
    };

    if report.refreshed {
        metrics::counter!("wtm_syncs_total", 1);
        metrics::histogram!("wtm_sync_duration_seconds", start.elapsed().as_secs_f64());
    } else {
        metrics::counter!("wtm_syncs_skipped_total", 1);
    }

    Ok(Json(SyncResponse {
        user: report.user,
        refreshed: report.refreshed,
        groups: report.groups,
        venues: report.venues,
        events: report.events,
        event_venues: report.event_venues,
    }))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
) -> Result<Json<ProfileResponse>, NodeError> {
    let user = account::require_user(state.records(), MemberId(member_id))?;
    Ok(Json(ProfileResponse { user }))
}

async fn update_profile(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileResponse>, NodeError> {
    let email = non_blank(req.email);
    if let Some(email) = &email {
        validate_email(email)?;
    }
    let user = account::update_profile(state.records(), MemberId(member_id), email, non_blank(req.phone))?;
    Ok(Json(ProfileResponse { user }))
}

async fn organized_groups(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
) -> Result<Json<GroupListResponse>, NodeError> {
    let user = account::require_user(state.records(), MemberId(member_id))?;
    let filter = Filter::new().is_in(ID_FIELD, user.organizer_of.iter().copied());
    let groups = query::groups(state.records(), &filter, Some("name"))?.collect::<Result<Vec<_>, _>>()?;
    Ok(Json(GroupListResponse { groups }))
}

async fn members_venues(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
) -> Result<Json<VenueListResponse>, NodeError> {
    let venues = query::users_venues(state.records(), MemberId(member_id))?.collect::<Result<Vec<_>, _>>()?;
    Ok(Json(VenueListResponse { venues }))
}

async fn nearby_venues(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
) -> Result<Json<VenueListResponse>, NodeError> {
    let user = account::require_user(state.records(), MemberId(member_id))?;
    let loc = user
        .loc
        .ok_or_else(|| NodeError::InvalidInput(format!("member {} has no location", member_id)))?;
    let venues = query::available_venues(state.records(), loc)?.collect::<Result<Vec<_>, _>>()?;
    Ok(Json(VenueListResponse { venues }))
}

async fn group_events(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<Json<EventListResponse>, NodeError> {
    let group: Group = account::require(state.records(), "group", GroupId(group_id))?;
    let filter = Filter::new().eq("group_id", group.id);
    let mut events = query::events(state.records(), &filter, None)?.collect::<Result<Vec<_>, _>>()?;
    query::sort_events(&mut events);
    Ok(Json(EventListResponse { group, events }))
}

async fn unclaimed_venues(
    State(state): State<AppState>,
    Query(params): Query<UnclaimedQuery>,
) -> Result<Json<VenueListResponse>, NodeError> {
    let location = match (params.lon, params.lat) {
        (Some(lon), Some(lat)) => Some(Location::new(lon, lat)),
        (None, None) => None,
        _ => return Err(NodeError::InvalidInput("lon and lat go together".into())),
    };
    let name = non_blank(params.name);
    let venues = query::unclaimed_venues(state.records(), name.as_deref(), location)?.collect::<Result<Vec<_>, _>>()?;
    Ok(Json(VenueListResponse { venues }))
}

async fn claim_defaults(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
    Query(params): Query<MemberQuery>,
) -> Result<Json<ClaimDefaultsResponse>, NodeError> {
    let defaults = account::claim_form_defaults(state.records(), VenueId(venue_id), MemberId(params.member_id))?;
    Ok(Json(ClaimDefaultsResponse {
        venue: defaults.venue,
        contact: defaults.contact,
        editing: defaults.editing,
    }))
}

async fn claim_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, NodeError> {
    let contact_name = non_blank(Some(req.contact_name))
        .ok_or_else(|| NodeError::InvalidInput("contact name is required".into()))?;
    validate_email(&req.contact_email)?;
    account::require_user(state.records(), MemberId(req.member_id))?;

    let claim = VenueClaim {
        user_id: MemberId(req.member_id),
        contact: Contact {
            name: Some(contact_name),
            email: Some(req.contact_email.trim().to_string()),
            phone: non_blank(req.contact_phone),
        },
        capacity: req.capacity,
    };
    let (venue, was_claimed) = account::claim_venue(state.records(), VenueId(venue_id), claim)?;

    let message = format!(
        "Thank you for {} {}",
        if was_claimed { "updating" } else { "claiming" },
        venue.name
    );
    Ok(Json(ClaimResponse { venue, message }))
}

/// Loads member, group and event for a space request, failing with 404 on any miss.
fn request_context(
    state: &AppState,
    member_id: i64,
    group_id: i64,
    event_id: String,
) -> Result<(wheretomeetup::models::User, Group, Event), NodeError> {
    let user = account::require_user(state.records(), MemberId(member_id))?;
    let group: Group = account::require(state.records(), "group", GroupId(group_id))?;
    let event: Event = account::require(state.records(), "event", EventId(event_id))?;
    if event.group_id != group.id {
        return Err(NodeError::InvalidInput(format!("event {} is not in group {}", event.id, group.id)));
    }
    Ok((user, group, event))
}

async fn space_request_defaults(
    State(state): State<AppState>,
    Path((group_id, event_id)): Path<(i64, String)>,
    Query(params): Query<MemberQuery>,
) -> Result<Json<SpaceRequestDefaults>, NodeError> {
    let (user, group, event) = request_context(&state, params.member_id, group_id, event_id)?;
    let venues: Vec<Venue> = match user.loc {
        Some(loc) => query::available_venues(state.records(), loc)?.collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(Json(SpaceRequestDefaults {
        body: account::initial_request_body(&user, &group, &event),
        from: user.email,
        event_size_known: event.rsvp_limit.is_some(),
        event_time_known: event.time.is_some(),
        venues,
    }))
}

async fn send_space_request(
    State(state): State<AppState>,
    Path((group_id, event_id)): Path<(i64, String)>,
    Json(form): Json<SpaceRequestForm>,
) -> Result<Json<SpaceRequestResponse>, NodeError> {
    if form.venue_ids.is_empty() {
        return Err(NodeError::InvalidInput("You need to pick at least one venue!".into()));
    }
    validate_email(&form.email)?;
    if form.body.trim().is_empty() {
        return Err(NodeError::InvalidInput("request body is empty".into()));
    }
    request_context(&state, form.member_id, group_id, event_id)?;

    let request = SpaceRequest {
        venue_ids: form.venue_ids,
        from: form.email.trim().to_string(),
        body: form.body,
    };
    let messages = account::compose_space_requests(state.records(), &request)?;
    let sent = mail::dispatch(state.mailer.as_ref(), &messages).await?;

    let message = if sent > 1 {
        "The hosts have been notified of your request"
    } else {
        "The host has been notified of your request"
    };
    Ok(Json(SpaceRequestResponse {
        sent,
        message: message.to_string(),
        messages,
    }))
}

/// Saves to the configured snapshot path only.
async fn snapshot_save(State(state): State<AppState>) -> Result<Json<SnapshotSaveResponse>, NodeError> {
    let path = state
        .snapshot_path
        .clone()
        .ok_or_else(|| NodeError::InvalidInput("No snapshot path configured".into()))?;

    let meta = SnapshotManager::save_store(&path, &state.store)?;
    Ok(Json(SnapshotSaveResponse {
        success: true,
        path: path.to_string_lossy().to_string(),
        bytes: meta.store_len,
    }))
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}
