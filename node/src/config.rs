// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use wheretomeetup::config::{SyncOptions, DEFAULT_MAXIMUM_STALENESS_SECS, DEFAULT_PAGE_SIZE};

pub const DEFAULT_MEETUP_API_URL: &str = "https://api.meetup.com";

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    pub snapshot_path: Option<PathBuf>,
    pub auto_snapshot_interval_secs: Option<u64>,
    /// Bearer token required on every route when set.
    pub auth_token: Option<String>,
    pub meetup_api_url: String,
    pub meetup_access_token: Option<String>,
    pub maximum_staleness_secs: u64,
    pub page_size: u32,
    pub resolve_event_venues: bool,
    pub mail_from: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            snapshot_path: None,
            auto_snapshot_interval_secs: None,
            auth_token: None,
            meetup_api_url: DEFAULT_MEETUP_API_URL.to_string(),
            meetup_access_token: None,
            maximum_staleness_secs: DEFAULT_MAXIMUM_STALENESS_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            resolve_event_venues: true,
            mail_from: "noreply@wheretomeetup.local".to_string(),
        }
    }
}

impl NodeConfig {
    /// Defaults overridden by `WTM_*` / `MEETUP_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: try_load("WTM_BIND_ADDR", defaults.bind_addr),
            snapshot_path: optional("WTM_SNAPSHOT_PATH").map(PathBuf::from),
            auto_snapshot_interval_secs: optional("WTM_SNAPSHOT_INTERVAL_SECS").and_then(|v| parse_or_warn("WTM_SNAPSHOT_INTERVAL_SECS", &v)),
            auth_token: optional("WTM_AUTH_TOKEN"),
            meetup_api_url: optional("MEETUP_API_URL").unwrap_or(defaults.meetup_api_url),
            meetup_access_token: optional("MEETUP_ACCESS_TOKEN"),
            maximum_staleness_secs: try_load("WTM_MAXIMUM_STALENESS_SECS", defaults.maximum_staleness_secs),
            page_size: try_load("WTM_PAGE_SIZE", defaults.page_size),
            resolve_event_venues: try_load("WTM_RESOLVE_EVENT_VENUES", defaults.resolve_event_venues),
            mail_from: optional("WTM_MAIL_FROM").unwrap_or(defaults.mail_from),
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            maximum_staleness: Duration::from_secs(self.maximum_staleness_secs),
            page_size: self.page_size,
            resolve_event_venues: self.resolve_event_venues,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or_warn<T: FromStr>(key: &str, raw: &str) -> Option<T>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| tracing::warn!("Invalid {key} value {raw:?}: {e}"))
        .ok()
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match optional(key) {
        Some(raw) => parse_or_warn(key, &raw).unwrap_or_else(|| {
            tracing::warn!("{key} misconfigured, using default: {default}");
            default
        }),
        None => {
            tracing::debug!("{key} not set, using default: {default}");
            default
        }
    }
}
