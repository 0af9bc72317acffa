// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;
use tokio::net::TcpListener;
use wheretomeetup::store::MemoryStore;
use wheretomeetup_node::config::NodeConfig;
use wheretomeetup_node::mail::LogMailer;
use wheretomeetup_node::network::MeetupClient;
use wheretomeetup_node::persistence::SnapshotManager;
use wheretomeetup_node::server::{build_router, AppState};
use wheretomeetup_node::telemetry::init_telemetry;

#[tokio::main]
async fn main() {
    init_telemetry();

    let cfg = NodeConfig::from_env();
    tracing::info!(
        "Initializing WhereToMeetup node on {} against {}",
        cfg.bind_addr,
        cfg.meetup_api_url
    );
    if cfg.meetup_access_token.is_none() {
        tracing::warn!("MEETUP_ACCESS_TOKEN not set; Meetup calls will be anonymous");
    }

    let store = Arc::new(MemoryStore::new());

    // Load Snapshot if present
    if let Some(path) = &cfg.snapshot_path {
        if path.exists() {
            tracing::info!("Found snapshot at {:?}. Loading...", path);
            match SnapshotManager::load_store(path, &store) {
                Ok(meta) => tracing::info!("Snapshot restored ({} bytes, taken at {})", meta.store_len, meta.timestamp),
                Err(e) => {
                    tracing::error!("Failed to restore snapshot: {}", e);
                    return;
                }
            }
        }
    }

    let state = AppState {
        store: store.clone(),
        api: Arc::new(MeetupClient::new(cfg.meetup_api_url.clone(), cfg.meetup_access_token.clone())),
        mailer: Arc::new(LogMailer::new(cfg.mail_from.clone())),
        sync_options: cfg.sync_options(),
        snapshot_path: cfg.snapshot_path.clone(),
    };

    // Spawn Persistence Task
    if let (Some(path), Some(secs)) = (cfg.snapshot_path.clone(), cfg.auto_snapshot_interval_secs) {
        let store = store.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(secs));
            // First tick fires immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                tracing::debug!("Auto-snapshotting...");
                match SnapshotManager::save_store(&path, &store) {
                    Ok(meta) => tracing::info!("Snapshot saved to {:?} ({} bytes)", path, meta.store_len),
                    Err(e) => tracing::error!("Snapshot failed: {}", e),
                }
            }
        });
    }

    let app = build_router(state, cfg.auth_token.clone());

    let addr = cfg.bind_addr;
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };
    tracing::info!("Listening on {}", addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
