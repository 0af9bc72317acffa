// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod config;
pub mod errors;
pub mod api;
pub mod server;
pub mod mail;
pub mod persistence;
pub mod telemetry;
pub mod network;
