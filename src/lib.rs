// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! wheretomeetup: Meetup group/venue/event sync, venue queries and claims over a document store.

pub mod config;
pub mod error;
pub mod types;
pub mod models;
pub mod store;
pub mod remote;
pub mod normalize;
pub mod query;
pub mod sync;
pub mod account;
