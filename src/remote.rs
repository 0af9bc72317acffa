// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Meetup API seam.
//!
//! Implementations follow pagination to exhaustion and hand back raw records.
//! Timeouts and retries are the implementation's business.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::store::Document;
use crate::types::{GroupId, MemberId};

#[async_trait]
pub trait MeetupApi: Send + Sync {
    /// Profile of a single member.
    async fn member(&self, member_id: MemberId) -> Result<Document, ApiError>;

    /// Groups `member_id` belongs to.
    async fn groups(&self, member_id: MemberId, fields: &[&str], page: u32) -> Result<Vec<Document>, ApiError>;

    /// Venues used by any of `group_ids`.
    async fn venues(&self, group_ids: &[GroupId], fields: &[&str], page: u32) -> Result<Vec<Document>, ApiError>;

    /// Events of `group_ids` in one of `status`.
    async fn events(
        &self,
        group_ids: &[GroupId],
        status: &[&str],
        fields: &[&str],
        page: u32,
    ) -> Result<Vec<Document>, ApiError>;
}
