// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use async_trait::async_trait;
use wheretomeetup::account::OutboundMessage;

use crate::errors::NodeError;

/// Outbound email seam. Delivery itself happens outside this crate.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NodeError>;
}

/// Writes each message to the log and keeps nothing.
pub struct LogMailer {
    /// Envelope sender; the organizer's address goes in `from`.
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self { sender: sender.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NodeError> {
        tracing::info!(
            "Mail via {} to {} from {} about venue {}: {}",
            self.sender,
            message.to,
            message.from,
            message.venue_id,
            message.subject
        );
        Ok(())
    }
}

/// Sends every message, stopping at the first failure. Returns how many went out.
pub async fn dispatch(mailer: &dyn Mailer, messages: &[OutboundMessage]) -> Result<usize, NodeError> {
    for message in messages {
        mailer.send(message).await?;
        metrics::counter!("wtm_space_requests_sent_total", 1);
    }
    Ok(messages.len())
}
