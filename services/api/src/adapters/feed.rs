//! services/api/src/adapters/feed.rs
//!
//! This module contains the change-feed adapter, the concrete implementation
//! of the `ChangeFeed` port. Row changes are delivered through Postgres
//! LISTEN/NOTIFY: triggers installed by the migrations publish a JSON payload
//! on one channel per collection, and each subscription holds its own
//! listener connection. Dropping the returned stream closes the connection.

use async_trait::async_trait;
use campus_portal_core::domain::{Announcement, Audience, Ticket, TicketChange, TicketStatus};
use campus_portal_core::ports::{ChangeFeed, ChangeStream, PortError, PortResult};
use chrono::{DateTime, Utc};
use futures::stream;
use serde::Deserialize;
use sqlx::postgres::PgListener;
use uuid::Uuid;

/// NOTIFY channel for ticket row updates.
const TICKET_CHANNEL: &str = "ticket_updates";
/// NOTIFY channel for announcement row inserts.
const ANNOUNCEMENT_CHANNEL: &str = "announcement_inserts";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A change-feed adapter backed by Postgres LISTEN/NOTIFY.
#[derive(Clone)]
pub struct PgChangeFeed {
    database_url: String,
}

impl PgChangeFeed {
    /// Creates a new `PgChangeFeed`.
    pub fn new(database_url: String) -> Self {
        Self { database_url }
    }

    async fn listener_for(&self, channel: &str) -> PortResult<PgListener> {
        let mut listener = PgListener::connect(&self.database_url)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        listener
            .listen(channel)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(listener)
    }
}

//=========================================================================================
// NOTIFY Payload Structs
//=========================================================================================

/// The JSON payload published by the ticket update trigger.
#[derive(Deserialize)]
struct TicketChangePayload {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    status: String,
    old_status: String,
    updated_at: DateTime<Utc>,
}

impl TicketChangePayload {
    fn to_domain(self) -> PortResult<TicketChange> {
        let status = TicketStatus::parse(&self.status)
            .ok_or_else(|| PortError::Unexpected(format!("Unknown ticket status '{}'", self.status)))?;
        let old_status = TicketStatus::parse(&self.old_status).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown ticket status '{}'", self.old_status))
        })?;
        Ok(TicketChange {
            ticket: Ticket {
                id: self.id,
                owner_id: self.owner_id,
                title: self.title,
                description: self.description,
                status,
                updated_at: self.updated_at,
            },
            old_status,
        })
    }
}

/// The JSON payload published by the announcement insert trigger.
#[derive(Deserialize)]
struct AnnouncementPayload {
    id: Uuid,
    author_id: Uuid,
    title: String,
    content: String,
    audience: String,
    created_at: DateTime<Utc>,
}

impl AnnouncementPayload {
    fn to_domain(self) -> PortResult<Announcement> {
        let audience = Audience::parse(&self.audience).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown audience '{}'", self.audience))
        })?;
        Ok(Announcement {
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            content: self.content,
            audience,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// `ChangeFeed` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    /// Update events on the ticket collection, filtered to `owner_id` before
    /// anything reaches the core engine.
    async fn ticket_updates(&self, owner_id: Uuid) -> PortResult<ChangeStream<TicketChange>> {
        let listener = self.listener_for(TICKET_CHANNEL).await?;

        let stream = stream::unfold(listener, move |mut listener| async move {
            loop {
                let notification = match listener.recv().await {
                    Ok(n) => n,
                    Err(e) => return Some((Err(PortError::Unexpected(e.to_string())), listener)),
                };
                let parsed = serde_json::from_str::<TicketChangePayload>(notification.payload())
                    .map_err(|e| {
                        PortError::Unexpected(format!("Malformed ticket payload: {e}"))
                    })
                    .and_then(TicketChangePayload::to_domain);
                match parsed {
                    Ok(change) if change.ticket.owner_id == owner_id => {
                        return Some((Ok(change), listener))
                    }
                    // Another user's ticket; keep listening.
                    Ok(_) => continue,
                    Err(e) => return Some((Err(e), listener)),
                }
            }
        });
        Ok(Box::pin(stream))
    }

    /// Insert events on the announcement collection, unfiltered. Audience
    /// filtering happens per viewer in the engine.
    async fn announcement_inserts(&self) -> PortResult<ChangeStream<Announcement>> {
        let listener = self.listener_for(ANNOUNCEMENT_CHANNEL).await?;

        let stream = stream::unfold(listener, move |mut listener| async move {
            let item = match listener.recv().await {
                Ok(notification) => {
                    serde_json::from_str::<AnnouncementPayload>(notification.payload())
                        .map_err(|e| {
                            PortError::Unexpected(format!("Malformed announcement payload: {e}"))
                        })
                        .and_then(AnnouncementPayload::to_domain)
                }
                Err(e) => Err(PortError::Unexpected(e.to_string())),
            };
            Some((item, listener))
        });
        Ok(Box::pin(stream))
    }
}
