//! crates/campus_portal_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the portal's core logic.
//! These traits form the boundary of the hexagonal architecture: everything
//! the core needs from the hosted backend (identity, rows, change streams,
//! chat completion) passes through here, so the core never sees SQL or
//! transport details.

use crate::domain::{
    Announcement, Audience, ChatTurn, NewProfile, Profile, ProfilePatch, Role, Session, Ticket,
    TicketChange, TicketStatus,
};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A boxed change-stream subscription. Dropping the stream is the disposer:
/// it tears the subscription down even when cleanup happens because of an
/// error elsewhere.
pub type ChangeStream<T> = Pin<Box<dyn Stream<Item = PortResult<T>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The identity backend. Credential checks and token bookkeeping live behind
/// this port; the core only sees resolved sessions.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Session>;

    async fn sign_out(&self, token: &str) -> PortResult<()>;

    /// Resolves a presented token to the user it belongs to.
    async fn validate_session(&self, token: &str) -> PortResult<Uuid>;

    /// Starts the redirect-based federated flow. Returns the provider URL the
    /// client must navigate to; completion arrives via the callback, not here.
    async fn begin_federated_sign_in(&self) -> PortResult<String>;

    /// Finishes the federated flow once the provider has redirected back.
    /// The assertion is validated upstream; this opens a session for the
    /// asserted identity, creating it on first sign-in.
    async fn complete_federated_sign_in(&self, email: &str) -> PortResult<Session>;
}

/// The generic data-access layer over the hosted backend's collections.
#[async_trait]
pub trait DataStore: Send + Sync {
    // --- Profiles ---
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile>;

    async fn create_profile(&self, user_id: Uuid, email: &str, profile: NewProfile)
        -> PortResult<Profile>;

    async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> PortResult<Profile>;

    // --- Tickets ---
    async fn get_ticket(&self, ticket_id: Uuid) -> PortResult<Ticket>;

    async fn list_tickets_for(&self, owner_id: Uuid) -> PortResult<Vec<Ticket>>;

    async fn create_ticket(&self, owner_id: Uuid, title: &str, description: &str)
        -> PortResult<Ticket>;

    async fn update_ticket_status(&self, ticket_id: Uuid, status: TicketStatus)
        -> PortResult<Ticket>;

    // --- Announcements ---
    async fn insert_announcement(
        &self,
        author_id: Uuid,
        title: &str,
        content: &str,
        audience: Audience,
    ) -> PortResult<Announcement>;

    async fn list_announcements(&self) -> PortResult<Vec<Announcement>>;
}

/// Live change streams from the backend. Each stream individually delivers
/// events in emission order for a given row; no ordering holds across
/// streams.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Update events on the ticket collection, filtered to `owner_id`.
    async fn ticket_updates(&self, owner_id: Uuid) -> PortResult<ChangeStream<TicketChange>>;

    /// Insert events on the announcement collection, unfiltered at the
    /// transport. Audience filtering happens per viewer in the engine.
    async fn announcement_inserts(&self) -> PortResult<ChangeStream<Announcement>>;
}

/// The chat-completion external service behind the AI assistant. Invoked
/// once per user-submitted message; failures surface to the user and the
/// conversation is preserved so the message can be retried manually.
#[async_trait]
pub trait ChatAssistant: Send + Sync {
    async fn complete(&self, role: Role, history: &[ChatTurn], message: &str)
        -> PortResult<String>;
}
