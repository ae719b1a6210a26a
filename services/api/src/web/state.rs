//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::notify::NotificationHub;
use campus_portal_core::ports::{ChatAssistant, DataStore};
use campus_portal_core::session::SessionGate;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. There is exactly one `SessionGate` and one `NotificationHub`
/// per process; nothing here is reachable as an ambient global.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: Arc<SessionGate>,
    pub store: Arc<dyn DataStore>,
    pub chat: Arc<dyn ChatAssistant>,
    pub hub: Arc<NotificationHub>,
}
