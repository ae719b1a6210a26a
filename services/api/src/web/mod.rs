pub mod announcements;
pub mod auth;
pub mod chat;
pub mod middleware;
pub mod notifications;
pub mod profile;
pub mod rest;
pub mod state;
pub mod tickets;

// Re-export the pieces the binary needs to build the router.
pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use state::AppState;
