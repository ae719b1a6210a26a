pub mod domain;
pub mod notifications;
pub mod ports;
pub mod routes;
pub mod session;
pub mod timefmt;

pub use domain::{
    Announcement, Audience, ChatTurn, NewProfile, NotificationEvent, NotificationKind, Profile,
    ProfilePatch, Role, Session, Speaker, Ticket, TicketChange, TicketStatus,
};
pub use notifications::{MarkOutcome, NotificationCenter, DISPLAY_LIMIT, RETAINED_EVENTS};
pub use ports::{
    AuthService, ChangeFeed, ChangeStream, ChatAssistant, DataStore, PortError, PortResult,
};
pub use routes::{navigation_for, resolve_route_access, NavEntry, RouteAccess};
pub use session::{AuthError, SessionGate, ValidationError};
