//! crates/campus_portal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the portal.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An authenticated identity, valid until sign-out or expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    /// Opaque token the client presents on subsequent requests.
    pub token: String,
}

/// The role a profile holds within the university.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "faculty" => Some(Role::Faculty),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The extended user record, distinct from the authentication identity.
///
/// A profile is created lazily at first sign-in and may be missing the
/// fields a user has to fill in on the completion screen.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Option<Role>,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year_of_study: Option<i32>,
    pub phone_number: Option<String>,
}

impl Profile {
    /// A profile is complete once the identifier, department, and role are
    /// all present. Route access re-derives this on every check.
    pub fn is_complete(&self) -> bool {
        self.student_id.is_some() && self.department.is_some() && self.role.is_some()
    }
}

/// The fields collected at signup time.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub full_name: String,
    pub role: Option<Role>,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year_of_study: Option<i32>,
    pub phone_number: Option<String>,
}

/// A partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year_of_study: Option<i32>,
    pub phone_number: Option<String>,
}

/// The lifecycle states of a support ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Rejected,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<TicketStatus> {
        match s {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            "rejected" => Some(TicketStatus::Rejected),
            _ => None,
        }
    }

    /// The human-readable line shown when a ticket transitions into this
    /// status. Statuses without a mapping produce no notification.
    pub fn notification_message(&self) -> Option<&'static str> {
        match self {
            TicketStatus::InProgress => Some("Your ticket is now being processed"),
            TicketStatus::Resolved => Some("Your ticket has been resolved"),
            TicketStatus::Rejected => Some("Your ticket has been rejected"),
            TicketStatus::Open => None,
        }
    }
}

/// A support ticket raised by a student.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub updated_at: DateTime<Utc>,
}

/// One delivery from the ticket update stream: the row after the change,
/// plus the status it held before.
#[derive(Debug, Clone)]
pub struct TicketChange {
    pub ticket: Ticket,
    pub old_status: TicketStatus,
}

/// Who an announcement is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    All,
    Students,
    Faculty,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Students => "students",
            Audience::Faculty => "faculty",
        }
    }

    pub fn parse(s: &str) -> Option<Audience> {
        match s {
            "all" => Some(Audience::All),
            "students" => Some(Audience::Students),
            "faculty" => Some(Audience::Faculty),
            _ => None,
        }
    }

    /// Whether a viewer holding `role` is addressed by this audience.
    /// Admins see everything faculty see.
    pub fn includes(&self, role: Role) -> bool {
        match self {
            Audience::All => true,
            Audience::Students => role == Role::Student,
            Audience::Faculty => matches!(role, Role::Faculty | Role::Admin),
        }
    }
}

/// A campus-wide announcement.
#[derive(Debug, Clone)]
pub struct Announcement {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub audience: Audience,
    pub created_at: DateTime<Utc>,
}

/// The two kinds of locally synthesized notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TicketStatusUpdate,
    NewAnnouncement,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TicketStatusUpdate => "ticket_status_update",
            NotificationKind::NewAnnouncement => "new_announcement",
        }
    }
}

/// A locally synthesized, non-persisted record of one user-relevant change.
///
/// The id is derived from the kind, the source row, and the change
/// timestamp, so a repeated delivery of the same underlying change maps to
/// the same id.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub source_id: Uuid,
}

impl NotificationEvent {
    /// Synthesizes the dedup identity for an event.
    pub fn synthesize_id(kind: NotificationKind, source_id: Uuid, created_at: DateTime<Utc>) -> String {
        format!("{}-{}-{}", kind.as_str(), source_id, created_at.timestamp_millis())
    }
}

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One prior exchange in an assistant conversation.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Option<Role>, student_id: Option<&str>, department: Option<&str>) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            full_name: "Asha Rao".to_string(),
            email: "asha@campus.edu".to_string(),
            role,
            student_id: student_id.map(String::from),
            department: department.map(String::from),
            year_of_study: None,
            phone_number: None,
        }
    }

    #[test]
    fn profile_completeness_requires_all_three_fields() {
        assert!(profile(Some(Role::Student), Some("S-100"), Some("CSE")).is_complete());
        assert!(!profile(None, Some("S-100"), Some("CSE")).is_complete());
        assert!(!profile(Some(Role::Student), None, Some("CSE")).is_complete());
        assert!(!profile(Some(Role::Student), Some("S-100"), None).is_complete());
    }

    #[test]
    fn only_terminal_and_in_progress_statuses_have_messages() {
        assert!(TicketStatus::Open.notification_message().is_none());
        assert_eq!(
            TicketStatus::InProgress.notification_message(),
            Some("Your ticket is now being processed")
        );
        assert!(TicketStatus::Resolved.notification_message().is_some());
        assert!(TicketStatus::Rejected.notification_message().is_some());
    }

    #[test]
    fn audience_membership_by_role() {
        assert!(Audience::All.includes(Role::Student));
        assert!(Audience::All.includes(Role::Admin));
        assert!(Audience::Students.includes(Role::Student));
        assert!(!Audience::Students.includes(Role::Faculty));
        assert!(Audience::Faculty.includes(Role::Faculty));
        assert!(Audience::Faculty.includes(Role::Admin));
        assert!(!Audience::Faculty.includes(Role::Student));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Resolved,
            TicketStatus::Rejected,
        ] {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("archived"), None);
    }

    #[test]
    fn synthesized_id_is_stable_for_the_same_change() {
        let source = Uuid::new_v4();
        let at = Utc::now();
        let a = NotificationEvent::synthesize_id(NotificationKind::NewAnnouncement, source, at);
        let b = NotificationEvent::synthesize_id(NotificationKind::NewAnnouncement, source, at);
        assert_eq!(a, b);
    }
}
