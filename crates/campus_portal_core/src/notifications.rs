//! crates/campus_portal_core/src/notifications.rs
//!
//! The notification reconciliation engine: aggregates the two live change
//! streams (ticket status updates scoped to the owner, announcement inserts
//! filtered by audience) into one ordered, deduplicated, read-state-tracked
//! log.
//!
//! The log is in-memory only. It is rebuilt from empty on every session
//! start and discarded on sign-out; there is no replay of events missed
//! while disconnected.

use crate::domain::{
    Announcement, NotificationEvent, NotificationKind, Role, TicketChange,
};
use std::collections::VecDeque;

/// How many events are retained in memory. Only the most recent
/// [`DISPLAY_LIMIT`] are ever displayed, so older entries are evicted
/// rather than letting the log grow for the lifetime of the session.
pub const RETAINED_EVENTS: usize = 50;

/// How many events the presentation layer shows.
pub const DISPLAY_LIMIT: usize = 10;

/// The outcome of marking one event as read. Callers that expose the
/// operation over HTTP need to tell "already read" apart from "no such
/// event": the former is a successful no-op, the latter an unknown id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The event was unread and is now read.
    Marked,
    /// The event exists but was read before; nothing changed.
    AlreadyRead,
    /// No retained event carries this id.
    Missing,
}

/// A bounded, most-recent-first log of notification events with an unread
/// counter.
///
/// Invariants:
/// - entries are ordered most-recent-first (new arrivals are prepended);
/// - `unread_count() == ` number of entries with `read == false`;
/// - an event id appears at most once, so a repeated delivery of the same
///   underlying change cannot double-count.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    events: VecDeque<NotificationEvent>,
    unread: usize,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles one delivery from the ticket update stream.
    ///
    /// A re-save with an unchanged status is a no-op, and so is a transition
    /// into a status with no message mapping (e.g. back to `open`).
    pub fn record_ticket_change(&mut self, change: &TicketChange) -> Option<&NotificationEvent> {
        if change.old_status == change.ticket.status {
            return None;
        }
        let status_line = change.ticket.status.notification_message()?;

        let event = NotificationEvent {
            id: NotificationEvent::synthesize_id(
                NotificationKind::TicketStatusUpdate,
                change.ticket.id,
                change.ticket.updated_at,
            ),
            kind: NotificationKind::TicketStatusUpdate,
            title: "Ticket Status Update".to_string(),
            message: format!("{}: {}", change.ticket.title, status_line),
            read: false,
            created_at: change.ticket.updated_at,
            source_id: change.ticket.id,
        };
        self.push(event)
    }

    /// Handles one delivery from the announcement insert stream.
    ///
    /// The transport broadcasts every insert; the viewer's role is checked
    /// against the announcement's audience here, so a student session never
    /// logs a faculty-only announcement.
    pub fn record_announcement(
        &mut self,
        viewer_role: Role,
        announcement: &Announcement,
    ) -> Option<&NotificationEvent> {
        if !announcement.audience.includes(viewer_role) {
            return None;
        }

        let event = NotificationEvent {
            id: NotificationEvent::synthesize_id(
                NotificationKind::NewAnnouncement,
                announcement.id,
                announcement.created_at,
            ),
            kind: NotificationKind::NewAnnouncement,
            title: "New Announcement".to_string(),
            message: announcement.title.clone(),
            read: false,
            created_at: announcement.created_at,
            source_id: announcement.id,
        };
        self.push(event)
    }

    /// Prepends `event`, enforcing dedup and the retention bound.
    fn push(&mut self, event: NotificationEvent) -> Option<&NotificationEvent> {
        if self.events.iter().any(|e| e.id == event.id) {
            return None;
        }

        self.events.push_front(event);
        self.unread += 1;

        while self.events.len() > RETAINED_EVENTS {
            if let Some(evicted) = self.events.pop_back() {
                if !evicted.read {
                    self.unread -= 1;
                }
            }
        }

        self.events.front()
    }

    /// Marks one event as read. Idempotent: re-marking an already-read
    /// event changes nothing, and is reported as such rather than as an
    /// unknown id.
    pub fn mark_as_read(&mut self, id: &str) -> MarkOutcome {
        match self.events.iter_mut().find(|e| e.id == id) {
            Some(event) if !event.read => {
                event.read = true;
                self.unread -= 1;
                MarkOutcome::Marked
            }
            Some(_) => MarkOutcome::AlreadyRead,
            None => MarkOutcome::Missing,
        }
    }

    /// Marks every event as read in one step.
    pub fn mark_all_as_read(&mut self) {
        for event in &mut self.events {
            event.read = true;
        }
        self.unread = 0;
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All retained events, most recent first.
    pub fn events(&self) -> impl Iterator<Item = &NotificationEvent> {
        self.events.iter()
    }

    /// The slice of events the UI displays, most recent first.
    pub fn recent(&self) -> impl Iterator<Item = &NotificationEvent> {
        self.events.iter().take(DISPLAY_LIMIT)
    }

    /// Discards the whole log, e.g. on sign-out.
    pub fn clear(&mut self) {
        self.events.clear();
        self.unread = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Audience, Ticket, TicketStatus};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn ticket(status: TicketStatus) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Leaking tap in block C".to_string(),
            description: "The washroom tap has been leaking for two days.".to_string(),
            status,
            updated_at: Utc::now(),
        }
    }

    fn change(old: TicketStatus, new: TicketStatus) -> TicketChange {
        TicketChange { ticket: ticket(new), old_status: old }
    }

    fn announcement(audience: Audience) -> Announcement {
        Announcement {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: "Campus fest next weekend".to_string(),
            content: "Registrations open on Monday.".to_string(),
            audience,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_transition_creates_one_notification_with_status_line() {
        let mut center = NotificationCenter::new();
        let event = center
            .record_ticket_change(&change(TicketStatus::Open, TicketStatus::InProgress))
            .expect("transition should notify");
        assert!(event.message.contains("being processed"));
        assert_eq!(center.len(), 1);
        assert_eq!(center.unread_count(), 1);
    }

    #[test]
    fn unchanged_status_is_a_no_op() {
        let mut center = NotificationCenter::new();
        assert!(center
            .record_ticket_change(&change(TicketStatus::InProgress, TicketStatus::InProgress))
            .is_none());
        assert!(center.is_empty());
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn transition_to_unmapped_status_is_discarded() {
        let mut center = NotificationCenter::new();
        assert!(center
            .record_ticket_change(&change(TicketStatus::Rejected, TicketStatus::Open))
            .is_none());
        assert!(center.is_empty());
    }

    #[test]
    fn duplicate_delivery_of_the_same_change_is_not_double_counted() {
        let mut center = NotificationCenter::new();
        let c = change(TicketStatus::Open, TicketStatus::Resolved);
        assert!(center.record_ticket_change(&c).is_some());
        assert!(center.record_ticket_change(&c).is_none());
        assert_eq!(center.len(), 1);
        assert_eq!(center.unread_count(), 1);
    }

    #[test]
    fn interleaved_streams_keep_most_recent_first_order() {
        let mut center = NotificationCenter::new();
        center.record_ticket_change(&change(TicketStatus::Open, TicketStatus::InProgress));
        center.record_announcement(Role::Student, &announcement(Audience::All));
        center.record_ticket_change(&change(TicketStatus::InProgress, TicketStatus::Resolved));

        assert_eq!(center.len(), 3);
        assert_eq!(center.unread_count(), 3);
        let kinds: Vec<_> = center.events().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::TicketStatusUpdate,
                NotificationKind::NewAnnouncement,
                NotificationKind::TicketStatusUpdate,
            ]
        );
    }

    #[test]
    fn audience_filter_drops_announcements_for_other_roles() {
        let mut center = NotificationCenter::new();
        assert!(center
            .record_announcement(Role::Student, &announcement(Audience::Faculty))
            .is_none());
        assert!(center
            .record_announcement(Role::Faculty, &announcement(Audience::Faculty))
            .is_some());
        assert!(center
            .record_announcement(Role::Admin, &announcement(Audience::Faculty))
            .is_some());
        assert_eq!(center.len(), 2);
    }

    #[test]
    fn mark_as_read_is_idempotent() {
        let mut center = NotificationCenter::new();
        let id = center
            .record_announcement(Role::Student, &announcement(Audience::All))
            .unwrap()
            .id
            .clone();
        assert_eq!(center.mark_as_read(&id), MarkOutcome::Marked);
        assert_eq!(center.unread_count(), 0);
        assert_eq!(center.mark_as_read(&id), MarkOutcome::AlreadyRead);
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn re_marking_an_existing_event_is_not_reported_as_missing() {
        let mut center = NotificationCenter::new();
        let id = center
            .record_announcement(Role::Student, &announcement(Audience::All))
            .unwrap()
            .id
            .clone();
        center.mark_as_read(&id);

        // The retained-but-read event and an unknown id are different
        // outcomes; callers map the latter to a not-found response.
        assert_eq!(center.mark_as_read(&id), MarkOutcome::AlreadyRead);
        assert_eq!(center.mark_as_read("no-such-id"), MarkOutcome::Missing);
    }

    #[test]
    fn mark_all_as_read_zeroes_the_counter_from_any_state() {
        let mut center = NotificationCenter::new();
        for _ in 0..4 {
            center.record_announcement(Role::Student, &announcement(Audience::All));
        }
        let id = center.events().next().unwrap().id.clone();
        center.mark_as_read(&id);

        center.mark_all_as_read();
        assert_eq!(center.unread_count(), 0);
        assert!(center.events().all(|e| e.read));

        // And again, from the already-read state.
        center.mark_all_as_read();
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn retention_bound_evicts_oldest_and_keeps_unread_consistent() {
        let mut center = NotificationCenter::new();
        let base = Utc::now();
        for i in 0..(RETAINED_EVENTS + 10) {
            let mut ann = announcement(Audience::All);
            ann.created_at = base + Duration::seconds(i as i64);
            center.record_announcement(Role::Student, &ann);
        }
        assert_eq!(center.len(), RETAINED_EVENTS);
        assert_eq!(center.unread_count(), RETAINED_EVENTS);

        // The newest arrival is still at the front.
        let newest = center.events().next().unwrap();
        assert_eq!(newest.created_at, base + Duration::seconds((RETAINED_EVENTS + 9) as i64));
    }

    #[test]
    fn recent_is_capped_at_the_display_limit() {
        let mut center = NotificationCenter::new();
        for _ in 0..(DISPLAY_LIMIT + 5) {
            center.record_announcement(Role::Student, &announcement(Audience::All));
        }
        assert_eq!(center.recent().count(), DISPLAY_LIMIT);
    }

    #[test]
    fn clear_discards_everything() {
        let mut center = NotificationCenter::new();
        center.record_announcement(Role::Student, &announcement(Audience::All));
        center.clear();
        assert!(center.is_empty());
        assert_eq!(center.unread_count(), 0);
    }
}
