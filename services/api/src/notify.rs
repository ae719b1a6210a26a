//! services/api/src/notify.rs
//!
//! Server-side notification fan-out. One `NotificationHub` is created at
//! startup; it owns a per-user `NotificationCenter` (attached when a session
//! resolves its role, detached on sign-out) and the tasks that pump the two
//! change streams into those centers.
//!
//! Stream lifetimes are scoped with cancellation tokens: detaching a user or
//! shutting the hub down cancels the pump tasks, which drops the streams and
//! with them the underlying subscriptions. A disconnected stream is
//! resubscribed after a bounded exponential backoff.

use campus_portal_core::domain::{NotificationEvent, Role};
use campus_portal_core::notifications::{MarkOutcome, NotificationCenter};
use campus_portal_core::ports::ChangeFeed;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// What a user's notification state looks like right now.
pub struct NotificationSnapshot {
    /// The displayable slice of the log, most recent first.
    pub events: Vec<NotificationEvent>,
    pub unread_count: usize,
}

struct UserEntry {
    role: Role,
    center: Arc<AsyncMutex<NotificationCenter>>,
    ticket_task: CancellationToken,
}

/// Routes change-stream deliveries into per-user notification centers.
pub struct NotificationHub {
    feed: Arc<dyn ChangeFeed>,
    users: Mutex<HashMap<Uuid, UserEntry>>,
    shutdown: CancellationToken,
}

impl NotificationHub {
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Arc<Self> {
        Arc::new(Self {
            feed,
            users: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        })
    }

    /// Starts the single, global announcement pump. Announcement inserts are
    /// broadcast on one stream; the audience check happens per viewer inside
    /// each center.
    pub fn spawn_announcement_fanout(self: &Arc<Self>) {
        let hub = Arc::clone(self);
        let token = self.shutdown.child_token();
        tokio::spawn(async move {
            let mut backoff = INITIAL_BACKOFF;
            loop {
                let subscribed = tokio::select! {
                    _ = token.cancelled() => return,
                    res = hub.feed.announcement_inserts() => res,
                };
                match subscribed {
                    Ok(mut stream) => {
                        backoff = INITIAL_BACKOFF;
                        loop {
                            let item = tokio::select! {
                                _ = token.cancelled() => return,
                                item = stream.next() => item,
                            };
                            match item {
                                Some(Ok(announcement)) => {
                                    // Snapshot the attached centers so the map
                                    // lock is not held across awaits.
                                    let targets: Vec<_> = hub
                                        .users
                                        .lock()
                                        .unwrap()
                                        .values()
                                        .map(|e| (e.role, Arc::clone(&e.center)))
                                        .collect();
                                    for (role, center) in targets {
                                        center.lock().await.record_announcement(role, &announcement);
                                    }
                                }
                                Some(Err(e)) => {
                                    warn!("Announcement stream error: {e}");
                                    break;
                                }
                                None => {
                                    warn!("Announcement stream ended");
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => warn!("Failed to subscribe to announcements: {e}"),
                }

                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        });
    }

    /// Attaches a user once their role is known, opening their ticket-update
    /// subscription. Attaching an already-attached user with the same role is
    /// a no-op; a changed role (profile update) reopens the subscription and
    /// starts from an empty log, like any fresh session.
    ///
    /// Check, replacement, and insert happen under one lock acquisition, so
    /// two requests attaching the same user concurrently cannot both spawn a
    /// pump: exactly one entry wins, and a replaced entry has its pump
    /// cancelled before the new one becomes visible.
    pub fn attach(self: &Arc<Self>, user_id: Uuid, role: Role) {
        let center = Arc::new(AsyncMutex::new(NotificationCenter::new()));
        let token = self.shutdown.child_token();
        {
            let mut users = self.users.lock().unwrap();
            if let Some(entry) = users.get(&user_id) {
                if entry.role == role {
                    return;
                }
            }
            if let Some(replaced) = users.insert(
                user_id,
                UserEntry { role, center: Arc::clone(&center), ticket_task: token.clone() },
            ) {
                replaced.ticket_task.cancel();
            }
        }
        info!("Attached notification center for user {user_id}");

        let feed = Arc::clone(&self.feed);
        tokio::spawn(pump_ticket_updates(feed, user_id, center, token));
    }

    /// Detaches a user, cancelling their ticket subscription and discarding
    /// their log. Called on sign-out; a later sign-in starts from empty.
    pub fn detach(&self, user_id: Uuid) {
        if let Some(entry) = self.users.lock().unwrap().remove(&user_id) {
            entry.ticket_task.cancel();
            info!("Detached notification center for user {user_id}");
        }
    }

    pub fn is_attached(&self, user_id: Uuid) -> bool {
        self.users.lock().unwrap().contains_key(&user_id)
    }

    /// Cancels every pump task. Used on shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn center_of(&self, user_id: Uuid) -> Option<Arc<AsyncMutex<NotificationCenter>>> {
        self.users.lock().unwrap().get(&user_id).map(|e| Arc::clone(&e.center))
    }

    /// The displayable state of a user's log, or `None` if they are not
    /// attached.
    pub async fn snapshot(&self, user_id: Uuid) -> Option<NotificationSnapshot> {
        let center = self.center_of(user_id)?;
        let center = center.lock().await;
        Some(NotificationSnapshot {
            events: center.recent().cloned().collect(),
            unread_count: center.unread_count(),
        })
    }

    /// Marks one of the user's notifications as read. An unattached user has
    /// no log, so every id reads as missing.
    pub async fn mark_as_read(&self, user_id: Uuid, notification_id: &str) -> MarkOutcome {
        match self.center_of(user_id) {
            Some(center) => center.lock().await.mark_as_read(notification_id),
            None => MarkOutcome::Missing,
        }
    }

    /// Marks all of the user's notifications as read.
    pub async fn mark_all_as_read(&self, user_id: Uuid) {
        if let Some(center) = self.center_of(user_id) {
            center.lock().await.mark_all_as_read();
        }
    }
}

/// Pumps one user's ticket-update stream into their center until cancelled,
/// resubscribing with bounded exponential backoff after a disconnect.
async fn pump_ticket_updates(
    feed: Arc<dyn ChangeFeed>,
    user_id: Uuid,
    center: Arc<AsyncMutex<NotificationCenter>>,
    token: CancellationToken,
) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        let subscribed = tokio::select! {
            _ = token.cancelled() => return,
            res = feed.ticket_updates(user_id) => res,
        };
        match subscribed {
            Ok(mut stream) => {
                backoff = INITIAL_BACKOFF;
                loop {
                    let item = tokio::select! {
                        _ = token.cancelled() => return,
                        item = stream.next() => item,
                    };
                    match item {
                        Some(Ok(change)) => {
                            center.lock().await.record_ticket_change(&change);
                        }
                        Some(Err(e)) => {
                            warn!("Ticket stream error for user {user_id}: {e}");
                            break;
                        }
                        None => {
                            warn!("Ticket stream ended for user {user_id}");
                            break;
                        }
                    }
                }
            }
            Err(e) => warn!("Failed to subscribe to ticket updates for user {user_id}: {e}"),
        }

        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(backoff) => {}
        }
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}
