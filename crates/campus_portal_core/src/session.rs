//! crates/campus_portal_core/src/session.rs
//!
//! The session and authorization gate. Resolves identity and profile
//! through the `AuthService` and `DataStore` ports and drives the mandatory
//! profile-completion flow. One instance is created at startup and passed
//! explicitly wherever it is needed; there is no ambient global.

use crate::domain::{NewProfile, Profile, ProfilePatch, Session};
use crate::ports::{AuthService, DataStore, PortError, PortResult};
use std::sync::Arc;
use uuid::Uuid;

/// Authentication failures. Surfaced to the initiating screen as a
/// dismissible message and never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Identity backend unavailable: {0}")]
    Backend(String),
}

impl From<PortError> for AuthError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Unauthorized | PortError::NotFound(_) => AuthError::InvalidCredentials,
            PortError::Unexpected(msg) => AuthError::Backend(msg),
        }
    }
}

/// Profile update failures.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required value for {0}")]
    MissingField(&'static str),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("Profile update failed: {0}")]
    Backend(String),
}

/// Resolves the current identity and gates what it may do.
///
/// Route reachability itself is the pure function in [`crate::routes`]; the
/// gate supplies it with the resolved session and profile.
pub struct SessionGate {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DataStore>,
}

impl SessionGate {
    pub fn new(auth: Arc<dyn AuthService>, store: Arc<dyn DataStore>) -> Self {
        Self { auth, store }
    }

    /// Signs an existing user in. Failures are reported, not retried.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        Ok(self.auth.sign_in(email, password).await?)
    }

    /// Creates a new account and its profile row in one step.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: NewProfile,
    ) -> Result<Session, AuthError> {
        let session = self.auth.sign_up(email, password).await?;
        self.store
            .create_profile(session.user_id, email, profile)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        Ok(session)
    }

    /// Starts the redirect-based federated flow. The caller navigates the
    /// browser to the returned URL; completion is observed asynchronously
    /// via [`SessionGate::complete_federated_sign_in`].
    pub async fn begin_federated_sign_in(&self) -> Result<String, AuthError> {
        Ok(self.auth.begin_federated_sign_in().await?)
    }

    /// Finishes the federated flow for an identity the provider asserted.
    /// The profile is created lazily on first sign-in.
    pub async fn complete_federated_sign_in(&self, email: &str) -> Result<Session, AuthError> {
        let session = self.auth.complete_federated_sign_in(email).await?;
        self.ensure_profile(&session).await?;
        Ok(session)
    }

    /// Signs the session out. The caller is responsible for discarding all
    /// state derived from the identity, including its notification log.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        Ok(self.auth.sign_out(token).await?)
    }

    /// Resolves a presented token to its user.
    pub async fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        Ok(self.auth.validate_session(token).await?)
    }

    /// Loads a user's profile; a profile that has not been created yet reads
    /// as `None` (which the route gate treats as incomplete).
    pub async fn load_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AuthError> {
        match self.store.get_profile(user_id).await {
            Ok(profile) => Ok(Some(profile)),
            Err(PortError::NotFound(_)) => Ok(None),
            Err(e) => Err(AuthError::Backend(e.to_string())),
        }
    }

    /// Applies a partial profile update. Once the previously missing
    /// required fields are present, route access unblocks on the next
    /// navigation because completeness is always re-derived from the stored
    /// profile.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Profile, ValidationError> {
        validate_patch(&patch)?;
        self.store
            .update_profile(user_id, patch)
            .await
            .map_err(|e| ValidationError::Backend(e.to_string()))
    }

    async fn ensure_profile(&self, session: &Session) -> PortResult<()> {
        match self.store.get_profile(session.user_id).await {
            Ok(_) => Ok(()),
            Err(PortError::NotFound(_)) => {
                let full_name = session
                    .email
                    .split('@')
                    .next()
                    .unwrap_or(&session.email)
                    .to_string();
                self.store
                    .create_profile(
                        session.user_id,
                        &session.email,
                        NewProfile {
                            full_name,
                            role: None,
                            student_id: None,
                            department: None,
                            year_of_study: None,
                            phone_number: None,
                        },
                    )
                    .await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn validate_patch(patch: &ProfilePatch) -> Result<(), ValidationError> {
    if matches!(&patch.full_name, Some(name) if name.trim().is_empty()) {
        return Err(ValidationError::MissingField("full_name"));
    }
    if matches!(&patch.student_id, Some(id) if id.trim().is_empty()) {
        return Err(ValidationError::MissingField("student_id"));
    }
    if matches!(&patch.department, Some(dep) if dep.trim().is_empty()) {
        return Err(ValidationError::MissingField("department"));
    }
    if let Some(year) = patch.year_of_study {
        if !(1..=6).contains(&year) {
            return Err(ValidationError::InvalidValue {
                field: "year_of_study",
                reason: format!("{year} is out of range"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Announcement, Audience, Role, Ticket, TicketStatus};
    use crate::ports::PortResult;
    use crate::routes::{resolve_route_access, RouteAccess, COMPLETE_PROFILE_PATH};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory identity backend for gate tests.
    #[derive(Default)]
    struct FakeAuth {
        // email -> (password, user_id)
        accounts: Mutex<HashMap<String, (String, Uuid)>>,
        // token -> user_id
        sessions: Mutex<HashMap<String, Uuid>>,
        unreachable: bool,
    }

    impl FakeAuth {
        fn open_session(&self, user_id: Uuid, email: &str) -> Session {
            let token = Uuid::new_v4().to_string();
            self.sessions.lock().unwrap().insert(token.clone(), user_id);
            Session { user_id, email: email.to_string(), token }
        }
    }

    #[async_trait]
    impl AuthService for FakeAuth {
        async fn sign_up(&self, email: &str, password: &str) -> PortResult<Session> {
            let user_id = Uuid::new_v4();
            self.accounts
                .lock()
                .unwrap()
                .insert(email.to_string(), (password.to_string(), user_id));
            Ok(self.open_session(user_id, email))
        }

        async fn sign_in(&self, email: &str, password: &str) -> PortResult<Session> {
            if self.unreachable {
                return Err(PortError::Unexpected("connection refused".to_string()));
            }
            let user_id = match self.accounts.lock().unwrap().get(email) {
                Some((stored, id)) if stored == password => *id,
                _ => return Err(PortError::Unauthorized),
            };
            Ok(self.open_session(user_id, email))
        }

        async fn sign_out(&self, token: &str) -> PortResult<()> {
            self.sessions.lock().unwrap().remove(token);
            Ok(())
        }

        async fn validate_session(&self, token: &str) -> PortResult<Uuid> {
            self.sessions
                .lock()
                .unwrap()
                .get(token)
                .copied()
                .ok_or(PortError::Unauthorized)
        }

        async fn begin_federated_sign_in(&self) -> PortResult<String> {
            Ok("https://provider.example/authorize".to_string())
        }

        async fn complete_federated_sign_in(&self, email: &str) -> PortResult<Session> {
            let user_id = self
                .accounts
                .lock()
                .unwrap()
                .entry(email.to_string())
                .or_insert_with(|| (String::new(), Uuid::new_v4()))
                .1;
            Ok(self.open_session(user_id, email))
        }
    }

    /// In-memory data store for gate tests. Only the profile operations are
    /// exercised here.
    #[derive(Default)]
    struct FakeStore {
        profiles: Mutex<HashMap<Uuid, Profile>>,
    }

    #[async_trait]
    impl DataStore for FakeStore {
        async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile> {
            self.profiles
                .lock()
                .unwrap()
                .get(&user_id)
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("profile {user_id}")))
        }

        async fn create_profile(
            &self,
            user_id: Uuid,
            email: &str,
            profile: NewProfile,
        ) -> PortResult<Profile> {
            let row = Profile {
                user_id,
                full_name: profile.full_name,
                email: email.to_string(),
                role: profile.role,
                student_id: profile.student_id,
                department: profile.department,
                year_of_study: profile.year_of_study,
                phone_number: profile.phone_number,
            };
            self.profiles.lock().unwrap().insert(user_id, row.clone());
            Ok(row)
        }

        async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> PortResult<Profile> {
            let mut profiles = self.profiles.lock().unwrap();
            let row = profiles
                .get_mut(&user_id)
                .ok_or_else(|| PortError::NotFound(format!("profile {user_id}")))?;
            if let Some(name) = patch.full_name {
                row.full_name = name;
            }
            if let Some(role) = patch.role {
                row.role = Some(role);
            }
            if let Some(id) = patch.student_id {
                row.student_id = Some(id);
            }
            if let Some(dep) = patch.department {
                row.department = Some(dep);
            }
            if let Some(year) = patch.year_of_study {
                row.year_of_study = Some(year);
            }
            if let Some(phone) = patch.phone_number {
                row.phone_number = Some(phone);
            }
            Ok(row.clone())
        }

        async fn get_ticket(&self, _ticket_id: Uuid) -> PortResult<Ticket> {
            unimplemented!("not exercised by gate tests")
        }

        async fn list_tickets_for(&self, _owner_id: Uuid) -> PortResult<Vec<Ticket>> {
            Ok(Vec::new())
        }

        async fn create_ticket(
            &self,
            _owner_id: Uuid,
            _title: &str,
            _description: &str,
        ) -> PortResult<Ticket> {
            unimplemented!("not exercised by gate tests")
        }

        async fn update_ticket_status(
            &self,
            _ticket_id: Uuid,
            _status: TicketStatus,
        ) -> PortResult<Ticket> {
            unimplemented!("not exercised by gate tests")
        }

        async fn insert_announcement(
            &self,
            _author_id: Uuid,
            _title: &str,
            _content: &str,
            _audience: Audience,
        ) -> PortResult<Announcement> {
            unimplemented!("not exercised by gate tests")
        }

        async fn list_announcements(&self) -> PortResult<Vec<Announcement>> {
            Ok(Vec::new())
        }
    }

    fn gate() -> (SessionGate, Arc<FakeAuth>, Arc<FakeStore>) {
        let auth = Arc::new(FakeAuth::default());
        let store = Arc::new(FakeStore::default());
        (SessionGate::new(auth.clone(), store.clone()), auth, store)
    }

    fn signup_fields() -> NewProfile {
        NewProfile {
            full_name: "Asha Rao".to_string(),
            role: None,
            student_id: None,
            department: None,
            year_of_study: None,
            phone_number: None,
        }
    }

    #[tokio::test]
    async fn sign_up_opens_a_session_and_creates_the_profile() {
        let (gate, _auth, store) = gate();
        let session = gate
            .sign_up("asha@campus.edu", "hunter2", signup_fields())
            .await
            .unwrap();
        let profile = store.get_profile(session.user_id).await.unwrap();
        assert_eq!(profile.email, "asha@campus.edu");
        assert!(!profile.is_complete());
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_reports_invalid_credentials() {
        let (gate, _auth, _store) = gate();
        gate.sign_up("asha@campus.edu", "hunter2", signup_fields())
            .await
            .unwrap();
        let err = gate.sign_in("asha@campus.edu", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unreachable_backend_surfaces_as_backend_error() {
        let auth = Arc::new(FakeAuth { unreachable: true, ..FakeAuth::default() });
        let store = Arc::new(FakeStore::default());
        let gate = SessionGate::new(auth, store);
        let err = gate.sign_in("asha@campus.edu", "hunter2").await.unwrap_err();
        assert!(matches!(err, AuthError::Backend(_)));
    }

    #[tokio::test]
    async fn sign_out_invalidates_the_token() {
        let (gate, _auth, _store) = gate();
        let session = gate
            .sign_up("asha@campus.edu", "hunter2", signup_fields())
            .await
            .unwrap();
        assert!(gate.validate(&session.token).await.is_ok());
        gate.sign_out(&session.token).await.unwrap();
        assert!(matches!(
            gate.validate(&session.token).await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn completing_the_profile_unblocks_protected_routes() {
        let (gate, _auth, _store) = gate();
        let session = gate
            .sign_up("asha@campus.edu", "hunter2", signup_fields())
            .await
            .unwrap();

        let profile = gate.load_profile(session.user_id).await.unwrap().unwrap();
        assert_eq!(
            resolve_route_access("/dashboard", Some(&session), Some(&profile)),
            RouteAccess::Redirect(COMPLETE_PROFILE_PATH)
        );

        gate.update_profile(
            session.user_id,
            ProfilePatch {
                role: Some(Role::Student),
                student_id: Some("S-2291".to_string()),
                department: Some("CSE".to_string()),
                year_of_study: Some(2),
                ..ProfilePatch::default()
            },
        )
        .await
        .unwrap();

        let profile = gate.load_profile(session.user_id).await.unwrap().unwrap();
        assert_eq!(
            resolve_route_access("/dashboard", Some(&session), Some(&profile)),
            RouteAccess::Allow
        );
    }

    #[tokio::test]
    async fn empty_required_values_are_rejected_before_the_store_is_touched() {
        let (gate, _auth, _store) = gate();
        let session = gate
            .sign_up("asha@campus.edu", "hunter2", signup_fields())
            .await
            .unwrap();

        let err = gate
            .update_profile(
                session.user_id,
                ProfilePatch { student_id: Some("  ".to_string()), ..ProfilePatch::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingField("student_id")));

        let err = gate
            .update_profile(
                session.user_id,
                ProfilePatch { year_of_study: Some(9), ..ProfilePatch::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field: "year_of_study", .. }));
    }

    #[tokio::test]
    async fn federated_completion_creates_the_profile_lazily() {
        let (gate, _auth, store) = gate();
        let url = gate.begin_federated_sign_in().await.unwrap();
        assert!(url.starts_with("https://"));

        let session = gate.complete_federated_sign_in("ravi@campus.edu").await.unwrap();
        let profile = store.get_profile(session.user_id).await.unwrap();
        assert_eq!(profile.full_name, "ravi");
        assert!(!profile.is_complete());

        // A second completion reuses the existing profile.
        let again = gate.complete_federated_sign_in("ravi@campus.edu").await.unwrap();
        assert_eq!(again.user_id, session.user_id);
    }
}
