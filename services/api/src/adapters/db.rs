//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `DataStore` and `AuthService` ports from the `core`
//! crate. It handles all interactions with the PostgreSQL backend using
//! `sqlx`, including credential verification with argon2.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use campus_portal_core::domain::{
    Announcement, Audience, NewProfile, Profile, ProfilePatch, Role, Session, Ticket, TicketStatus,
};
use campus_portal_core::ports::{AuthService, DataStore, PortError, PortResult};
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// How long a session token stays valid.
const SESSION_LIFETIME_DAYS: i64 = 30;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DataStore` and `AuthService` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    federated_auth_url: Option<String>,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool, federated_auth_url: Option<String>) -> Self {
        Self { pool, federated_auth_url }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn hash_password(password: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {e}")))?
            .to_string())
    }

    fn verify_password(password: &str, stored_hash: &str) -> PortResult<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| PortError::Unexpected(format!("Stored password hash is invalid: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    async fn open_session(&self, user_id: Uuid, email: &str) -> PortResult<Session> {
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(SESSION_LIFETIME_DAYS);
        sqlx::query(
            "INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Session { user_id, email: email.to_string(), token })
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRecord {
    user_id: Uuid,
    full_name: String,
    email: String,
    role: Option<String>,
    student_id: Option<String>,
    department: Option<String>,
    year_of_study: Option<i32>,
    phone_number: Option<String>,
}

impl ProfileRecord {
    fn to_domain(self) -> PortResult<Profile> {
        let role = match self.role {
            Some(raw) => Some(
                Role::parse(&raw)
                    .ok_or_else(|| PortError::Unexpected(format!("Unknown role '{raw}'")))?,
            ),
            None => None,
        };
        Ok(Profile {
            user_id: self.user_id,
            full_name: self.full_name,
            email: self.email,
            role,
            student_id: self.student_id,
            department: self.department,
            year_of_study: self.year_of_study,
            phone_number: self.phone_number,
        })
    }
}

#[derive(FromRow)]
struct TicketRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    status: String,
    updated_at: DateTime<Utc>,
}

impl TicketRecord {
    fn to_domain(self) -> PortResult<Ticket> {
        let status = TicketStatus::parse(&self.status)
            .ok_or_else(|| PortError::Unexpected(format!("Unknown ticket status '{}'", self.status)))?;
        Ok(Ticket {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            status,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AnnouncementRecord {
    id: Uuid,
    author_id: Uuid,
    title: String,
    content: String,
    audience: String,
    created_at: DateTime<Utc>,
}

impl AnnouncementRecord {
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

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    password_hash: Option<String>,
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for DbAdapter {
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<Session> {
        let password_hash = Self::hash_password(password)?;
        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.open_session(user_id, email).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Session> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })?;

        // Accounts created through the federated flow carry no local password.
        let stored_hash = record.password_hash.ok_or(PortError::Unauthorized)?;
        if !Self::verify_password(password, &stored_hash)? {
            return Err(PortError::Unauthorized);
        }

        self.open_session(record.id, email).await
    }

    async fn sign_out(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_session(&self, token: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })
    }

    async fn begin_federated_sign_in(&self) -> PortResult<String> {
        self.federated_auth_url.clone().ok_or_else(|| {
            PortError::Unexpected("No federated identity provider is configured".to_string())
        })
    }

    async fn complete_federated_sign_in(&self, email: &str) -> PortResult<Session> {
        // The provider's assertion was validated upstream; here we only map
        // the asserted identity to a local user, creating it on first sign-in.
        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (id, email) VALUES ($1, $2) \
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.open_session(user_id, email).await
    }
}

//=========================================================================================
// `DataStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DataStore for DbAdapter {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT user_id, full_name, email, role, student_id, department, year_of_study, phone_number \
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Profile for user {user_id} not found")),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn create_profile(
        &self,
        user_id: Uuid,
        email: &str,
        profile: NewProfile,
    ) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "INSERT INTO profiles (user_id, full_name, email, role, student_id, department, year_of_study, phone_number) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING user_id, full_name, email, role, student_id, department, year_of_study, phone_number",
        )
        .bind(user_id)
        .bind(&profile.full_name)
        .bind(email)
        .bind(profile.role.map(|r| r.as_str()))
        .bind(&profile.student_id)
        .bind(&profile.department)
        .bind(profile.year_of_study)
        .bind(&profile.phone_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "UPDATE profiles SET \
                 full_name = COALESCE($2, full_name), \
                 role = COALESCE($3, role), \
                 student_id = COALESCE($4, student_id), \
                 department = COALESCE($5, department), \
                 year_of_study = COALESCE($6, year_of_study), \
                 phone_number = COALESCE($7, phone_number), \
                 updated_at = now() \
             WHERE user_id = $1 \
             RETURNING user_id, full_name, email, role, student_id, department, year_of_study, phone_number",
        )
        .bind(user_id)
        .bind(&patch.full_name)
        .bind(patch.role.map(|r| r.as_str()))
        .bind(&patch.student_id)
        .bind(&patch.department)
        .bind(patch.year_of_study)
        .bind(&patch.phone_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Profile for user {user_id} not found")),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> PortResult<Ticket> {
        let record = sqlx::query_as::<_, TicketRecord>(
            "SELECT id, owner_id, title, description, status, updated_at \
             FROM tickets WHERE id = $1",
        )
        .bind(ticket_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Ticket {ticket_id} not found")),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn list_tickets_for(&self, owner_id: Uuid) -> PortResult<Vec<Ticket>> {
        let records = sqlx::query_as::<_, TicketRecord>(
            "SELECT id, owner_id, title, description, status, updated_at \
             FROM tickets WHERE owner_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(TicketRecord::to_domain).collect()
    }

    async fn create_ticket(
        &self,
        owner_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<Ticket> {
        let record = sqlx::query_as::<_, TicketRecord>(
            "INSERT INTO tickets (id, owner_id, title, description, status) \
             VALUES ($1, $2, $3, $4, 'open') \
             RETURNING id, owner_id, title, description, status, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> PortResult<Ticket> {
        let record = sqlx::query_as::<_, TicketRecord>(
            "UPDATE tickets SET status = $2, updated_at = now() WHERE id = $1 \
             RETURNING id, owner_id, title, description, status, updated_at",
        )
        .bind(ticket_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Ticket {ticket_id} not found")),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn insert_announcement(
        &self,
        author_id: Uuid,
        title: &str,
        content: &str,
        audience: Audience,
    ) -> PortResult<Announcement> {
        let record = sqlx::query_as::<_, AnnouncementRecord>(
            "INSERT INTO announcements (id, author_id, title, content, audience) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, author_id, title, content, audience, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(title)
        .bind(content)
        .bind(audience.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn list_announcements(&self) -> PortResult<Vec<Announcement>> {
        let records = sqlx::query_as::<_, AnnouncementRecord>(
            "SELECT id, author_id, title, content, audience, created_at \
             FROM announcements ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(AnnouncementRecord::to_domain).collect()
    }
}
