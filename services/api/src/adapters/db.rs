//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapters, the concrete implementations of
//! the `KeyValueStore` and `AuthenticationService` ports from the `core` crate.
//! They handle all interactions with the PostgreSQL database using `sqlx`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ianlanguage_core::domain::{AuthSession, Registration, SocialProvider};
use ianlanguage_core::ports::{AuthenticationService, KeyValueStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, info};
use uuid::Uuid;

/// A helper function to run database migrations at startup.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// Preferences
//=========================================================================================

/// Key-value storage scoped to one device.
#[derive(Clone)]
pub struct PgKeyValueStore {
    pool: PgPool,
    device_id: String,
}

impl PgKeyValueStore {
    pub fn new(pool: PgPool, device_id: impl Into<String>) -> Self {
        Self {
            pool,
            device_id: device_id.into(),
        }
    }
}

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let value: Option<(String,)> =
            sqlx::query_as("SELECT value FROM preferences WHERE device_id = $1 AND key = $2")
                .bind(&self.device_id)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(value.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO preferences (device_id, key, value) VALUES ($1, $2, $3) \
             ON CONFLICT (device_id, key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(&self.device_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    hashed_password: Option<String>,
}

#[derive(FromRow)]
struct AuthSessionRecord {
    id: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}
impl AuthSessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            id: self.id,
            user_id: self.user_id,
            expires_at: self.expires_at,
        }
    }
}

//=========================================================================================
// Accounts
//=========================================================================================

fn hash_password(password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            PortError::Unexpected("failed to hash password".to_string())
        })
}

fn verify_password(password: &str, stored: &str) -> PortResult<bool> {
    let parsed_hash = PasswordHash::new(stored).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        PortError::Unexpected("stored password hash is malformed".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Email and password accounts with expiring, database-backed sessions.
///
/// `session_id` is the value of the caller's session cookie, if any; it is
/// what [`current_session`](AuthenticationService::current_session) checks.
#[derive(Clone)]
pub struct DbAuthAdapter {
    pool: PgPool,
    session_ttl: chrono::Duration,
    session_id: Option<String>,
}

impl DbAuthAdapter {
    pub fn new(pool: PgPool, session_ttl: chrono::Duration, session_id: Option<String>) -> Self {
        Self {
            pool,
            session_ttl,
            session_id,
        }
    }

    async fn create_session(&self, user_id: Uuid) -> PortResult<AuthSession> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3) \
             RETURNING id, user_id, expires_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(Utc::now() + self.session_ttl)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }
}

#[async_trait]
impl AuthenticationService for DbAuthAdapter {
    async fn current_session(&self) -> PortResult<Option<AuthSession>> {
        let Some(session_id) = &self.session_id else {
            return Ok(None);
        };
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT id, user_id, expires_at FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(AuthSessionRecord::to_domain))
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthSession> {
        let creds = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)?;

        let Some(stored) = creds.hashed_password else {
            return Err(PortError::Unauthorized);
        };
        if !verify_password(password, &stored)? {
            return Err(PortError::Unauthorized);
        }
        self.create_session(creds.user_id).await
    }

    async fn sign_in_with_provider(&self, provider: SocialProvider) -> PortResult<AuthSession> {
        Err(PortError::Unavailable(format!(
            "{:?} sign-in is not configured",
            provider
        )))
    }

    async fn sign_up(&self, registration: &Registration) -> PortResult<AuthSession> {
        let password_hash = hash_password(&registration.password)?;
        let user_id: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO users (user_id, email, hashed_password, display_name) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO NOTHING RETURNING user_id",
        )
        .bind(Uuid::new_v4())
        .bind(&registration.email)
        .bind(&password_hash)
        .bind(&registration.display_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        let Some((user_id,)) = user_id else {
            debug!("Registration refused: email already in use");
            return Err(PortError::AlreadyExists(format!(
                "{} is already registered",
                registration.email
            )));
        };
        info!(%user_id, "Account created");
        self.create_session(user_id).await
    }

    async fn update_password(&self, email: &str, new_password: &str) -> PortResult<()> {
        let password_hash = hash_password(new_password)?;
        let result = sqlx::query("UPDATE users SET hashed_password = $1 WHERE email = $2")
            .bind(&password_hash)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("No account for {}", email)));
        }
        Ok(())
    }
}
