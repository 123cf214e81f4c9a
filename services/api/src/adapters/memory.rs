//! services/api/src/adapters/memory.rs
//!
//! In-process adapters for demo mode and for tests. Nothing here survives a
//! restart.

use async_trait::async_trait;
use chrono::Utc;
use ianlanguage_core::domain::{AuthSession, Registration, SocialProvider};
use ianlanguage_core::ports::{AuthenticationService, KeyValueStore, PortError, PortResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//=========================================================================================
// Preferences
//=========================================================================================

/// Preferences for every device, keyed by `(device_id, key)`.
#[derive(Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<(String, String), String>>,
}

impl MemoryPreferences {
    /// A store that reads and writes one device's entries.
    pub fn for_device(self: &Arc<Self>, device_id: &str) -> MemoryKeyValueStore {
        MemoryKeyValueStore {
            preferences: self.clone(),
            device_id: device_id.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct MemoryKeyValueStore {
    preferences: Arc<MemoryPreferences>,
    device_id: String,
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let values = locked(&self.preferences.values);
        Ok(values
            .get(&(self.device_id.clone(), key.to_string()))
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        locked(&self.preferences.values)
            .insert((self.device_id.clone(), key.to_string()), value.to_string());
        Ok(())
    }
}

//=========================================================================================
// Demo Authentication
//=========================================================================================

struct DemoAccount {
    user_id: Uuid,
    password: String,
}

/// Accounts and sessions shared by every demo flow.
#[derive(Default)]
pub struct DemoDirectory {
    accounts: Mutex<HashMap<String, DemoAccount>>,
    sessions: Mutex<HashMap<String, AuthSession>>,
}

impl DemoDirectory {
    fn issue_session(&self, user_id: Uuid, ttl: chrono::Duration) -> AuthSession {
        let session = AuthSession {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + ttl,
        };
        let mut sessions = locked(&self.sessions);
        let now = Utc::now();
        sessions.retain(|_, existing| existing.expires_at > now);
        sessions.insert(session.id.clone(), session.clone());
        session
    }
}

/// Authentication against [`DemoDirectory`]. Password updates wait for
/// `latency` to mimic a network round trip.
#[derive(Clone)]
pub struct DemoAuthAdapter {
    directory: Arc<DemoDirectory>,
    session_ttl: chrono::Duration,
    latency: Duration,
    session_id: Option<String>,
}

impl DemoAuthAdapter {
    pub fn new(
        directory: Arc<DemoDirectory>,
        session_ttl: chrono::Duration,
        latency: Duration,
        session_id: Option<String>,
    ) -> Self {
        Self {
            directory,
            session_ttl,
            latency,
            session_id,
        }
    }
}

#[async_trait]
impl AuthenticationService for DemoAuthAdapter {
    async fn current_session(&self) -> PortResult<Option<AuthSession>> {
        let Some(session_id) = &self.session_id else {
            return Ok(None);
        };
        let mut sessions = locked(&self.directory.sessions);
        match sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(Some(session.clone())),
            Some(_) => {
                sessions.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthSession> {
        let user_id = {
            let accounts = locked(&self.directory.accounts);
            match accounts.get(email) {
                Some(account) if account.password == password => account.user_id,
                _ => return Err(PortError::Unauthorized),
            }
        };
        Ok(self.directory.issue_session(user_id, self.session_ttl))
    }

    async fn sign_in_with_provider(&self, provider: SocialProvider) -> PortResult<AuthSession> {
        info!(?provider, "Demo social sign-in");
        Ok(self.directory.issue_session(Uuid::new_v4(), self.session_ttl))
    }

    async fn sign_up(&self, registration: &Registration) -> PortResult<AuthSession> {
        let user_id = {
            let mut accounts = locked(&self.directory.accounts);
            if accounts.contains_key(&registration.email) {
                return Err(PortError::AlreadyExists(format!(
                    "{} is already registered",
                    registration.email
                )));
            }
            let user_id = Uuid::new_v4();
            accounts.insert(
                registration.email.clone(),
                DemoAccount {
                    user_id,
                    password: registration.password.clone(),
                },
            );
            user_id
        };
        Ok(self.directory.issue_session(user_id, self.session_ttl))
    }

    async fn update_password(&self, email: &str, new_password: &str) -> PortResult<()> {
        tokio::time::sleep(self.latency).await;
        // Unknown emails succeed too, so the demo never reveals which
        // addresses have accounts.
        if let Some(account) = locked(&self.directory.accounts).get_mut(email) {
            account.password = new_password.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(directory: &Arc<DemoDirectory>, session_id: Option<String>) -> DemoAuthAdapter {
        DemoAuthAdapter::new(
            directory.clone(),
            chrono::Duration::days(30),
            Duration::ZERO,
            session_id,
        )
    }

    #[tokio::test]
    async fn preferences_are_scoped_per_device() {
        let preferences = Arc::new(MemoryPreferences::default());
        let phone = preferences.for_device("phone");
        let tablet = preferences.for_device("tablet");

        phone.set("lang", "vi").await.unwrap();

        assert_eq!(phone.get("lang").await.unwrap().as_deref(), Some("vi"));
        assert_eq!(tablet.get("lang").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_and_reuse_session() {
        let directory = Arc::new(DemoDirectory::default());
        let auth = adapter(&directory, None);
        let registration = Registration {
            email: "ian@example.com".to_string(),
            password: "abc123".to_string(),
            display_name: None,
        };

        let created = auth.sign_up(&registration).await.unwrap();
        assert!(matches!(
            auth.sign_up(&registration).await,
            Err(PortError::AlreadyExists(_))
        ));
        assert!(matches!(
            auth.sign_in("ian@example.com", "wrong1").await,
            Err(PortError::Unauthorized)
        ));
        let signed_in = auth.sign_in("ian@example.com", "abc123").await.unwrap();
        assert_eq!(signed_in.user_id, created.user_id);

        let returning = adapter(&directory, Some(signed_in.id.clone()));
        assert_eq!(returning.current_session().await.unwrap(), Some(signed_in));
        assert_eq!(auth.current_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn password_update_changes_the_credentials() {
        let directory = Arc::new(DemoDirectory::default());
        let auth = adapter(&directory, None);
        auth.sign_up(&Registration {
            email: "ian@example.com".to_string(),
            password: "abc123".to_string(),
            display_name: None,
        })
        .await
        .unwrap();

        auth.update_password("ian@example.com", "xyz789").await.unwrap();

        assert!(auth.sign_in("ian@example.com", "abc123").await.is_err());
        assert!(auth.sign_in("ian@example.com", "xyz789").await.is_ok());
        assert!(auth.update_password("nobody@example.com", "xyz789").await.is_ok());
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped() {
        let directory = Arc::new(DemoDirectory::default());
        let expired = DemoAuthAdapter::new(
            directory.clone(),
            chrono::Duration::seconds(-1),
            Duration::ZERO,
            None,
        );
        let stale = expired
            .sign_in_with_provider(SocialProvider::Google)
            .await
            .unwrap();
        expired
            .sign_in_with_provider(SocialProvider::Google)
            .await
            .unwrap();
        assert_eq!(locked(&directory.sessions).len(), 1);

        let returning = adapter(&directory, Some(stale.id.clone()));
        let other = locked(&directory.sessions).keys().next().cloned();
        assert_eq!(returning.current_session().await.unwrap(), None);
        adapter(&directory, other).current_session().await.unwrap();
        assert!(locked(&directory.sessions).is_empty());

        adapter(&directory, None)
            .sign_in_with_provider(SocialProvider::Google)
            .await
            .unwrap();
        assert_eq!(locked(&directory.sessions).len(), 1);
    }
}
