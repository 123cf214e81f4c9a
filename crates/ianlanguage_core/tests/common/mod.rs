#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

use ianlanguage_core::domain::{AuthSession, Registration, SocialProvider};
use ianlanguage_core::flow::{Collaborators, FlowOptions, OnboardingFlowController};
use ianlanguage_core::i18n::{LocalizationStore, Translations};
use ianlanguage_core::ports::{
    AuthenticationService, CodeDelivery, Delivery, KeyValueStore, Navigator, PortError, PortResult,
    Route,
};

pub fn session() -> AuthSession {
    AuthSession {
        id: Uuid::new_v4().to_string(),
        user_id: Uuid::new_v4(),
        expires_at: Utc::now() + Duration::days(30),
    }
}

//=========================================================================================
// Storage
//=========================================================================================

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with(values: &[(&str, &str)]) -> Self {
        let store = Self::default();
        {
            let mut map = store.values.lock().unwrap();
            for (key, value) in values {
                map.insert(key.to_string(), value.to_string());
            }
        }
        store
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("storage offline".to_string()));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("storage offline".to_string()));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

//=========================================================================================
// Auth
//=========================================================================================

/// Auth backend with scripted answers. When `gated` is set, `sign_in`
/// signals `entered` and waits for `release` before answering.
#[derive(Default)]
pub struct ScriptedAuth {
    pub existing_session: Mutex<Option<AuthSession>>,
    pub fail_session_check: AtomicBool,
    pub reject_sign_in: AtomicBool,
    pub fail_update_password: AtomicBool,
    pub gated: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
    pub sign_in_calls: AtomicUsize,
    pub sign_up_calls: AtomicUsize,
    pub registrations: Mutex<Vec<(String, Option<String>)>>,
    pub password_updates: Mutex<Vec<(String, String)>>,
}

impl ScriptedAuth {
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthenticationService for ScriptedAuth {
    async fn current_session(&self) -> PortResult<Option<AuthSession>> {
        if self.fail_session_check.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("auth offline".to_string()));
        }
        Ok(self.existing_session.lock().unwrap().clone())
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> PortResult<AuthSession> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.reject_sign_in.load(Ordering::SeqCst) {
            return Err(PortError::Unauthorized);
        }
        Ok(session())
    }

    async fn sign_in_with_provider(&self, _provider: SocialProvider) -> PortResult<AuthSession> {
        Ok(session())
    }

    async fn sign_up(&self, registration: &Registration) -> PortResult<AuthSession> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        let mut registrations = self.registrations.lock().unwrap();
        if registrations.iter().any(|(email, _)| *email == registration.email) {
            return Err(PortError::AlreadyExists(registration.email.clone()));
        }
        registrations.push((registration.email.clone(), registration.display_name.clone()));
        Ok(session())
    }

    async fn update_password(&self, email: &str, new_password: &str) -> PortResult<()> {
        if self.fail_update_password.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("auth offline".to_string()));
        }
        self.password_updates
            .lock()
            .unwrap()
            .push((email.to_string(), new_password.to_string()));
        Ok(())
    }
}

//=========================================================================================
// Code delivery and navigation
//=========================================================================================

/// Keeps every delivered code so tests can type it back.
pub struct CapturingDelivery {
    pub mode: Delivery,
    pub fail: AtomicBool,
    pub codes: Mutex<Vec<(String, String)>>,
}

impl CapturingDelivery {
    pub fn new(mode: Delivery) -> Self {
        Self {
            mode,
            fail: AtomicBool::new(false),
            codes: Mutex::new(Vec::new()),
        }
    }

    pub fn last_code(&self) -> Option<String> {
        self.codes.lock().unwrap().last().map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl CodeDelivery for CapturingDelivery {
    async fn deliver(&self, email: &str, code: &str) -> PortResult<Delivery> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("mailer offline".to_string()));
        }
        self.codes
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(self.mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Push(Route),
    Replace(Route),
}

#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<Nav>>,
}

impl RecordingNavigator {
    pub fn events(&self) -> Vec<Nav> {
        self.events.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Nav> {
        self.events.lock().unwrap().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, route: Route) {
        self.events.lock().unwrap().push(Nav::Push(route));
    }

    fn replace(&self, route: Route) {
        self.events.lock().unwrap().push(Nav::Replace(route));
    }
}

//=========================================================================================
// Harness
//=========================================================================================

pub struct Harness {
    pub storage: Arc<MemoryStore>,
    pub auth: Arc<ScriptedAuth>,
    pub delivery: Arc<CapturingDelivery>,
    pub navigator: Arc<RecordingNavigator>,
    pub localization: Arc<LocalizationStore>,
    pub flow: Arc<OnboardingFlowController>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(MemoryStore::default(), FlowOptions::default(), Delivery::Displayed)
    }

    pub fn build(storage: MemoryStore, options: FlowOptions, delivery: Delivery) -> Self {
        let storage = Arc::new(storage);
        let auth = Arc::new(ScriptedAuth::default());
        let delivery = Arc::new(CapturingDelivery::new(delivery));
        let navigator = Arc::new(RecordingNavigator::default());
        let translations = Arc::new(Translations::embedded().unwrap());
        let localization = Arc::new(LocalizationStore::new(storage.clone(), translations));
        let flow = Arc::new(OnboardingFlowController::new(
            localization.clone(),
            Collaborators {
                auth: auth.clone(),
                delivery: delivery.clone(),
                navigator: navigator.clone(),
            },
            options,
        ));
        Self {
            storage,
            auth,
            delivery,
            navigator,
            localization,
            flow,
        }
    }
}
