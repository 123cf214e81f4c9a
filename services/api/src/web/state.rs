//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-device flow state.

use crate::adapters::{
    DbAuthAdapter, DemoAuthAdapter, DemoCodeDelivery, DemoDirectory, MemoryPreferences,
    PgKeyValueStore, RecordingNavigator, UnavailableCodeDelivery,
};
use crate::config::{AuthMode, Config};
use ianlanguage_core::flow::{Collaborators, FlowOptions, OnboardingFlowController};
use ianlanguage_core::i18n::{LocalizationStore, Translations};
use ianlanguage_core::ports::{AuthenticationService, CodeDelivery, KeyValueStore};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// Backends
//=========================================================================================

/// Where language preferences are kept.
#[derive(Clone)]
pub enum PreferenceBackend {
    Postgres(PgPool),
    Memory(Arc<MemoryPreferences>),
}

/// Who signs users in.
#[derive(Clone)]
pub enum AuthBackend {
    Database(PgPool),
    Demo(Arc<DemoDirectory>),
}

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub translations: Arc<Translations>,
    pub preferences: PreferenceBackend,
    pub auth: AuthBackend,
    pub delivery: Arc<dyn CodeDelivery>,
    pub flows: Arc<FlowRegistry>,
}

impl AppState {
    /// State backed by Postgres. Accounts live in Postgres too unless the
    /// configured auth mode is `demo`; only then are reset codes shown on screen.
    pub fn with_database(config: Arc<Config>, translations: Arc<Translations>, pool: PgPool) -> Self {
        let flow_idle_timeout = config.flow_idle_timeout;
        let (auth, delivery): (AuthBackend, Arc<dyn CodeDelivery>) = match config.auth_mode {
            AuthMode::Production => (
                AuthBackend::Database(pool.clone()),
                Arc::new(UnavailableCodeDelivery),
            ),
            AuthMode::Demo => (
                AuthBackend::Demo(Arc::new(DemoDirectory::default())),
                Arc::new(DemoCodeDelivery),
            ),
        };
        Self {
            config,
            translations,
            preferences: PreferenceBackend::Postgres(pool),
            auth,
            delivery,
            flows: Arc::new(FlowRegistry::new(flow_idle_timeout)),
        }
    }

    /// State with nothing outside the process.
    pub fn in_memory(config: Arc<Config>, translations: Arc<Translations>) -> Self {
        let flow_idle_timeout = config.flow_idle_timeout;
        Self {
            config,
            translations,
            preferences: PreferenceBackend::Memory(Arc::new(MemoryPreferences::default())),
            auth: AuthBackend::Demo(Arc::new(DemoDirectory::default())),
            delivery: Arc::new(DemoCodeDelivery),
            flows: Arc::new(FlowRegistry::new(flow_idle_timeout)),
        }
    }

    pub fn storage_for(&self, device_id: &str) -> Arc<dyn KeyValueStore> {
        match &self.preferences {
            PreferenceBackend::Postgres(pool) => {
                Arc::new(PgKeyValueStore::new(pool.clone(), device_id))
            }
            PreferenceBackend::Memory(preferences) => Arc::new(preferences.for_device(device_id)),
        }
    }

    /// Authentication as seen by a caller holding `session_id`.
    pub fn auth_for(&self, session_id: Option<String>) -> Arc<dyn AuthenticationService> {
        let ttl = self.config.session_ttl;
        match &self.auth {
            AuthBackend::Database(pool) => {
                Arc::new(DbAuthAdapter::new(pool.clone(), ttl, session_id))
            }
            AuthBackend::Demo(directory) => Arc::new(DemoAuthAdapter::new(
                directory.clone(),
                ttl,
                self.config.demo_latency,
                session_id,
            )),
        }
    }

    /// Wires a fresh onboarding flow for one device.
    pub fn new_flow(&self, device_id: &str, session_id: Option<String>) -> FlowHandle {
        let localization = Arc::new(LocalizationStore::new(
            self.storage_for(device_id),
            self.translations.clone(),
        ));
        let navigator = Arc::new(RecordingNavigator::default());
        let controller = OnboardingFlowController::new(
            localization,
            Collaborators {
                auth: self.auth_for(session_id),
                delivery: self.delivery.clone(),
                navigator: navigator.clone(),
            },
            FlowOptions {
                profile_setup_after_register: self.config.profile_setup_after_register,
            },
        );
        FlowHandle {
            id: Uuid::new_v4(),
            device_id: device_id.to_string(),
            controller: Arc::new(controller),
            navigator,
        }
    }
}

//=========================================================================================
// Flows (One Per Onboarding Run)
//=========================================================================================

/// A running onboarding flow owned by one device.
#[derive(Clone)]
pub struct FlowHandle {
    pub id: Uuid,
    pub device_id: String,
    pub controller: Arc<OnboardingFlowController>,
    pub navigator: Arc<RecordingNavigator>,
}

struct TrackedFlow {
    flow: FlowHandle,
    last_used: Instant,
}

/// Flows that have not reached home yet. A device has at most one; flows
/// left idle past `idle_timeout` are dropped.
pub struct FlowRegistry {
    flows: RwLock<HashMap<Uuid, TrackedFlow>>,
    idle_timeout: Duration,
}

impl FlowRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            flows: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Registers `flow`, replacing any earlier flow of the same device.
    pub async fn insert(&self, flow: FlowHandle) {
        let mut flows = self.flows.write().await;
        let before = flows.len();
        flows.retain(|_, tracked| {
            tracked.flow.device_id != flow.device_id
                && tracked.last_used.elapsed() < self.idle_timeout
        });
        if flows.len() < before {
            debug!(dropped = before - flows.len(), "Dropped replaced or idle flows");
        }
        flows.insert(
            flow.id,
            TrackedFlow {
                flow,
                last_used: Instant::now(),
            },
        );
    }

    /// The flow `id`, if it exists, belongs to `device_id` and has not gone
    /// idle. A hit counts as use.
    pub async fn get(&self, id: Uuid, device_id: &str) -> Option<FlowHandle> {
        let mut flows = self.flows.write().await;
        let tracked = flows.get_mut(&id)?;
        if tracked.flow.device_id != device_id {
            return None;
        }
        if tracked.last_used.elapsed() >= self.idle_timeout {
            debug!(flow_id = %id, "Dropped idle flow");
            flows.remove(&id);
            return None;
        }
        tracked.last_used = Instant::now();
        Some(tracked.flow.clone())
    }

    pub async fn remove(&self, id: Uuid) {
        self.flows.write().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.flows.read().await.len()
    }
}
