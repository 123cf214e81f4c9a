//! The language-selection state shared by every screen.
//!
//! Screens hold an `Arc<LocalizationStore>` and either read `resolve()` when
//! they render or follow `subscribe()`/`changes()` to re-render on updates.

use futures::Stream;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{LanguageCode, LocalizationState};
use crate::i18n::pack::{LocalePack, Translations};
use crate::ports::KeyValueStore;

/// Storage keys for the two language preferences.
pub mod storage_keys {
    pub const NATIVE_LANGUAGE: &str = "@ianlanguage_native_lang";
    pub const TARGET_LANGUAGE: &str = "@ianlanguage_target_lang";
}

/// Whether a language change reached persistent storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Persisted,
    /// Storage failed; the change is live but will not survive a restart.
    MemoryOnly,
}

pub struct LocalizationStore {
    storage: Arc<dyn KeyValueStore>,
    translations: Arc<Translations>,
    state: watch::Sender<LocalizationState>,
    ready: AtomicBool,
}

impl LocalizationStore {
    /// Creates a store holding the default languages. Call [`initialize`](Self::initialize)
    /// to adopt the persisted ones.
    pub fn new(storage: Arc<dyn KeyValueStore>, translations: Arc<Translations>) -> Self {
        let (state, _) = watch::channel(LocalizationState::default());
        Self {
            storage,
            translations,
            state,
            ready: AtomicBool::new(false),
        }
    }

    /// Adopts the persisted languages. Never fails: unreadable or unknown values
    /// keep the defaults.
    pub async fn initialize(&self) {
        let native = self.load(storage_keys::NATIVE_LANGUAGE).await;
        let target = self.load(storage_keys::TARGET_LANGUAGE).await;

        self.state.send_modify(|state| {
            if let Some(code) = native {
                state.native_language = code;
            }
            if let Some(code) = target {
                state.target_language = code;
            }
        });
        self.ready.store(true, Ordering::Release);

        let state = self.state();
        info!(
            native = %state.native_language,
            target = %state.target_language,
            "Localization initialized"
        );
    }

    async fn load(&self, key: &str) -> Option<LanguageCode> {
        match self.storage.get(key).await {
            Ok(Some(raw)) => match raw.parse::<LanguageCode>() {
                Ok(code) => Some(code),
                Err(e) => {
                    warn!(key, "Ignoring stored language preference: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, "Failed to read language preference: {:?}", e);
                None
            }
        }
    }

    /// False until [`initialize`](Self::initialize) has finished.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn state(&self) -> LocalizationState {
        *self.state.borrow()
    }

    pub async fn set_native_language(&self, code: LanguageCode) -> SaveOutcome {
        let outcome = self.persist(storage_keys::NATIVE_LANGUAGE, code).await;
        self.state.send_modify(|state| state.native_language = code);
        outcome
    }

    pub async fn set_target_language(&self, code: LanguageCode) -> SaveOutcome {
        let outcome = self.persist(storage_keys::TARGET_LANGUAGE, code).await;
        self.state.send_modify(|state| state.target_language = code);
        self.warn_if_equal();
        outcome
    }

    async fn persist(&self, key: &str, code: LanguageCode) -> SaveOutcome {
        match self.storage.set(key, code.as_str()).await {
            Ok(()) => {
                debug!(key, language = %code, "Language preference saved");
                SaveOutcome::Persisted
            }
            Err(e) => {
                warn!(
                    key,
                    language = %code,
                    "Failed to save language preference; keeping it in memory only: {:?}", e
                );
                SaveOutcome::MemoryOnly
            }
        }
    }

    // The flow never offers the native language as a target, but the setters
    // accept any pair.
    fn warn_if_equal(&self) {
        let state = self.state();
        if state.native_language == state.target_language {
            warn!(
                language = %state.native_language,
                "Native and target language are the same"
            );
        }
    }

    /// The pack for the current native language.
    pub fn resolve(&self) -> &LocalePack {
        self.translations
            .pack_or_default(self.state.borrow().native_language)
    }

    pub fn translations(&self) -> &Arc<Translations> {
        &self.translations
    }

    /// A receiver that observes every language change.
    pub fn subscribe(&self) -> watch::Receiver<LocalizationState> {
        self.state.subscribe()
    }

    /// The language changes made after this call, as a stream.
    pub fn changes(&self) -> impl Stream<Item = LocalizationState> {
        futures::stream::unfold(self.subscribe(), |mut receiver| async move {
            receiver.changed().await.ok()?;
            let state = *receiver.borrow_and_update();
            Some((state, receiver))
        })
    }
}
