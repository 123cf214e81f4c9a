mod common;

use futures::StreamExt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::MemoryStore;
use ianlanguage_core::domain::{LanguageCode, LocalizationState};
use ianlanguage_core::i18n::{storage_keys, LocalizationStore, SaveOutcome, Translations};

fn store_over(storage: Arc<MemoryStore>) -> LocalizationStore {
    LocalizationStore::new(storage, Arc::new(Translations::embedded().unwrap()))
}

#[tokio::test]
async fn starts_with_defaults_and_not_ready() {
    let store = store_over(Arc::new(MemoryStore::default()));
    assert!(!store.is_ready());
    assert_eq!(store.state(), LocalizationState::default());
    assert_eq!(store.state().native_language, LanguageCode::En);
    assert_eq!(store.state().target_language, LanguageCode::ZhCn);

    store.initialize().await;
    assert!(store.is_ready());
    assert_eq!(store.state(), LocalizationState::default());
}

#[tokio::test]
async fn initialize_adopts_persisted_languages() {
    let storage = Arc::new(MemoryStore::with(&[
        (storage_keys::NATIVE_LANGUAGE, "vi"),
        (storage_keys::TARGET_LANGUAGE, "zh-TW"),
    ]));
    let store = store_over(storage);

    store.initialize().await;

    assert_eq!(store.state().native_language, LanguageCode::Vi);
    assert_eq!(store.state().target_language, LanguageCode::ZhTw);
    assert_eq!(store.resolve().welcome.title, "Xin chào, mình là Ian!");
}

#[tokio::test]
async fn unknown_stored_values_keep_defaults() {
    let storage = Arc::new(MemoryStore::with(&[
        (storage_keys::NATIVE_LANGUAGE, "fr"),
        (storage_keys::TARGET_LANGUAGE, "zh-TW"),
    ]));
    let store = store_over(storage);

    store.initialize().await;

    assert!(store.is_ready());
    assert_eq!(store.state().native_language, LanguageCode::En);
    assert_eq!(store.state().target_language, LanguageCode::ZhTw);
}

#[tokio::test]
async fn unreadable_storage_still_becomes_ready() {
    let storage = Arc::new(MemoryStore::with(&[(storage_keys::NATIVE_LANGUAGE, "vi")]));
    storage.fail_reads.store(true, Ordering::SeqCst);
    let store = store_over(storage);

    store.initialize().await;

    assert!(store.is_ready());
    assert_eq!(store.state(), LocalizationState::default());
}

#[tokio::test]
async fn setters_persist_and_switch_the_pack() {
    let storage = Arc::new(MemoryStore::default());
    let store = store_over(storage.clone());
    store.initialize().await;

    assert_eq!(
        store.set_native_language(LanguageCode::ZhCn).await,
        SaveOutcome::Persisted
    );
    assert_eq!(
        store.set_target_language(LanguageCode::En).await,
        SaveOutcome::Persisted
    );

    assert_eq!(storage.value(storage_keys::NATIVE_LANGUAGE).as_deref(), Some("zh-CN"));
    assert_eq!(storage.value(storage_keys::TARGET_LANGUAGE).as_deref(), Some("en"));
    assert_eq!(store.resolve().welcome.title, "你好，我是 Ian！");

    // A fresh store over the same storage sees the same choice.
    let reopened = store_over(storage);
    reopened.initialize().await;
    assert_eq!(reopened.state(), store.state());
}

#[tokio::test]
async fn failed_write_keeps_the_change_in_memory() {
    let storage = Arc::new(MemoryStore::default());
    let store = store_over(storage.clone());
    store.initialize().await;
    storage.fail_writes.store(true, Ordering::SeqCst);

    let outcome = store.set_native_language(LanguageCode::Vi).await;

    assert_eq!(outcome, SaveOutcome::MemoryOnly);
    assert_eq!(store.state().native_language, LanguageCode::Vi);
    assert_eq!(storage.value(storage_keys::NATIVE_LANGUAGE), None);
}

#[tokio::test]
async fn store_accepts_equal_native_and_target() {
    let store = store_over(Arc::new(MemoryStore::default()));
    store.initialize().await;

    store.set_target_language(LanguageCode::En).await;

    assert_eq!(store.state().native_language, store.state().target_language);
}

#[tokio::test]
async fn subscribers_see_each_change() {
    let store = store_over(Arc::new(MemoryStore::default()));
    store.initialize().await;
    let mut receiver = store.subscribe();

    store.set_native_language(LanguageCode::ZhTw).await;

    receiver.changed().await.unwrap();
    assert_eq!(receiver.borrow_and_update().native_language, LanguageCode::ZhTw);
}

#[tokio::test]
async fn change_stream_yields_later_updates() {
    let store = store_over(Arc::new(MemoryStore::default()));
    store.initialize().await;
    let changes = store.changes();
    futures::pin_mut!(changes);

    store.set_target_language(LanguageCode::Vi).await;

    let next = tokio::time::timeout(Duration::from_secs(1), changes.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.target_language, LanguageCode::Vi);
}

#[tokio::test]
async fn every_language_pair_survives_a_restart() {
    for native in LanguageCode::ALL {
        for target in LanguageCode::target_options(native) {
            let storage = Arc::new(MemoryStore::default());
            let store = store_over(storage.clone());
            store.initialize().await;
            store.set_native_language(native).await;
            store.set_target_language(target).await;

            let reopened = store_over(storage);
            reopened.initialize().await;

            assert_eq!(
                reopened.state(),
                LocalizationState {
                    native_language: native,
                    target_language: target,
                },
                "pair {native} -> {target}"
            );
        }
    }
}

#[tokio::test]
async fn resolve_follows_the_native_language() {
    let translations = Arc::new(Translations::embedded().unwrap());
    let store = LocalizationStore::new(Arc::new(MemoryStore::default()), translations.clone());
    assert_eq!(
        store.resolve().home.welcome,
        translations.default_pack().home.welcome
    );

    store.set_native_language(LanguageCode::ZhTw).await;

    assert_eq!(
        store.resolve().common.next,
        translations.pack(LanguageCode::ZhTw).unwrap().common.next
    );
}
