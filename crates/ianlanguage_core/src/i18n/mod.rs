//! Localization: static locale packs and the live language selection.

pub mod pack;
pub mod store;

pub use pack::{I18nError, LocalePack, Translations};
pub use store::{storage_keys, LocalizationStore, SaveOutcome};
