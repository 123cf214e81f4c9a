pub mod db;
pub mod delivery;
pub mod memory;
pub mod navigation;

pub use db::{DbAuthAdapter, PgKeyValueStore};
pub use delivery::{DemoCodeDelivery, UnavailableCodeDelivery};
pub use memory::{DemoAuthAdapter, DemoDirectory, MemoryKeyValueStore, MemoryPreferences};
pub use navigation::{NavigationEvent, NavigationKind, RecordingNavigator};
