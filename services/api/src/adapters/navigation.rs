//! services/api/src/adapters/navigation.rs
//!
//! The HTTP client owns the real screen stack, so navigation requests are
//! recorded and returned with the next response.

use ianlanguage_core::ports::{Navigator, Route};
use serde::Serialize;
use std::sync::Mutex;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    Push,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavigationEvent {
    pub kind: NavigationKind,
    #[schema(value_type = String, example = "welcome")]
    pub route: Route,
}

#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavigationEvent>>,
}

impl RecordingNavigator {
    /// Returns and forgets everything recorded so far.
    pub fn drain(&self) -> Vec<NavigationEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn record(&self, kind: NavigationKind, route: Route) {
        let event = NavigationEvent { kind, route };
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, route: Route) {
        self.record(NavigationKind::Push, route);
    }

    fn replace(&self, route: Route) {
        self.record(NavigationKind::Replace, route);
    }
}
