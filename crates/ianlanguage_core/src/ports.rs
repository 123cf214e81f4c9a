//! crates/ianlanguage_core/src/ports.rs
//!
//! Defines the service contracts (traits) the onboarding core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of a concrete storage engine, auth backend or UI shell.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{AuthSession, Registration, SocialProvider};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistent string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Must only return once the value is durable.
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;
}

#[async_trait]
pub trait AuthenticationService: Send + Sync {
    /// Reports whether the device already holds a live session.
    async fn current_session(&self) -> PortResult<Option<AuthSession>>;

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<AuthSession>;

    async fn sign_in_with_provider(&self, provider: SocialProvider) -> PortResult<AuthSession>;

    async fn sign_up(&self, registration: &Registration) -> PortResult<AuthSession>;

    async fn update_password(&self, email: &str, new_password: &str) -> PortResult<()>;
}

/// How a password-reset code reached the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Sent out-of-band (e.g. email).
    Sent,
    /// Not sent anywhere; the caller has to show the code on screen.
    Displayed,
}

#[async_trait]
pub trait CodeDelivery: Send + Sync {
    async fn deliver(&self, email: &str, code: &str) -> PortResult<Delivery>;
}

/// A screen the navigation collaborator can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Splash,
    Language,
    Welcome,
    Goals,
    Level,
    Login,
    Register,
    ForgotPassword,
    ProfileSetup,
    Home,
}

/// Performs screen transitions. Fire-and-forget.
pub trait Navigator: Send + Sync {
    /// Pushes `route` on top of the current screen.
    fn go_to(&self, route: Route);

    /// Replaces the current screen with `route`.
    fn replace(&self, route: Route);
}
