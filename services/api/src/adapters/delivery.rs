//! services/api/src/adapters/delivery.rs

use async_trait::async_trait;
use ianlanguage_core::ports::{CodeDelivery, Delivery, PortError, PortResult};
use tracing::{info, warn};

/// Hands the reset code back to the flow so the screen can show it.
/// No email is sent.
#[derive(Clone, Copy, Debug, Default)]
pub struct DemoCodeDelivery;

#[async_trait]
impl CodeDelivery for DemoCodeDelivery {
    async fn deliver(&self, _email: &str, _code: &str) -> PortResult<Delivery> {
        info!("Reset code will be displayed on screen");
        Ok(Delivery::Displayed)
    }
}

/// Used when accounts are real but no email transport is configured. Every
/// delivery fails, so a reset code never leaves the server.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableCodeDelivery;

#[async_trait]
impl CodeDelivery for UnavailableCodeDelivery {
    async fn deliver(&self, _email: &str, _code: &str) -> PortResult<Delivery> {
        warn!("Password reset requested but no email transport is configured");
        Err(PortError::Unavailable(
            "reset code delivery is not configured".to_string(),
        ))
    }
}
