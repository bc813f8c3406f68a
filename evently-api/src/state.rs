use std::sync::Arc;

use evently_domain::repository::{BookingLedger, EventCatalog};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn EventCatalog>,
    pub ledger: Arc<dyn BookingLedger>,
    pub auth: AuthConfig,
}
