//! # statusdeck-http
//!
//! The HTTP surface of statusdeck: exact-path routing over hyper 1.0, the
//! platform CRUD endpoints, the aggregated status endpoint, and the
//! shared-credential auth gate. The core crate stays protocol-agnostic;
//! everything request-shaped lives here.

use std::sync::Arc;

use statusdeck_core::{Aggregator, Registry};
use statusdeck_store::PlatformStore;

pub mod auth;
pub mod ingress;
pub mod routes;

pub use auth::{AuthConfig, AuthError, AuthGate};
pub use ingress::Server;

/// Everything a request handler can reach, shared behind an `Arc`.
pub struct AppState {
    pub store: PlatformStore,
    pub registry: Arc<Registry>,
    pub aggregator: Aggregator,
    pub auth: AuthGate,
}

impl AppState {
    pub fn new(store: PlatformStore, registry: Arc<Registry>, auth: AuthGate) -> Self {
        let aggregator = Aggregator::new(registry.clone());
        Self {
            store,
            registry,
            aggregator,
            auth,
        }
    }
}
