//! Application state shared by all handlers.

use std::sync::Arc;

use crate::auth::IdentityService;
use crate::services::Orchestrator;

/// Process-lifetime handles. Built once at startup, before the listener accepts
/// connections, and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub identity: Arc<IdentityService>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, identity: Arc<IdentityService>) -> Self {
        Self {
            orchestrator,
            identity,
        }
    }
}
