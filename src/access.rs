use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::error::Result;
use crate::store::{self, DirectoryStore};

/// Identity presented with a mutating command. The lifecycle engines do not
/// interpret it beyond handing it to the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Username(String),
    UserId(Uuid),
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principal::Username(name) => write!(f, "{}", name),
            Principal::UserId(id) => write!(f, "{}", id),
        }
    }
}

/// Capability check gating organization-scoped mutations.
pub trait AccessGate: Send + Sync {
    /// Whether the principal may act on behalf of the organization. A store
    /// or lookup failure propagates as an error; a plain `false` is reported
    /// to the caller as Forbidden by the lifecycle engine.
    fn is_member(&self, organization_id: Uuid, principal: &Principal) -> Result<bool>;
}

/// Gate answering from the organization_responsible relation.
pub struct StoreGate<S> {
    store: Arc<Mutex<S>>,
}

impl<S> StoreGate<S> {
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self { store }
    }
}

impl<S: DirectoryStore + Send> AccessGate for StoreGate<S> {
    fn is_member(&self, organization_id: Uuid, principal: &Principal) -> Result<bool> {
        let mut store = store::lock(&self.store)?;
        store.is_responsible(organization_id, principal)
    }
}

/// Fixed-answer gate for lifecycle tests.
#[cfg(test)]
pub struct StaticGate(pub bool);

#[cfg(test)]
impl AccessGate for StaticGate {
    fn is_member(&self, _organization_id: Uuid, _principal: &Principal) -> Result<bool> {
        Ok(self.0)
    }
}
