// src/engine/port.rs

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Mutual exclusion around the contended server port.
///
/// Every unit's server binds the same port, so by default only one main
/// invocation may hold it. `isolated` lifts the lock for trees where each
/// unit binds its own port.
#[derive(Debug, Clone)]
pub struct PortLock {
    port: u16,
    permits: Option<Arc<Semaphore>>,
}

impl PortLock {
    pub fn exclusive(port: u16) -> Self {
        Self {
            port,
            permits: Some(Arc::new(Semaphore::new(1))),
        }
    }

    pub fn isolated(port: u16) -> Self {
        Self {
            port,
            permits: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait until `unit_id` may bind the port.
    pub async fn acquire(&self, unit_id: &str) -> PortToken {
        let permit = match &self.permits {
            // The semaphore is never closed, so acquisition only fails if
            // that invariant is broken; treat it as uncontended.
            Some(sem) => Arc::clone(sem).acquire_owned().await.ok(),
            None => None,
        };
        debug!(unit = %unit_id, port = self.port, exclusive = permit.is_some(), "port token acquired");
        PortToken {
            unit_id: unit_id.to_string(),
            port: self.port,
            _permit: permit,
        }
    }
}

/// Proof of ownership of the port; released on drop.
#[derive(Debug)]
pub struct PortToken {
    unit_id: String,
    port: u16,
    _permit: Option<OwnedSemaphorePermit>,
}

impl Drop for PortToken {
    fn drop(&mut self) {
        debug!(unit = %self.unit_id, port = self.port, "port token released");
    }
}
