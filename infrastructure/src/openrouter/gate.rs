//! Process-wide admission control for upstream requests.

use council_application::GatewayError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate capping simultaneous upstream requests.
///
/// Construct once at startup and clone the handle into every client that
/// should share the cap. A slot is held for as long as the returned
/// [`GatePermit`] lives, so release happens on every exit path.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One admitted request. Dropping it frees the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots free right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a free slot. Waiters are not served in any particular order.
    pub async fn acquire(&self) -> Result<GatePermit, GatewayError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GatewayError::Other("concurrency gate closed".to_string()))?;
        Ok(GatePermit { _permit: permit })
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(2)
    }
}
