//! Per-key upload mutual exclusion.
//!
//! Serializes uploads targeting the same `(package, version)` pair so
//! that, after the first committer returns, later attempts observe
//! "already exists" deterministically. The catalog's uniqueness
//! constraint remains the correctness boundary (and the only one across
//! processes); the gate is the in-process fast path.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct GateSlot {
    lock: Arc<AsyncMutex<()>>,
    /// Holders plus waiters. The slot is removed when this reaches zero.
    claims: usize,
}

/// Keyed mutual-exclusion table.
///
/// The outer mutex only guards the table itself and is never held across
/// an await; waiting happens on the per-key async lock so a queued upload
/// suspends instead of pinning a worker thread.
#[derive(Default)]
pub struct UploadGate {
    slots: Mutex<HashMap<String, GateSlot>>,
}

impl UploadGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(package: &str, version: &str) -> String {
        format!("{package}@{version}")
    }

    /// Wait for exclusive access to the key. The returned permit releases
    /// on drop.
    pub async fn acquire(&self, package: &str, version: &str) -> UploadPermit<'_> {
        let key = Self::key(package, version);
        let lock = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(key.clone()).or_insert_with(|| GateSlot {
                lock: Arc::new(AsyncMutex::new(())),
                claims: 0,
            });
            slot.claims += 1;
            Arc::clone(&slot.lock)
        };

        // The permit is registered before the await: if the caller is
        // cancelled while queued, its drop still surrenders the claim.
        let mut permit = UploadPermit {
            gate: self,
            key,
            guard: None,
        };
        permit.guard = Some(lock.lock_owned().await);
        permit
    }

    fn surrender(&self, key: &str) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(key) {
            slot.claims -= 1;
            if slot.claims == 0 {
                slots.remove(key);
            }
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Exclusive hold on one `(package, version)` key.
pub struct UploadPermit<'a> {
    gate: &'a UploadGate,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UploadPermit<'_> {
    fn drop(&mut self) {
        // Unlock first, then drop the claim; a queued waiter must never
        // observe its slot removed from the table.
        self.guard.take();
        self.gate.surrender(&self.key);
    }
}
