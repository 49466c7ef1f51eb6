//! # Capability registry: the run-scoped record of what has been provided.
//!
//! One [`CapabilityRegistry`] is created at the start of every run and handed
//! to each launch attempt as an `Arc`. It is dropped when the run ends.
//!
//! ## Architecture
//! ```text
//! LaunchActor(A) ── provide([net]) ──► RwLock<HashSet<Capability>>  (write lock, instant)
//!                                  └─► watch::Sender<u64> generation += 1
//!                                                │
//! LaunchActor(B) ◄── changed() ──────────────────┘
//!        └─► satisfies([net]) (read lock, instant)
//! ```
//!
//! ## Rules
//! - Capabilities are only ever added during a run (no retraction).
//! - Locks are held for a single read or write, never across an `.await` point
//!   other than the lock acquisition itself.
//! - The generation is bumped **after** the write lock is released, so a woken
//!   waiter always sees the new capabilities.

use std::collections::HashSet;

use tokio::sync::{RwLock, watch};

use crate::services::Capability;

/// Concurrency-safe, grow-only set of provided capabilities.
#[derive(Debug)]
pub struct CapabilityRegistry {
    provided: RwLock<HashSet<Capability>>,
    generation: watch::Sender<u64>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let (generation, _rx) = watch::channel(0);
        Self {
            provided: RwLock::new(HashSet::new()),
            generation,
        }
    }

    /// Marks `caps` as present and wakes waiters.
    ///
    /// Returns the capabilities that were not present before.
    pub async fn provide<'a, I>(&self, caps: I) -> Vec<Capability>
    where
        I: IntoIterator<Item = &'a Capability>,
    {
        let added: Vec<Capability> = {
            let mut provided = self.provided.write().await;
            caps.into_iter()
                .filter(|cap| provided.insert((*cap).clone()))
                .cloned()
                .collect()
        };
        if !added.is_empty() {
            self.generation.send_modify(|g| *g += 1);
        }
        added
    }

    /// Returns true if `cap` has been provided.
    pub async fn contains(&self, cap: &str) -> bool {
        self.provided.read().await.contains(cap)
    }

    /// Returns true if every capability in `needs` has been provided.
    pub async fn satisfies<'a, I>(&self, needs: I) -> bool
    where
        I: IntoIterator<Item = &'a Capability>,
    {
        let provided = self.provided.read().await;
        needs.into_iter().all(|cap| provided.contains(cap))
    }

    /// Returns the capabilities of `needs` that are still absent, in iteration order.
    pub async fn missing<'a, I>(&self, needs: I) -> Vec<Capability>
    where
        I: IntoIterator<Item = &'a Capability>,
    {
        let provided = self.provided.read().await;
        needs
            .into_iter()
            .filter(|cap| !provided.contains(*cap))
            .cloned()
            .collect()
    }

    /// Returns a sorted snapshot of the provided capabilities.
    pub async fn snapshot(&self) -> Vec<Capability> {
        let mut caps: Vec<Capability> = self.provided.read().await.iter().cloned().collect();
        caps.sort_unstable();
        caps
    }

    /// Returns a receiver that observes every publish (generation bump).
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(tokens: &[&str]) -> Vec<Capability> {
        tokens.iter().map(|t| Capability::from(*t)).collect()
    }

    #[tokio::test]
    async fn provide_is_grow_only_and_reports_new() {
        let reg = CapabilityRegistry::new();
        assert_eq!(reg.provide(&caps(&["net", "db"])).await, caps(&["net", "db"]));
        assert_eq!(reg.provide(&caps(&["db", "queue"])).await, caps(&["queue"]));
        assert!(reg.contains("net").await);
        assert_eq!(reg.snapshot().await, caps(&["db", "net", "queue"]));
    }

    #[tokio::test]
    async fn satisfies_and_missing() {
        let reg = CapabilityRegistry::new();
        let needs = caps(&["net", "db"]);
        assert!(reg.satisfies(&caps(&[])).await);
        assert!(!reg.satisfies(&needs).await);

        reg.provide(&caps(&["net"])).await;
        assert_eq!(reg.missing(&needs).await, caps(&["db"]));

        reg.provide(&caps(&["db"])).await;
        assert!(reg.satisfies(&needs).await);
        assert!(reg.missing(&needs).await.is_empty());
    }

    #[tokio::test]
    async fn publish_wakes_subscribers_once_per_change() {
        let reg = CapabilityRegistry::new();
        let mut rx = reg.subscribe();
        assert!(!rx.has_changed().unwrap());

        reg.provide(&caps(&["net"])).await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        // Re-providing an existing capability is not a change.
        reg.provide(&caps(&["net"])).await;
        assert!(!rx.has_changed().unwrap());
    }
}
