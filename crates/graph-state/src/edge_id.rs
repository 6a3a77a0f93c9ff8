// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Edge identifier generation.
//!
//! Edge ids are bookkeeping only; they never take part in canonical ordering.
//! The generator is injectable so tests can pin sequences, and the process
//! default is an atomic counter so concurrent construction never hands out
//! the same id twice.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of an edge, unique per generator.
pub type EdgeId = u64;

/// Source of edge ids.
pub trait EdgeIdGenerator: Send + Sync {
    /// Next id, or `None` when the generator only accepts caller-supplied ids.
    fn next_id(&self) -> Option<EdgeId>;

    /// Whether ids are assigned automatically.
    fn auto_ids(&self) -> bool;
}

/// Monotonic atomic counter.
#[derive(Debug)]
pub struct EdgeIds {
    next: AtomicU64,
    auto_ids: bool,
}

impl EdgeIds {
    /// A counter whose first id is `first`.
    pub const fn starting_at(first: EdgeId) -> Self {
        Self {
            next: AtomicU64::new(first),
            auto_ids: true,
        }
    }

    /// A generator that never assigns ids; every edge must bring its own.
    pub const fn caller_supplied() -> Self {
        Self {
            next: AtomicU64::new(0),
            auto_ids: false,
        }
    }
}

impl Default for EdgeIds {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

impl EdgeIdGenerator for EdgeIds {
    fn next_id(&self) -> Option<EdgeId> {
        self.auto_ids
            .then(|| self.next.fetch_add(1, Ordering::Relaxed))
    }

    fn auto_ids(&self) -> bool {
        self.auto_ids
    }
}

static GLOBAL_EDGE_IDS: EdgeIds = EdgeIds::starting_at(0);

/// Process-wide generator used by [`EdgeBuilder::build`](crate::EdgeBuilder::build).
pub fn global_edge_ids() -> &'static EdgeIds {
    &GLOBAL_EDGE_IDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_monotonic() {
        let ids = EdgeIds::starting_at(10);
        assert_eq!(ids.next_id(), Some(10));
        assert_eq!(ids.next_id(), Some(11));
        assert!(ids.auto_ids());
    }

    #[test]
    fn caller_supplied_generator_hands_out_nothing() {
        let ids = EdgeIds::caller_supplied();
        assert_eq!(ids.next_id(), None);
        assert!(!ids.auto_ids());
    }

    #[test]
    fn global_ids_are_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..100)
                        .filter_map(|_| global_edge_ids().next_id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut all: Vec<EdgeId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_default())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
        assert_eq!(total, 400);
    }
}
