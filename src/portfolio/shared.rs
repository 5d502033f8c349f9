//! Thread-safe handle around a single allocator.

use super::{AllocationEntry, EwaAllocator};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Clonable allocator handle shared between the pipeline and readers.
///
/// An update holds the write lock for its whole read-blend-normalize cycle,
/// so readers never see a half-applied update and concurrent updates cannot
/// interleave. Poisoned locks are recovered since the weight map is only
/// ever replaced whole.
#[derive(Debug, Clone)]
pub struct SharedAllocator {
    inner: Arc<RwLock<EwaAllocator>>,
}

impl SharedAllocator {
    pub fn new(allocator: EwaAllocator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(allocator)),
        }
    }

    /// Apply one period of performance feedback.
    pub fn update(&self, performance: &HashMap<String, f64>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .update(performance);
    }

    /// Snapshot of the current weights.
    pub fn allocations(&self) -> HashMap<String, f64> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .allocations()
    }

    /// Snapshot of the current weights in configured order, sized against `capital`.
    pub fn entries(&self, capital: Decimal, precision: u32) -> Vec<AllocationEntry> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries(capital, precision)
    }

    /// Strategy identifiers in configured order.
    pub fn strategies(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .strategies()
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn shared(strategies: &[&str]) -> SharedAllocator {
        SharedAllocator::new(EwaAllocator::new(strategies.iter().copied(), None, None).unwrap())
    }

    #[test]
    fn test_clones_share_state() {
        let allocator = shared(&["A", "B"]);
        let reader = allocator.clone();

        allocator.update(&HashMap::from([("A".to_string(), 1.0)]));

        assert_eq!(reader.allocations(), allocator.allocations());
        assert!(reader.allocations()["A"] > 0.5);
    }

    #[test]
    fn test_concurrent_updates_and_reads() {
        let allocator = shared(&["A", "B", "C"]);
        let performance = HashMap::from([
            ("A".to_string(), 3.0),
            ("B".to_string(), 2.0),
            ("C".to_string(), 1.0),
        ]);

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let allocator = allocator.clone();
                let performance = performance.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        allocator.update(&performance);
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let allocator = allocator.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let weights = allocator.allocations();
                        assert_eq!(weights.len(), 3);
                        let sum: f64 = weights.values().sum();
                        assert!((sum - 1.0).abs() < 1e-9);
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        // Same input every time, so the final state equals 200 sequential updates
        let mut sequential = EwaAllocator::new(["A", "B", "C"], None, None).unwrap();
        for _ in 0..200 {
            sequential.update(&performance);
        }
        let concurrent = allocator.allocations();
        for (strategy, weight) in sequential.allocations() {
            assert!((concurrent[&strategy] - weight).abs() < 1e-9);
        }
    }

    #[test]
    fn test_strategies_in_order() {
        let allocator = shared(&["Z", "A", "M"]);
        assert_eq!(allocator.strategies(), vec!["Z", "A", "M"]);
    }
}
