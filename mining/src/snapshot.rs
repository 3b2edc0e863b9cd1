use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Totals of the most recently assembled template. Written at the end of each
/// build; readers take the value without synchronization and accept staleness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssemblySnapshot {
    pub num_txs: u64,
    pub weight: u64,
}

#[derive(Default)]
pub struct LastAssembly {
    inner: ArcSwapOption<AssemblySnapshot>,
}

impl LastAssembly {
    pub fn store(&self, snapshot: AssemblySnapshot) {
        self.inner.store(Some(Arc::new(snapshot)));
    }

    pub fn load(&self) -> Option<AssemblySnapshot> {
        self.inner.load_full().map(|snapshot| *snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_roundtrip() {
        let last = LastAssembly::default();
        assert_eq!(last.load(), None);
        last.store(AssemblySnapshot { num_txs: 3, weight: 4_500 });
        assert_eq!(last.load(), Some(AssemblySnapshot { num_txs: 3, weight: 4_500 }));
    }
}
