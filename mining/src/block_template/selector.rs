//! Ancestor-package selection.
//!
//! The mempool is ordered by ancestor feerate, so absent any selection state
//! the best package is simply the next index entry. Once a transaction joins
//! the block, the remaining marginal feerate of its descendants can be far
//! better than their original ancestor feerate; the modified index captures
//! exactly that by shadowing those entries with decremented aggregates. Each
//! round compares the best of both orderings and commits the winner's full
//! ancestor package.

use crate::block_template::policy::Policy;
use crate::feerate::{AncestorFeerateKey, FeeRate};
use crate::mempool::{EntryId, Mempool, MempoolEntry};
use diadem_consensus_core::constants::{COINBASE_SIGOPS_RESERVED, COINBASE_WEIGHT_RESERVED, WITNESS_SCALE_FACTOR};
use diadem_consensus_core::tx::Transaction;
use diadem_core::debug;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Number of consecutive budget rejections after which selection gives up,
/// provided the block is already within one coinbase reservation of full.
const MAX_CONSECUTIVE_FAILURES: u64 = 1000;

pub(crate) struct SelectedEntry {
    pub tx: Arc<Transaction>,
    pub fee: u64,
    pub sigops_cost: u64,
}

#[derive(Default)]
pub(crate) struct SelectionResult {
    pub entries: Vec<SelectedEntry>,
    pub total_fees: u64,
    pub block_weight: u64,
    pub block_sigops: u64,
    pub tx_count: u64,
    pub packages_selected: u64,
    pub descendants_updated: u64,
}

/// A package candidate: one entry plus its not-yet-committed ancestor
/// aggregates, taken either from the mempool index or the modified index.
#[derive(Clone, Copy)]
struct Candidate {
    id: EntryId,
    vsize: u64,
    fees: u64,
    sigops: u64,
    from_modified: bool,
}

/// Shadow copy of an entry whose ancestor aggregates were decremented
/// because some ancestor is already committed to the block.
struct ModifiedEntry {
    key: AncestorFeerateKey,
    ancestor_vsize: u64,
    ancestor_mod_fees: u64,
    ancestor_sigops: u64,
}

impl ModifiedEntry {
    fn rebuild_key(&mut self) {
        self.key = AncestorFeerateKey { fees: self.ancestor_mod_fees, size: self.ancestor_vsize, txid: self.key.txid };
    }
}

#[derive(Default)]
struct ModifiedIndex {
    entries: HashMap<EntryId, ModifiedEntry>,
    order: BTreeSet<(AncestorFeerateKey, EntryId)>,
}

impl ModifiedIndex {
    fn contains(&self, id: EntryId) -> bool {
        self.entries.contains_key(&id)
    }

    fn best(&self) -> Option<(AncestorFeerateKey, Candidate)> {
        let (key, id) = self.order.first()?;
        let entry = self.entries.get(id)?;
        Some((
            *key,
            Candidate {
                id: *id,
                vsize: entry.ancestor_vsize,
                fees: entry.ancestor_mod_fees,
                sigops: entry.ancestor_sigops,
                from_modified: true,
            },
        ))
    }

    fn remove(&mut self, id: EntryId) {
        if let Some(entry) = self.entries.remove(&id) {
            self.order.remove(&(entry.key, id));
        }
    }

    /// Subtracts a newly committed ancestor's contribution from `id`,
    /// creating the shadow entry from `base` on first touch.
    fn decrement(&mut self, id: EntryId, base: &MempoolEntry, vsize: u64, fees: u64, sigops: u64) {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                self.order.remove(&(entry.key, id));
                entry.ancestor_vsize = entry.ancestor_vsize.saturating_sub(vsize);
                entry.ancestor_mod_fees = entry.ancestor_mod_fees.saturating_sub(fees);
                entry.ancestor_sigops = entry.ancestor_sigops.saturating_sub(sigops);
                entry.rebuild_key();
                self.order.insert((entry.key, id));
            }
            None => {
                let mut entry = ModifiedEntry {
                    key: base.feerate_key(),
                    ancestor_vsize: base.ancestor_vsize().saturating_sub(vsize),
                    ancestor_mod_fees: base.ancestor_mod_fees().saturating_sub(fees),
                    ancestor_sigops: base.ancestor_sigops().saturating_sub(sigops),
                };
                entry.rebuild_key();
                self.order.insert((entry.key, id));
                self.entries.insert(id, entry);
            }
        }
    }
}

pub(crate) struct TemplateSelector<'a> {
    mempool: &'a Mempool,
    policy: &'a Policy,
    height: u64,
    lock_time_cutoff: u64,
    include_witness: bool,

    in_block: HashSet<EntryId>,
    failed: HashSet<EntryId>,
    modified: ModifiedIndex,
    result: SelectionResult,
}

impl<'a> TemplateSelector<'a> {
    pub(crate) fn new(mempool: &'a Mempool, policy: &'a Policy, height: u64, lock_time_cutoff: u64, include_witness: bool) -> Self {
        Self {
            mempool,
            policy,
            height,
            lock_time_cutoff,
            include_witness,
            in_block: HashSet::new(),
            failed: HashSet::new(),
            modified: ModifiedIndex::default(),
            result: SelectionResult {
                block_weight: COINBASE_WEIGHT_RESERVED,
                block_sigops: COINBASE_SIGOPS_RESERVED,
                ..Default::default()
            },
        }
    }

    pub(crate) fn select_packages(mut self) -> SelectionResult {
        let mempool = self.mempool;
        let mut pool_iter = mempool.ancestor_order_iter().peekable();
        let mut consecutive_failed = 0u64;

        loop {
            // Skip index entries whose place is represented elsewhere: already
            // committed, already failed, or shadowed by the modified index.
            while let Some(&id) = pool_iter.peek() {
                if self.in_block.contains(&id) || self.failed.contains(&id) || self.modified.contains(id) {
                    pool_iter.next();
                } else {
                    break;
                }
            }

            let candidate = match (pool_iter.peek().copied(), self.modified.best()) {
                (None, None) => break,
                (None, Some((_, modified))) => modified,
                (Some(pool_id), None) => {
                    pool_iter.next();
                    Self::pool_candidate(mempool, pool_id)
                }
                (Some(pool_id), Some((modified_key, modified))) => {
                    if modified_key < mempool.get(pool_id).feerate_key() {
                        modified
                    } else {
                        pool_iter.next();
                        Self::pool_candidate(mempool, pool_id)
                    }
                }
            };
            debug_assert!(!self.in_block.contains(&candidate.id));

            if candidate.fees < self.policy.min_fee_rate.fee(candidate.vsize) {
                // Everything still unconsidered scores no better
                break;
            }

            if !self.test_package(candidate.vsize, candidate.sigops) {
                self.reject(&candidate);
                consecutive_failed += 1;
                if consecutive_failed > MAX_CONSECUTIVE_FAILURES
                    && self.result.block_weight > self.policy.max_block_weight - COINBASE_WEIGHT_RESERVED
                {
                    break;
                }
                continue;
            }

            let mut package: Vec<EntryId> =
                mempool.calculate_ancestors(candidate.id).into_iter().filter(|id| !self.in_block.contains(id)).collect();
            package.push(candidate.id);

            if !self.test_package_transactions(&package) {
                self.reject(&candidate);
                continue;
            }

            consecutive_failed = 0;

            // Commit in dependency order: a transaction always has more
            // ancestors than any transaction it spends from.
            package.sort_by_key(|&id| {
                let entry = mempool.get(id);
                (entry.ancestor_count(), entry.txid())
            });
            for &id in &package {
                self.add_to_block(id);
                self.modified.remove(id);
            }
            self.result.packages_selected += 1;
            self.update_packages_for_added(&package);
        }

        self.result
    }

    fn pool_candidate(mempool: &Mempool, id: EntryId) -> Candidate {
        let entry = mempool.get(id);
        Candidate {
            id,
            vsize: entry.ancestor_vsize(),
            fees: entry.ancestor_mod_fees(),
            sigops: entry.ancestor_sigops(),
            from_modified: false,
        }
    }

    /// Failed modified entries must leave the index so the next best one can
    /// surface; they may only be reconsidered through ancestor inclusion.
    fn reject(&mut self, candidate: &Candidate) {
        if candidate.from_modified {
            self.modified.remove(candidate.id);
            self.failed.insert(candidate.id);
        }
    }

    fn test_package(&self, package_vsize: u64, package_sigops: u64) -> bool {
        if self.result.block_weight + WITNESS_SCALE_FACTOR * package_vsize >= self.policy.max_block_weight {
            return false;
        }
        if self.result.block_sigops + package_sigops >= self.policy.max_block_sigops {
            return false;
        }
        true
    }

    /// Per-transaction checks deferred until a package is actually
    /// considered: locktime finality and premature witness.
    fn test_package_transactions(&self, package: &[EntryId]) -> bool {
        package.iter().all(|&id| {
            let entry = self.mempool.get(id);
            entry.tx().is_final(self.height, self.lock_time_cutoff) && (self.include_witness || !entry.has_witness())
        })
    }

    fn add_to_block(&mut self, id: EntryId) {
        let entry = self.mempool.get(id);
        self.result.entries.push(SelectedEntry { tx: entry.tx().clone(), fee: entry.fee(), sigops_cost: entry.sigops_cost() });
        self.result.block_weight += entry.weight();
        self.result.block_sigops += entry.sigops_cost();
        self.result.total_fees += entry.fee();
        self.result.tx_count += 1;
        self.in_block.insert(id);

        if self.policy.print_priority {
            debug!("fee {} txid {}", FeeRate::from_fee_and_size(entry.modified_fee(), entry.vsize()), entry.txid());
        }
    }

    /// Creates or updates modified entries for every descendant of the
    /// entries just committed.
    fn update_packages_for_added(&mut self, added: &[EntryId]) {
        let mempool = self.mempool;
        let added_set: HashSet<EntryId> = added.iter().copied().collect();
        for &id in added {
            let committed = mempool.get(id);
            let (vsize, fees, sigops) = (committed.vsize(), committed.modified_fee(), committed.sigops_cost());
            for descendant in mempool.calculate_descendants(id) {
                if added_set.contains(&descendant) {
                    continue;
                }
                self.result.descendants_updated += 1;
                self.modified.decrement(descendant, mempool.get(descendant), vsize, fees, sigops);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_template::policy::PolicyOptions;
    use crate::testutils::{build_tx, build_tx_with_locktime, build_tx_with_vsize, build_witness_tx};
    use diadem_consensus_core::constants::MAX_BLOCK_WEIGHT;

    fn select(mempool: &Mempool, policy: &Policy) -> SelectionResult {
        TemplateSelector::new(mempool, policy, 100, 1_000_000, true).select_packages()
    }

    fn txids(result: &SelectionResult) -> Vec<diadem_consensus_core::Hash> {
        result.entries.iter().map(|entry| entry.tx.id()).collect()
    }

    #[test]
    fn test_empty_mempool() {
        let result = select(&Mempool::new(), &Policy::default());
        assert!(result.entries.is_empty());
        assert_eq!(result.block_weight, COINBASE_WEIGHT_RESERVED);
        assert_eq!(result.block_sigops, COINBASE_SIGOPS_RESERVED);
    }

    #[test]
    fn test_child_pulls_parent_in_order() {
        let mut pool = Mempool::new();
        let tx_a = build_tx_with_vsize(1, &[], 400);
        let a_txid = tx_a.id();
        pool.insert(tx_a, 2_000, 1).unwrap();
        let tx_b = build_tx_with_vsize(2, &[(a_txid, 0)], 200);
        let b_txid = tx_b.id();
        pool.insert(tx_b, 3_000, 1).unwrap();

        let result = select(&pool, &Policy::default());
        assert_eq!(txids(&result), vec![a_txid, b_txid]);
        assert_eq!(result.total_fees, 5_000);
        assert_eq!(result.packages_selected, 1);
    }

    #[test]
    fn test_package_feerate_beats_independent() {
        let mut pool = Mempool::new();
        let tx_a = build_tx_with_vsize(1, &[], 400);
        let a_txid = tx_a.id();
        pool.insert(tx_a, 2_000, 1).unwrap();
        let tx_b = build_tx_with_vsize(2, &[(a_txid, 0)], 200);
        let b_txid = tx_b.id();
        pool.insert(tx_b, 3_000, 1).unwrap();
        // C at 8.0 sat/vB loses to the {A, B} package at ~8.3
        let tx_c = build_tx_with_vsize(3, &[], 200);
        let c_txid = tx_c.id();
        pool.insert(tx_c, 1_600, 1).unwrap();

        let result = select(&pool, &Policy::default());
        assert_eq!(txids(&result), vec![a_txid, b_txid, c_txid]);
        assert_eq!(result.total_fees, 6_600);
        assert_eq!(result.packages_selected, 2);
    }

    #[test]
    fn test_modified_entry_revives_cheap_parent_child() {
        // Parent P has a terrible feerate; child C's marginal feerate is
        // excellent. P is dragged in by C's package, and D (child of C)
        // gets selected through the modified index afterwards.
        let mut pool = Mempool::new();
        let tx_p = build_tx_with_vsize(1, &[], 1_000);
        let p_txid = tx_p.id();
        pool.insert(tx_p, 1_000, 1).unwrap();
        let tx_c = build_tx_with_vsize(2, &[(p_txid, 0)], 200);
        let c_txid = tx_c.id();
        pool.insert(tx_c, 50_000, 1).unwrap();
        let tx_d = build_tx_with_vsize(3, &[(c_txid, 0)], 200);
        let d_txid = tx_d.id();
        pool.insert(tx_d, 4_000, 1).unwrap();

        let result = select(&pool, &Policy::default());
        assert_eq!(txids(&result), vec![p_txid, c_txid, d_txid]);
        assert!(result.descendants_updated >= 2);
    }

    #[test]
    fn test_min_fee_rate_excludes_cheap_packages() {
        let mut pool = Mempool::new();
        // 100 sat for 400 vbytes = 250 sat/kvB, below the 1000 default
        let tx_cheap = build_tx_with_vsize(1, &[], 400);
        pool.insert(tx_cheap, 100, 1).unwrap();
        let tx_paying = build_tx_with_vsize(2, &[], 400);
        let paying_txid = tx_paying.id();
        pool.insert(tx_paying, 2_000, 1).unwrap();

        let result = select(&pool, &Policy::default());
        assert_eq!(txids(&result), vec![paying_txid]);
    }

    #[test]
    fn test_weight_budget_respected() {
        let policy = Policy::new(&PolicyOptions { block_max_weight: 8_000, ..Default::default() });
        let mut pool = Mempool::new();
        // Each tx weighs 2000 (500 vbytes); after the coinbase reservation
        // only one fits under the 8000 ceiling.
        pool.insert(build_tx_with_vsize(1, &[], 500), 50_000, 1).unwrap();
        pool.insert(build_tx_with_vsize(2, &[], 500), 40_000, 1).unwrap();

        let result = select(&pool, &policy);
        assert_eq!(result.entries.len(), 1);
        assert!(result.block_weight <= 8_000);
    }

    #[test]
    fn test_sigops_budget_respected() {
        let mut pool = Mempool::new();
        // The first entry alone would blow the sigops ceiling
        pool.insert(build_tx_with_vsize(1, &[], 200), 5_000, 79_999).unwrap();
        pool.insert(build_tx_with_vsize(2, &[], 200), 2_000, 10).unwrap();

        let result = select(&pool, &Policy::default());
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].sigops_cost, 10);
    }

    #[test]
    fn test_non_final_excluded_without_failure_count() {
        let mut pool = Mempool::new();
        // Locked until far beyond the cutoff passed in select()
        let tx_locked = build_tx_with_locktime(1, 2_000_000);
        pool.insert(tx_locked, 50_000, 1).unwrap();
        let tx_final = build_tx(2, &[]);
        let final_txid = tx_final.id();
        pool.insert(tx_final, 2_000, 1).unwrap();

        let result = select(&pool, &Policy::default());
        assert_eq!(txids(&result), vec![final_txid]);
    }

    #[test]
    fn test_witness_tx_excluded_when_witness_disabled() {
        let mut pool = Mempool::new();
        let tx_witness = build_witness_tx(1);
        pool.insert(tx_witness, 50_000, 1).unwrap();
        let tx_plain = build_tx(2, &[]);
        let plain_txid = tx_plain.id();
        pool.insert(tx_plain, 2_000, 1).unwrap();

        let result = TemplateSelector::new(&pool, &Policy::default(), 100, 1_000_000, false).select_packages();
        assert_eq!(txids(&result), vec![plain_txid]);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let build_pool = || {
            let mut pool = Mempool::new();
            let mut prev = None;
            for seed in 0..40u64 {
                let parents = match prev {
                    Some(txid) if seed % 3 == 0 => vec![(txid, 0u32)],
                    _ => vec![],
                };
                let tx = build_tx_with_vsize(seed + 1, &parents, 150 + (seed % 7) * 50);
                let txid = tx.id();
                pool.insert(tx, 1_000 + (seed % 11) * 700, 1 + seed % 4).unwrap();
                prev = Some(txid);
            }
            pool
        };
        let first = select(&build_pool(), &Policy::default());
        let second = select(&build_pool(), &Policy::default());
        assert_eq!(txids(&first), txids(&second));
        assert_eq!(first.total_fees, second.total_fees);
        assert_eq!(first.block_weight, second.block_weight);
    }

    #[test]
    fn test_ancestors_precede_descendants() {
        let mut pool = Mempool::new();
        let mut prev = None;
        for seed in 0..20u64 {
            let parents = match prev {
                Some(txid) => vec![(txid, 0u32)],
                None => vec![],
            };
            let tx = build_tx_with_vsize(seed + 1, &parents, 150);
            prev = Some(tx.id());
            pool.insert(tx, 10_000 - seed * 100, 1).unwrap();
        }

        let result = select(&pool, &Policy::default());
        assert_eq!(result.entries.len(), 20);
        let mut seen = HashSet::new();
        for entry in &result.entries {
            let id = pool.get_by_txid(&entry.tx.id()).unwrap();
            for ancestor in pool.calculate_ancestors(id) {
                assert!(seen.contains(&ancestor), "ancestor committed after descendant");
            }
            seen.insert(id);
        }
    }

    #[test]
    fn test_total_weight_never_exceeds_consensus_max() {
        let mut pool = Mempool::new();
        for seed in 0..50u64 {
            pool.insert(build_tx_with_vsize(seed + 1, &[], 30_000), 90_000_000, 100).unwrap();
        }
        let result = select(&pool, &Policy::default());
        assert!(result.block_weight <= MAX_BLOCK_WEIGHT);
        assert!(result.block_sigops <= Policy::default().max_block_sigops);
    }
}
