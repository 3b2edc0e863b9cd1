use diadem_consensus_core::constants::COIN;
use diadem_consensus_core::tx::TransactionId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Fee rate expressed in satoshis per 1000 virtual bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeeRate {
    sat_per_kvb: u64,
}

impl FeeRate {
    pub const fn from_sat_per_kvb(sat_per_kvb: u64) -> Self {
        Self { sat_per_kvb }
    }

    /// Rate implied by paying `fee` for `vsize` bytes, rounded down.
    pub fn from_fee_and_size(fee: u64, vsize: u64) -> Self {
        if vsize == 0 {
            Self { sat_per_kvb: 0 }
        } else {
            Self { sat_per_kvb: fee.saturating_mul(1000) / vsize }
        }
    }

    /// Fee charged at this rate for `vsize` bytes. A non-zero rate never
    /// charges less than one satoshi for a non-empty transaction.
    pub fn fee(&self, vsize: u64) -> u64 {
        let fee = self.sat_per_kvb.saturating_mul(vsize) / 1000;
        if fee == 0 && vsize != 0 && self.sat_per_kvb != 0 {
            1
        } else {
            fee
        }
    }

    pub fn sat_per_kvb(&self) -> u64 {
        self.sat_per_kvb
    }
}

impl Display for FeeRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:08} DDM/kvB", self.sat_per_kvb / COIN, self.sat_per_kvb % COIN)
    }
}

/// Compares `fee_a/size_a` against `fee_b/size_b` by cross-multiplication,
/// avoiding any rounding. The products fit in 128 bits.
pub fn feerate_cmp(fee_a: u64, size_a: u64, fee_b: u64, size_b: u64) -> Ordering {
    (fee_a as u128 * size_b as u128).cmp(&(fee_b as u128 * size_a as u128))
}

/// Ordering key over ancestor aggregates. Sorted containers iterate these
/// best-first: higher ancestor feerate wins, exact ties go to the smaller
/// txid so selection is deterministic across implementations.
#[derive(Clone, Copy, Debug)]
pub struct AncestorFeerateKey {
    pub fees: u64,
    pub size: u64,
    pub txid: TransactionId,
}

impl PartialEq for AncestorFeerateKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AncestorFeerateKey {}

impl PartialOrd for AncestorFeerateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AncestorFeerateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match feerate_cmp(self.fees, self.size, other.fees, other.size) {
            Ordering::Equal => self.txid.cmp(&other.txid),
            ord => ord.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diadem_consensus_core::Hash;

    #[test]
    fn test_fee_rounding() {
        let rate = FeeRate::from_sat_per_kvb(1_000);
        assert_eq!(rate.fee(250), 250);
        assert_eq!(rate.fee(0), 0);

        // Sub-satoshi results round up to one satoshi
        let tiny = FeeRate::from_sat_per_kvb(1);
        assert_eq!(tiny.fee(250), 1);
        assert_eq!(FeeRate::from_sat_per_kvb(0).fee(250), 0);
    }

    #[test]
    fn test_feerate_cmp_no_rounding() {
        // 5000/300 vs 1600/100: 16.66 > 16.0
        assert_eq!(feerate_cmp(5_000, 300, 1_600, 100), Ordering::Greater);
        assert_eq!(feerate_cmp(1_600, 100, 5_000, 300), Ordering::Less);
        assert_eq!(feerate_cmp(2_000, 200, 1_000, 100), Ordering::Equal);
    }

    #[test]
    fn test_feerate_cmp_large_values() {
        // Products overflow 64 bits but not 128
        assert_eq!(feerate_cmp(u64::MAX, 1, u64::MAX - 1, 1), Ordering::Greater);
    }

    #[test]
    fn test_key_order_best_first() {
        let better = AncestorFeerateKey { fees: 5_000, size: 300, txid: Hash::from_u64_word(7) };
        let worse = AncestorFeerateKey { fees: 1_600, size: 100, txid: Hash::from_u64_word(1) };
        assert!(better < worse);

        // Equal feerates: the smaller txid sorts first
        let a = AncestorFeerateKey { fees: 1_000, size: 100, txid: Hash::from_u64_word(1) };
        let b = AncestorFeerateKey { fees: 2_000, size: 200, txid: Hash::from_u64_word(2) };
        assert!(a < b);
    }
}
