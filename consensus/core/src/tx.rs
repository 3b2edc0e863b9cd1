use crate::config::params::Network;
use crate::constants::{LOCKTIME_THRESHOLD, TX_ELE_VERSION, WITNESS_SCALE_FACTOR};
use crate::hashing::{double_sha256, Hash};
use crate::script::Script;

pub type TransactionId = Hash;
pub type AssetId = Hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: TransactionId,
    pub index: u32,
}

impl OutPoint {
    pub const NULL: OutPoint = OutPoint { txid: Hash::ZERO, index: u32::MAX };

    pub fn new(txid: TransactionId, index: u32) -> Self {
        Self { txid, index }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.index == u32::MAX
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInput {
    pub previous_outpoint: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
    pub witness: Vec<Vec<u8>>,
}

impl TransactionInput {
    pub fn new(previous_outpoint: OutPoint, script_sig: Script, sequence: u32) -> Self {
        Self { previous_outpoint, script_sig, sequence, witness: Vec::new() }
    }

    /// The single input of a coinbase transaction.
    pub fn coinbase(script_sig: Script) -> Self {
        Self::new(OutPoint::NULL, script_sig, u32::MAX)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyOutput {
    pub value: u64,
    pub script_pubkey: Script,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedOutput {
    pub value: u64,
    pub script_pubkey: Script,
    pub asset: AssetId,
}

/// The output vector of a transaction. The two wire layouts never mix within
/// one transaction; the variant is fixed by the transaction version at
/// construction time and callers go through the uniform accessors below
/// instead of branching on the version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outputs {
    Legacy(Vec<LegacyOutput>),
    Extended(Vec<ExtendedOutput>),
}

impl Outputs {
    /// An empty output vector in the layout mandated by `version`.
    pub fn for_version(version: u16) -> Self {
        if version >= TX_ELE_VERSION {
            Outputs::Extended(Vec::new())
        } else {
            Outputs::Legacy(Vec::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Outputs::Legacy(outs) => outs.len(),
            Outputs::Extended(outs) => outs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, slot: usize) -> Option<u64> {
        match self {
            Outputs::Legacy(outs) => outs.get(slot).map(|out| out.value),
            Outputs::Extended(outs) => outs.get(slot).map(|out| out.value),
        }
    }

    pub fn script(&self, slot: usize) -> Option<&Script> {
        match self {
            Outputs::Legacy(outs) => outs.get(slot).map(|out| &out.script_pubkey),
            Outputs::Extended(outs) => outs.get(slot).map(|out| &out.script_pubkey),
        }
    }

    pub fn value_mut(&mut self, slot: usize) -> Option<&mut u64> {
        match self {
            Outputs::Legacy(outs) => outs.get_mut(slot).map(|out| &mut out.value),
            Outputs::Extended(outs) => outs.get_mut(slot).map(|out| &mut out.value),
        }
    }

    pub fn script_mut(&mut self, slot: usize) -> Option<&mut Script> {
        match self {
            Outputs::Legacy(outs) => outs.get_mut(slot).map(|out| &mut out.script_pubkey),
            Outputs::Extended(outs) => outs.get_mut(slot).map(|out| &mut out.script_pubkey),
        }
    }

    /// Appends an output; the asset tag is dropped in the legacy layout.
    pub fn push(&mut self, value: u64, script_pubkey: Script, asset: AssetId) {
        match self {
            Outputs::Legacy(outs) => outs.push(LegacyOutput { value, script_pubkey }),
            Outputs::Extended(outs) => outs.push(ExtendedOutput { value, script_pubkey, asset }),
        }
    }

    pub fn remove(&mut self, slot: usize) {
        match self {
            Outputs::Legacy(outs) => {
                outs.remove(slot);
            }
            Outputs::Extended(outs) => {
                outs.remove(slot);
            }
        }
    }

    pub fn total_value(&self) -> u64 {
        match self {
            Outputs::Legacy(outs) => outs.iter().map(|out| out.value).sum(),
            Outputs::Extended(outs) => outs.iter().map(|out| out.value).sum(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: u16,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Outputs,
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(version: u16, inputs: Vec<TransactionInput>, outputs: Outputs, lock_time: u32) -> Self {
        Self { version, inputs, outputs, lock_time }
    }

    /// The transaction version in force at `height`. Every post-genesis block
    /// uses the extended layout; testnet alone keeps the legacy layout for its
    /// genesis block.
    pub fn version_for_height(network: Network, height: u64) -> u16 {
        if network == Network::Testnet && height < 1 {
            1
        } else {
            TX_ELE_VERSION
        }
    }

    pub fn id(&self) -> TransactionId {
        double_sha256(&self.encode(false))
    }

    /// Witness-inclusive id, used for the coinbase witness commitment.
    pub fn wtxid(&self) -> Hash {
        double_sha256(&self.encode(true))
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_outpoint.is_null()
    }

    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// Finality under the locktime rule: `block_time` is the cutoff selected
    /// by the caller (median time past or the block's own time).
    pub fn is_final(&self, block_height: u64, block_time: u64) -> bool {
        if self.lock_time == 0 {
            return true;
        }
        let cutoff = if self.lock_time < LOCKTIME_THRESHOLD { block_height } else { block_time };
        if (self.lock_time as u64) < cutoff {
            return true;
        }
        self.inputs.iter().all(|input| input.sequence == u32::MAX)
    }

    pub fn base_size(&self) -> u64 {
        self.encode(false).len() as u64
    }

    pub fn total_size(&self) -> u64 {
        self.encode(true).len() as u64
    }

    /// `3 × base_size + total_size`, the witness-discounted size.
    pub fn weight(&self) -> u64 {
        (WITNESS_SCALE_FACTOR - 1) * self.base_size() + self.total_size()
    }

    /// Virtual size in bytes, rounded up.
    pub fn vsize(&self) -> u64 {
        (self.weight() + WITNESS_SCALE_FACTOR - 1) / WITNESS_SCALE_FACTOR
    }

    /// Legacy sigop cost over all input and output scripts.
    pub fn legacy_sigop_count(&self) -> u64 {
        let input_ops: u64 = self.inputs.iter().map(|input| input.script_sig.sigop_count()).sum();
        let output_ops: u64 = (0..self.outputs.len()).filter_map(|slot| self.outputs.script(slot)).map(Script::sigop_count).sum();
        input_ops + output_ops
    }

    fn encode(&self, include_witness: bool) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            buf.extend_from_slice(&input.previous_outpoint.txid.as_bytes());
            buf.extend_from_slice(&input.previous_outpoint.index.to_le_bytes());
            encode_bytes(&mut buf, input.script_sig.as_slice());
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        buf.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        match &self.outputs {
            Outputs::Legacy(outs) => {
                for out in outs {
                    buf.extend_from_slice(&out.value.to_le_bytes());
                    encode_bytes(&mut buf, out.script_pubkey.as_slice());
                }
            }
            Outputs::Extended(outs) => {
                for out in outs {
                    buf.extend_from_slice(&out.value.to_le_bytes());
                    buf.extend_from_slice(&out.asset.as_bytes());
                    encode_bytes(&mut buf, out.script_pubkey.as_slice());
                }
            }
        }
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        if include_witness && self.has_witness() {
            for input in &self.inputs {
                buf.extend_from_slice(&(input.witness.len() as u32).to_le_bytes());
                for item in &input.witness {
                    encode_bytes(&mut buf, item);
                }
            }
        }
        buf
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::OP_0;

    fn extended_tx(lock_time: u32, sequence: u32) -> Transaction {
        let mut outputs = Outputs::for_version(TX_ELE_VERSION);
        outputs.push(500, Script::p2pkh(&[1u8; 20]), AssetId::ZERO);
        Transaction::new(
            TX_ELE_VERSION,
            vec![TransactionInput::new(OutPoint::new(Hash::from_u64_word(9), 0), Script::new(), sequence)],
            outputs,
            lock_time,
        )
    }

    #[test]
    fn test_version_selects_output_layout() {
        assert!(matches!(Outputs::for_version(1), Outputs::Legacy(_)));
        assert!(matches!(Outputs::for_version(TX_ELE_VERSION), Outputs::Extended(_)));
        assert_eq!(Transaction::version_for_height(Network::Mainnet, 0), TX_ELE_VERSION);
        assert_eq!(Transaction::version_for_height(Network::Testnet, 0), 1);
        assert_eq!(Transaction::version_for_height(Network::Testnet, 1), TX_ELE_VERSION);
    }

    #[test]
    fn test_id_ignores_witness() {
        let mut tx = extended_tx(0, u32::MAX);
        let id = tx.id();
        let wtxid = tx.wtxid();
        tx.inputs[0].witness.push(vec![0xab; 72]);
        assert_eq!(tx.id(), id);
        assert_ne!(tx.wtxid(), wtxid);
        assert!(tx.has_witness());
    }

    #[test]
    fn test_weight_discounts_witness() {
        let mut tx = extended_tx(0, u32::MAX);
        let base_weight = tx.weight();
        assert_eq!(base_weight, WITNESS_SCALE_FACTOR * tx.base_size());
        tx.inputs[0].witness.push(vec![0u8; 100]);
        // Witness bytes count once, not four times
        assert!(tx.weight() < base_weight + WITNESS_SCALE_FACTOR * 104);
        assert!(tx.weight() > base_weight);
    }

    #[test]
    fn test_is_final() {
        // Zero lock time is always final
        assert!(extended_tx(0, 0).is_final(100, 1_000));
        // Height-interpreted lock time
        assert!(extended_tx(99, 0).is_final(100, 1_000));
        assert!(!extended_tx(100, 0).is_final(100, 1_000));
        // Time-interpreted lock time
        let t = LOCKTIME_THRESHOLD + 50;
        assert!(extended_tx(t, 0).is_final(100, t as u64 + 1));
        assert!(!extended_tx(t, 0).is_final(100, t as u64));
        // Max sequences disable the lock time entirely
        assert!(extended_tx(100, u32::MAX).is_final(100, 1_000));
    }

    #[test]
    fn test_coinbase_detection() {
        let cb = Transaction::new(
            TX_ELE_VERSION,
            vec![TransactionInput::coinbase(Script::new().push_int(100).push_opcode(OP_0))],
            Outputs::for_version(TX_ELE_VERSION),
            0,
        );
        assert!(cb.is_coinbase());
        assert!(!extended_tx(0, 0).is_coinbase());
    }
}
