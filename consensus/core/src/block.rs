use crate::hashing::{Hash, HashWriter};
use crate::script::Script;
use crate::tx::Transaction;

/// Reference to the UTXO proving stake for a proof-of-stake block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakePointer {
    pub block_hash: Hash,
    pub tx_index: u32,
    pub out_index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block: Hash,
    pub merkle_root: Hash,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
    pub proof_of_stake: bool,
    /// Masternode payee script committed by the assembler, so light clients
    /// can verify the payment without re-running the election.
    pub payee: Script,
    /// Systemnode payee script, same purpose as `payee`.
    pub payee_sn: Script,
    pub stake_pointer: Option<StakePointer>,
}

impl BlockHeader {
    pub fn new(version: u32, prev_block: Hash) -> Self {
        Self {
            version,
            prev_block,
            merkle_root: Hash::ZERO,
            time: 0,
            bits: 0,
            nonce: 0,
            proof_of_stake: false,
            payee: Script::new(),
            payee_sn: Script::new(),
            stake_pointer: None,
        }
    }

    pub fn hash(&self) -> Hash {
        let mut writer = HashWriter::new();
        writer
            .write_u32(self.version)
            .write(&self.prev_block.as_bytes())
            .write(&self.merkle_root.as_bytes())
            .write_u32(self.time)
            .write_u32(self.bits)
            .write_u32(self.nonce)
            .write_u8(self.proof_of_stake as u8)
            .write_var_bytes(self.payee.as_slice())
            .write_var_bytes(self.payee_sn.as_slice());
        if let Some(pointer) = &self.stake_pointer {
            writer.write(&pointer.block_hash.as_bytes()).write_u32(pointer.tx_index).write_u32(pointer.out_index);
        }
        writer.finalize()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    /// Stake signature over the header, empty for proof-of-work blocks.
    pub signature: Vec<u8>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions, signature: Vec::new() }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    pub fn weight(&self) -> u64 {
        self.transactions.iter().map(Transaction::weight).sum()
    }
}
