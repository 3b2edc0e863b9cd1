use crate::block::Block;
use crate::hashing::{Hash, HashWriter};
use crate::script::{Script, OP_RETURN};
use crate::tx::Transaction;

pub const WITNESS_COMMITMENT_HEADER: [u8; 4] = [0xaa, 0x21, 0xa9, 0xed];

/// Reserved witness nonce committed alongside the witness merkle root.
const WITNESS_NONCE: [u8; 32] = [0u8; 32];

/// Length of a full commitment script: OP_RETURN, a 36-byte push opcode,
/// the 4-byte header and the 32-byte commitment hash.
const WITNESS_COMMITMENT_SCRIPT_LEN: usize = 38;

pub fn merkle_root_from_ids(ids: &[Hash]) -> Hash {
    if ids.is_empty() {
        return Hash::ZERO;
    }
    let mut level = ids.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = pair[pair.len() - 1];
            let mut writer = HashWriter::new();
            writer.write(&left.as_bytes()).write(&right.as_bytes());
            next.push(writer.finalize());
        }
        level = next;
    }
    level[0]
}

pub fn block_merkle_root(block: &Block) -> Hash {
    let ids: Vec<Hash> = block.transactions.iter().map(Transaction::id).collect();
    merkle_root_from_ids(&ids)
}

/// Witness merkle root: witness-inclusive ids with the coinbase slot zeroed.
pub fn witness_merkle_root(block: &Block) -> Hash {
    let ids: Vec<Hash> =
        block.transactions.iter().enumerate().map(|(i, tx)| if i == 0 { Hash::ZERO } else { tx.wtxid() }).collect();
    merkle_root_from_ids(&ids)
}

pub fn witness_commitment(block: &Block) -> Hash {
    let mut writer = HashWriter::new();
    writer.write(&witness_merkle_root(block).as_bytes()).write(&WITNESS_NONCE);
    writer.finalize()
}

pub fn witness_commitment_script(commitment: Hash) -> Script {
    let mut payload = [0u8; 36];
    payload[..4].copy_from_slice(&WITNESS_COMMITMENT_HEADER);
    payload[4..].copy_from_slice(&commitment.as_bytes());
    Script::new().push_opcode(OP_RETURN).push_data(&payload)
}

/// Index of the witness commitment output in a coinbase transaction, scanning
/// from the last output like consensus verification does.
pub fn find_witness_commitment(tx: &Transaction) -> Option<usize> {
    (0..tx.outputs.len()).rev().find(|&slot| {
        tx.outputs.script(slot).is_some_and(|script| {
            let bytes = script.as_slice();
            bytes.len() >= WITNESS_COMMITMENT_SCRIPT_LEN
                && bytes[0] == OP_RETURN
                && bytes[1] == 0x24
                && bytes[2..6] == WITNESS_COMMITMENT_HEADER
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockHeader;
    use crate::constants::{BLOCK_VERSION, TX_ELE_VERSION};
    use crate::script::OP_0;
    use crate::tx::{AssetId, OutPoint, Outputs, TransactionInput};

    fn tx_with_seed(seed: u64) -> Transaction {
        let mut outputs = Outputs::for_version(TX_ELE_VERSION);
        outputs.push(seed, Script::p2pkh(&[seed as u8; 20]), AssetId::ZERO);
        Transaction::new(
            TX_ELE_VERSION,
            vec![TransactionInput::new(OutPoint::new(Hash::from_u64_word(seed), 0), Script::new(), u32::MAX)],
            outputs,
            0,
        )
    }

    fn block_with_txs(count: u64) -> Block {
        let coinbase = Transaction::new(
            TX_ELE_VERSION,
            vec![TransactionInput::coinbase(Script::new().push_int(1).push_opcode(OP_0))],
            Outputs::for_version(TX_ELE_VERSION),
            0,
        );
        let txs = std::iter::once(coinbase).chain((0..count).map(tx_with_seed)).collect();
        Block::new(BlockHeader::new(BLOCK_VERSION, Hash::ZERO), txs)
    }

    #[test]
    fn test_merkle_root_single() {
        let block = block_with_txs(0);
        assert_eq!(block_merkle_root(&block), block.transactions[0].id());
    }

    #[test]
    fn test_merkle_root_changes_with_txs() {
        assert_ne!(block_merkle_root(&block_with_txs(1)), block_merkle_root(&block_with_txs(2)));
    }

    #[test]
    fn test_merkle_root_odd_count_duplicates_last() {
        // Three leaves: the second level hashes (ab, cc)
        let ids = [Hash::from_u64_word(1), Hash::from_u64_word(2), Hash::from_u64_word(3)];
        let root = merkle_root_from_ids(&ids);
        let ids_padded = [ids[0], ids[1], ids[2], ids[2]];
        assert_eq!(root, merkle_root_from_ids(&ids_padded));
    }

    #[test]
    fn test_commitment_script_found() {
        let mut block = block_with_txs(1);
        let commitment = witness_commitment(&block);
        let script = witness_commitment_script(commitment);
        block.transactions[0].outputs.push(0, script, AssetId::ZERO);
        assert_eq!(find_witness_commitment(&block.transactions[0]), Some(0));
        assert_eq!(find_witness_commitment(&block.transactions[1]), None);
    }
}
