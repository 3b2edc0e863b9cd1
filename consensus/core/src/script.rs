use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

/// Cost charged for a bare multisig opcode under legacy sigop accounting.
const MULTISIG_SIGOP_COST: u64 = 20;

pub type ScriptVec = SmallVec<[u8; 36]>;

/// A serialized script, used both for signature scripts and output scripts.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Script(ScriptVec);

impl Script {
    pub fn new() -> Self {
        Self(ScriptVec::new())
    }

    pub fn from_slice(slice: &[u8]) -> Self {
        Self(ScriptVec::from_slice(slice))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push_opcode(mut self, opcode: u8) -> Self {
        self.0.push(opcode);
        self
    }

    /// Appends a minimally-encoded integer push.
    pub fn push_int(self, value: i64) -> Self {
        match value {
            0 => self.push_opcode(OP_0),
            -1 => self.push_opcode(OP_1NEGATE),
            1..=16 => self.push_opcode(OP_1 + (value as u8) - 1),
            _ => {
                let encoded = scriptnum_encode(value);
                self.push_data(&encoded)
            }
        }
    }

    /// Appends a data push with the shortest applicable push opcode.
    pub fn push_data(mut self, data: &[u8]) -> Self {
        match data.len() {
            len if len < OP_PUSHDATA1 as usize => self.0.push(len as u8),
            len if len <= u8::MAX as usize => {
                self.0.push(OP_PUSHDATA1);
                self.0.push(len as u8);
            }
            len if len <= u16::MAX as usize => {
                self.0.push(OP_PUSHDATA2);
                self.0.extend_from_slice(&(len as u16).to_le_bytes());
            }
            len => {
                self.0.push(OP_PUSHDATA4);
                self.0.extend_from_slice(&(len as u32).to_le_bytes());
            }
        }
        self.0.extend_from_slice(data);
        self
    }

    /// Standard pay-to-pubkey-hash output script.
    pub fn p2pkh(pubkey_hash: &[u8; 20]) -> Self {
        Self::new().push_opcode(OP_DUP).push_opcode(OP_HASH160).push_data(pubkey_hash).push_opcode(OP_EQUALVERIFY).push_opcode(OP_CHECKSIG)
    }

    /// Legacy signature-operation cost of this script. Push payloads are
    /// skipped; a truncated push terminates the count.
    pub fn sigop_count(&self) -> u64 {
        let bytes = self.as_slice();
        let mut count = 0;
        let mut i = 0;
        while i < bytes.len() {
            let opcode = bytes[i];
            i += 1;
            match opcode {
                0x01..=0x4b => i += opcode as usize,
                OP_PUSHDATA1 => {
                    if i >= bytes.len() {
                        break;
                    }
                    i += 1 + bytes[i] as usize;
                }
                OP_PUSHDATA2 => {
                    if i + 2 > bytes.len() {
                        break;
                    }
                    i += 2 + u16::from_le_bytes([bytes[i], bytes[i + 1]]) as usize;
                }
                OP_PUSHDATA4 => {
                    if i + 4 > bytes.len() {
                        break;
                    }
                    i += 4 + u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]) as usize;
                }
                OP_CHECKSIG | OP_CHECKSIGVERIFY => count += 1,
                OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => count += MULTISIG_SIGOP_COST,
                _ => {}
            }
        }
        count
    }
}

impl Debug for Script {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Script({})", faster_hex::hex_string(&self.0))
    }
}

fn scriptnum_encode(value: i64) -> Vec<u8> {
    if value == 0 {
        return vec![];
    }
    let negative = value < 0;
    let mut absolute = value.unsigned_abs();
    let mut result = Vec::with_capacity(9);
    while absolute > 0 {
        result.push((absolute & 0xff) as u8);
        absolute >>= 8;
    }
    // The most significant bit carries the sign; add a padding byte when the
    // magnitude already occupies it.
    if result[result.len() - 1] & 0x80 != 0 {
        result.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        let last = result.len() - 1;
        result[last] |= 0x80;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_int_small_values() {
        assert_eq!(Script::new().push_int(0).as_slice(), &[OP_0]);
        assert_eq!(Script::new().push_int(1).as_slice(), &[OP_1]);
        assert_eq!(Script::new().push_int(16).as_slice(), &[OP_16]);
        assert_eq!(Script::new().push_int(-1).as_slice(), &[OP_1NEGATE]);
    }

    #[test]
    fn test_push_int_multibyte() {
        // 4660 = 0x1234, little-endian push of two bytes
        assert_eq!(Script::new().push_int(0x1234).as_slice(), &[0x02, 0x34, 0x12]);
        // 128 needs a padding byte to keep the sign bit clear
        assert_eq!(Script::new().push_int(128).as_slice(), &[0x02, 0x80, 0x00]);
        assert_eq!(Script::new().push_int(-128).as_slice(), &[0x02, 0x80, 0x80]);
    }

    #[test]
    fn test_sigop_count() {
        let script = Script::p2pkh(&[7u8; 20]);
        assert_eq!(script.sigop_count(), 1);

        let multisig = Script::new().push_int(2).push_data(&[1u8; 33]).push_data(&[2u8; 33]).push_int(2).push_opcode(OP_CHECKMULTISIG);
        assert_eq!(multisig.sigop_count(), MULTISIG_SIGOP_COST);

        // Opcode bytes hidden inside a push payload are not counted
        let data_only = Script::new().push_data(&[OP_CHECKSIG; 10]);
        assert_eq!(data_only.sigop_count(), 0);
    }

    #[test]
    fn test_sigop_count_truncated_push() {
        let script = Script::from_slice(&[OP_CHECKSIG, OP_PUSHDATA2, 0xff]);
        assert_eq!(script.sigop_count(), 1);
    }
}
