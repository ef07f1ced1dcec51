//! Signature hash computation for transaction signing.
//!
//! Two algorithms are implemented:
//!
//! * [`legacy`] - the pre-segwit digest used for P2PKH and P2SH
//!   inputs. It re-serializes a modified copy of the whole transaction per
//!   input.
//! * [`witness_v0`] - the BIP143 digest used for segregated witness v0
//!   inputs. It commits to the spent value and reuses three transaction-wide
//!   hashes (the [`Midstate`]) across inputs.
//!
//! See <https://github.com/bitcoin/bips/blob/master/bip-0143.mediawiki>

pub mod legacy;
pub mod witness_v0;

use btc_primitives::hash::sha256d;
use btc_primitives::util::ByteWriter;

use crate::transaction::Transaction;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: only sign the current input, allowing other
/// inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

/// The base type and ANYONECANPAY bit of a sighash type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HashType {
    pub raw: u32,
    pub base: u32,
    pub anyone_can_pay: bool,
}

impl HashType {
    pub fn new(raw: u32) -> Self {
        HashType {
            raw,
            base: raw & SIGHASH_MASK,
            anyone_can_pay: raw & SIGHASH_ANYONECANPAY != 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.base == SIGHASH_NONE
    }

    pub fn is_single(&self) -> bool {
        self.base == SIGHASH_SINGLE
    }
}

// -----------------------------------------------------------------------
// Midstate
// -----------------------------------------------------------------------

/// The transaction-wide hashes BIP143 shares between inputs.
///
/// They depend only on the outpoints, the sequences and the outputs, so
/// they are computed once per transaction and dropped whenever any of
/// those change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Midstate {
    pub hash_prevouts: [u8; 32],
    pub hash_sequence: [u8; 32],
    pub hash_outputs: [u8; 32],
}

impl Midstate {
    pub fn compute(tx: &Transaction) -> Self {
        let mut prevouts = ByteWriter::with_capacity(tx.inputs().len() * 36);
        let mut sequences = ByteWriter::with_capacity(tx.inputs().len() * 4);
        for input in tx.inputs() {
            input.outpoint.write_to(&mut prevouts);
            sequences.write_u32_le(input.sequence);
        }

        let mut outputs = ByteWriter::new();
        for output in tx.outputs() {
            output.write_to(&mut outputs);
        }

        Midstate {
            hash_prevouts: sha256d(prevouts.as_bytes()),
            hash_sequence: sha256d(sequences.as_bytes()),
            hash_outputs: sha256d(outputs.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_type_split() {
        let ht = HashType::new(SIGHASH_SINGLE | SIGHASH_ANYONECANPAY);
        assert_eq!(ht.raw, 0x83);
        assert!(ht.is_single());
        assert!(!ht.is_none());
        assert!(ht.anyone_can_pay);

        let ht = HashType::new(SIGHASH_ALL);
        assert_eq!(ht.base, SIGHASH_ALL);
        assert!(!ht.anyone_can_pay);
    }

    #[test]
    fn test_midstate_of_empty_transaction() {
        let tx = Transaction::new();
        let empty = sha256d(&[]);
        let m = Midstate::compute(&tx);
        assert_eq!(m.hash_prevouts, empty);
        assert_eq!(m.hash_sequence, empty);
        assert_eq!(m.hash_outputs, empty);
    }
}
