//! The pre-segwit Bitcoin signature hash.
//!
//! The preimage is a copy of the transaction with every scriptSig emptied
//! except the signed input's, which is replaced by the script code. NONE,
//! SINGLE and ANYONECANPAY then drop or blank parts of that copy.

use btc_primitives::hash::sha256d;
use btc_primitives::util::{ByteWriter, VarInt};
use btc_script::opcodes::OP_CODESEPARATOR;
use btc_script::Script;

use super::HashType;
use crate::transaction::Transaction;
use crate::TransactionError;

/// The digest returned for SIGHASH_SINGLE when the signed input has no
/// matching output: the number one as a little-endian 256-bit integer.
pub const SINGLE_OUT_OF_RANGE_HASH: [u8; 32] = {
    let mut h = [0u8; 32];
    h[0] = 1;
    h
};

/// Compute the legacy signature hash for input `idx`.
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `idx` - Index of the input being signed. It must carry coin data.
/// * `hash_type` - The sighash type, written as four bytes at the end.
///
/// # Returns
/// The double SHA-256 of the preimage.
pub fn signature_hash(tx: &Transaction, idx: usize, hash_type: u32) -> Result<[u8; 32], TransactionError> {
    let input = tx.input(idx)?;
    let spent = input.spent_output().ok_or(TransactionError::MissingCoin(idx))?;
    let ht = HashType::new(hash_type);

    if ht.is_single() && idx >= tx.outputs().len() {
        return Ok(SINGLE_OUT_OF_RANGE_HASH);
    }

    let script_code = match &spent.redeem_script {
        Some(redeem) => redeem.clone(),
        None => spent.final_locking_script.remove_opcode(OP_CODESEPARATOR)?,
    };

    Ok(sha256d(&preimage(tx, idx, &script_code, ht)))
}

/// Serialize the modified transaction the legacy digest covers.
pub(crate) fn preimage(tx: &Transaction, idx: usize, script_code: &Script, ht: HashType) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(tx.base_size() + script_code.len());
    w.write_u32_le(tx.version);

    if ht.anyone_can_pay {
        let input = &tx.inputs()[idx];
        w.write_varint(VarInt(1));
        input.outpoint.write_to(&mut w);
        w.write_var_bytes(script_code.to_bytes());
        w.write_u32_le(input.sequence);
    } else {
        w.write_varint(VarInt::from(tx.inputs().len()));
        for (j, input) in tx.inputs().iter().enumerate() {
            input.outpoint.write_to(&mut w);
            if j == idx {
                w.write_var_bytes(script_code.to_bytes());
                w.write_u32_le(input.sequence);
            } else {
                w.write_varint(VarInt(0));
                // Other inputs may be replaced under NONE and SINGLE.
                let sequence = if ht.is_none() || ht.is_single() { 0 } else { input.sequence };
                w.write_u32_le(sequence);
            }
        }
    }

    if ht.is_none() {
        w.write_varint(VarInt(0));
    } else if ht.is_single() {
        w.write_varint(VarInt::from(idx + 1));
        for _ in 0..idx {
            w.write_u64_le(u64::MAX);
            w.write_varint(VarInt(0));
        }
        tx.outputs()[idx].write_to(&mut w);
    } else {
        w.write_varint(VarInt::from(tx.outputs().len()));
        for output in tx.outputs() {
            output.write_to(&mut w);
        }
    }

    w.write_u32_le(tx.lock_time);
    w.write_u32_le(ht.raw);
    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sighash::{SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_NONE, SIGHASH_SINGLE};
    use crate::{Coin, Outpoint, TxIn, TxOut};

    const P2PKH_HEX: &str = "76a914eb0bd5edba389198e73f8efabddfc61666969ff788ac";

    fn coin(n: u8, value: u64) -> Coin {
        Coin::new(Outpoint::new([n; 32].into(), n as u32), value, P2PKH_HEX)
    }

    fn two_in_one_out() -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(TxIn::from_coin(&coin(1, 1000), None, 0xffff_fffe).unwrap());
        tx.add_input(TxIn::from_coin(&coin(2, 2000), None, 0xffff_fffd).unwrap());
        tx.add_output(TxOut::new(2500, Script::from_hex(P2PKH_HEX).unwrap()));
        tx
    }

    #[test]
    fn test_all_preimage_layout() {
        let tx = two_in_one_out();
        let code = Script::from_hex(P2PKH_HEX).unwrap();
        let pre = preimage(&tx, 1, &code, HashType::new(SIGHASH_ALL));

        // version, 2 inputs: first with empty script, second with the code.
        assert_eq!(&pre[..4], &1u32.to_le_bytes());
        assert_eq!(pre[4], 2);
        assert_eq!(pre[4 + 36 + 1], 0);
        assert_eq!(&pre[4 + 36 + 1..4 + 36 + 5], &[0, 0xfe, 0xff, 0xff]);
        let second = 4 + 1 + 41;
        assert_eq!(pre[second + 36], 25);
        assert_eq!(&pre[pre.len() - 4..], &SIGHASH_ALL.to_le_bytes());
    }

    #[test]
    fn test_none_zeroes_other_sequences() {
        let tx = two_in_one_out();
        let code = Script::from_hex(P2PKH_HEX).unwrap();
        let pre = preimage(&tx, 1, &code, HashType::new(SIGHASH_NONE));
        let first_seq = 4 + 1 + 36 + 1;
        assert_eq!(&pre[first_seq..first_seq + 4], &[0, 0, 0, 0]);
        // no outputs: count 0, locktime, hash type
        assert_eq!(pre[pre.len() - 9], 0);
    }

    #[test]
    fn test_anyone_can_pay_commits_to_one_input() {
        let tx = two_in_one_out();
        let code = Script::from_hex(P2PKH_HEX).unwrap();
        let pre = preimage(&tx, 0, &code, HashType::new(SIGHASH_ALL | SIGHASH_ANYONECANPAY));
        assert_eq!(pre[4], 1);
        assert_eq!(&pre[5..37], &[1u8; 32]);
    }

    #[test]
    fn test_single_out_of_range() {
        let tx = two_in_one_out();
        assert_eq!(
            signature_hash(&tx, 1, SIGHASH_SINGLE).unwrap(),
            SINGLE_OUT_OF_RANGE_HASH
        );
        assert_ne!(signature_hash(&tx, 0, SIGHASH_SINGLE).unwrap(), SINGLE_OUT_OF_RANGE_HASH);
    }

    #[test]
    fn test_hash_types_differ() {
        let tx = two_in_one_out();
        let all = signature_hash(&tx, 0, SIGHASH_ALL).unwrap();
        let none = signature_hash(&tx, 0, SIGHASH_NONE).unwrap();
        let single = signature_hash(&tx, 0, SIGHASH_SINGLE).unwrap();
        assert_ne!(all, none);
        assert_ne!(all, single);
        assert_ne!(none, single);
    }

    #[test]
    fn test_code_separator_removed() {
        let mut tx = two_in_one_out();
        let with_sep = format!("ab{}", P2PKH_HEX);
        let plain = signature_hash(&tx, 0, SIGHASH_ALL).unwrap();
        let c = Coin::new(Outpoint::new([1; 32].into(), 1), 1000, with_sep);
        // OP_CODESEPARATOR + P2PKH is not a standard shape, so attach the
        // scripts by hand.
        let mut spent = tx.inputs()[0].spent_output().cloned().unwrap();
        spent.final_locking_script = c.locking_script().unwrap();
        tx.input_mut(0).unwrap().set_spent_output(Some(spent));
        assert_eq!(signature_hash(&tx, 0, SIGHASH_ALL).unwrap(), plain);
    }

    #[test]
    fn test_missing_coin_and_range() {
        let mut tx = Transaction::new();
        tx.add_input(TxIn::new(Outpoint::new([0; 32].into(), 0), 0));
        assert!(matches!(
            signature_hash(&tx, 0, SIGHASH_ALL),
            Err(TransactionError::MissingCoin(0))
        ));
        assert!(matches!(
            signature_hash(&tx, 1, SIGHASH_ALL),
            Err(TransactionError::IndexOutOfRange { index: 1, count: 1 })
        ));
    }
}
