//! BIP143 signature hash for segregated witness v0 inputs.

use btc_primitives::hash::sha256d;
use btc_primitives::util::ByteWriter;
use btc_script::Script;

use super::{HashType, Midstate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Compute the BIP143 signature hash for input `idx`.
///
/// The input must carry a witness script code, which it has when it was
/// built from a P2WPKH or P2WSH coin.
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `idx` - Index of the input being signed.
/// * `hash_type` - The sighash type.
///
/// # Returns
/// The double SHA-256 of the preimage.
pub fn signature_hash(tx: &Transaction, idx: usize, hash_type: u32) -> Result<[u8; 32], TransactionError> {
    Ok(sha256d(&preimage(tx, idx, hash_type)?))
}

/// Build the BIP143 preimage for input `idx`.
///
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes), zero under ANYONECANPAY
/// 3. hashSequence (32 bytes), zero under ANYONECANPAY, SINGLE or NONE
/// 4. outpoint (32+4 bytes)
/// 5. scriptCode (varint + script)
/// 6. value (8 bytes LE)
/// 7. nSequence (4 bytes LE)
/// 8. hashOutputs (32 bytes): all outputs, the matching output under
///    SINGLE, or zero
/// 9. nLocktime (4 bytes LE)
/// 10. sighashType (4 bytes LE)
pub fn preimage(tx: &Transaction, idx: usize, hash_type: u32) -> Result<Vec<u8>, TransactionError> {
    let input = tx.input(idx)?;
    let spent = input.spent_output().ok_or(TransactionError::MissingCoin(idx))?;
    let script_code: &Script = spent
        .witness_script_code
        .as_ref()
        .or(spent.redeem_script.as_ref())
        .unwrap_or(&spent.final_locking_script);

    let ht = HashType::new(hash_type);
    let mid: &Midstate = tx.midstate();

    let hash_prevouts = if ht.anyone_can_pay { [0u8; 32] } else { mid.hash_prevouts };
    let hash_sequence = if ht.anyone_can_pay || ht.is_single() || ht.is_none() {
        [0u8; 32]
    } else {
        mid.hash_sequence
    };
    let hash_outputs = if !ht.is_single() && !ht.is_none() {
        mid.hash_outputs
    } else if ht.is_single() && idx < tx.outputs().len() {
        sha256d(&tx.outputs()[idx].to_bytes())
    } else {
        [0u8; 32]
    };

    let mut w = ByteWriter::with_capacity(156 + script_code.len());
    w.write_u32_le(tx.version);
    w.write_bytes(&hash_prevouts);
    w.write_bytes(&hash_sequence);
    input.outpoint.write_to(&mut w);
    w.write_var_bytes(script_code.to_bytes());
    w.write_u64_le(spent.value);
    w.write_u32_le(input.sequence);
    w.write_bytes(&hash_outputs);
    w.write_u32_le(tx.lock_time);
    w.write_u32_le(ht.raw);
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sighash::{SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_NONE, SIGHASH_SINGLE};
    use crate::{Coin, Outpoint, TxIn, TxOut};

    const P2WPKH_HEX: &str = "00141d0f172a0ecb48aee1be1f2687d2963ae33f71a1";

    fn tx() -> Transaction {
        let mut tx = Transaction::new();
        for n in 1..=2u8 {
            let coin = Coin::new(Outpoint::new([n; 32].into(), 0), 1000 * n as u64, P2WPKH_HEX);
            tx.add_input(TxIn::from_coin(&coin, None, 0xffff_ffee).unwrap());
        }
        tx.add_output(TxOut::new(500, Script::from_hex(P2WPKH_HEX).unwrap()));
        tx
    }

    #[test]
    fn test_preimage_fields() {
        let tx = tx();
        let pre = preimage(&tx, 1, SIGHASH_ALL).unwrap();
        let mid = Midstate::compute(&tx);
        assert_eq!(&pre[4..36], &mid.hash_prevouts);
        assert_eq!(&pre[36..68], &mid.hash_sequence);
        assert_eq!(&pre[68..100], &[2u8; 32]);
        // script code is the P2PKH form of the witness program
        assert_eq!(pre[104], 25);
        assert_eq!(&pre[105..108], &[0x76, 0xa9, 0x14]);
        assert_eq!(&pre[130..138], &2000u64.to_le_bytes());
        assert_eq!(&pre[142..174], &mid.hash_outputs);
        assert_eq!(pre.len(), 182);
    }

    #[test]
    fn test_zeroed_commitments() {
        let tx = tx();
        let zero = [0u8; 32];

        let pre = preimage(&tx, 0, SIGHASH_ALL | SIGHASH_ANYONECANPAY).unwrap();
        assert_eq!(&pre[4..36], &zero);
        assert_eq!(&pre[36..68], &zero);

        let pre = preimage(&tx, 0, SIGHASH_NONE).unwrap();
        assert_ne!(&pre[4..36], &zero);
        assert_eq!(&pre[36..68], &zero);
        assert_eq!(&pre[142..174], &zero);

        let pre = preimage(&tx, 0, SIGHASH_SINGLE).unwrap();
        assert_eq!(&pre[142..174], &sha256d(&tx.outputs()[0].to_bytes()));

        let pre = preimage(&tx, 1, SIGHASH_SINGLE).unwrap();
        assert_eq!(&pre[142..174], &zero);
    }

    #[test]
    fn test_midstate_reset_on_mutation() {
        let mut tx = tx();
        let before = signature_hash(&tx, 0, SIGHASH_ALL).unwrap();
        tx.add_output(TxOut::new(1, Script::new()));
        let after = signature_hash(&tx, 0, SIGHASH_ALL).unwrap();
        assert_ne!(before, after);
        assert_eq!(tx.midstate(), &Midstate::compute(&tx));
    }
}
