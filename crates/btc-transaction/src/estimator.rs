//! Worst-case size and fee estimation for unsigned transactions.
//!
//! Every input is assumed to be spent by a single compressed key: a
//! non-witness input gets a `<sig> <pubkey>` scriptSig and a witness input
//! gets a `[sig, pubkey]` witness, with the signature at its largest DER
//! length. Inputs without coin data count as non-witness.

use btc_primitives::util::{var_bytes_len, VarInt};
use btc_script::ScriptVersion;

use crate::input::TxIn;
use crate::outpoint::OUTPOINT_SIZE;
use crate::output::TxOut;
use crate::transaction::{vsize_of, weight_of, Transaction};

/// Largest DER signature plus its sighash byte.
pub const MAX_SIGNATURE_SIZE: usize = 73;

/// Compressed public key length.
pub const COMPRESSED_PUB_KEY_SIZE: usize = 33;

/// `OP_DATA_73 <sig> OP_DATA_33 <pubkey>`.
pub const P2PKH_SCRIPT_SIG_SIZE: usize = 1 + MAX_SIGNATURE_SIZE + 1 + COMPRESSED_PUB_KEY_SIZE;

/// Witness bytes of a `[sig, pubkey]` stack including its count.
pub const P2WPKH_WITNESS_SIZE: usize =
    1 + (1 + MAX_SIGNATURE_SIZE) + (1 + COMPRESSED_PUB_KEY_SIZE);

fn is_witness(input: &TxIn) -> bool {
    input
        .spent_output()
        .map(|s| s.script_version() == ScriptVersion::WitnessV0)
        .unwrap_or(false)
}

/// Estimated virtual size of `tx` once every input is signed.
///
/// The result is directly comparable to [`Transaction::vsize`].
pub fn estimate_size(tx: &Transaction) -> usize {
    let inputs = tx.inputs();
    let outputs = tx.outputs();

    let inputs_size: usize = inputs
        .iter()
        .map(|input| {
            let script_sig = if is_witness(input) { 0 } else { P2PKH_SCRIPT_SIG_SIZE };
            OUTPOINT_SIZE + var_bytes_len(script_sig) + 4
        })
        .sum();

    let base_size = 4
        + VarInt::from(inputs.len()).length()
        + inputs_size
        + VarInt::from(outputs.len()).length()
        + outputs.iter().map(TxOut::serialized_size).sum::<usize>()
        + 4;

    let witness_size = if inputs.iter().any(is_witness) {
        // one stack per input, empty ones included
        inputs
            .iter()
            .map(|input| if is_witness(input) { P2WPKH_WITNESS_SIZE } else { 1 })
            .sum::<usize>()
    } else {
        0
    };

    vsize_of(weight_of(base_size, witness_size))
}

/// Fee for `size` virtual bytes at `relay_fee_per_kb` satoshis per 1000
/// bytes, rounded up.
pub fn estimate_fees(size: usize, relay_fee_per_kb: u64) -> u64 {
    let fee = (relay_fee_per_kb as u128 * size as u128 + 999) / 1000;
    u64::try_from(fee).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coin, Outpoint};
    use btc_script::Script;

    const P2PKH_HEX: &str = "76a914eb0bd5edba389198e73f8efabddfc61666969ff788ac";
    const P2WPKH_HEX: &str = "00141d0f172a0ecb48aee1be1f2687d2963ae33f71a1";

    fn tx_spending(script_hex: &str) -> Transaction {
        let mut tx = Transaction::new();
        let coin = Coin::new(Outpoint::new([7; 32].into(), 0), 10_000, script_hex);
        tx.add_input(TxIn::from_coin(&coin, None, 0xffff_ffff).unwrap());
        tx.add_output(TxOut::new(9_000, Script::from_hex(P2PKH_HEX).unwrap()));
        tx
    }

    #[test]
    fn test_script_sig_size() {
        assert_eq!(P2PKH_SCRIPT_SIG_SIZE, 108);
        assert_eq!(P2WPKH_WITNESS_SIZE, 109);
    }

    #[test]
    fn test_estimate_p2pkh() {
        // 4 + 1 + (36 + 1 + 108 + 4) + 1 + (8 + 1 + 25) + 4
        assert_eq!(estimate_size(&tx_spending(P2PKH_HEX)), 193);
    }

    #[test]
    fn test_estimate_p2wpkh() {
        // base 4 + 1 + 41 + 1 + 34 + 4 = 85, witness 109
        // weight 85 * 4 + 109 = 449, vsize 112
        assert_eq!(estimate_size(&tx_spending(P2WPKH_HEX)), 112);
    }

    #[test]
    fn test_estimate_fees_rounds_up() {
        assert_eq!(estimate_fees(193, 1000), 193);
        assert_eq!(estimate_fees(193, 1), 1);
        assert_eq!(estimate_fees(250, 10_000), 2500);
        assert_eq!(estimate_fees(0, 10_000), 0);
        assert_eq!(estimate_fees(1001, 999), 1000);
    }
}
