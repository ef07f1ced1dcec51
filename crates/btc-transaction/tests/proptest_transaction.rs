use proptest::prelude::*;

use btc_script::Script;
use btc_transaction::{Outpoint, Transaction, TxIn, TxOut};

fn arb_input(with_witness: bool) -> impl Strategy<Value = TxIn> {
    let witness = if with_witness {
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..80), 1..4).boxed()
    } else {
        Just(Vec::new()).boxed()
    };
    (
        prop::array::uniform32(any::<u8>()),       // prev txid
        any::<u32>(),                              // prev index
        prop::collection::vec(any::<u8>(), 0..64), // scriptSig bytes
        any::<u32>(),                              // sequence
        witness,
    )
        .prop_map(|(txid, index, script_bytes, sequence, witness)| {
            let mut input = TxIn::new(Outpoint::new(txid.into(), index), sequence);
            input.unlocking_script = Script::from_bytes(&script_bytes);
            input.witness = witness;
            input
        })
}

fn arb_output() -> impl Strategy<Value = TxOut> {
    (any::<u64>(), prop::collection::vec(any::<u8>(), 0..64))
        .prop_map(|(value, script_bytes)| TxOut::new(value, Script::from_bytes(&script_bytes)))
}

/// A random transaction with at least one input and one output, in
/// witness form when `with_witness` is set.
fn arb_transaction(with_witness: bool) -> impl Strategy<Value = Transaction> {
    (
        any::<u32>(), // version
        prop::collection::vec(arb_input(with_witness), 1..4),
        prop::collection::vec(arb_output(), 1..4),
        any::<u32>(), // lock time
    )
        .prop_map(|(version, inputs, outputs, lock_time)| {
            let mut tx = Transaction::new();
            tx.version = version;
            tx.lock_time = lock_time;
            for input in inputs {
                tx.add_input(input);
            }
            for output in outputs {
                tx.add_output(output);
            }
            tx
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn legacy_serialize_deserialize_roundtrip(tx in arb_transaction(false)) {
        let bytes = tx.to_bytes();
        prop_assert_eq!(bytes.len(), tx.size());
        let tx2 = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&tx2, &tx);
        prop_assert_eq!(tx2.id(), tx2.witness_id());
        prop_assert_eq!(tx2.weight(), tx2.size() * 4);
    }

    #[test]
    fn witness_serialize_deserialize_roundtrip(tx in arb_transaction(true)) {
        let bytes = tx.to_bytes();
        prop_assert_eq!(bytes.len(), tx.serialized_size());
        prop_assert_eq!(bytes.len(), tx.size() + 2);
        let tx2 = Transaction::from_bytes(&bytes).unwrap();
        prop_assert!(tx2.has_witness());
        prop_assert_eq!(&tx2, &tx);
        prop_assert_eq!(tx2.to_bytes_no_witness().len(), tx2.base_size());
        prop_assert_eq!(tx2.weight(), tx2.base_size() * 3 + tx2.size());
        prop_assert!(tx2.vsize() < tx2.size());
    }

    #[test]
    fn hex_roundtrip(tx in arb_transaction(true)) {
        let hex_str = tx.to_hex();
        let tx2 = Transaction::from_hex(&hex_str).unwrap();
        prop_assert_eq!(tx2.to_hex(), hex_str);
    }

    /// Stripping witnesses leaves the id unchanged.
    #[test]
    fn id_ignores_witness(tx in arb_transaction(true)) {
        let stripped = Transaction::from_bytes(&tx.to_bytes_no_witness()).unwrap();
        prop_assert_eq!(stripped.id(), tx.id());
        prop_assert!(!stripped.has_witness());
    }
}
