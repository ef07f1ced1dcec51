use proptest::prelude::*;

use btc_script::instruction::parse_instructions;
use btc_script::interpreter::{Engine, ScriptNum};
use btc_script::Script;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn script_num_encode_decode_roundtrip(val in -0x7FFFFFFFi64..=0x7FFFFFFFi64) {
        let bytes = ScriptNum(val).to_bytes();
        prop_assert!(bytes.len() <= 4);
        let back = ScriptNum::from_bytes(&bytes, 4, true).unwrap();
        prop_assert_eq!(back.value(), val);
    }

    #[test]
    fn script_num_wide_roundtrip(val in -i64::MAX..=i64::MAX) {
        let bytes = ScriptNum(val).to_bytes();
        let back = ScriptNum::from_bytes(&bytes, 8, true).unwrap();
        prop_assert_eq!(back.value(), val);
    }

    #[test]
    fn pushed_data_parses_back(items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 0..8)) {
        let mut script = Script::new();
        for item in &items {
            script.append_push_data(item).unwrap();
        }
        let ins = parse_instructions(script.to_bytes()).unwrap();
        prop_assert_eq!(ins.len(), items.len());
        for (i, item) in ins.iter().zip(&items) {
            prop_assert_eq!(i.data(), &item[..]);
        }
        prop_assert!(script.is_push_only());
    }

    #[test]
    fn executing_pushes_reproduces_items(items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..80), 0..8)) {
        let mut script = Script::new();
        for item in &items {
            script.append_push_data(item).unwrap();
        }
        let mut engine = Engine::new();
        engine.execute(&script).unwrap();
        prop_assert_eq!(engine.stack().items(), &items[..]);
    }

    #[test]
    fn script_hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let script = Script::from_bytes(&data);
        let script2 = Script::from_hex(&script.to_hex()).unwrap();
        prop_assert_eq!(script.to_bytes(), script2.to_bytes());
    }
}
