use proptest::prelude::*;

use btc_primitives::chainhash::Hash;
use btc_primitives::ec::private_key::{PrivateKey, MAINNET_WIF_PREFIX};
use btc_primitives::ec::signature::Signature;
use btc_primitives::hash::sha256;
use btc_primitives::util::{ByteReader, ByteWriter, VarInt};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn private_key_wif_roundtrip(seed in prop::array::uniform32(any::<u8>())) {
        // Not all 32-byte arrays are valid private keys (must be < curve order, nonzero).
        if let Ok(pk) = PrivateKey::from_bytes(&seed) {
            let wif = pk.to_wif(MAINNET_WIF_PREFIX);
            let pk2 = PrivateKey::from_wif(&wif).unwrap();
            prop_assert_eq!(pk.to_hex(), pk2.to_hex());
        }
    }

    #[test]
    fn ecdsa_sign_verify_der_roundtrip(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        if let Ok(pk) = PrivateKey::from_bytes(&seed) {
            let hash = sha256(&msg);
            let der = pk.sign(&hash).unwrap().to_der();
            let sig = Signature::from_der(&der).unwrap();
            prop_assert!(pk.pub_key().verify(&hash, &sig));
        }
    }

    #[test]
    fn hash_hex_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let hash = Hash::new(bytes);
        let hash2 = Hash::from_hex(&hash.to_string()).unwrap();
        prop_assert_eq!(hash, hash2);
    }

    #[test]
    fn varint_roundtrip(value in any::<u64>()) {
        let mut writer = ByteWriter::new();
        writer.write_varint(VarInt(value));
        let bytes = writer.into_bytes();
        prop_assert_eq!(bytes.len(), VarInt(value).length());
        let mut reader = ByteReader::new(&bytes);
        prop_assert_eq!(reader.read_varint().unwrap(), VarInt(value));
        prop_assert_eq!(reader.remaining(), 0);
    }
}
