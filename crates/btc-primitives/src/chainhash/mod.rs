//! Chain hash type for transaction identification.
//!
//! Provides a `Hash` type, a 32-byte array displayed as byte-reversed hex,
//! matching Bitcoin's convention for transaction IDs. Internal computation
//! always stays in natural (little-endian) byte order; reversal happens only
//! when formatting or parsing the human-readable form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Size of a Hash in bytes.
pub const HASH_SIZE: usize = 32;

/// Maximum hex string length for a Hash (64 hex characters).
pub const MAX_HASH_STRING_SIZE: usize = HASH_SIZE * 2;

/// A 32-byte hash used for transaction IDs and outpoint references.
///
/// When displayed as a string, the bytes are reversed to match Bitcoin's
/// standard representation (little-endian internal, big-endian display).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a Hash from a raw 32-byte array in internal byte order.
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a Hash from a byte slice.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 32 bytes.
    ///
    /// # Returns
    /// `Ok(Hash)` if the slice is 32 bytes, or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidHash(format!(
                "invalid hash length of {}, want {}",
                bytes.len(),
                HASH_SIZE
            ))
        })?;
        Ok(Hash(arr))
    }

    /// Create a Hash from a byte-reversed hex string.
    ///
    /// The hex string represents bytes in display order (reversed from
    /// internal storage). Short strings are zero-padded on the high end.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string of up to 64 characters.
    ///
    /// # Returns
    /// `Ok(Hash)` on success, or an error for invalid input.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.len() > MAX_HASH_STRING_SIZE {
            return Err(PrimitivesError::InvalidHash(format!(
                "max hash string length is {} bytes",
                MAX_HASH_STRING_SIZE
            )));
        }

        let padded = if hex_str.len() % 2 != 0 {
            format!("0{}", hex_str)
        } else {
            hex_str.to_string()
        };

        let decoded = hex::decode(&padded)?;
        let mut display_order = [0u8; HASH_SIZE];
        display_order[HASH_SIZE - decoded.len()..].copy_from_slice(&decoded);
        display_order.reverse();

        Ok(Hash(display_order))
    }

    /// Double-SHA-256 the given data and wrap the digest as a Hash.
    pub fn double_sha256(data: &[u8]) -> Self {
        Hash(sha256d(data))
    }

    /// Access the internal byte array as a reference.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Return the internal bytes in display (big-endian) order.
    pub fn to_reversed_bytes(&self) -> [u8; HASH_SIZE] {
        let mut reversed = self.0;
        reversed.reverse();
        reversed
    }
}

/// Display the hash as byte-reversed hex (Bitcoin convention).
///
/// Internal bytes `[0x06, 0xe5, ...]` display as `"...e506"`.
impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_reversed_bytes()))
    }
}

impl FromStr for Hash {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }
}

/// Serialize as a display-order hex string in JSON.
impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Genesis block hash bytes in internal (little-endian) order.
    const MAIN_NET_GENESIS_HASH: Hash = Hash([
        0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72,
        0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63, 0xf7, 0x4f,
        0x93, 0x1e, 0x83, 0x65, 0xe1, 0x5a, 0x08, 0x9c,
        0x68, 0xd6, 0x19, 0x00, 0x00, 0x00, 0x00, 0x00,
    ]);

    #[test]
    fn test_hash_string() {
        let hash = Hash::new([
            0x06, 0xe5, 0x33, 0xfd, 0x1a, 0xda, 0x86, 0x39,
            0x1f, 0x3f, 0x6c, 0x34, 0x32, 0x04, 0xb0, 0xd2,
            0x78, 0xd4, 0xaa, 0xec, 0x1c, 0x0b, 0x20, 0xaa,
            0x27, 0xba, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);
        assert_eq!(
            hash.to_string(),
            "000000000003ba27aa200b1cecaad478d2b00432346c3f1f3986da1afd33e506"
        );
    }

    #[test]
    fn test_new_hash_from_hex() {
        let result = Hash::from_hex(
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
        )
        .unwrap();
        assert_eq!(result, MAIN_NET_GENESIS_HASH);

        // Leading zeros stripped.
        let result =
            Hash::from_hex("19d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f").unwrap();
        assert_eq!(result, MAIN_NET_GENESIS_HASH);

        assert_eq!(Hash::from_hex("").unwrap(), Hash::default());

        let mut one = [0u8; HASH_SIZE];
        one[0] = 1;
        assert_eq!(Hash::from_hex("1").unwrap(), Hash::new(one));

        assert!(Hash::from_hex(
            "01234567890123456789012345678901234567890123456789012345678912345"
        )
        .is_err());
        assert!(Hash::from_hex("abcdefg").is_err());
    }

    #[test]
    fn test_from_bytes_length() {
        assert!(Hash::from_bytes(&[0u8; HASH_SIZE + 1]).is_err());
        assert!(Hash::from_bytes(&[0u8; 31]).is_err());
        let h = Hash::from_bytes(MAIN_NET_GENESIS_HASH.as_bytes()).unwrap();
        assert_eq!(h, MAIN_NET_GENESIS_HASH);
    }

    #[test]
    fn test_marshalling() {
        #[derive(Serialize, Deserialize)]
        struct TestData {
            hash: Hash,
        }

        let data = TestData { hash: MAIN_NET_GENESIS_HASH };
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(
            json,
            r#"{"hash":"000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"}"#
        );

        let data2: TestData = serde_json::from_str(&json).unwrap();
        assert_eq!(data2.hash, MAIN_NET_GENESIS_HASH);
    }
}
