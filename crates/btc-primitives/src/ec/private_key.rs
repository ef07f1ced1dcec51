//! secp256k1 private key with Bitcoin-specific functionality.
//!
//! Wraps the k256 signing key and adds WIF encoding and low-S ECDSA signing
//! over precomputed 32-byte signature hashes.

use std::fmt;

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::hash::sha256d;
use crate::PrimitivesError;

/// Length of a serialized private key in bytes.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Mainnet WIF prefix byte.
pub const MAINNET_WIF_PREFIX: u8 = 0x80;

/// Testnet and regtest WIF prefix byte.
pub const TESTNET_WIF_PREFIX: u8 = 0xef;

/// Compression flag byte appended to WIF for compressed public keys.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 private key used to sign transaction inputs.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a new random private key using the OS random number generator.
    pub fn new() -> Self {
        PrivateKey { inner: SigningKey::random(&mut OsRng) }
    }

    /// Create a private key from a raw 32-byte big-endian scalar.
    ///
    /// # Arguments
    /// * `bytes` - A 32-byte slice representing the private key scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` if the bytes represent a valid scalar on secp256k1,
    /// or an error if the scalar is zero or out of range.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidKeyLength {
                expected: PRIVATE_KEY_BYTES_LEN,
                got: bytes.len(),
            });
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner })
    }

    /// Create a private key from a hex-encoded 32-byte scalar.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Create a private key from a WIF (Wallet Import Format) string.
    ///
    /// Accepts both the compressed (38-byte payload) and uncompressed
    /// (37-byte payload) forms and any network prefix.
    ///
    /// # Arguments
    /// * `wif` - A Base58Check-encoded WIF string.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` on success, or an error if the WIF is malformed or the checksum fails.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        let decoded = bs58::decode(wif)
            .into_vec()
            .map_err(|e| PrimitivesError::InvalidWif(e.to_string()))?;

        let payload_len = match decoded.len() {
            38 if decoded[33] == COMPRESS_MAGIC => 34,
            38 => {
                return Err(PrimitivesError::InvalidWif(
                    "malformed private key: invalid compression flag".to_string(),
                ))
            }
            37 => 33,
            n => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "malformed private key: invalid length {}",
                    n
                )))
            }
        };

        let checksum = sha256d(&decoded[..payload_len]);
        if checksum[..4] != decoded[payload_len..] {
            return Err(PrimitivesError::ChecksumMismatch);
        }

        Self::from_bytes(&decoded[1..1 + PRIVATE_KEY_BYTES_LEN])
    }

    /// Encode the private key as a compressed-key WIF string.
    ///
    /// # Arguments
    /// * `prefix` - The network prefix byte (`MAINNET_WIF_PREFIX` or `TESTNET_WIF_PREFIX`).
    pub fn to_wif(&self, prefix: u8) -> String {
        let mut payload = Vec::with_capacity(1 + PRIVATE_KEY_BYTES_LEN + 1 + 4);
        payload.push(prefix);
        payload.extend_from_slice(&self.to_bytes());
        payload.push(COMPRESS_MAGIC);

        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);

        bs58::encode(payload).into_string()
    }

    /// Serialize the private key as a 32-byte big-endian array.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    /// Serialize the private key as a lowercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the corresponding public key.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_k256_verifying_key(self.inner.verifying_key())
    }

    /// Sign a 32-byte message hash with RFC6979 deterministic nonces.
    ///
    /// The resulting signature is low-S normalized.
    ///
    /// # Arguments
    /// * `hash` - The precomputed hash to sign.
    ///
    /// # Returns
    /// `Ok(Signature)` on success, or an error if signing fails.
    pub fn sign(&self, hash: &[u8; 32]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PrivateKey {}

/// Only the public half is printed.
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pub_key", &self.pub_key().to_hex())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;

    #[test]
    fn test_priv_keys() {
        let key_bytes: [u8; 32] = [
            0xea, 0xf0, 0x2c, 0xa3, 0x48, 0xc5, 0x24, 0xe6, 0x39, 0x26, 0x55, 0xba, 0x4d, 0x29,
            0x60, 0x3c, 0xd1, 0xa7, 0x34, 0x7d, 0x9d, 0x65, 0xcf, 0xe9, 0x3c, 0xe1, 0xeb, 0xff,
            0xdc, 0xa2, 0x26, 0x94,
        ];

        let priv_key = PrivateKey::from_bytes(&key_bytes).unwrap();
        let pub_key = priv_key.pub_key();

        let uncompressed = pub_key.to_uncompressed();
        assert_eq!(PublicKey::from_bytes(&uncompressed).unwrap(), pub_key);

        let hash = sha256(b"toolkit");
        let sig = priv_key.sign(&hash).unwrap();
        assert!(pub_key.verify(&hash, &sig));

        assert_eq!(priv_key.to_bytes(), key_bytes);
    }

    #[test]
    fn test_private_key_serialization_roundtrips() {
        let pk = PrivateKey::new();

        assert_eq!(PrivateKey::from_bytes(&pk.to_bytes()).unwrap(), pk);
        assert_eq!(PrivateKey::from_hex(&pk.to_hex()).unwrap(), pk);
        assert_eq!(PrivateKey::from_wif(&pk.to_wif(MAINNET_WIF_PREFIX)).unwrap(), pk);
        assert_eq!(PrivateKey::from_wif(&pk.to_wif(TESTNET_WIF_PREFIX)).unwrap(), pk);
    }

    #[test]
    fn test_known_wif() {
        // Private key 1 encodes to this well-known compressed mainnet WIF.
        let wif = "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn";
        let pk = PrivateKey::from_wif(wif).unwrap();
        assert_eq!(
            pk.to_hex(),
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
        assert_eq!(pk.to_wif(MAINNET_WIF_PREFIX), wif);
    }

    #[test]
    fn test_private_key_invalid_inputs() {
        assert!(PrivateKey::from_hex("").is_err());
        assert!(PrivateKey::from_hex("zz").is_err());
        assert!(PrivateKey::from_bytes(&[0u8; 31]).is_err());
        // Zero is not a valid scalar.
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
        // Modified character breaks the checksum.
        assert!(PrivateKey::from_wif("KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWm").is_err());
        // Truncated.
        assert!(PrivateKey::from_wif("KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHno").is_err());
    }
}
