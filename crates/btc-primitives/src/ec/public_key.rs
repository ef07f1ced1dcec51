//! secp256k1 public key with Bitcoin-specific functionality.
//!
//! Supports SEC1 compressed/uncompressed serialization, Hash160 commitments
//! and ECDSA signature verification.

use std::fmt;

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::ec::signature::Signature;
use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of a compressed public key in bytes (prefix + 32 byte x-coordinate).
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed public key in bytes (prefix + 32 byte x + 32 byte y).
pub const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key used to verify input signatures.
#[derive(Clone, Debug)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Create a PublicKey from raw SEC1 encoded bytes.
    ///
    /// Accepts both compressed (33-byte) and uncompressed (65-byte) formats.
    ///
    /// # Arguments
    /// * `bytes` - SEC1-encoded public key bytes.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or an error if the bytes don't represent a valid point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.is_empty() {
            return Err(PrimitivesError::InvalidPublicKey(
                "pubkey bytes are empty".to_string(),
            ));
        }
        let inner = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey { inner })
    }

    /// Create a PublicKey from a hex-encoded SEC1 string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Serialize the public key in compressed SEC1 format (33 bytes).
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize the public key in uncompressed SEC1 format (65 bytes).
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize in the requested SEC1 form.
    ///
    /// # Arguments
    /// * `compressed` - `true` for the 33-byte form, `false` for the 65-byte form.
    pub fn serialize(&self, compressed: bool) -> Vec<u8> {
        if compressed {
            self.to_compressed().to_vec()
        } else {
            self.to_uncompressed().to_vec()
        }
    }

    /// Hex of the compressed form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Hash160 of the serialized key, the payload of P2PKH and P2WPKH scripts.
    ///
    /// # Arguments
    /// * `compressed` - Which SEC1 form to hash.
    pub fn hash160(&self, compressed: bool) -> [u8; 20] {
        hash160(&self.serialize(compressed))
    }

    /// Verify an ECDSA signature against a 32-byte message hash.
    ///
    /// # Returns
    /// `true` if the signature is valid for this hash and public key, `false` otherwise.
    pub fn verify(&self, hash: &[u8; 32], sig: &Signature) -> bool {
        sig.verify(hash, self)
    }

    /// Verify a DER-encoded signature, failing with `InvalidSignature`.
    ///
    /// The DER bytes must not carry the trailing sighash-type byte.
    pub fn verify_der(&self, hash: &[u8; 32], der: &[u8]) -> Result<(), PrimitivesError> {
        let sig = Signature::from_der(der)?;
        if self.verify(hash, &sig) {
            Ok(())
        } else {
            Err(PrimitivesError::InvalidSignature(
                "signature does not match public key".to_string(),
            ))
        }
    }

    pub(crate) fn from_k256_verifying_key(vk: &VerifyingKey) -> Self {
        PublicKey { inner: *vk }
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_compressed() == other.to_compressed()
    }
}

impl Eq for PublicKey {}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
