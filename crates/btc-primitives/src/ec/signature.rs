//! ECDSA signature with strict DER serialization.
//!
//! Signatures are produced with RFC6979 deterministic nonces and are always
//! low-S normalized (BIP-0062), so the DER form embedded in a scriptSig is
//! canonical.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// The secp256k1 curve order N.
const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
    0x41, 0x41,
];

/// N/2, the largest S value allowed after normalization.
const HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B,
    0x20, 0xA0,
];

/// Maximum DER-encoded length of a secp256k1 signature.
pub const MAX_DER_LEN: usize = 72;

/// An ECDSA signature with big-endian R and S components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    /// Create a signature from raw R and S 32-byte arrays.
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Signature { r, s }
    }

    /// The R component.
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// The S component.
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Parse a strictly DER-encoded ECDSA signature.
    ///
    /// Expected format: `0x30 <len> 0x02 <r_len> <r> 0x02 <s_len> <s>`, with
    /// the total length matching the input exactly and both integers
    /// positive and minimally encoded.
    ///
    /// # Arguments
    /// * `bytes` - DER-encoded signature bytes, without a sighash byte.
    ///
    /// # Returns
    /// `Ok(Signature)` on success, or an error if the DER encoding is malformed.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let malformed = |why: &str| PrimitivesError::InvalidSignature(format!("malformed signature: {}", why));

        if bytes.len() < 8 || bytes.len() > MAX_DER_LEN {
            return Err(malformed("bad length"));
        }
        if bytes[0] != 0x30 {
            return Err(malformed("no header magic"));
        }
        if bytes[1] as usize != bytes.len() - 2 {
            return Err(malformed("length does not match content"));
        }

        let (r, rest) = parse_der_int(&bytes[2..]).ok_or_else(|| malformed("bogus R"))?;
        let (s, rest) = parse_der_int(rest).ok_or_else(|| malformed("bogus S"))?;
        if !rest.is_empty() {
            return Err(malformed("trailing bytes"));
        }

        Ok(Signature { r, s })
    }

    /// Serialize the signature in DER format with low-S normalization.
    pub fn to_der(&self) -> Vec<u8> {
        let s = if is_high(&self.s) { negate(&self.s) } else { self.s };

        let rb = canonicalize_int(&self.r);
        let sb = canonicalize_int(&s);

        let total_len = 6 + rb.len() + sb.len();
        let mut out = Vec::with_capacity(total_len);
        out.push(0x30);
        out.push((total_len - 2) as u8);
        out.push(0x02);
        out.push(rb.len() as u8);
        out.extend_from_slice(&rb);
        out.push(0x02);
        out.push(sb.len() as u8);
        out.extend_from_slice(&sb);
        out
    }

    /// Sign a 32-byte hash with RFC6979 deterministic nonces.
    ///
    /// # Arguments
    /// * `hash` - The precomputed message hash.
    /// * `priv_key` - The private key to sign with.
    ///
    /// # Returns
    /// A low-S `Signature`, or an error if signing fails.
    pub fn sign(hash: &[u8; 32], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let (k256_sig, _recovery_id) = priv_key
            .signing_key()
            .sign_prehash_recoverable(hash)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;

        let (r_bytes, s_bytes) = k256_sig.split_bytes();
        let r: [u8; 32] = r_bytes.into();
        let mut s: [u8; 32] = s_bytes.into();
        if is_high(&s) {
            s = negate(&s);
        }

        Ok(Signature { r, s })
    }

    /// Verify this signature against a 32-byte hash and public key.
    pub fn verify(&self, hash: &[u8; 32], pub_key: &PublicKey) -> bool {
        let k256_sig = match ecdsa::Signature::from_scalars(
            k256::FieldBytes::from(self.r),
            k256::FieldBytes::from(self.s),
        ) {
            Ok(sig) => sig,
            Err(_) => return false,
        };

        pub_key
            .verifying_key()
            .verify_prehash(hash, &k256_sig)
            .is_ok()
    }
}

/// Parse one `0x02 <len> <int>` element, returning the value left-padded to
/// 32 bytes and the unconsumed remainder.
fn parse_der_int(data: &[u8]) -> Option<([u8; 32], &[u8])> {
    if data.len() < 2 || data[0] != 0x02 {
        return None;
    }
    let len = data[1] as usize;
    if len == 0 || data.len() < 2 + len {
        return None;
    }
    let int = &data[2..2 + len];
    // Negative values and redundant leading zeros are not canonical.
    if int[0] & 0x80 != 0 {
        return None;
    }
    if len > 1 && int[0] == 0x00 && int[1] & 0x80 == 0 {
        return None;
    }
    let trimmed = if int[0] == 0x00 { &int[1..] } else { int };
    if trimmed.len() > 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out[32 - trimmed.len()..].copy_from_slice(trimmed);
    Some((out, &data[2 + len..]))
}

/// Strip leading zeros and re-add one if the high bit would read as negative.
fn canonicalize_int(val: &[u8; 32]) -> Vec<u8> {
    let first = val.iter().position(|&b| b != 0).unwrap_or(31);
    let mut out = Vec::with_capacity(33);
    if val[first] & 0x80 != 0 {
        out.push(0x00);
    }
    out.extend_from_slice(&val[first..]);
    out
}

fn is_high(s: &[u8; 32]) -> bool {
    s > &HALF_ORDER
}

/// N - s, big-endian.
fn negate(s: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = CURVE_ORDER[i] as i16 - s[i] as i16 - borrow;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        } else {
            borrow = 0;
        }
        out[i] = diff as u8;
    }
    out
}
