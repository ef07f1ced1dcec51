/// Unified error type for all primitives operations.
///
/// Covers errors from key handling, signature encoding, hex decoding and
/// the byte cursor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid WIF format: {0}")]
    InvalidWif(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid utf-8: {0}")]
    InvalidUtf8(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("unexpected end of data: need {needed} bytes, have {remaining}")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("length {0} does not fit in memory")]
    LengthOverflow(u64),
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
