/// Bitcoin toolkit - Cryptographic primitives, hashing, and byte codecs.
///
/// This crate provides the foundational building blocks for the toolkit:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Chain hash type for transaction identification
/// - Byte cursor with CompactSize variable-length integers
/// - secp256k1 private keys, public keys and DER signatures

pub mod hash;
pub mod chainhash;
pub mod util;
pub mod ec;

mod error;
pub use error::PrimitivesError;
