#![deny(missing_docs)]

//! Bitcoin transaction toolkit - Complete SDK.
//!
//! Re-exports the primitives, script and transaction crates for
//! convenient single-crate usage.

/// Hashes, keys, signatures and byte codecs.
pub use btc_primitives as primitives;
/// Scripts, addresses, templates and the interpreter.
pub use btc_script as script;
/// Transactions, signature hashes, signing, verification and the builder.
pub use btc_transaction as transaction;

/// The types most callers need to build and check a transaction.
pub mod prelude {
    pub use btc_primitives::ec::{PrivateKey, PublicKey};
    pub use btc_script::{Address, AddressKind, Network, Script};
    pub use btc_transaction::{
        BuilderConfig, BuilderError, Coin, Outpoint, Transaction, TransactionBuilder,
        TransactionError, TxIn, TxOut,
    };
}
