/// Bitcoin toolkit - Transaction model, signing, verification and building.
///
/// Provides the Transaction type with witness-aware serialization, ids and
/// weight, the legacy and BIP143 signature hashes, per-input signing and
/// script verification, plus a grouped builder with fee estimation.

pub mod builder;
pub mod config;
pub mod estimator;
pub mod input;
pub mod outpoint;
pub mod output;
pub mod sighash;
pub mod transaction;

mod error;
pub use builder::TransactionBuilder;
pub use config::BuilderConfig;
pub use error::{BuilderError, TransactionError};
pub use input::{SpentOutput, TxIn, DEFAULT_SEQUENCE_NUMBER};
pub use outpoint::{Coin, Outpoint};
pub use output::TxOut;
pub use transaction::Transaction;
