use btc_primitives::PrimitivesError;
use btc_script::interpreter::InterpreterError;
use btc_script::ScriptError;

use crate::outpoint::Outpoint;

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The wire bytes ended early or held an impossible length.
    #[error("reading {field}: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: PrimitivesError,
    },

    /// A witness marker was followed by a flag other than `0x01`.
    #[error("unsupported witness flag {0:#04x}")]
    WitnessFlag(u8),

    /// The witness flag was set but every input's witness is empty.
    #[error("witness flag set but no input has a witness")]
    SuperfluousWitness,

    /// Bytes remained after a complete transaction was read.
    #[error("trailing {0} bytes after transaction")]
    TrailingBytes(usize),

    #[error("input index {index} out of range (tx has {count} inputs)")]
    IndexOutOfRange { index: usize, count: usize },

    /// More than one signing key was given for an input with no redeem
    /// script to say how they combine.
    #[error("input {0}: multiple keys require a redeem script")]
    MultipleKeysWithoutRedeem(usize),

    /// The input carries no value or locking script for the output it spends.
    #[error("input {0}: spent coin unknown")]
    MissingCoin(usize),

    /// A coin was attached to an input that spends a different output.
    #[error("coin {coin} does not match input outpoint {input}")]
    OutpointMismatch { coin: Outpoint, input: Outpoint },

    /// The scripts of an input did not evaluate to true.
    #[error("input {index} ({outpoint}) failed verification: {source}")]
    Verify {
        index: usize,
        outpoint: Outpoint,
        #[source]
        source: InterpreterError,
    },

    /// An underlying script error (forwarded from `btc-script`).
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// An underlying primitives error (forwarded from `btc-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] PrimitivesError),
}

/// Error types for [`TransactionBuilder`](crate::TransactionBuilder).
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("no inputs")]
    NoInputs,

    #[error("no outputs")]
    NoOutputs,

    /// Change is owed but nowhere to send it.
    #[error("no change address for change of {0}")]
    NoChangeAddress(u64),

    #[error("group {group}: no signing keys")]
    NoSigningKeys { group: usize },

    #[error("fee {fee} exceeds maximum {max}")]
    FeeTooHigh { fee: u64, max: u64 },

    /// Outputs spend more than the inputs bring in.
    #[error("amount not enough")]
    AmountNotEnough,

    /// Inputs cover the outputs but not the fee on top.
    #[error("insufficient fee: need {fee}, have {available}")]
    InsufficientFee { fee: u64, available: u64 },

    /// Summing input or output values overflowed.
    #[error("value overflow")]
    ValueOverflow,

    /// A failure while resolving or signing one group.
    #[error("group {group}: {source}")]
    Group {
        group: usize,
        #[source]
        source: TransactionError,
    },

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}
