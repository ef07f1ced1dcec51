/// Error types for script operations.
///
/// Covers script codec failures, address encoding problems, script
/// classification and the construction of unlocking data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    /// An unrecognized opcode name was encountered while parsing ASM.
    #[error("invalid opcode: {0}")]
    InvalidOpcode(String),

    /// Invalid opcode data encountered during ASM parsing.
    #[error("invalid opcode data")]
    InvalidOpcodeData,

    /// Attempted to use `append_opcodes` for a push data opcode.
    #[error("use append_push_data for push data opcodes: {0}")]
    InvalidOpcodeType(String),

    /// A push opcode claims more operand bytes than the script holds.
    #[error("malformed push at offset {offset}: opcode {opcode} needs {needed} bytes, {remaining} left")]
    MalformedPush {
        offset: usize,
        opcode: String,
        needed: usize,
        remaining: usize,
    },

    /// Push data exceeds the largest length-prefix form.
    #[error("data too big: {0} bytes")]
    DataTooBig(usize),

    /// The locking script matches none of the standard shapes.
    #[error("script type unknown: {0}")]
    UnknownScriptType(String),

    /// The multisig redeem script asks for more signatures than it has keys.
    #[error("pubkeys less than nrequired: {pubkeys} < {nrequired}")]
    PubKeysLessThanRequired { pubkeys: usize, nrequired: usize },

    /// The multisig parameters are outside the encodable range.
    #[error("invalid multisig parameters: {0}")]
    InvalidMultisig(String),

    /// A script-hash variant needs a redeem script and none was given.
    #[error("redeem script required for {0}")]
    MissingRedeemScript(&'static str),

    /// The redeem script does not hash to the script's commitment.
    #[error("redeem script does not match {kind} commitment {expected}")]
    RedeemScriptMismatch { kind: &'static str, expected: String },

    /// Wrong number of signatures for a single-key template.
    #[error("{kind} requires exactly one signature, got {got}")]
    SignatureCount { kind: &'static str, got: usize },

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Address version byte or human-readable part is not recognized.
    #[error("address not supported: {0}")]
    UnsupportedAddress(String),

    /// Base58Check checksum does not match.
    #[error("checksum failed")]
    EncodingChecksumFailed,

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Error from primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] btc_primitives::PrimitivesError),
}
