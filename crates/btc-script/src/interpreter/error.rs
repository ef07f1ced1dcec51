//! Interpreter error types.

use std::fmt;

/// Error codes for the script interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterErrorCode {
    /// A stack operation referenced an item deeper than the stack.
    InvalidStackOperation,
    /// A number operand is longer than the configured maximum.
    NumberTooBig,
    /// A number operand is not minimally encoded.
    MinimalData,
    /// An IF/NOTIF condition other than empty or `0x01`.
    MinimalIf,
    /// ELSE/ENDIF without IF, or IF left open at the end of a script.
    UnbalancedConditional,
    /// CHECKSIG family executed without a hasher callback.
    MissingHasher,
    /// CHECKSIG family executed without a verifier callback.
    MissingVerifier,
    /// The hasher callback failed to produce a signature hash.
    SigHash,
    /// The final stack is empty.
    EmptyStack,
    /// The final top-of-stack is false.
    EvalFalse,
    /// OP_RETURN was executed.
    EarlyReturn,
    /// The opcode is known but not implemented by this machine.
    UnsupportedOpcode,
    /// OP_RESERVED and friends.
    ReservedOpcode,
    /// A push runs past the end of the script.
    MalformedPush,
    /// P2SH unlocking scripts may only push data.
    NotPushOnly,
    ScriptTooBig,
    ElementTooBig,
    TooManyOperations,
    StackOverflow,
    InvalidPubKeyCount,
    InvalidSignatureCount,
    Verify,
    EqualVerify,
    NumEqualVerify,
    CheckSigVerify,
    CheckMultiSigVerify,
}

impl fmt::Display for InterpreterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A script interpreter error with an error code and description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterError {
    pub code: InterpreterErrorCode,
    pub description: String,
}

impl InterpreterError {
    pub fn new(code: InterpreterErrorCode, description: impl Into<String>) -> Self {
        InterpreterError { code, description: description.into() }
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

impl std::error::Error for InterpreterError {}

impl From<crate::ScriptError> for InterpreterError {
    fn from(e: crate::ScriptError) -> Self {
        InterpreterError::new(InterpreterErrorCode::MalformedPush, e.to_string())
    }
}
