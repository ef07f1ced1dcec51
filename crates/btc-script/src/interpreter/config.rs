//! Interpreter limits.
//!
//! Defaults are the Bitcoin consensus limits for legacy and witness v0
//! script evaluation.

use serde::{Deserialize, Serialize};

pub const MAX_OPS_PER_SCRIPT: usize = 201;
pub const MAX_STACK_SIZE: usize = 1000;
pub const MAX_SCRIPT_SIZE: usize = 10000;
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
pub const MAX_SCRIPT_NUMBER_LENGTH: usize = 4;
pub const MAX_PUB_KEYS_PER_MULTISIG: usize = 20;

/// Script execution limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Non-push opcodes allowed per executed script.
    pub max_ops: usize,
    /// Combined depth of the data stack.
    pub max_stack_size: usize,
    /// Byte length of one executed script.
    pub max_script_size: usize,
    /// Byte length of one pushed element.
    pub max_script_element_size: usize,
    /// Byte length of a number operand; numbers are at most 8 bytes here.
    pub max_script_number_length: usize,
    pub max_pub_keys_per_multisig: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_ops: MAX_OPS_PER_SCRIPT,
            max_stack_size: MAX_STACK_SIZE,
            max_script_size: MAX_SCRIPT_SIZE,
            max_script_element_size: MAX_SCRIPT_ELEMENT_SIZE,
            max_script_number_length: MAX_SCRIPT_NUMBER_LENGTH,
            max_pub_keys_per_multisig: MAX_PUB_KEYS_PER_MULTISIG,
        }
    }
}
