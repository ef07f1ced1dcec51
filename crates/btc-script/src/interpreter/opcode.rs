//! Process-wide opcode catalog.
//!
//! Every byte value has one entry holding its name, its operand length rule
//! and the function that executes it. The table is built once on first use
//! and shared read-only by the parser, the disassembler and every engine.

use std::sync::OnceLock;

use super::engine::Engine;
use super::error::{InterpreterError, InterpreterErrorCode};
use super::{ops_arithmetic, ops_crypto, ops_data, ops_flow, ops_stack};
use crate::instruction::Instruction;
use crate::opcodes::*;

/// Execution function of an opcode.
pub type ExecFn = fn(&mut Engine<'_>, &Instruction) -> Result<(), InterpreterError>;

/// Operand layout following an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandLength {
    /// The opcode stands alone.
    None,
    /// A fixed number of operand bytes follows.
    Fixed(usize),
    /// A little-endian length prefix of this many bytes follows, then the data.
    Prefixed(usize),
}

/// One catalog entry.
pub struct Opcode {
    pub value: u8,
    name: String,
    /// `1` for a bare opcode, `n > 1` for `n - 1` operand bytes, `-1/-2/-4`
    /// for a length prefix of that width.
    pub length: i8,
    pub exec: ExecFn,
}

impl Opcode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operand_length(&self) -> OperandLength {
        match self.length {
            l if l < 0 => OperandLength::Prefixed(l.unsigned_abs() as usize),
            1 => OperandLength::None,
            l => OperandLength::Fixed(l as usize - 1),
        }
    }
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opcode")
            .field("value", &self.value)
            .field("name", &self.name)
            .field("length", &self.length)
            .finish()
    }
}

static TABLE: OnceLock<Vec<Opcode>> = OnceLock::new();

/// The full 256-entry catalog, indexed by opcode byte.
pub fn table() -> &'static [Opcode] {
    TABLE.get_or_init(|| (0..=u8::MAX).map(describe).collect())
}

/// The catalog entry for `op`.
pub fn lookup(op: u8) -> &'static Opcode {
    &table()[op as usize]
}

/// Find an opcode by its name, e.g. `OP_CHECKSIG`.
pub fn opcode_by_name(name: &str) -> Option<&'static Opcode> {
    table().iter().find(|o| o.name == name)
}

fn entry(value: u8, name: impl Into<String>, length: i8, exec: ExecFn) -> Opcode {
    Opcode { value, name: name.into(), length, exec }
}

fn describe(op: u8) -> Opcode {
    match op {
        OP_0 => entry(op, "OP_0", 1, ops_data::op_push_small_int),
        OP_DATA_1..=OP_DATA_75 => {
            entry(op, format!("OP_DATA_{}", op), op as i8 + 1, ops_data::op_push_data)
        }
        OP_PUSHDATA1 => entry(op, "OP_PUSHDATA1", -1, ops_data::op_push_data),
        OP_PUSHDATA2 => entry(op, "OP_PUSHDATA2", -2, ops_data::op_push_data),
        OP_PUSHDATA4 => entry(op, "OP_PUSHDATA4", -4, ops_data::op_push_data),
        OP_1NEGATE => entry(op, "OP_1NEGATE", 1, ops_data::op_1negate),
        OP_RESERVED => entry(op, "OP_RESERVED", 1, op_reserved),
        OP_1..=OP_16 => {
            entry(op, format!("OP_{}", op - (OP_1 - 1)), 1, ops_data::op_push_small_int)
        }

        OP_NOP => entry(op, "OP_NOP", 1, ops_flow::op_nop),
        OP_VER => entry(op, "OP_VER", 1, op_reserved),
        OP_IF => entry(op, "OP_IF", 1, ops_flow::op_if),
        OP_NOTIF => entry(op, "OP_NOTIF", 1, ops_flow::op_notif),
        OP_VERIF => entry(op, "OP_VERIF", 1, op_reserved),
        OP_VERNOTIF => entry(op, "OP_VERNOTIF", 1, op_reserved),
        OP_ELSE => entry(op, "OP_ELSE", 1, ops_flow::op_else),
        OP_ENDIF => entry(op, "OP_ENDIF", 1, ops_flow::op_endif),
        OP_VERIFY => entry(op, "OP_VERIFY", 1, ops_flow::op_verify),
        OP_RETURN => entry(op, "OP_RETURN", 1, ops_flow::op_return),

        OP_TOALTSTACK => entry(op, "OP_TOALTSTACK", 1, op_unsupported),
        OP_FROMALTSTACK => entry(op, "OP_FROMALTSTACK", 1, op_unsupported),
        OP_2DROP => entry(op, "OP_2DROP", 1, ops_stack::op_2drop),
        OP_2DUP => entry(op, "OP_2DUP", 1, ops_stack::op_2dup),
        OP_3DUP => entry(op, "OP_3DUP", 1, ops_stack::op_3dup),
        OP_2OVER => entry(op, "OP_2OVER", 1, op_unsupported),
        OP_2ROT => entry(op, "OP_2ROT", 1, op_unsupported),
        OP_2SWAP => entry(op, "OP_2SWAP", 1, op_unsupported),
        OP_IFDUP => entry(op, "OP_IFDUP", 1, op_unsupported),
        OP_DEPTH => entry(op, "OP_DEPTH", 1, ops_stack::op_depth),
        OP_DROP => entry(op, "OP_DROP", 1, ops_stack::op_drop),
        OP_DUP => entry(op, "OP_DUP", 1, ops_stack::op_dup),
        OP_NIP => entry(op, "OP_NIP", 1, ops_stack::op_nip),
        OP_OVER => entry(op, "OP_OVER", 1, ops_stack::op_over),
        OP_PICK => entry(op, "OP_PICK", 1, op_unsupported),
        OP_ROLL => entry(op, "OP_ROLL", 1, op_unsupported),
        OP_ROT => entry(op, "OP_ROT", 1, op_unsupported),
        OP_SWAP => entry(op, "OP_SWAP", 1, ops_stack::op_swap),
        OP_TUCK => entry(op, "OP_TUCK", 1, op_unsupported),

        OP_CAT => entry(op, "OP_CAT", 1, op_unsupported),
        OP_SUBSTR => entry(op, "OP_SUBSTR", 1, op_unsupported),
        OP_LEFT => entry(op, "OP_LEFT", 1, op_unsupported),
        OP_RIGHT => entry(op, "OP_RIGHT", 1, op_unsupported),
        OP_SIZE => entry(op, "OP_SIZE", 1, ops_data::op_size),

        OP_INVERT => entry(op, "OP_INVERT", 1, op_unsupported),
        OP_AND => entry(op, "OP_AND", 1, op_unsupported),
        OP_OR => entry(op, "OP_OR", 1, op_unsupported),
        OP_XOR => entry(op, "OP_XOR", 1, op_unsupported),
        OP_EQUAL => entry(op, "OP_EQUAL", 1, ops_data::op_equal),
        OP_EQUALVERIFY => entry(op, "OP_EQUALVERIFY", 1, ops_data::op_equalverify),
        OP_RESERVED1 => entry(op, "OP_RESERVED1", 1, op_reserved),
        OP_RESERVED2 => entry(op, "OP_RESERVED2", 1, op_reserved),

        OP_1ADD => entry(op, "OP_1ADD", 1, ops_arithmetic::op_1add),
        OP_1SUB => entry(op, "OP_1SUB", 1, ops_arithmetic::op_1sub),
        OP_2MUL => entry(op, "OP_2MUL", 1, op_unsupported),
        OP_2DIV => entry(op, "OP_2DIV", 1, op_unsupported),
        OP_NEGATE => entry(op, "OP_NEGATE", 1, op_unsupported),
        OP_ABS => entry(op, "OP_ABS", 1, op_unsupported),
        OP_NOT => entry(op, "OP_NOT", 1, op_unsupported),
        OP_0NOTEQUAL => entry(op, "OP_0NOTEQUAL", 1, op_unsupported),
        OP_ADD => entry(op, "OP_ADD", 1, ops_arithmetic::op_add),
        OP_SUB => entry(op, "OP_SUB", 1, ops_arithmetic::op_sub),
        OP_MUL => entry(op, "OP_MUL", 1, op_unsupported),
        OP_DIV => entry(op, "OP_DIV", 1, op_unsupported),
        OP_MOD => entry(op, "OP_MOD", 1, op_unsupported),
        OP_LSHIFT => entry(op, "OP_LSHIFT", 1, op_unsupported),
        OP_RSHIFT => entry(op, "OP_RSHIFT", 1, op_unsupported),
        OP_BOOLAND => entry(op, "OP_BOOLAND", 1, op_unsupported),
        OP_BOOLOR => entry(op, "OP_BOOLOR", 1, op_unsupported),
        OP_NUMEQUAL => entry(op, "OP_NUMEQUAL", 1, ops_arithmetic::op_numequal),
        OP_NUMEQUALVERIFY => {
            entry(op, "OP_NUMEQUALVERIFY", 1, ops_arithmetic::op_numequalverify)
        }
        OP_NUMNOTEQUAL => entry(op, "OP_NUMNOTEQUAL", 1, op_unsupported),
        OP_LESSTHAN => entry(op, "OP_LESSTHAN", 1, op_unsupported),
        OP_GREATERTHAN => entry(op, "OP_GREATERTHAN", 1, op_unsupported),
        OP_LESSTHANOREQUAL => entry(op, "OP_LESSTHANOREQUAL", 1, op_unsupported),
        OP_GREATERTHANOREQUAL => entry(op, "OP_GREATERTHANOREQUAL", 1, op_unsupported),
        OP_MIN => entry(op, "OP_MIN", 1, op_unsupported),
        OP_MAX => entry(op, "OP_MAX", 1, op_unsupported),
        OP_WITHIN => entry(op, "OP_WITHIN", 1, op_unsupported),

        OP_RIPEMD160 => entry(op, "OP_RIPEMD160", 1, ops_crypto::op_ripemd160),
        OP_SHA1 => entry(op, "OP_SHA1", 1, op_unsupported),
        OP_SHA256 => entry(op, "OP_SHA256", 1, ops_crypto::op_sha256),
        OP_HASH160 => entry(op, "OP_HASH160", 1, ops_crypto::op_hash160),
        OP_HASH256 => entry(op, "OP_HASH256", 1, ops_crypto::op_hash256),
        OP_CODESEPARATOR => entry(op, "OP_CODESEPARATOR", 1, ops_crypto::op_codeseparator),
        OP_CHECKSIG => entry(op, "OP_CHECKSIG", 1, ops_crypto::op_checksig),
        OP_CHECKSIGVERIFY => entry(op, "OP_CHECKSIGVERIFY", 1, ops_crypto::op_checksigverify),
        OP_CHECKMULTISIG => entry(op, "OP_CHECKMULTISIG", 1, ops_crypto::op_checkmultisig),
        OP_CHECKMULTISIGVERIFY => {
            entry(op, "OP_CHECKMULTISIGVERIFY", 1, ops_crypto::op_checkmultisigverify)
        }

        OP_NOP1 => entry(op, "OP_NOP1", 1, op_unsupported),
        OP_CHECKLOCKTIMEVERIFY => entry(op, "OP_CHECKLOCKTIMEVERIFY", 1, op_unsupported),
        OP_CHECKSEQUENCEVERIFY => entry(op, "OP_CHECKSEQUENCEVERIFY", 1, op_unsupported),
        OP_NOP4..=OP_NOP10 => {
            entry(op, format!("OP_NOP{}", op - OP_NOP4 + 4), 1, op_unsupported)
        }
        OP_CHECKSIGADD => entry(op, "OP_CHECKSIGADD", 1, op_unsupported),
        OP_INVALIDOPCODE => entry(op, "OP_INVALIDOPCODE", 1, op_unsupported),
        _ => entry(op, format!("OP_UNKNOWN{}", op), 1, op_unsupported),
    }
}

fn op_unsupported(_: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    Err(InterpreterError::new(
        InterpreterErrorCode::UnsupportedOpcode,
        format!("attempt to execute unsupported opcode {}", ins.name()),
    ))
}

fn op_reserved(_: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    Err(InterpreterError::new(
        InterpreterErrorCode::ReservedOpcode,
        format!("attempt to execute reserved opcode {}", ins.name()),
    ))
}
