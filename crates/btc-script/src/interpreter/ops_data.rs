//! Push, size and equality operations for the script interpreter.

use super::engine::Engine;
use super::error::{InterpreterError, InterpreterErrorCode};
use super::scriptnum::ScriptNum;
use crate::instruction::Instruction;
use crate::opcodes::small_int_value;

/// `OP_DATA_n` and `OP_PUSHDATA1/2/4`: push the operand.
pub(super) fn op_push_data(e: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.push(ins.data().to_vec());
    Ok(())
}

/// `OP_0` and `OP_1`..`OP_16`.
pub(super) fn op_push_small_int(e: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    let n = small_int_value(ins.opcode).ok_or_else(|| {
        InterpreterError::new(
            InterpreterErrorCode::UnsupportedOpcode,
            format!("{} is not a small integer opcode", ins.name()),
        )
    })?;
    e.dstack.push_int(ScriptNum(n as i64));
    Ok(())
}

pub(super) fn op_1negate(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.push_int(ScriptNum(-1));
    Ok(())
}

pub(super) fn op_size(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    let len = e.dstack.peek(0)?.len();
    e.dstack.push_int(ScriptNum(len as i64));
    Ok(())
}

pub(super) fn op_equal(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    let a = e.dstack.pop()?;
    let b = e.dstack.pop()?;
    e.dstack.push_bool(a == b);
    Ok(())
}

pub(super) fn op_equalverify(e: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    op_equal(e, ins)?;
    if !e.dstack.pop_bool()? {
        return Err(InterpreterError::new(
            InterpreterErrorCode::EqualVerify,
            "OP_EQUALVERIFY failed",
        ));
    }
    Ok(())
}
