//! Flow control operations for the script interpreter.

use super::engine::{Condition, Engine};
use super::error::{InterpreterError, InterpreterErrorCode};
use crate::instruction::Instruction;

/// Pop an IF/NOTIF condition. Only empty and `0x01` are accepted.
fn pop_if_bool(e: &mut Engine<'_>) -> Result<bool, InterpreterError> {
    let b = e.dstack.pop()?;
    match b.as_slice() {
        [] => Ok(false),
        [1] => Ok(true),
        _ if b.len() > 1 => Err(InterpreterError::new(
            InterpreterErrorCode::MinimalIf,
            format!("conditional has data of length {}", b.len()),
        )),
        _ => Err(InterpreterError::new(
            InterpreterErrorCode::MinimalIf,
            format!("conditional value {:02x} is not 0x01", b[0]),
        )),
    }
}

fn push_condition(e: &mut Engine<'_>, negate: bool) -> Result<(), InterpreterError> {
    let cond = if e.is_branch_executing() {
        if pop_if_bool(e)? != negate {
            Condition::True
        } else {
            Condition::False
        }
    } else {
        Condition::Skip
    };
    e.cond_stack.push(cond);
    Ok(())
}

pub(super) fn op_if(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    push_condition(e, false)
}

pub(super) fn op_notif(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    push_condition(e, true)
}

pub(super) fn op_else(e: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    let cond = e.cond_stack.last_mut().ok_or_else(|| {
        InterpreterError::new(
            InterpreterErrorCode::UnbalancedConditional,
            format!("encountered opcode {} with no matching opcode to begin conditional execution", ins.name()),
        )
    })?;
    *cond = match *cond {
        Condition::True => Condition::False,
        Condition::False => Condition::True,
        Condition::Skip => Condition::Skip,
    };
    Ok(())
}

pub(super) fn op_endif(e: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    e.cond_stack.pop().map(|_| ()).ok_or_else(|| {
        InterpreterError::new(
            InterpreterErrorCode::UnbalancedConditional,
            format!("encountered opcode {} with no matching opcode to begin conditional execution", ins.name()),
        )
    })
}

pub(super) fn op_verify(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    if !e.dstack.pop_bool()? {
        return Err(InterpreterError::new(
            InterpreterErrorCode::Verify,
            "OP_VERIFY failed",
        ));
    }
    Ok(())
}

pub(super) fn op_return(_: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    Err(InterpreterError::new(
        InterpreterErrorCode::EarlyReturn,
        "script returned early",
    ))
}

pub(super) fn op_nop(_: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    Ok(())
}
