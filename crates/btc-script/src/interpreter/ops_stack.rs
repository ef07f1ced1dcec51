//! Stack manipulation operations for the script interpreter.

use super::engine::Engine;
use super::error::InterpreterError;
use super::scriptnum::ScriptNum;
use crate::instruction::Instruction;

pub(super) fn op_dup(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.dup_n(1)
}

pub(super) fn op_2dup(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.dup_n(2)
}

pub(super) fn op_3dup(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.dup_n(3)
}

pub(super) fn op_drop(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.drop_n(1)
}

pub(super) fn op_2drop(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.drop_n(2)
}

pub(super) fn op_nip(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.nip_n(1).map(|_| ())
}

pub(super) fn op_over(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.over()
}

pub(super) fn op_swap(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    e.dstack.swap()
}

pub(super) fn op_depth(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    let depth = ScriptNum(e.dstack.depth() as i64);
    e.dstack.push_int(depth);
    Ok(())
}
