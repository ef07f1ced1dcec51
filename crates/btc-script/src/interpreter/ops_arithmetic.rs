//! Arithmetic operations for the script interpreter.
//!
//! Operands are read with the configured maximum number length, so sums of
//! two operands always fit in an `i64`.

use super::engine::Engine;
use super::error::{InterpreterError, InterpreterErrorCode};
use super::scriptnum::ScriptNum;
use crate::instruction::Instruction;

fn unary(e: &mut Engine<'_>, f: impl Fn(i64) -> i64) -> Result<(), InterpreterError> {
    let m = e.dstack.pop_int()?;
    e.dstack.push_int(ScriptNum(f(m.0)));
    Ok(())
}

fn binary(e: &mut Engine<'_>, f: impl Fn(i64, i64) -> i64) -> Result<(), InterpreterError> {
    let v0 = e.dstack.pop_int()?;
    let v1 = e.dstack.pop_int()?;
    e.dstack.push_int(ScriptNum(f(v1.0, v0.0)));
    Ok(())
}

pub(super) fn op_1add(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    unary(e, |a| a + 1)
}

pub(super) fn op_1sub(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    unary(e, |a| a - 1)
}

pub(super) fn op_add(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    binary(e, |a, b| a + b)
}

pub(super) fn op_sub(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    binary(e, |a, b| a - b)
}

pub(super) fn op_numequal(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    binary(e, |a, b| (a == b) as i64)
}

pub(super) fn op_numequalverify(e: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    op_numequal(e, ins)?;
    if !e.dstack.pop_bool()? {
        return Err(InterpreterError::new(
            InterpreterErrorCode::NumEqualVerify,
            "OP_NUMEQUALVERIFY failed",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::interpreter::{Engine, InterpreterErrorCode};
    use crate::Script;

    fn run(asm: &str) -> Result<Vec<Vec<u8>>, InterpreterErrorCode> {
        let mut e = Engine::new();
        e.execute(&Script::from_asm(asm).unwrap()).map_err(|err| err.code)?;
        Ok(e.stack().items().to_vec())
    }

    #[test]
    fn test_add_sub() {
        assert_eq!(run("OP_2 OP_3 OP_ADD").unwrap(), vec![vec![5]]);
        assert_eq!(run("OP_2 OP_3 OP_SUB").unwrap(), vec![vec![0x81]]);
        assert_eq!(run("OP_5 OP_1ADD OP_1SUB OP_1SUB").unwrap(), vec![vec![4]]);
        assert_eq!(run("OP_1 OP_1NEGATE OP_ADD").unwrap(), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_add_overflows_into_five_bytes() {
        // 0x7fffffff + 0x7fffffff = 0xfffffffe, needs a sign byte.
        let stack = run("ffffff7f ffffff7f OP_ADD").unwrap();
        assert_eq!(stack, vec![vec![0xfe, 0xff, 0xff, 0xff, 0x00]]);
        // Reading the five-byte result back as a number fails.
        assert_eq!(
            run("ffffff7f ffffff7f OP_ADD OP_1ADD").unwrap_err(),
            InterpreterErrorCode::NumberTooBig
        );
    }

    #[test]
    fn test_non_minimal_operand() {
        assert_eq!(run("0100 OP_1 OP_ADD").unwrap_err(), InterpreterErrorCode::MinimalData);
    }

    #[test]
    fn test_numequal() {
        assert_eq!(run("OP_4 OP_4 OP_NUMEQUAL").unwrap(), vec![vec![1]]);
        assert_eq!(run("OP_4 OP_5 OP_NUMEQUAL").unwrap(), vec![Vec::<u8>::new()]);
        assert!(run("OP_4 OP_4 OP_NUMEQUALVERIFY").unwrap().is_empty());
        assert_eq!(
            run("OP_4 OP_5 OP_NUMEQUALVERIFY").unwrap_err(),
            InterpreterErrorCode::NumEqualVerify
        );
    }
}
