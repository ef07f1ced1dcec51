//! Hash and signature operations for the script interpreter.

use btc_primitives::hash::{hash160, ripemd160, sha256, sha256d};

use super::engine::Engine;
use super::error::{InterpreterError, InterpreterErrorCode};
use crate::instruction::Instruction;

fn hash_top(e: &mut Engine<'_>, f: impl Fn(&[u8]) -> Vec<u8>) -> Result<(), InterpreterError> {
    let data = e.dstack.pop()?;
    e.dstack.push(f(&data));
    Ok(())
}

fn verify_top(e: &mut Engine<'_>, code: InterpreterErrorCode, ins: &Instruction) -> Result<(), InterpreterError> {
    if !e.dstack.pop_bool()? {
        return Err(InterpreterError::new(code, format!("{} failed", ins.name())));
    }
    Ok(())
}

pub(super) fn op_ripemd160(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    hash_top(e, |d| ripemd160(d).to_vec())
}

pub(super) fn op_sha256(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    hash_top(e, |d| sha256(d).to_vec())
}

pub(super) fn op_hash160(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    hash_top(e, |d| hash160(d).to_vec())
}

pub(super) fn op_hash256(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    hash_top(e, |d| sha256d(d).to_vec())
}

/// Separators only affect the legacy script code, which the signature
/// hasher strips on its own.
pub(super) fn op_codeseparator(_: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    Ok(())
}

pub(super) fn op_checksig(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    let pub_key = e.dstack.pop()?;
    let sig = e.dstack.pop()?;
    let ok = e.check_signature(&sig, &pub_key)?;
    e.dstack.push_bool(ok);
    Ok(())
}

pub(super) fn op_checksigverify(e: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    op_checksig(e, ins)?;
    verify_top(e, InterpreterErrorCode::CheckSigVerify, ins)
}

/// Pop `count` items and return them in the order they were pushed.
fn pop_in_script_order(e: &mut Engine<'_>, count: usize) -> Result<Vec<Vec<u8>>, InterpreterError> {
    let mut items = (0..count)
        .map(|_| e.dstack.pop())
        .collect::<Result<Vec<_>, _>>()?;
    items.reverse();
    Ok(items)
}

/// `<dummy> <sig>... <m> <pubkey>... <n> OP_CHECKMULTISIG`
///
/// Signatures must appear in the same relative order as their public keys.
/// Each signature is tried against the keys from the current cursor on; a
/// key that does not match is skipped for good.
pub(super) fn op_checkmultisig(e: &mut Engine<'_>, _: &Instruction) -> Result<(), InterpreterError> {
    let n = e.dstack.pop_int()?.value();
    if n < 0 || n as usize > e.cfg.max_pub_keys_per_multisig {
        return Err(InterpreterError::new(
            InterpreterErrorCode::InvalidPubKeyCount,
            format!(
                "number of pubkeys {} is out of range 0..={}",
                n, e.cfg.max_pub_keys_per_multisig
            ),
        ));
    }
    let n = n as usize;
    e.num_ops += n;
    e.check_op_count()?;
    let pub_keys = pop_in_script_order(e, n)?;

    let m = e.dstack.pop_int()?.value();
    if m < 0 || m as usize > n {
        return Err(InterpreterError::new(
            InterpreterErrorCode::InvalidSignatureCount,
            format!("number of signatures {} is out of range 0..={}", m, n),
        ));
    }
    let m = m as usize;
    let signatures = pop_in_script_order(e, m)?;

    // Dummy element, consumed because of the historical off-by-one.
    e.dstack.pop()?;

    let mut isig = 0;
    let mut ikey = 0;
    let mut success = true;
    while isig < m {
        if n - ikey < m - isig {
            success = false;
            break;
        }
        if e.check_signature(&signatures[isig], &pub_keys[ikey])? {
            isig += 1;
        }
        ikey += 1;
    }

    e.dstack.push_bool(success);
    Ok(())
}

pub(super) fn op_checkmultisigverify(e: &mut Engine<'_>, ins: &Instruction) -> Result<(), InterpreterError> {
    op_checkmultisig(e, ins)?;
    verify_top(e, InterpreterErrorCode::CheckMultiSigVerify, ins)
}
