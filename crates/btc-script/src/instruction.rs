//! Script instructions: one opcode plus its operand bytes.
//!
//! Raw script bytes are split into `Instruction`s using the operand length
//! rule recorded for each opcode in the process-wide opcode table. The same
//! parser feeds the interpreter, the locking-script classifier and the
//! human-readable disassembly.

use crate::interpreter::opcode::{lookup, OperandLength};
use crate::opcodes::*;
use crate::ScriptError;

/// A single parsed element of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// The opcode byte. For direct pushes (1-75 bytes), this is the length.
    pub opcode: u8,
    /// The operand bytes, present for every push opcode that carries data.
    pub data: Option<Vec<u8>>,
}

impl Instruction {
    /// A bare opcode with no operand.
    pub fn op(opcode: u8) -> Self {
        Instruction { opcode, data: None }
    }

    /// A push of `data` using the shortest length-prefix form.
    ///
    /// Empty data is expressed as `OP_0`.
    pub fn push(data: &[u8]) -> Result<Self, ScriptError> {
        if data.is_empty() {
            return Ok(Instruction::op(OP_0));
        }
        let prefix = push_data_prefix(data.len())?;
        Ok(Instruction { opcode: prefix[0], data: Some(data.to_vec()) })
    }

    /// Human-readable opcode name from the opcode table.
    pub fn name(&self) -> &'static str {
        lookup(self.opcode).name()
    }

    /// Whether this instruction only pushes data (`OP_0`..`OP_16`, `OP_1NEGATE`).
    pub fn is_push(&self) -> bool {
        self.opcode <= OP_16 && self.opcode != OP_RESERVED
    }

    /// The pushed bytes, or an empty slice for opcodes without an operand.
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Re-encode this instruction into script bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let data = self.data();
        let mut out = Vec::with_capacity(1 + 4 + data.len());
        out.push(self.opcode);
        match self.opcode {
            OP_PUSHDATA1 => out.push(data.len() as u8),
            OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
            OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
            _ => {}
        }
        out.extend_from_slice(data);
        out
    }

    /// Name plus operand hex, e.g. `OP_DATA_20 89ab...`.
    pub fn disassemble(&self) -> String {
        match &self.data {
            Some(data) => format!("{} {}", self.name(), hex::encode(data)),
            None => self.name().to_string(),
        }
    }

    /// ASM token: pushes render as bare hex, everything else by name.
    pub fn to_asm_string(&self) -> String {
        match &self.data {
            Some(data) if self.opcode > OP_0 && self.opcode <= OP_PUSHDATA4 => hex::encode(data),
            _ => self.name().to_string(),
        }
    }
}

/// Split raw script bytes into instructions.
///
/// # Arguments
/// * `bytes` - The raw script bytes to decode.
///
/// # Returns
/// The parsed instructions, or `MalformedPush` if an operand or length
/// prefix runs past the end of the script.
pub fn parse_instructions(bytes: &[u8]) -> Result<Vec<Instruction>, ScriptError> {
    let mut instructions = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let opcode = bytes[pos];
        let entry = lookup(opcode);
        let start = pos;
        let malformed = move |needed: usize, remaining: usize| ScriptError::MalformedPush {
            offset: start,
            opcode: entry.name().to_string(),
            needed,
            remaining,
        };
        pos += 1;

        let data_len = match entry.operand_length() {
            OperandLength::None => {
                instructions.push(Instruction::op(opcode));
                continue;
            }
            OperandLength::Fixed(n) => n,
            OperandLength::Prefixed(width) => {
                let remaining = bytes.len() - pos;
                if remaining < width {
                    return Err(malformed(width, remaining));
                }
                let mut len_bytes = [0u8; 4];
                len_bytes[..width].copy_from_slice(&bytes[pos..pos + width]);
                pos += width;
                u32::from_le_bytes(len_bytes) as usize
            }
        };

        let remaining = bytes.len() - pos;
        if remaining < data_len {
            return Err(malformed(data_len, remaining));
        }
        instructions.push(Instruction {
            opcode,
            data: Some(bytes[pos..pos + data_len].to_vec()),
        });
        pos += data_len;
    }

    Ok(instructions)
}

/// Compute the push prefix for a payload of the given length.
///
/// # Arguments
/// * `data_len` - The length of the data to be pushed.
///
/// # Returns
/// The prefix bytes (`len`, `OP_PUSHDATA1 len`, `OP_PUSHDATA2 len16` or
/// `OP_PUSHDATA4 len32`), or an error if the data is too large.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len <= OP_DATA_75 as usize {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xFF {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xFFFF {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len <= 0xFFFF_FFFF {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig(data_len))
    }
}

/// Space-separated disassembly of a run of instructions.
pub fn disassemble(instructions: &[Instruction]) -> String {
    instructions
        .iter()
        .map(Instruction::disassemble)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // parse_instructions
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_p2pkh() {
        let script = hex::decode("76a914e2a623699e81b291c0327f408fea765d534baa2a88ac").unwrap();
        let ins = parse_instructions(&script).unwrap();
        assert_eq!(ins.len(), 5);
        assert_eq!(ins[0], Instruction::op(OP_DUP));
        assert_eq!(ins[1], Instruction::op(OP_HASH160));
        assert_eq!(ins[2].opcode, OP_DATA_20);
        assert_eq!(ins[2].data().len(), 20);
        assert_eq!(ins[3], Instruction::op(OP_EQUALVERIFY));
        assert_eq!(ins[4], Instruction::op(OP_CHECKSIG));
    }

    #[test]
    fn test_parse_pushdata_forms() {
        let mut script = vec![OP_PUSHDATA1, 3, 1, 2, 3];
        script.extend_from_slice(&[OP_PUSHDATA2, 2, 0, 9, 9]);
        script.extend_from_slice(&[OP_PUSHDATA4, 1, 0, 0, 0, 7]);
        let ins = parse_instructions(&script).unwrap();
        assert_eq!(ins[0].data(), &[1, 2, 3]);
        assert_eq!(ins[1].data(), &[9, 9]);
        assert_eq!(ins[2].data(), &[7]);

        let reencoded: Vec<u8> = ins.iter().flat_map(|i| i.to_bytes()).collect();
        assert_eq!(reencoded, script);
    }

    #[test]
    fn test_parse_truncated_push() {
        // OP_DATA_5 with only 2 bytes following.
        let err = parse_instructions(&[0x05, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, ScriptError::MalformedPush { needed: 5, remaining: 2, .. }));

        // OP_PUSHDATA2 with a 1-byte length prefix.
        let err = parse_instructions(&[OP_PUSHDATA2, 0x01]).unwrap_err();
        assert!(matches!(err, ScriptError::MalformedPush { needed: 2, remaining: 1, .. }));
    }

    #[test]
    fn test_unknown_opcode_parses_as_bare() {
        let ins = parse_instructions(&[0xfe, OP_NOP]).unwrap();
        assert_eq!(ins.len(), 2);
        assert!(ins[0].data.is_none());
    }

    // -----------------------------------------------------------------------
    // push encoding and disassembly
    // -----------------------------------------------------------------------

    #[test]
    fn test_push_data_prefix_boundaries() {
        assert_eq!(push_data_prefix(0).unwrap(), vec![0x00]);
        assert_eq!(push_data_prefix(75).unwrap(), vec![75]);
        assert_eq!(push_data_prefix(76).unwrap(), vec![OP_PUSHDATA1, 76]);
        assert_eq!(push_data_prefix(255).unwrap(), vec![OP_PUSHDATA1, 0xff]);
        assert_eq!(push_data_prefix(256).unwrap(), vec![OP_PUSHDATA2, 0x00, 0x01]);
        assert_eq!(
            push_data_prefix(65536).unwrap(),
            vec![OP_PUSHDATA4, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_push_instruction() {
        assert_eq!(Instruction::push(&[]).unwrap(), Instruction::op(OP_0));
        let ins = Instruction::push(&[0xab; 80]).unwrap();
        assert_eq!(ins.opcode, OP_PUSHDATA1);
        assert_eq!(ins.to_bytes().len(), 82);
    }

    #[test]
    fn test_disassemble() {
        let script = hex::decode("a914e2a623699e81b291c0327f408fea765d534baa2a87").unwrap();
        let ins = parse_instructions(&script).unwrap();
        assert_eq!(
            disassemble(&ins),
            "OP_HASH160 OP_DATA_20 e2a623699e81b291c0327f408fea765d534baa2a OP_EQUAL"
        );
        assert_eq!(ins[1].to_asm_string(), "e2a623699e81b291c0327f408fea765d534baa2a");
    }
}
