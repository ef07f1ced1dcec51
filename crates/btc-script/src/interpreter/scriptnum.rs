//! Script number encoding with Bitcoin consensus rules.
//!
//! All numbers on the script stack are little-endian sign-magnitude byte
//! strings with the sign in the high bit of the last byte. Zero is the
//! empty string. Numeric opcodes read operands of at most 4 bytes, but their
//! results may be wider and stay valid as long as nothing reads them back
//! as numbers.

use super::error::{InterpreterError, InterpreterErrorCode};

/// Widest encoding representable in an `i64`.
const MAX_NUM_BYTES: usize = 8;

/// A decoded script number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptNum(pub i64);

impl ScriptNum {
    /// Decode a stack element as a number.
    ///
    /// # Arguments
    /// * `bytes` - The stack element.
    /// * `max_len` - Maximum accepted byte length (4 in arithmetic context).
    /// * `require_minimal` - Reject encodings with a redundant high zero byte.
    ///
    /// # Returns
    /// The number, or `NumberTooBig` / `MinimalData`.
    pub fn from_bytes(
        bytes: &[u8],
        max_len: usize,
        require_minimal: bool,
    ) -> Result<Self, InterpreterError> {
        if bytes.len() > max_len.min(MAX_NUM_BYTES) {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NumberTooBig,
                format!(
                    "numeric value encoded as {} is {} bytes which exceeds the max allowed of {}",
                    hex::encode(bytes),
                    bytes.len(),
                    max_len
                ),
            ));
        }

        if require_minimal {
            check_minimal_data_encoding(bytes)?;
        }

        let Some((&last, _)) = bytes.split_last() else {
            return Ok(ScriptNum(0));
        };

        let mut magnitude: u64 = 0;
        for (i, &b) in bytes.iter().enumerate() {
            magnitude |= (b as u64) << (8 * i);
        }

        if last & 0x80 != 0 {
            magnitude &= !(0x80u64 << (8 * (bytes.len() - 1)));
            Ok(ScriptNum(-(magnitude as i64)))
        } else {
            Ok(ScriptNum(magnitude as i64))
        }
    }

    /// Encode as the minimal sign-magnitude byte string.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.0 == 0 {
            return Vec::new();
        }

        let negative = self.0 < 0;
        let mut magnitude = self.0.unsigned_abs();
        let mut out = Vec::with_capacity(9);
        while magnitude > 0 {
            out.push((magnitude & 0xff) as u8);
            magnitude >>= 8;
        }

        // The high bit of the last byte is the sign; add a byte if it is taken.
        let last = out.len() - 1;
        if out[last] & 0x80 != 0 {
            out.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            out[last] |= 0x80;
        }
        out
    }

    /// The value clamped into the `i32` range.
    pub fn to_i32(&self) -> i32 {
        self.0.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ScriptNum {
    fn from(v: i64) -> Self {
        ScriptNum(v)
    }
}

/// Check that `v` carries no redundant most-significant byte.
///
/// A final `0x00` or `0x80` byte is only allowed when the byte before it has
/// its high bit set, since the extra byte is then needed for the sign.
pub fn check_minimal_data_encoding(v: &[u8]) -> Result<(), InterpreterError> {
    let Some((&last, rest)) = v.split_last() else {
        return Ok(());
    };
    if last & 0x7f == 0 && rest.last().map_or(true, |b| b & 0x80 == 0) {
        return Err(InterpreterError::new(
            InterpreterErrorCode::MinimalData,
            format!("numeric value encoded as {} is not minimally encoded", hex::encode(v)),
        ));
    }
    Ok(())
}
