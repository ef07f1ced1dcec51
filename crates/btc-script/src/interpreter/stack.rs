//! Script execution stack.

use std::fmt;

use super::error::{InterpreterError, InterpreterErrorCode};
use super::scriptnum::ScriptNum;

/// Convert byte array to boolean (Bitcoin consensus rules).
///
/// Any non-zero byte makes the value true, except a lone sign bit in the
/// last byte (negative zero).
pub fn as_bool(t: &[u8]) -> bool {
    for i in 0..t.len() {
        if t[i] != 0 {
            // Negative 0 is also considered false
            if i == t.len() - 1 && t[i] == 0x80 {
                return false;
            }
            return true;
        }
    }
    false
}

/// Convert boolean to byte array.
pub fn from_bool(v: bool) -> Vec<u8> {
    if v {
        vec![1]
    } else {
        vec![]
    }
}

fn invalid_index(idx: usize, depth: usize) -> InterpreterError {
    InterpreterError::new(
        InterpreterErrorCode::InvalidStackOperation,
        format!("index {} is invalid for stack size {}", idx, depth),
    )
}

/// The data stack used by the script interpreter.
///
/// Indices passed to `peek`, `nip` and friends count from the top, so `0`
/// is the top item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    items: Vec<Vec<u8>>,
    max_num_length: usize,
}

impl Stack {
    /// Create an empty stack whose numeric pops accept up to
    /// `max_num_length` bytes.
    pub fn new(max_num_length: usize) -> Self {
        Stack { items: Vec::new(), max_num_length }
    }

    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, data: Vec<u8>) {
        self.items.push(data);
    }

    pub fn push_int(&mut self, n: ScriptNum) {
        self.push(n.to_bytes());
    }

    pub fn push_bool(&mut self, val: bool) {
        self.push(from_bool(val));
    }

    pub fn pop(&mut self) -> Result<Vec<u8>, InterpreterError> {
        self.items.pop().ok_or_else(|| invalid_index(0, 0))
    }

    /// Pop the top item as a minimally-encoded number.
    pub fn pop_int(&mut self) -> Result<ScriptNum, InterpreterError> {
        let data = self.pop()?;
        ScriptNum::from_bytes(&data, self.max_num_length, true)
    }

    pub fn pop_bool(&mut self) -> Result<bool, InterpreterError> {
        let data = self.pop()?;
        Ok(as_bool(&data))
    }

    /// Borrow the item `idx` positions below the top.
    pub fn peek(&self, idx: usize) -> Result<&[u8], InterpreterError> {
        let sz = self.items.len();
        if idx >= sz {
            return Err(invalid_index(idx, sz));
        }
        Ok(&self.items[sz - idx - 1])
    }

    /// Remove and return the item `idx` positions below the top.
    pub fn nip_n(&mut self, idx: usize) -> Result<Vec<u8>, InterpreterError> {
        let sz = self.items.len();
        if idx >= sz {
            return Err(invalid_index(idx, sz));
        }
        Ok(self.items.remove(sz - idx - 1))
    }

    /// Duplicate the top `n` items, preserving their order.
    pub fn dup_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        if n < 1 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::InvalidStackOperation,
                format!("attempt to dup {} stack items", n),
            ));
        }
        for _ in 0..n {
            let so = self.peek(n - 1)?.to_vec();
            self.push(so);
        }
        Ok(())
    }

    /// Drop the top `n` items.
    pub fn drop_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        if n > self.items.len() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::InvalidStackOperation,
                format!("attempt to drop {} items from stack of {}", n, self.items.len()),
            ));
        }
        self.items.truncate(self.items.len() - n);
        Ok(())
    }

    pub fn swap(&mut self) -> Result<(), InterpreterError> {
        let so = self.nip_n(1)?;
        self.push(so);
        Ok(())
    }

    /// Copy the second item to the top.
    pub fn over(&mut self) -> Result<(), InterpreterError> {
        let so = self.peek(1)?.to_vec();
        self.push(so);
        Ok(())
    }

    /// Items from bottom to top.
    pub fn items(&self) -> &[Vec<u8>] {
        &self.items
    }

    /// Replace the contents (last = top).
    pub fn set_items(&mut self, data: Vec<Vec<u8>>) {
        self.items = data;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", hex::encode(item))?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_bool() {
        assert!(!as_bool(&[]));
        assert!(!as_bool(&[0x00]));
        assert!(!as_bool(&[0x80])); // negative zero
        assert!(as_bool(&[0x01]));
        assert!(as_bool(&[0x00, 0x01]));
        assert!(!as_bool(&[0x00, 0x00]));
        assert!(!as_bool(&[0x00, 0x80])); // negative zero
        assert!(as_bool(&[0x80, 0x00]));
    }

    #[test]
    fn test_stack_basic_ops() {
        let mut s = Stack::new(4);
        s.push(vec![1, 2, 3]);
        s.push(vec![4, 5]);
        assert_eq!(s.depth(), 2);
        assert_eq!(s.pop().unwrap(), vec![4, 5]);
        assert_eq!(s.depth(), 1);
        assert_eq!(s.peek(0).unwrap(), &[1, 2, 3]);
        assert_eq!(s.peek(1).unwrap_err().code, InterpreterErrorCode::InvalidStackOperation);
    }

    #[test]
    fn test_stack_dup() {
        let mut s = Stack::new(4);
        s.push(vec![1]);
        s.push(vec![2]);
        s.dup_n(2).unwrap();
        assert_eq!(s.items(), &[vec![1], vec![2], vec![1], vec![2]]);
    }

    #[test]
    fn test_stack_swap_and_over() {
        let mut s = Stack::new(4);
        s.push(vec![1]);
        s.push(vec![2]);
        s.swap().unwrap();
        assert_eq!(s.items(), &[vec![2], vec![1]]);
        s.over().unwrap();
        assert_eq!(s.items(), &[vec![2], vec![1], vec![2]]);
    }

    #[test]
    fn test_pop_int_enforces_length_and_minimality() {
        let mut s = Stack::new(4);
        s.push(vec![0x00]);
        assert_eq!(s.pop_int().unwrap_err().code, InterpreterErrorCode::MinimalData);
        s.push(vec![1, 2, 3, 4, 5]);
        assert_eq!(s.pop_int().unwrap_err().code, InterpreterErrorCode::NumberTooBig);
        s.push_int(ScriptNum(-300));
        assert_eq!(s.pop_int().unwrap(), ScriptNum(-300));
    }

    #[test]
    fn test_display() {
        let mut s = Stack::new(4);
        assert_eq!(s.to_string(), "[]");
        s.push(vec![0xab]);
        s.push(vec![]);
        s.push(vec![1, 2]);
        assert_eq!(s.to_string(), "[ab  0102]");
    }
}
