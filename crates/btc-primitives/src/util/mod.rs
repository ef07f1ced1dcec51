//! Byte cursor for Bitcoin wire serialization.
//!
//! Provides CompactSize `VarInt` encoding, plus `ByteReader` and `ByteWriter`
//! for reading and writing little-endian fixed-width integers, varints and
//! length-prefixed byte strings. Every other component serializes through
//! these two types.

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// VarInt
// ---------------------------------------------------------------------------

/// A Bitcoin "CompactSize" variable-length integer.
///
/// Encodes as 1 byte below `0xfd`, `0xfd` + 2 bytes up to `0xffff`,
/// `0xfe` + 4 bytes up to `0xffffffff`, and `0xff` + 8 bytes otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Return the wire-format byte length of this VarInt.
    ///
    /// # Returns
    /// 1, 3, 5, or 9 depending on the value.
    pub fn length(&self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x10000..=0xffff_ffff => 5,
            _ => 9,
        }
    }

    /// Encode the VarInt into a new byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let v = self.0;
        let mut buf = Vec::with_capacity(self.length());
        match self.length() {
            1 => buf.push(v as u8),
            3 => {
                buf.push(0xfd);
                buf.extend_from_slice(&(v as u16).to_le_bytes());
            }
            5 => {
                buf.push(0xfe);
                buf.extend_from_slice(&(v as u32).to_le_bytes());
            }
            _ => {
                buf.push(0xff);
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        buf
    }

    /// Return the underlying u64 value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarInt {
    fn from(v: u64) -> Self {
        VarInt(v)
    }
}

impl From<usize> for VarInt {
    fn from(v: usize) -> Self {
        VarInt(v as u64)
    }
}

/// Number of bytes a varint length prefix plus `len` payload bytes occupy.
pub fn var_bytes_len(len: usize) -> usize {
    VarInt::from(len).length() + len
}

// ---------------------------------------------------------------------------
// ByteReader
// ---------------------------------------------------------------------------

/// A positional reader over Bitcoin wire-format bytes.
///
/// Wraps a byte slice and maintains a read position. Reads past the end fail
/// with `UnexpectedEof`, reporting how many bytes were needed and how many
/// were left.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a new reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance the position.
    ///
    /// # Arguments
    /// * `n` - Number of bytes to read.
    ///
    /// # Returns
    /// A byte slice of length `n`, or an error if insufficient data remains.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        if n > self.remaining() {
            return Err(PrimitivesError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Return the next byte without advancing.
    pub fn peek_u8(&self) -> Result<u8, PrimitivesError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(PrimitivesError::UnexpectedEof { needed: 1, remaining: 0 })
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a little-endian u16.
    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64.
    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a CompactSize VarInt.
    pub fn read_varint(&mut self) -> Result<VarInt, PrimitivesError> {
        let val = match self.read_u8()? {
            0xff => self.read_u64_le()?,
            0xfe => self.read_u32_le()? as u64,
            0xfd => self.read_u16_le()? as u64,
            b => b as u64,
        };
        Ok(VarInt(val))
    }

    /// Read a varint and convert it to a `usize` length.
    pub fn read_length(&mut self) -> Result<usize, PrimitivesError> {
        let VarInt(len) = self.read_varint()?;
        usize::try_from(len).map_err(|_| PrimitivesError::LengthOverflow(len))
    }

    /// Read a varint-length-prefixed byte string.
    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>, PrimitivesError> {
        let len = self.read_length()?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Read a varint-length-prefixed UTF-8 string.
    pub fn read_var_string(&mut self) -> Result<String, PrimitivesError> {
        let bytes = self.read_var_bytes()?;
        String::from_utf8(bytes).map_err(|e| PrimitivesError::InvalidUtf8(e.to_string()))
    }

    /// Return the number of bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Return the current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }
}

// ---------------------------------------------------------------------------
// ByteWriter
// ---------------------------------------------------------------------------

/// An append-only writer producing Bitcoin wire-format bytes.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    /// Create a new writer with a pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter { buf: Vec::with_capacity(capacity) }
    }

    /// Append raw bytes to the buffer.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Append a little-endian u16.
    pub fn write_u16_le(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u32.
    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u64.
    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a CompactSize VarInt.
    pub fn write_varint(&mut self, varint: VarInt) {
        self.buf.extend_from_slice(&varint.to_bytes());
    }

    /// Append a varint length prefix followed by `bytes`.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(VarInt::from(bytes.len()));
        self.buf.extend_from_slice(bytes);
    }

    /// Append a varint length prefix followed by the UTF-8 bytes of `s`.
    pub fn write_var_string(&mut self, s: &str) {
        self.write_var_bytes(s.as_bytes());
    }

    /// Consume the writer and return the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Return a reference to the current buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Return the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- VarInt byte-length tests --

    #[test]
    fn test_varint_byte_length() {
        assert_eq!(VarInt(0).to_bytes().len(), 1);
        assert_eq!(VarInt(252).to_bytes().len(), 1);
        assert_eq!(VarInt(253).to_bytes().len(), 3);
        assert_eq!(VarInt(65535).to_bytes().len(), 3);
        assert_eq!(VarInt(65536).to_bytes().len(), 5);
        assert_eq!(VarInt(4294967295).to_bytes().len(), 5);
        assert_eq!(VarInt(4294967296).to_bytes().len(), 9);
        assert_eq!(VarInt(u64::MAX).to_bytes().len(), 9);
    }

    // -- VarInt encoding tests --

    #[test]
    fn test_varint_to_bytes() {
        let cases: Vec<(u64, Vec<u8>)> = vec![
            (0, vec![0x00]),
            (1, vec![0x01]),
            (252, vec![0xfc]),
            (253, vec![0xfd, 0xfd, 0x00]),
            (65535, vec![0xfd, 0xff, 0xff]),
            (65536, vec![0xfe, 0x00, 0x00, 0x01, 0x00]),
            (4294967295, vec![0xfe, 0xff, 0xff, 0xff, 0xff]),
            (4294967296, vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]),
            (u64::MAX, vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
        ];

        for (value, expected) in cases {
            let vi = VarInt(value);
            assert_eq!(vi.to_bytes(), expected, "encoding mismatch for {}", value);
            assert_eq!(vi.length(), expected.len(), "length mismatch for {}", value);

            let mut reader = ByteReader::new(&expected);
            assert_eq!(reader.read_varint().unwrap(), vi);
            assert_eq!(reader.remaining(), 0);
        }
    }

    // -- ByteReader / ByteWriter round-trip tests --

    #[test]
    fn test_reader_writer_roundtrip() {
        let mut writer = ByteWriter::new();
        writer.write_u8(0x42);
        writer.write_u16_le(0x1234);
        writer.write_u32_le(0xDEADBEEF);
        writer.write_u64_le(0x0102030405060708);
        writer.write_varint(VarInt(300));
        writer.write_var_bytes(b"hello");
        writer.write_var_string("satoshi");

        let data = writer.into_bytes();
        let mut reader = ByteReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.read_u32_le().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0102030405060708);
        assert_eq!(reader.read_varint().unwrap(), VarInt(300));
        assert_eq!(reader.read_var_bytes().unwrap(), b"hello");
        assert_eq!(reader.read_var_string().unwrap(), "satoshi");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_underrun_reports_counts() {
        let mut reader = ByteReader::new(&[0x01, 0x02]);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(
            reader.read_u32_le().unwrap_err(),
            PrimitivesError::UnexpectedEof { needed: 4, remaining: 1 }
        );
        // A failed read does not consume anything.
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.peek_u8().unwrap(), 0x02);
    }

    #[test]
    fn test_var_bytes_truncated() {
        // Prefix claims 5 bytes but only 2 follow.
        let mut reader = ByteReader::new(&[0x05, 0xaa, 0xbb]);
        assert!(matches!(
            reader.read_var_bytes(),
            Err(PrimitivesError::UnexpectedEof { needed: 5, remaining: 2 })
        ));
    }

    #[test]
    fn test_var_bytes_len() {
        assert_eq!(var_bytes_len(0), 1);
        assert_eq!(var_bytes_len(20), 21);
        assert_eq!(var_bytes_len(253), 256);
    }
}
