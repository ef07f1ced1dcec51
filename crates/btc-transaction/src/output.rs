//! Transaction output: a value and the script that locks it.

use btc_primitives::util::{var_bytes_len, ByteReader, ByteWriter};
use btc_script::Script;

use crate::TransactionError;

/// A single output in a transaction.
///
/// # Wire format
///
/// | Field          | Size          |
/// |----------------|---------------|
/// | value          | 8 bytes (LE)  |
/// | script length  | VarInt        |
/// | locking_script | variable      |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
    /// Amount in satoshis.
    pub value: u64,
    pub script: Script,
}

impl TxOut {
    pub fn new(value: u64, script: Script) -> Self {
        TxOut { value, script }
    }

    /// Deserialize a `TxOut` from a `ByteReader`.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let value = reader
            .read_u64_le()
            .map_err(|source| TransactionError::Decode { field: "output value", source })?;
        let script = reader
            .read_var_bytes()
            .map_err(|source| TransactionError::Decode { field: "locking script", source })?;
        Ok(TxOut {
            value,
            script: Script::from(script),
        })
    }

    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u64_le(self.value);
        writer.write_var_bytes(self.script.to_bytes());
    }

    /// Serialize this output to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.serialized_size());
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    pub fn serialized_size(&self) -> usize {
        8 + var_bytes_len(self.script.len())
    }

    /// Whether the output is a provably unspendable `OP_RETURN` data carrier.
    pub fn is_data(&self) -> bool {
        self.script.is_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_bytes() {
        let out = TxOut::new(
            1500,
            Script::from_hex("76a914eb0bd5edba389198e73f8efabddfc61666969ff788ac").unwrap(),
        );
        let bytes = out.to_bytes();
        assert_eq!(bytes.len(), out.serialized_size());
        assert_eq!(&bytes[..8], &1500u64.to_le_bytes());
        assert_eq!(bytes[8], 25);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(TxOut::read_from(&mut r).unwrap(), out);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_output_script_truncated() {
        let mut bytes = 7u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0x05, 0x6a, 0x01]);
        let mut r = ByteReader::new(&bytes);
        match TxOut::read_from(&mut r) {
            Err(TransactionError::Decode { field, source }) => {
                assert_eq!(field, "locking script");
                assert_eq!(
                    source,
                    btc_primitives::PrimitivesError::UnexpectedEof { needed: 5, remaining: 2 }
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_output_is_data() {
        let out = TxOut::new(0, Script::op_return(b"hello").unwrap());
        assert!(out.is_data());
    }
}
