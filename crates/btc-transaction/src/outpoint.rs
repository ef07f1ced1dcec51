//! References to previous outputs and the coins behind them.

use std::fmt;

use btc_primitives::chainhash::Hash;
use btc_primitives::util::{ByteReader, ByteWriter};
use btc_script::Script;
use serde::{Deserialize, Serialize};

use crate::TransactionError;

/// Serialized length of an outpoint: 32-byte txid plus 4-byte index.
pub const OUTPOINT_SIZE: usize = 36;

/// A previous transaction id and an output index within it.
///
/// The id is held in internal byte order and only reversed for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    pub txid: Hash,
    pub index: u32,
}

impl Outpoint {
    pub fn new(txid: Hash, index: u32) -> Self {
        Outpoint { txid, index }
    }

    /// Build an outpoint from a txid in display (reversed) hex.
    pub fn from_hex(txid_hex: &str, index: u32) -> Result<Self, TransactionError> {
        Ok(Outpoint {
            txid: Hash::from_hex(txid_hex)?,
            index,
        })
    }

    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let txid = reader
            .read_array::<32>()
            .map_err(|source| TransactionError::Decode { field: "outpoint txid", source })?;
        let index = reader
            .read_u32_le()
            .map_err(|source| TransactionError::Decode { field: "outpoint index", source })?;
        Ok(Outpoint {
            txid: Hash::new(txid),
            index,
        })
    }

    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_bytes(self.txid.as_bytes());
        writer.write_u32_le(self.index);
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// An unspent output as the caller knows it: where it is, what it is worth
/// and the locking script guarding it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub outpoint: Outpoint,
    pub value: u64,
    pub locking_script_hex: String,
}

impl Coin {
    pub fn new(outpoint: Outpoint, value: u64, locking_script_hex: impl Into<String>) -> Self {
        Coin {
            outpoint,
            value,
            locking_script_hex: locking_script_hex.into(),
        }
    }

    /// Parse the locking script hex.
    pub fn locking_script(&self) -> Result<Script, TransactionError> {
        Ok(Script::from_hex(&self.locking_script_hex)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXID: &str = "fe77aa03d5563d3ec98455a76655ea3b58e19a4eb102baf7b2a47af37e94b295";

    #[test]
    fn test_outpoint_display_is_reversed_hex() {
        let op = Outpoint::from_hex(TXID, 3).unwrap();
        assert_eq!(op.to_string(), format!("{}:3", TXID));
        assert_eq!(op.txid.as_bytes()[0], 0x95);
    }

    #[test]
    fn test_outpoint_wire_layout() {
        let op = Outpoint::from_hex(TXID, 0x0102_0304).unwrap();
        let mut w = ByteWriter::new();
        op.write_to(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), OUTPOINT_SIZE);
        assert_eq!(&bytes[32..], &[0x04, 0x03, 0x02, 0x01]);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(Outpoint::read_from(&mut r).unwrap(), op);
    }

    #[test]
    fn test_outpoint_truncated() {
        let mut r = ByteReader::new(&[0u8; 33]);
        let err = Outpoint::read_from(&mut r).unwrap_err();
        assert!(matches!(err, TransactionError::Decode { field: "outpoint index", .. }));
    }

    #[test]
    fn test_coin_from_json() {
        let json = format!(
            r#"{{"outpoint":{{"txid":"{}","index":1}},"value":4000,"locking_script_hex":"76a914eb0bd5edba389198e73f8efabddfc61666969ff788ac"}}"#,
            TXID
        );
        let coin: Coin = serde_json::from_str(&json).unwrap();
        assert_eq!(coin.value, 4000);
        assert_eq!(coin.outpoint.index, 1);
        assert!(coin.locking_script().unwrap().is_p2pkh());
    }

    #[test]
    fn test_coin_bad_script_hex() {
        let coin = Coin::new(Outpoint::from_hex(TXID, 0).unwrap(), 1, "zz");
        assert!(matches!(coin.locking_script(), Err(TransactionError::Script(_))));
    }
}
