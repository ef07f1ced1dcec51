//! Transaction input spending a previous output.
//!
//! Besides its wire fields an input can carry what it knows about the coin
//! it spends: the value, the classified locking script, the script the
//! engine evaluates and the script code signature hashes commit to. That
//! data comes from a [`Coin`] and never travels on the wire.

use btc_primitives::util::{var_bytes_len, ByteReader, ByteWriter, VarInt};
use btc_script::{Script, ScriptTemplate, ScriptVersion};

use crate::outpoint::{Coin, Outpoint, OUTPOINT_SIZE};
use crate::TransactionError;

/// Default sequence number indicating a finalized input (no relative lock-time).
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// What an input knows about the output it spends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpentOutput {
    pub value: u64,
    pub template: ScriptTemplate,
    /// The locking script exactly as the coin carries it.
    pub raw_locking_script: Script,
    /// The script the engine evaluates after the unlocking script.
    pub final_locking_script: Script,
    pub redeem_script: Option<Script>,
    /// Script code for the BIP143 signature hash; `None` for legacy inputs.
    pub witness_script_code: Option<Script>,
}

impl SpentOutput {
    /// Classify a coin's locking script and derive the scripts signing and
    /// verification need.
    ///
    /// # Arguments
    /// * `coin` - The coin being spent.
    /// * `redeem` - Redeem or witness script, required for P2SH and P2WSH.
    ///
    /// # Returns
    /// The spent output, or an error if the script is not a standard shape
    /// or the redeem script does not match a witness script-hash program.
    pub fn from_coin(coin: &Coin, redeem: Option<Script>) -> Result<Self, TransactionError> {
        let raw_locking_script = coin.locking_script()?;
        let template = ScriptTemplate::parse_locking_script(raw_locking_script.to_bytes())?;
        let final_locking_script = template.final_locking_script(redeem.as_ref())?;
        let witness_script_code = template.witness_script_code(redeem.as_ref())?;
        Ok(SpentOutput {
            value: coin.value,
            template,
            raw_locking_script,
            final_locking_script,
            redeem_script: redeem,
            witness_script_code,
        })
    }

    pub fn script_version(&self) -> ScriptVersion {
        self.template.script_version()
    }
}

/// A single input in a transaction.
///
/// # Wire format
///
/// | Field            | Size          |
/// |------------------|---------------|
/// | txid             | 32 bytes      |
/// | output index     | 4 bytes (LE)  |
/// | script length    | VarInt        |
/// | unlocking_script | variable      |
/// | sequence         | 4 bytes (LE)  |
///
/// The witness stack is written separately, after all outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxIn {
    pub outpoint: Outpoint,
    pub sequence: u32,
    /// The scriptSig. Empty for native witness inputs.
    pub unlocking_script: Script,
    pub witness: Vec<Vec<u8>>,
    spent: Option<SpentOutput>,
}

impl TxIn {
    /// An unsigned input with no coin data attached.
    pub fn new(outpoint: Outpoint, sequence: u32) -> Self {
        TxIn {
            outpoint,
            sequence,
            unlocking_script: Script::new(),
            witness: Vec::new(),
            spent: None,
        }
    }

    /// An unsigned input spending `coin`.
    ///
    /// # Arguments
    /// * `coin` - The coin being spent.
    /// * `redeem` - Redeem or witness script for script-hash coins.
    /// * `sequence` - The input's sequence number.
    pub fn from_coin(coin: &Coin, redeem: Option<Script>, sequence: u32) -> Result<Self, TransactionError> {
        let mut input = TxIn::new(coin.outpoint, sequence);
        input.spent = Some(SpentOutput::from_coin(coin, redeem)?);
        Ok(input)
    }

    pub fn spent_output(&self) -> Option<&SpentOutput> {
        self.spent.as_ref()
    }

    pub fn set_spent_output(&mut self, spent: Option<SpentOutput>) {
        self.spent = spent;
    }

    /// Value of the spent coin, if known.
    pub fn value(&self) -> Option<u64> {
        self.spent.as_ref().map(|s| s.value)
    }

    pub fn has_witness(&self) -> bool {
        !self.witness.is_empty()
    }

    /// Deserialize the non-witness part of an input.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let outpoint = Outpoint::read_from(reader)?;
        let script = reader
            .read_var_bytes()
            .map_err(|source| TransactionError::Decode { field: "unlocking script", source })?;
        let sequence = reader
            .read_u32_le()
            .map_err(|source| TransactionError::Decode { field: "sequence", source })?;

        let mut input = TxIn::new(outpoint, sequence);
        input.unlocking_script = Script::from(script);
        Ok(input)
    }

    /// Read this input's witness stack.
    pub fn read_witness(&mut self, reader: &mut ByteReader) -> Result<(), TransactionError> {
        let count = reader
            .read_length()
            .map_err(|source| TransactionError::Decode { field: "witness count", source })?;
        let mut witness = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            witness.push(
                reader
                    .read_var_bytes()
                    .map_err(|source| TransactionError::Decode { field: "witness item", source })?,
            );
        }
        self.witness = witness;
        Ok(())
    }

    pub fn write_to(&self, writer: &mut ByteWriter) {
        self.outpoint.write_to(writer);
        writer.write_var_bytes(self.unlocking_script.to_bytes());
        writer.write_u32_le(self.sequence);
    }

    pub fn write_witness(&self, writer: &mut ByteWriter) {
        writer.write_varint(VarInt::from(self.witness.len()));
        for item in &self.witness {
            writer.write_var_bytes(item);
        }
    }

    /// Serialized size without the witness.
    pub fn base_size(&self) -> usize {
        OUTPOINT_SIZE + var_bytes_len(self.unlocking_script.len()) + 4
    }

    /// Serialized size of the witness stack including its count prefix.
    pub fn witness_size(&self) -> usize {
        VarInt::from(self.witness.len()).length()
            + self.witness.iter().map(|item| var_bytes_len(item.len())).sum::<usize>()
    }
}
