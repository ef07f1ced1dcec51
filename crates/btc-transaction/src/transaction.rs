//! Core transaction type.
//!
//! Represents a complete transaction with version, inputs, outputs and
//! lock time. Supports the legacy and BIP141 witness wire formats, id and
//! weight computation, both signature hash algorithms, signing inputs
//! through their [`ScriptTemplate`] and verifying every input with the
//! script engine.

use std::fmt;
use std::sync::OnceLock;

use btc_primitives::chainhash::Hash;
use btc_primitives::ec::{PrivateKey, PublicKey};
use btc_primitives::hash::sha256d;
use btc_primitives::util::{ByteReader, ByteWriter, VarInt};
use btc_primitives::PrimitivesError;
use btc_script::interpreter::{Engine, InterpreterError, InterpreterErrorCode};
use btc_script::{PubKeySign, Script, ScriptTemplate, ScriptVersion};
use tracing::debug;

use crate::input::{SpentOutput, TxIn};
use crate::outpoint::Coin;
use crate::output::TxOut;
use crate::sighash::{legacy, witness_v0, Midstate};
use crate::TransactionError;

/// Marker byte that replaces the input count in the witness format.
pub const WITNESS_MARKER: u8 = 0x00;

/// The only witness flag defined so far.
pub const WITNESS_FLAG: u8 = 0x01;

/// Weight of a transaction with the given no-witness and witness sizes.
///
/// Base bytes count four times, witness bytes once.
pub fn weight_of(base_size: usize, witness_size: usize) -> usize {
    base_size * 3 + base_size + witness_size
}

/// Virtual size for a weight, truncated.
pub fn vsize_of(weight: usize) -> usize {
    weight / 4
}

/// A Bitcoin transaction.
///
/// # Wire format
///
/// | Field          | Size                            |
/// |----------------|---------------------------------|
/// | version        | 4 bytes (LE)                    |
/// | marker, flag   | `0x00 0x01`, witness form only  |
/// | input count    | VarInt                          |
/// | inputs         | variable (per input)            |
/// | output count   | VarInt                          |
/// | outputs        | variable (per output)           |
/// | witnesses      | one stack per input, witness form only |
/// | lock_time      | 4 bytes (LE)                    |
///
/// The BIP143 midstate is cached after the first witness signature hash
/// and dropped by every method that can change an outpoint, a sequence or
/// an output.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub version: u32,
    pub lock_time: u32,
    inputs: Vec<TxIn>,
    outputs: Vec<TxOut>,
    midstate: OnceLock<Midstate>,
}

impl Transaction {
    /// Create a new empty transaction with version 1 and lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: 1,
            lock_time: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            midstate: OnceLock::new(),
        }
    }

    // -----------------------------------------------------------------
    // Inputs and outputs
    // -----------------------------------------------------------------

    pub fn inputs(&self) -> &[TxIn] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOut] {
        &self.outputs
    }

    /// The input at `idx`, or `IndexOutOfRange`.
    pub fn input(&self, idx: usize) -> Result<&TxIn, TransactionError> {
        self.inputs.get(idx).ok_or(TransactionError::IndexOutOfRange {
            index: idx,
            count: self.inputs.len(),
        })
    }

    pub fn add_input(&mut self, input: TxIn) {
        self.midstate = OnceLock::new();
        self.inputs.push(input);
    }

    pub fn add_output(&mut self, output: TxOut) {
        self.midstate = OnceLock::new();
        self.outputs.push(output);
    }

    /// Mutable access to an input. Drops the cached midstate.
    pub fn input_mut(&mut self, idx: usize) -> Option<&mut TxIn> {
        self.midstate = OnceLock::new();
        self.inputs.get_mut(idx)
    }

    /// Mutable access to an output. Drops the cached midstate.
    pub fn output_mut(&mut self, idx: usize) -> Option<&mut TxOut> {
        self.midstate = OnceLock::new();
        self.outputs.get_mut(idx)
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Sum of the spent coin values.
    ///
    /// # Returns
    /// The total, or `MissingCoin` for the first input without coin data.
    pub fn total_input_value(&self) -> Result<u64, TransactionError> {
        self.inputs.iter().enumerate().try_fold(0u64, |total, (idx, input)| {
            let value = input.value().ok_or(TransactionError::MissingCoin(idx))?;
            Ok(total.saturating_add(value))
        })
    }

    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().fold(0u64, |total, o| total.saturating_add(o.value))
    }

    /// Whether this is a coinbase transaction: a single input spending the
    /// null outpoint.
    pub fn is_coinbase(&self) -> bool {
        match self.inputs.as_slice() {
            [input] => input.outpoint.txid == Hash::default() && input.outpoint.index == u32::MAX,
            _ => false,
        }
    }

    /// Whether any input carries a witness stack.
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(TxIn::has_witness)
    }

    /// The BIP143 hashes shared by every input, computed on first use.
    pub fn midstate(&self) -> &Midstate {
        self.midstate.get_or_init(|| Midstate::compute(self))
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction from a hex-encoded string.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str).map_err(PrimitivesError::from)?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from raw bytes.
    ///
    /// This method requires the byte slice to contain exactly one complete
    /// transaction with no trailing data.
    ///
    /// # Arguments
    /// * `bytes` - The raw transaction bytes, legacy or witness form.
    ///
    /// # Returns
    /// `Ok(Transaction)` on success, or a `TransactionError` if the data
    /// is truncated, malformed, or has trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = ByteReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::TrailingBytes(reader.remaining()));
        }
        Ok(tx)
    }

    /// Deserialize a transaction from a `ByteReader`.
    ///
    /// A zero input count followed by `0x01` is the witness marker and
    /// flag. A zero input count followed by `0x00` is a transaction with no
    /// inputs and no outputs; any other byte is an unknown flag.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let version = reader.read_u32_le().map_err(decode("version"))?;

        let mut input_count = reader.read_length().map_err(decode("input count"))?;
        let mut segwit = false;
        if input_count == 0 {
            match reader.peek_u8() {
                Ok(WITNESS_FLAG) => {
                    reader.read_u8().map_err(decode("witness flag"))?;
                    segwit = true;
                    input_count = reader.read_length().map_err(decode("input count"))?;
                }
                Ok(0x00) | Err(_) => {}
                Ok(flag) => return Err(TransactionError::WitnessFlag(flag)),
            }
        }

        let mut inputs = Vec::with_capacity(input_count.min(reader.remaining()));
        for _ in 0..input_count {
            inputs.push(TxIn::read_from(reader)?);
        }

        let output_count = reader.read_length().map_err(decode("output count"))?;
        let mut outputs = Vec::with_capacity(output_count.min(reader.remaining()));
        for _ in 0..output_count {
            outputs.push(TxOut::read_from(reader)?);
        }

        if segwit {
            for input in inputs.iter_mut() {
                input.read_witness(reader)?;
            }
            if !inputs.iter().any(TxIn::has_witness) {
                return Err(TransactionError::SuperfluousWitness);
            }
        }

        let lock_time = reader.read_u32_le().map_err(decode("lock time"))?;

        Ok(Transaction {
            version,
            lock_time,
            inputs,
            outputs,
            midstate: OnceLock::new(),
        })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize this transaction, in witness form when any input has a
    /// witness.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.serialize(self.has_witness())
    }

    /// Serialize without witness data. This is what the txid commits to.
    pub fn to_bytes_no_witness(&self) -> Vec<u8> {
        self.serialize(false)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    fn serialize(&self, witness: bool) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.serialized_size());
        writer.write_u32_le(self.version);
        if witness {
            writer.write_u8(WITNESS_MARKER);
            writer.write_u8(WITNESS_FLAG);
        }

        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(&mut writer);
        }

        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(&mut writer);
        }

        if witness {
            for input in &self.inputs {
                input.write_witness(&mut writer);
            }
        }

        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    // -----------------------------------------------------------------
    // Identifiers
    // -----------------------------------------------------------------

    /// Double SHA-256 of the no-witness serialization, in internal order.
    pub fn hash(&self) -> Hash {
        Hash::new(sha256d(&self.to_bytes_no_witness()))
    }

    /// The transaction id as displayed: reversed hex of [`hash`](Self::hash).
    pub fn id(&self) -> String {
        self.hash().to_string()
    }

    /// Double SHA-256 of the full serialization, witnesses included.
    pub fn witness_hash(&self) -> Hash {
        Hash::new(sha256d(&self.to_bytes()))
    }

    pub fn witness_id(&self) -> String {
        self.witness_hash().to_string()
    }

    // -----------------------------------------------------------------
    // Size and weight
    // -----------------------------------------------------------------

    /// Length of the no-witness serialization.
    pub fn base_size(&self) -> usize {
        4 + VarInt::from(self.inputs.len()).length()
            + self.inputs.iter().map(TxIn::base_size).sum::<usize>()
            + VarInt::from(self.outputs.len()).length()
            + self.outputs.iter().map(TxOut::serialized_size).sum::<usize>()
            + 4
    }

    /// Witness stack bytes, count and length prefixes included. The marker
    /// and flag are not counted. Zero when no input has a witness.
    pub fn witness_size(&self) -> usize {
        if !self.has_witness() {
            return 0;
        }
        self.inputs.iter().map(TxIn::witness_size).sum()
    }

    /// `base_size + witness_size`.
    pub fn size(&self) -> usize {
        self.base_size() + self.witness_size()
    }

    /// `base_size * 3 + size`.
    pub fn weight(&self) -> usize {
        weight_of(self.base_size(), self.witness_size())
    }

    /// `weight / 4`.
    pub fn vsize(&self) -> usize {
        vsize_of(self.weight())
    }

    /// Length of [`to_bytes`](Self::to_bytes), marker and flag included.
    pub fn serialized_size(&self) -> usize {
        if self.has_witness() {
            self.size() + 2
        } else {
            self.size()
        }
    }

    /// BIP141 virtual size: the full serialization weighed with base bytes
    /// counted four times, rounded up.
    pub fn bip141_vsize(&self) -> usize {
        let weight = self.base_size() * 3 + self.serialized_size();
        (weight + 3) / 4
    }

    // -----------------------------------------------------------------
    // Signature hash
    // -----------------------------------------------------------------

    /// Legacy signature hash of input `idx`. See [`legacy::signature_hash`].
    pub fn raw_signature_hash(&self, idx: usize, hash_type: u32) -> Result<[u8; 32], TransactionError> {
        legacy::signature_hash(self, idx, hash_type)
    }

    /// BIP143 signature hash of input `idx`. See [`witness_v0::signature_hash`].
    pub fn witness_v0_signature_hash(&self, idx: usize, hash_type: u32) -> Result<[u8; 32], TransactionError> {
        witness_v0::signature_hash(self, idx, hash_type)
    }

    // -----------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------

    /// Sign input `idx` with `keys` and install the unlocking data.
    ///
    /// Witness inputs get a witness stack, the rest a scriptSig. Keys must
    /// be given in the order their public keys appear in the redeem script.
    ///
    /// # Arguments
    /// * `idx` - Index of the input to sign. It must carry coin data.
    /// * `keys` - One key, or several when the input has a redeem script.
    /// * `compressed` - Serialize public keys in compressed form.
    /// * `hash_type` - Sighash type, appended to every signature.
    pub fn sign_index(
        &mut self,
        idx: usize,
        keys: &[PrivateKey],
        compressed: bool,
        hash_type: u32,
    ) -> Result<(), TransactionError> {
        let spent = self.spent(idx)?;
        if keys.len() > 1 && spent.redeem_script.is_none() {
            return Err(TransactionError::MultipleKeysWithoutRedeem(idx));
        }
        if spent.witness_script_code.is_some() {
            self.witness_signature(idx, keys, compressed, hash_type)
        } else {
            self.raw_signature(idx, keys, compressed, hash_type)
        }
    }

    /// Sign a non-witness input, replacing its scriptSig.
    pub fn raw_signature(
        &mut self,
        idx: usize,
        keys: &[PrivateKey],
        compressed: bool,
        hash_type: u32,
    ) -> Result<(), TransactionError> {
        let hash = self.raw_signature_hash(idx, hash_type)?;
        let signs = sign_all(keys, &hash, compressed, hash_type)?;
        let spent = self.spent(idx)?;
        let script = spent.template.raw_unlocking_script(&signs, spent.redeem_script.as_ref())?;

        debug!(input = idx, keys = keys.len(), hash_type, "signed legacy input");
        let input = &mut self.inputs[idx];
        input.unlocking_script = script;
        input.witness.clear();
        Ok(())
    }

    /// Sign a witness input, replacing its witness stack.
    pub fn witness_signature(
        &mut self,
        idx: usize,
        keys: &[PrivateKey],
        compressed: bool,
        hash_type: u32,
    ) -> Result<(), TransactionError> {
        let hash = self.witness_v0_signature_hash(idx, hash_type)?;
        let signs = sign_all(keys, &hash, compressed, hash_type)?;
        let spent = self.spent(idx)?;
        let witness = spent
            .template
            .witness_unlocking_stack(&signs, spent.redeem_script.as_ref())?;
        let script = spent.template.raw_unlocking_script(&signs, spent.redeem_script.as_ref())?;

        debug!(input = idx, keys = keys.len(), hash_type, "signed witness input");
        let input = &mut self.inputs[idx];
        input.unlocking_script = script;
        input.witness = witness;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------

    /// Verify every input. Stops at the first failure.
    pub fn verify(&self) -> Result<(), TransactionError> {
        for idx in 0..self.inputs.len() {
            self.verify_input(idx)?;
        }
        Ok(())
    }

    /// Run the unlocking data of input `idx` against the script it spends.
    ///
    /// Witness stacks are replayed as an equivalent push-only scriptSig.
    /// Signature checks hash with the algorithm matching the spent script's
    /// version.
    pub fn verify_input(&self, idx: usize) -> Result<(), TransactionError> {
        let input = self.input(idx)?;
        let spent = self.spent(idx)?;
        let version = spent.script_version();

        let unlocking = match version {
            ScriptVersion::Base => input.unlocking_script.clone(),
            ScriptVersion::WitnessV0 => ScriptTemplate::witness_to_unlocking(&input.witness)?,
        };

        let mut engine = Engine::new();
        engine.set_hasher(move |hash_type| {
            let hash = match version {
                ScriptVersion::Base => legacy::signature_hash(self, idx, hash_type),
                ScriptVersion::WitnessV0 => witness_v0::signature_hash(self, idx, hash_type),
            };
            hash.map_err(|e| InterpreterError::new(InterpreterErrorCode::SigHash, e.to_string()))
        });
        engine.set_verifier(check_ecdsa);

        match engine.verify(&unlocking, &spent.final_locking_script) {
            Ok(()) => {
                debug!(input = idx, outpoint = %input.outpoint, "input verified");
                Ok(())
            }
            Err(source) => {
                debug!(input = idx, outpoint = %input.outpoint, error = %source, "input failed verification");
                Err(TransactionError::Verify {
                    index: idx,
                    outpoint: input.outpoint,
                    source,
                })
            }
        }
    }

    // -----------------------------------------------------------------
    // Coin data
    // -----------------------------------------------------------------

    /// Attach coin data to input `idx`, typically after deserializing.
    ///
    /// Without an explicit redeem script one is recovered from the
    /// unlocking data: the last push of the scriptSig for P2SH, the last
    /// witness element for P2WSH.
    ///
    /// # Arguments
    /// * `idx` - Index of the input.
    /// * `coin` - The coin the input spends. Its outpoint must match.
    /// * `redeem` - Redeem or witness script, if known.
    pub fn hydrate_input(&mut self, idx: usize, coin: &Coin, redeem: Option<Script>) -> Result<(), TransactionError> {
        let input = self.input(idx)?;
        if coin.outpoint != input.outpoint {
            return Err(TransactionError::OutpointMismatch {
                coin: coin.outpoint,
                input: input.outpoint,
            });
        }

        let redeem = match redeem {
            Some(redeem) => Some(redeem),
            None => recover_redeem(input, coin)?,
        };
        let spent = SpentOutput::from_coin(coin, redeem)?;
        self.inputs[idx].set_spent_output(Some(spent));
        Ok(())
    }

    fn spent(&self, idx: usize) -> Result<&SpentOutput, TransactionError> {
        self.input(idx)?
            .spent_output()
            .ok_or(TransactionError::MissingCoin(idx))
    }
}

/// Decode-error constructor naming the field being read.
fn decode(field: &'static str) -> impl FnOnce(PrimitivesError) -> TransactionError {
    move |source| TransactionError::Decode { field, source }
}

fn sign_all(
    keys: &[PrivateKey],
    hash: &[u8; 32],
    compressed: bool,
    hash_type: u32,
) -> Result<Vec<PubKeySign>, TransactionError> {
    keys.iter()
        .map(|key| -> Result<PubKeySign, TransactionError> {
            let mut signature = key.sign(hash)?.to_der();
            signature.push(hash_type as u8);
            Ok(PubKeySign {
                pub_key: key.pub_key().serialize(compressed),
                signature,
            })
        })
        .collect()
}

fn check_ecdsa(hash: &[u8; 32], der: &[u8], pub_key: &[u8]) -> Result<(), InterpreterError> {
    let invalid = |e: PrimitivesError| InterpreterError::new(InterpreterErrorCode::CheckSigVerify, e.to_string());
    let key = PublicKey::from_bytes(pub_key).map_err(invalid)?;
    key.verify_der(hash, der).map_err(invalid)
}

fn recover_redeem(input: &TxIn, coin: &Coin) -> Result<Option<Script>, TransactionError> {
    let locking = coin.locking_script()?;
    match ScriptTemplate::parse_locking_script(locking.to_bytes())? {
        ScriptTemplate::P2sh(_) => {
            let instructions = input.unlocking_script.instructions()?;
            Ok(instructions
                .last()
                .filter(|ins| ins.is_push())
                .map(|ins| Script::from_bytes(ins.data())))
        }
        ScriptTemplate::P2wsh(_) => Ok(input.witness.last().map(|item| Script::from_bytes(item))),
        ScriptTemplate::P2pkh(_) | ScriptTemplate::P2wpkh(_) => Ok(None),
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

/// Equality over the wire fields and attached coin data; the cached
/// midstate is ignored.
impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.lock_time == other.lock_time
            && self.inputs == other.inputs
            && self.outputs == other.outputs
    }
}

impl Eq for Transaction {}

impl fmt::Display for Transaction {
    /// Display the transaction as its hex-encoded serialization.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
