/// Bitcoin Script type - a sequence of opcodes and data pushes.
///
/// Scripts are used in transaction inputs (unlocking) and outputs (locking)
/// to define spending conditions. The Script wraps a `Vec<u8>` and provides
/// methods for construction, classification, serialization, and ASM output.

use std::fmt;

use crate::instruction::{self, parse_instructions, Instruction};
use crate::interpreter::opcode::opcode_by_name;
use crate::opcodes::*;
use crate::ScriptError;

/// A Bitcoin script, represented as a byte vector newtype.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string (e.g. "76a914...88ac").
    ///
    /// # Returns
    /// A `Script` wrapping the decoded bytes, or an error if the hex is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        Ok(Script(hex::decode(hex_str)?))
    }

    /// Create a script from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Create a script from a Bitcoin ASM string.
    ///
    /// Tokens are opcode names (`OP_DUP`), `0` and `-1` for `OP_0` and
    /// `OP_1NEGATE`, or hex strings which become data pushes.
    ///
    /// # Arguments
    /// * `asm` - A space-separated ASM string.
    ///
    /// # Returns
    /// A `Script`, or an error if any token is invalid.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            match token {
                "0" | "OP_FALSE" => script.append_opcodes(&[OP_0])?,
                "-1" => script.append_opcodes(&[OP_1NEGATE])?,
                "OP_TRUE" => script.append_opcodes(&[OP_1])?,
                _ if token.starts_with("OP_") => {
                    let opcode = opcode_by_name(token)
                        .ok_or_else(|| ScriptError::InvalidOpcode(token.to_string()))?;
                    script.append_opcodes(&[opcode.value])?;
                }
                _ => script.append_push_data_hex(token)?,
            }
        }
        Ok(script)
    }

    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn p2pkh(pub_key_hash: &[u8; 20]) -> Self {
        let mut b = Vec::with_capacity(25);
        b.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
        b.extend_from_slice(pub_key_hash);
        b.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Script(b)
    }

    /// `OP_HASH160 <hash> OP_EQUAL`
    pub fn p2sh(script_hash: &[u8; 20]) -> Self {
        let mut b = Vec::with_capacity(23);
        b.extend_from_slice(&[OP_HASH160, OP_DATA_20]);
        b.extend_from_slice(script_hash);
        b.push(OP_EQUAL);
        Script(b)
    }

    /// `OP_0 <program>` for a 20-byte (P2WPKH) or 32-byte (P2WSH) program.
    pub fn witness_v0(program: &[u8]) -> Result<Self, ScriptError> {
        if program.len() != 20 && program.len() != 32 {
            return Err(ScriptError::UnknownScriptType(format!(
                "witness v0 program of {} bytes",
                program.len()
            )));
        }
        let mut b = Vec::with_capacity(2 + program.len());
        b.push(OP_0);
        b.push(program.len() as u8);
        b.extend_from_slice(program);
        Ok(Script(b))
    }

    /// `OP_RETURN <data>`, the provably unspendable data carrier.
    pub fn op_return(data: &[u8]) -> Result<Self, ScriptError> {
        let mut script = Script(vec![OP_RETURN]);
        script.append_push_data(data)?;
        Ok(script)
    }

    /// Build an `m`-of-`n` multisig redeem script:
    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`.
    ///
    /// # Arguments
    /// * `nrequired` - Number of signatures required (`m`).
    /// * `pubkeys` - Serialized public keys in signing order.
    ///
    /// # Returns
    /// The redeem script, or an error if there are fewer keys than required
    /// or either count is outside `1..=16`.
    pub fn multisig(nrequired: usize, pubkeys: &[Vec<u8>]) -> Result<Self, ScriptError> {
        if nrequired == 0 {
            return Err(ScriptError::InvalidMultisig("nrequired must be at least 1".to_string()));
        }
        if pubkeys.len() < nrequired {
            return Err(ScriptError::PubKeysLessThanRequired {
                pubkeys: pubkeys.len(),
                nrequired,
            });
        }
        let n = small_int_opcode(pubkeys.len() as u8)
            .filter(|_| pubkeys.len() <= 16)
            .ok_or_else(|| {
                ScriptError::InvalidMultisig(format!("{} pubkeys exceeds 16", pubkeys.len()))
            })?;
        let m = small_int_opcode(nrequired as u8)
            .ok_or_else(|| ScriptError::InvalidMultisig(format!("nrequired {}", nrequired)))?;

        let mut script = Script::new();
        script.append_opcodes(&[m])?;
        for pk in pubkeys {
            script.append_push_data(pk)?;
        }
        script.append_opcodes(&[n, OP_CHECKMULTISIG])?;
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Encode the script as a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Convert the script to its ASM representation.
    ///
    /// Data pushes appear as their hex encoding; opcodes appear by name.
    /// Returns an empty string for malformed scripts.
    pub fn to_asm(&self) -> String {
        match self.instructions() {
            Ok(ins) => ins.iter().map(Instruction::to_asm_string).collect::<Vec<_>>().join(" "),
            Err(_) => String::new(),
        }
    }

    /// Render every instruction as its name followed by operand hex,
    /// e.g. `OP_DUP OP_HASH160 OP_DATA_20 89ab... OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn disassemble(&self) -> Result<String, ScriptError> {
        Ok(instruction::disassemble(&self.instructions()?))
    }

    /// Return a reference to the underlying bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the script into instructions.
    pub fn instructions(&self) -> Result<Vec<Instruction>, ScriptError> {
        parse_instructions(&self.0)
    }

    // -----------------------------------------------------------------------
    // Script classification
    // -----------------------------------------------------------------------

    /// Pattern: OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
    pub fn is_p2pkh(&self) -> bool {
        let b = &self.0;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// Pattern: OP_HASH160 <20 bytes> OP_EQUAL
    pub fn is_p2sh(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// Pattern: OP_0 <20 bytes>
    pub fn is_p2wpkh(&self) -> bool {
        let b = &self.0;
        b.len() == 22 && b[0] == OP_0 && b[1] == OP_DATA_20
    }

    /// Pattern: OP_0 <32 bytes>
    pub fn is_p2wsh(&self) -> bool {
        let b = &self.0;
        b.len() == 34 && b[0] == OP_0 && b[1] == OP_DATA_32
    }

    /// Whether the script starts with OP_RETURN.
    pub fn is_data(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }

    /// Whether every instruction only pushes data. Malformed scripts are not.
    pub fn is_push_only(&self) -> bool {
        self.instructions()
            .map(|ins| ins.iter().all(Instruction::is_push))
            .unwrap_or(false)
    }

    // -----------------------------------------------------------------------
    // Mutation / building
    // -----------------------------------------------------------------------

    /// Append data bytes with the shortest PUSHDATA prefix.
    ///
    /// Empty data is appended as `OP_0`.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        self.0.extend_from_slice(&Instruction::push(data)?.to_bytes());
        Ok(())
    }

    /// Append hex-encoded data with the proper PUSHDATA prefix.
    pub fn append_push_data_hex(&mut self, hex_str: &str) -> Result<(), ScriptError> {
        let data = hex::decode(hex_str).map_err(|_| ScriptError::InvalidOpcodeData)?;
        self.append_push_data(&data)
    }

    /// Append raw opcodes to the script.
    ///
    /// Rejects push data opcodes (OP_DATA_1..OP_PUSHDATA4); use
    /// `append_push_data` for those.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        if let Some(&op) = opcodes.iter().find(|&&op| (OP_DATA_1..=OP_PUSHDATA4).contains(&op)) {
            return Err(ScriptError::InvalidOpcodeType(
                crate::interpreter::lookup(op).name().to_string(),
            ));
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }

    /// A copy of the script with every `opcode` instruction removed.
    pub fn remove_opcode(&self, opcode: u8) -> Result<Script, ScriptError> {
        let bytes = self
            .instructions()?
            .into_iter()
            .filter(|ins| ins.opcode != opcode)
            .flat_map(|ins| ins.to_bytes())
            .collect();
        Ok(Script(bytes))
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl fmt::Display for Script {
    /// Display the script as a lowercase hex string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P2PKH_HEX: &str = "76a914e2a623699e81b291c0327f408fea765d534baa2a88ac";

    fn pkh() -> [u8; 20] {
        let mut h = [0u8; 20];
        h.copy_from_slice(&hex::decode("e2a623699e81b291c0327f408fea765d534baa2a").unwrap());
        h
    }

    #[test]
    fn test_from_hex_roundtrip() {
        let s = Script::from_hex(P2PKH_HEX).unwrap();
        assert_eq!(s.to_hex(), P2PKH_HEX);
        assert_eq!(s.len(), 25);
        assert!(Script::from_hex("zz").is_err());
    }

    #[test]
    fn test_standard_constructors() {
        assert_eq!(Script::p2pkh(&pkh()).to_hex(), P2PKH_HEX);
        assert!(Script::p2pkh(&pkh()).is_p2pkh());
        let p2sh = Script::p2sh(&pkh());
        assert_eq!(p2sh.to_hex(), "a914e2a623699e81b291c0327f408fea765d534baa2a87");
        assert!(p2sh.is_p2sh());
        assert!(!p2sh.is_p2pkh());

        let wpkh = Script::witness_v0(&pkh()).unwrap();
        assert_eq!(wpkh.to_hex(), "0014e2a623699e81b291c0327f408fea765d534baa2a");
        assert!(wpkh.is_p2wpkh());
        assert!(!wpkh.is_p2wsh());
        let wsh = Script::witness_v0(&[0xab; 32]).unwrap();
        assert!(wsh.is_p2wsh());
        assert!(Script::witness_v0(&[0; 21]).is_err());
    }

    #[test]
    fn test_asm_roundtrip() {
        let asm = "OP_DUP OP_HASH160 e2a623699e81b291c0327f408fea765d534baa2a OP_EQUALVERIFY OP_CHECKSIG";
        let s = Script::from_asm(asm).unwrap();
        assert_eq!(s.to_hex(), P2PKH_HEX);
        assert_eq!(s.to_asm(), asm);
        assert_eq!(Script::from_asm("").unwrap(), Script::new());
        assert_eq!(Script::from_asm("0 -1 OP_TRUE").unwrap().to_bytes(), &[OP_0, OP_1NEGATE, OP_1]);
        assert!(matches!(Script::from_asm("OP_BOGUS"), Err(ScriptError::InvalidOpcode(_))));
        assert!(matches!(Script::from_asm("xyz"), Err(ScriptError::InvalidOpcodeData)));
    }

    #[test]
    fn test_disassemble() {
        let s = Script::from_hex(P2PKH_HEX).unwrap();
        assert_eq!(
            s.disassemble().unwrap(),
            "OP_DUP OP_HASH160 OP_DATA_20 e2a623699e81b291c0327f408fea765d534baa2a OP_EQUALVERIFY OP_CHECKSIG"
        );
        assert!(Script::from_bytes(&[0x4c]).disassemble().is_err());
        assert_eq!(Script::from_bytes(&[0x4c]).to_asm(), "");
    }

    #[test]
    fn test_op_return() {
        let s = Script::op_return(b"hello").unwrap();
        assert_eq!(s.to_hex(), "6a0568656c6c6f");
        assert!(s.is_data());
    }

    #[test]
    fn test_push_only() {
        assert!(Script::from_asm("0 OP_16 aabb -1").unwrap().is_push_only());
        assert!(!Script::from_asm("OP_1 OP_DUP").unwrap().is_push_only());
        assert!(!Script::from_bytes(&[0x02, 0x01]).is_push_only());
        assert!(Script::new().is_push_only());
    }

    #[test]
    fn test_append_opcodes_rejects_push() {
        let mut s = Script::new();
        assert!(matches!(s.append_opcodes(&[OP_PUSHDATA1]), Err(ScriptError::InvalidOpcodeType(_))));
        assert!(s.is_empty());
    }

    #[test]
    fn test_remove_opcode() {
        let s = Script::from_asm("OP_1 OP_CODESEPARATOR ab OP_CODESEPARATOR OP_DROP").unwrap();
        assert_eq!(s.remove_opcode(OP_CODESEPARATOR).unwrap().to_asm(), "OP_1 ab OP_DROP");
    }

    #[test]
    fn test_multisig() {
        let keys: Vec<Vec<u8>> = (1..=3u8)
            .map(|i| {
                let mut k = vec![0x02; 33];
                k[32] = i;
                k
            })
            .collect();
        let s = Script::multisig(2, &keys).unwrap();
        let ins = s.instructions().unwrap();
        assert_eq!(ins.len(), 6);
        assert_eq!(ins[0].opcode, OP_2);
        assert_eq!(ins[4].opcode, OP_3);
        assert_eq!(ins[5].opcode, OP_CHECKMULTISIG);

        assert_eq!(
            Script::multisig(3, &keys[..2]),
            Err(ScriptError::PubKeysLessThanRequired { pubkeys: 2, nrequired: 3 })
        );
        assert!(matches!(Script::multisig(0, &keys), Err(ScriptError::InvalidMultisig(_))));
        let many = vec![vec![0x02; 33]; 17];
        assert!(matches!(Script::multisig(1, &many), Err(ScriptError::InvalidMultisig(_))));
    }

    #[test]
    fn test_serde_hex() {
        let s = Script::from_hex(P2PKH_HEX).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, format!("\"{}\"", P2PKH_HEX));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
