//! The four standard script shapes and the unlocking data each needs.
//!
//! A [`ScriptTemplate`] holds only the hash or witness program of a locking
//! script. It knows how to render the locking script, the script the engine
//! actually evaluates for it, and the scriptSig or witness stack that
//! satisfies it given signatures and an optional redeem script.

use btc_primitives::hash::{hash160, sha256};

use crate::address::{Address, AddressKind, Network};
use crate::opcodes::*;
use crate::{Script, ScriptError};

/// Script evaluation rules an input is signed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptVersion {
    /// Legacy scripts with the pre-segwit signature hash.
    Base,
    /// Segregated witness v0 with the BIP143 signature hash.
    WitnessV0,
}

/// A public key and a signature over it, the signature carrying its
/// trailing sighash byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubKeySign {
    pub pub_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// A standard locking script shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptTemplate {
    P2pkh([u8; 20]),
    P2sh([u8; 20]),
    P2wpkh([u8; 20]),
    P2wsh([u8; 32]),
}

impl ScriptTemplate {
    /// Classify a locking script.
    ///
    /// # Returns
    /// The matching template, or `UnknownScriptType` for any other shape.
    pub fn parse_locking_script(bytes: &[u8]) -> Result<Self, ScriptError> {
        let unknown = || ScriptError::UnknownScriptType(hex::encode(bytes));
        let ins = crate::instruction::parse_instructions(bytes).map_err(|_| unknown())?;

        match ins.as_slice() {
            [a, b, push, c, d]
                if a.opcode == OP_DUP
                    && b.opcode == OP_HASH160
                    && push.opcode == OP_DATA_20
                    && c.opcode == OP_EQUALVERIFY
                    && d.opcode == OP_CHECKSIG =>
            {
                Ok(ScriptTemplate::P2pkh(to_array(push.data()).ok_or_else(unknown)?))
            }
            [a, push, b] if a.opcode == OP_HASH160 && push.opcode == OP_DATA_20 && b.opcode == OP_EQUAL => {
                Ok(ScriptTemplate::P2sh(to_array(push.data()).ok_or_else(unknown)?))
            }
            [v, push] if v.opcode == OP_0 && push.opcode == OP_DATA_20 => {
                Ok(ScriptTemplate::P2wpkh(to_array(push.data()).ok_or_else(unknown)?))
            }
            [v, push] if v.opcode == OP_0 && push.opcode == OP_DATA_32 => {
                Ok(ScriptTemplate::P2wsh(to_array(push.data()).ok_or_else(unknown)?))
            }
            _ => Err(unknown()),
        }
    }

    /// The template an address pays to.
    pub fn from_address(address: &Address) -> Result<Self, ScriptError> {
        let payload = address.hash_payload();
        let bad = || ScriptError::InvalidAddress(hex::encode(payload));
        Ok(match address.kind {
            AddressKind::P2pkh => ScriptTemplate::P2pkh(to_array(payload).ok_or_else(bad)?),
            AddressKind::P2sh => ScriptTemplate::P2sh(to_array(payload).ok_or_else(bad)?),
            AddressKind::P2wpkh => ScriptTemplate::P2wpkh(to_array(payload).ok_or_else(bad)?),
            AddressKind::P2wsh => ScriptTemplate::P2wsh(to_array(payload).ok_or_else(bad)?),
        })
    }

    pub fn to_address(&self, network: Network) -> Result<Address, ScriptError> {
        let (kind, payload): (AddressKind, &[u8]) = match self {
            ScriptTemplate::P2pkh(h) => (AddressKind::P2pkh, h),
            ScriptTemplate::P2sh(h) => (AddressKind::P2sh, h),
            ScriptTemplate::P2wpkh(h) => (AddressKind::P2wpkh, h),
            ScriptTemplate::P2wsh(h) => (AddressKind::P2wsh, h),
        };
        Address::new(kind, payload, network)
    }

    pub fn script_version(&self) -> ScriptVersion {
        match self {
            ScriptTemplate::P2pkh(_) | ScriptTemplate::P2sh(_) => ScriptVersion::Base,
            ScriptTemplate::P2wpkh(_) | ScriptTemplate::P2wsh(_) => ScriptVersion::WitnessV0,
        }
    }

    /// The canonical locking script.
    pub fn locking_script(&self) -> Script {
        match self {
            ScriptTemplate::P2pkh(h) => Script::p2pkh(h),
            ScriptTemplate::P2sh(h) => Script::p2sh(h),
            ScriptTemplate::P2wpkh(p) => witness_program(p),
            ScriptTemplate::P2wsh(p) => witness_program(p),
        }
    }

    /// The script the engine evaluates in place of the locking script.
    ///
    /// A witness pubkey-hash program is evaluated as the equivalent P2PKH
    /// script and a witness script-hash program as the P2SH of its redeem
    /// script.
    pub fn final_locking_script(&self, redeem: Option<&Script>) -> Result<Script, ScriptError> {
        match self {
            ScriptTemplate::P2pkh(_) | ScriptTemplate::P2sh(_) => Ok(self.locking_script()),
            ScriptTemplate::P2wpkh(h) => Ok(Script::p2pkh(h)),
            ScriptTemplate::P2wsh(_) => {
                let redeem = self.checked_redeem(redeem)?;
                Ok(Script::p2sh(&hash160(redeem.to_bytes())))
            }
        }
    }

    /// The scriptSig for a non-witness input.
    ///
    /// * P2PKH: `<sig> <pubkey>`, exactly one signature.
    /// * P2SH: `OP_0 <sig>... <redeem>`.
    /// * Witness variants: empty.
    pub fn raw_unlocking_script(&self, signs: &[PubKeySign], redeem: Option<&Script>) -> Result<Script, ScriptError> {
        let mut script = Script::new();
        match self {
            ScriptTemplate::P2pkh(_) => {
                let sign = single_sign("P2PKH", signs)?;
                script.append_push_data(&sign.signature)?;
                script.append_push_data(&sign.pub_key)?;
            }
            ScriptTemplate::P2sh(_) => {
                let redeem = self.checked_redeem(redeem)?;
                script.append_opcodes(&[OP_0])?;
                for sign in signs {
                    script.append_push_data(&sign.signature)?;
                }
                script.append_push_data(redeem.to_bytes())?;
            }
            ScriptTemplate::P2wpkh(_) | ScriptTemplate::P2wsh(_) => {}
        }
        Ok(script)
    }

    /// The witness stack for a witness input.
    ///
    /// * P2WPKH: `[sig, pubkey]`, exactly one signature.
    /// * P2WSH: `["", sig..., redeem]`.
    /// * Base variants: empty.
    pub fn witness_unlocking_stack(&self, signs: &[PubKeySign], redeem: Option<&Script>) -> Result<Vec<Vec<u8>>, ScriptError> {
        match self {
            ScriptTemplate::P2pkh(_) | ScriptTemplate::P2sh(_) => Ok(Vec::new()),
            ScriptTemplate::P2wpkh(_) => {
                let sign = single_sign("P2WPKH", signs)?;
                Ok(vec![sign.signature.clone(), sign.pub_key.clone()])
            }
            ScriptTemplate::P2wsh(_) => {
                let redeem = self.checked_redeem(redeem)?;
                let mut stack = Vec::with_capacity(signs.len() + 2);
                stack.push(Vec::new());
                stack.extend(signs.iter().map(|s| s.signature.clone()));
                stack.push(redeem.to_bytes().to_vec());
                Ok(stack)
            }
        }
    }

    /// The script code committed to by the BIP143 signature hash, or `None`
    /// for non-witness inputs.
    pub fn witness_script_code(&self, redeem: Option<&Script>) -> Result<Option<Script>, ScriptError> {
        match self {
            ScriptTemplate::P2pkh(_) | ScriptTemplate::P2sh(_) => Ok(None),
            ScriptTemplate::P2wpkh(h) => Ok(Some(Script::p2pkh(h))),
            ScriptTemplate::P2wsh(_) => Ok(Some(self.checked_redeem(redeem)?.clone())),
        }
    }

    /// Re-express a witness stack as an equivalent push-only scriptSig.
    pub fn witness_to_unlocking(stack: &[Vec<u8>]) -> Result<Script, ScriptError> {
        let mut script = Script::new();
        for item in stack {
            script.append_push_data(item)?;
        }
        Ok(script)
    }

    /// Check `redeem` against a script-hash commitment.
    fn checked_redeem<'r>(&self, redeem: Option<&'r Script>) -> Result<&'r Script, ScriptError> {
        let (kind, matches, expected) = match self {
            ScriptTemplate::P2sh(h) => {
                let redeem = redeem.ok_or(ScriptError::MissingRedeemScript("P2SH"))?;
                ("P2SH", hash160(redeem.to_bytes()) == *h, hex::encode(h))
            }
            ScriptTemplate::P2wsh(p) => {
                let redeem = redeem.ok_or(ScriptError::MissingRedeemScript("P2WSH"))?;
                ("P2WSH", sha256(redeem.to_bytes()) == *p, hex::encode(p))
            }
            ScriptTemplate::P2pkh(_) | ScriptTemplate::P2wpkh(_) => {
                return redeem.ok_or(ScriptError::MissingRedeemScript("pubkey hash template"));
            }
        };
        match redeem {
            Some(r) if matches => Ok(r),
            _ => Err(ScriptError::RedeemScriptMismatch { kind, expected }),
        }
    }
}

/// `OP_0 <program>` for the 20- and 32-byte programs held by the variants.
fn witness_program(program: &[u8]) -> Script {
    let mut bytes = Vec::with_capacity(2 + program.len());
    bytes.push(OP_0);
    bytes.push(program.len() as u8);
    bytes.extend_from_slice(program);
    Script::from(bytes)
}

fn single_sign<'s>(kind: &'static str, signs: &'s [PubKeySign]) -> Result<&'s PubKeySign, ScriptError> {
    match signs {
        [sign] => Ok(sign),
        _ => Err(ScriptError::SignatureCount { kind, got: signs.len() }),
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.try_into().ok()
}
