/// Bitcoin address handling.
///
/// Legacy P2PKH and P2SH addresses use Base58Check with a SHA-256d checksum.
/// Witness v0 addresses (P2WPKH, P2WSH) use bech32 segwit encoding.

use std::fmt;
use std::str::FromStr;

use bech32::{hrp, segwit, Fe32, Hrp};
use btc_primitives::hash::{hash160, sha256d};
use serde::{Deserialize, Serialize};

use crate::{Script, ScriptError};

/// Bitcoin network type for address prefix selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Mainnet: `1...`, `3...`, `bc1...`.
    #[default]
    Mainnet,
    /// Testnet: `m.../n...`, `2...`, `tb1...`.
    Testnet,
    /// Regtest shares testnet's Base58 versions and uses `bcrt1...`.
    Regtest,
}

impl Network {
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet | Network::Regtest => 0x6f,
        }
    }

    pub fn p2sh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Testnet | Network::Regtest => 0xc4,
        }
    }

    /// Human-readable part of bech32 addresses.
    pub fn hrp(&self) -> Hrp {
        match self {
            Network::Mainnet => hrp::BC,
            Network::Testnet => hrp::TB,
            Network::Regtest => hrp::BCRT,
        }
    }
}

/// Locking script type an address commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressKind {
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
}

impl AddressKind {
    fn payload_len(&self) -> usize {
        match self {
            AddressKind::P2wsh => 32,
            _ => 20,
        }
    }
}

/// A Bitcoin address: a script type plus its hash or witness program.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub kind: AddressKind,
    /// The network parsed from the text form, used by `Display`.
    pub network: Network,
    payload: Vec<u8>,
}

impl Address {
    /// Create an address from its script type and hash payload.
    ///
    /// # Returns
    /// The address, or `InvalidAddress` when the payload length does not fit
    /// the kind (32 bytes for P2WSH, 20 otherwise).
    pub fn new(kind: AddressKind, payload: &[u8], network: Network) -> Result<Self, ScriptError> {
        if payload.len() != kind.payload_len() {
            return Err(ScriptError::InvalidAddress(format!(
                "{:?} payload must be {} bytes, got {}",
                kind,
                kind.payload_len(),
                payload.len()
            )));
        }
        Ok(Address { kind, network, payload: payload.to_vec() })
    }

    /// P2PKH address of a 20-byte public key hash.
    pub fn from_public_key_hash(hash: &[u8; 20], network: Network) -> Self {
        Address { kind: AddressKind::P2pkh, network, payload: hash.to_vec() }
    }

    /// P2PKH address of a serialized public key.
    pub fn from_public_key(pub_key: &[u8], network: Network) -> Self {
        Self::from_public_key_hash(&hash160(pub_key), network)
    }

    /// P2SH address of a redeem script.
    pub fn from_redeem_script(redeem: &Script, network: Network) -> Self {
        Address {
            kind: AddressKind::P2sh,
            network,
            payload: hash160(redeem.to_bytes()).to_vec(),
        }
    }

    /// Parse a Base58Check or bech32 address string.
    ///
    /// The network is detected from the version byte or human-readable
    /// part. Base58 testnet versions are reported as `Testnet`.
    pub fn from_text(addr: &str) -> Result<Self, ScriptError> {
        if let Ok((hrp, version, program)) = segwit::decode(addr) {
            return Self::from_segwit(addr, hrp, version, program);
        }

        let decoded = bs58::decode(addr)
            .into_vec()
            .map_err(|_| ScriptError::InvalidAddress(format!("bad char for '{}'", addr)))?;

        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddress(format!(
                "'{}' decodes to {} bytes",
                addr,
                decoded.len()
            )));
        }

        // Verify checksum: last 4 bytes should equal sha256d of first 21 bytes.
        let checksum = sha256d(&decoded[..21]);
        if decoded[21..25] != checksum[..4] {
            return Err(ScriptError::EncodingChecksumFailed);
        }

        let (kind, network) = match decoded[0] {
            0x00 => (AddressKind::P2pkh, Network::Mainnet),
            0x05 => (AddressKind::P2sh, Network::Mainnet),
            0x6f => (AddressKind::P2pkh, Network::Testnet),
            0xc4 => (AddressKind::P2sh, Network::Testnet),
            _ => return Err(ScriptError::UnsupportedAddress(addr.to_string())),
        };
        Self::new(kind, &decoded[1..21], network)
    }

    fn from_segwit(addr: &str, hrp: Hrp, version: Fe32, program: Vec<u8>) -> Result<Self, ScriptError> {
        let network = [Network::Mainnet, Network::Testnet, Network::Regtest]
            .into_iter()
            .find(|n| n.hrp() == hrp)
            .ok_or_else(|| ScriptError::UnsupportedAddress(addr.to_string()))?;
        if version != Fe32::Q {
            return Err(ScriptError::UnsupportedAddress(addr.to_string()));
        }
        let kind = match program.len() {
            20 => AddressKind::P2wpkh,
            32 => AddressKind::P2wsh,
            n => {
                return Err(ScriptError::InvalidAddress(format!(
                    "witness v0 program of {} bytes",
                    n
                )))
            }
        };
        Self::new(kind, &program, network)
    }

    /// Encode the address for `network`.
    pub fn to_text(&self, network: Network) -> Result<String, ScriptError> {
        let version = match self.kind {
            AddressKind::P2pkh => network.p2pkh_version(),
            AddressKind::P2sh => network.p2sh_version(),
            AddressKind::P2wpkh | AddressKind::P2wsh => {
                return segwit::encode(network.hrp(), Fe32::Q, &self.payload)
                    .map_err(|e| ScriptError::InvalidAddress(e.to_string()));
            }
        };

        let mut payload = Vec::with_capacity(25);
        payload.push(version);
        payload.extend_from_slice(&self.payload);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        Ok(bs58::encode(&payload).into_string())
    }

    /// The public key hash, script hash or witness program.
    pub fn hash_payload(&self) -> &[u8] {
        &self.payload
    }

    /// The locking script paying to this address.
    pub fn locking_script(&self) -> Result<Script, ScriptError> {
        match self.kind {
            AddressKind::P2pkh => Ok(Script::p2pkh(&self.payload20()?)),
            AddressKind::P2sh => Ok(Script::p2sh(&self.payload20()?)),
            AddressKind::P2wpkh | AddressKind::P2wsh => Script::witness_v0(&self.payload),
        }
    }

    fn payload20(&self) -> Result<[u8; 20], ScriptError> {
        self.payload
            .as_slice()
            .try_into()
            .map_err(|_| ScriptError::InvalidAddress(format!("payload of {} bytes", self.payload.len())))
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_text(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_text(self.network).map_err(|_| fmt::Error)?;
        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The public key hash shared across several test vectors.
    const TEST_PUBLIC_KEY_HASH: &str = "00ac6144c4db7b5790f343cf0477a65fb8a02eb7";

    fn h20(s: &str) -> [u8; 20] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    // -----------------------------------------------------------------------
    // Base58Check
    // -----------------------------------------------------------------------

    #[test]
    fn test_from_text_mainnet() {
        let addr = Address::from_text("1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMr").unwrap();
        assert_eq!(hex::encode(addr.hash_payload()), "8fe80c75c9560e8b56ed64ea3c26e18d2c52211b");
        assert_eq!(addr.kind, AddressKind::P2pkh);
        assert_eq!(addr.network, Network::Mainnet);
    }

    #[test]
    fn test_from_text_testnet() {
        let addr = Address::from_text("mtdruWYVEV1wz5yL7GvpBj4MgifCB7yhPd").unwrap();
        assert_eq!(hex::encode(addr.hash_payload()), "8fe80c75c9560e8b56ed64ea3c26e18d2c52211b");
        assert_eq!(addr.network, Network::Testnet);
    }

    #[test]
    fn test_from_public_key_hash() {
        let addr = Address::from_public_key_hash(&h20(TEST_PUBLIC_KEY_HASH), Network::Mainnet);
        assert_eq!(addr.to_string(), "114ZWApV4EEU8frr7zygqQcB1V2BodGZuS");
        assert_eq!(addr.to_text(Network::Testnet).unwrap(), "mfaWoDuTsFfiunLTqZx4fKpVsUctiDV9jk");
    }

    #[test]
    fn test_from_text_known_hash() {
        let addr = Address::from_text("16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM").unwrap();
        assert_eq!(hex::encode(addr.hash_payload()), "010966776006953d5567439e5e39f86a0d273bee");
    }

    #[test]
    fn test_p2sh_roundtrip() {
        let redeem = Script::from_asm("OP_1").unwrap();
        let addr = Address::from_redeem_script(&redeem, Network::Mainnet);
        let text = addr.to_string();
        assert!(text.starts_with('3'));
        assert_eq!(Address::from_text(&text).unwrap(), addr);

        let testnet = addr.to_text(Network::Testnet).unwrap();
        assert!(testnet.starts_with('2'));
        assert_eq!(Address::from_text(&testnet).unwrap().kind, AddressKind::P2sh);
        assert!(addr.locking_script().unwrap().is_p2sh());
    }

    #[test]
    fn test_bad_checksum_and_length() {
        assert_eq!(
            Address::from_text("1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMs"),
            Err(ScriptError::EncodingChecksumFailed)
        );
        assert!(matches!(Address::from_text("1E7uc"), Err(ScriptError::InvalidAddress(_))));
        assert!(matches!(Address::from_text("0OIl"), Err(ScriptError::InvalidAddress(_))));
    }

    // -----------------------------------------------------------------------
    // bech32
    // -----------------------------------------------------------------------

    #[test]
    fn test_p2wpkh_bip173() {
        let program = h20("751e76e8199196d454941c45d1b3a323f1433bd6");
        let addr = Address::new(AddressKind::P2wpkh, &program, Network::Mainnet).unwrap();
        assert_eq!(addr.to_string(), "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
        assert_eq!(
            addr.to_text(Network::Testnet).unwrap(),
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"
        );

        let parsed = Address::from_text("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4").unwrap();
        assert_eq!(parsed, addr);
        assert_eq!(
            parsed.locking_script().unwrap().to_hex(),
            "0014751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn test_p2wsh_bip173() {
        let text = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";
        let addr = Address::from_text(text).unwrap();
        assert_eq!(addr.kind, AddressKind::P2wsh);
        assert_eq!(
            hex::encode(addr.hash_payload()),
            "1863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262"
        );
        assert_eq!(addr.to_string(), text);
    }

    #[test]
    fn test_regtest_hrp() {
        let addr = Address::new(AddressKind::P2wpkh, &[1u8; 20], Network::Regtest).unwrap();
        let text = addr.to_string();
        assert!(text.starts_with("bcrt1q"));
        assert_eq!(Address::from_text(&text).unwrap().network, Network::Regtest);
    }

    #[test]
    fn test_payload_length_checked() {
        assert!(Address::new(AddressKind::P2wsh, &[0u8; 20], Network::Mainnet).is_err());
        assert!(Address::new(AddressKind::P2pkh, &[0u8; 32], Network::Mainnet).is_err());
    }

    #[test]
    fn test_network_serde() {
        assert_eq!(serde_json::to_string(&Network::Regtest).unwrap(), "\"regtest\"");
        let n: Network = serde_json::from_str("\"testnet\"").unwrap();
        assert_eq!(n, Network::Testnet);
    }
}
