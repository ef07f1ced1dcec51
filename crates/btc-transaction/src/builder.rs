//! Grouped construction of signed transactions.
//!
//! A [`TransactionBuilder`] collects an ordered list of groups. Each group
//! may spend one coin (with the keys and settings to sign it) and may pay
//! one destination. [`TransactionBuilder::then`] closes the current group
//! and opens the next, so inputs and outputs interleave in one chain:
//!
//! ```ignore
//! let tx = TransactionBuilder::new()
//!     .add_coin(coin)
//!     .add_keys(vec![key], true)
//!     .to_address(&dest, 3000)
//!     .then()
//!     .push_data(b"hello".to_vec())
//!     .set_change_address(change)
//!     .send_fees(1000)
//!     .build()?;
//! ```

use btc_primitives::ec::PrivateKey;
use btc_script::{Address, Script};
use tracing::debug;

use crate::config::BuilderConfig;
use crate::estimator::{estimate_fees, estimate_size};
use crate::input::{TxIn, DEFAULT_SEQUENCE_NUMBER};
use crate::outpoint::Coin;
use crate::output::TxOut;
use crate::sighash::SIGHASH_ALL;
use crate::transaction::Transaction;
use crate::{BuilderError, TransactionError};

#[derive(Clone, Debug)]
enum Destination {
    Address(Address),
    ScriptHex(String),
}

/// One coin and/or one destination, with the settings to sign the coin.
#[derive(Clone, Debug)]
struct Group {
    coin: Option<Coin>,
    keys: Vec<PrivateKey>,
    compressed: bool,
    hash_type: u32,
    redeem: Option<Script>,
    sequence: u32,
    destination: Option<(Destination, u64)>,
}

impl Default for Group {
    fn default() -> Self {
        Group {
            coin: None,
            keys: Vec::new(),
            compressed: true,
            hash_type: SIGHASH_ALL,
            redeem: None,
            sequence: DEFAULT_SEQUENCE_NUMBER,
            destination: None,
        }
    }
}

/// Fluent builder producing a funded, optionally signed [`Transaction`].
#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    config: BuilderConfig,
    groups: Vec<Group>,
    change_address: Option<Address>,
    data: Vec<Vec<u8>>,
    version: u32,
    lock_time: u32,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        TransactionBuilder {
            config,
            groups: vec![Group::default()],
            change_address: None,
            data: Vec::new(),
            version: 1,
            lock_time: 0,
        }
    }

    fn current(&mut self) -> &mut Group {
        if self.groups.is_empty() {
            self.groups.push(Group::default());
        }
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    /// Close the current group and open a new one.
    pub fn then(mut self) -> Self {
        self.groups.push(Group::default());
        self
    }

    // -----------------------------------------------------------------
    // Group settings
    // -----------------------------------------------------------------

    /// Spend `coin` in the current group, replacing any coin set before.
    pub fn add_coin(mut self, coin: Coin) -> Self {
        self.current().coin = Some(coin);
        self
    }

    /// Keys signing the current group's coin, in redeem script order.
    pub fn add_keys(mut self, keys: Vec<PrivateKey>, compressed: bool) -> Self {
        let group = self.current();
        group.keys = keys;
        group.compressed = compressed;
        self
    }

    pub fn hash_type(mut self, hash_type: u32) -> Self {
        self.current().hash_type = hash_type;
        self
    }

    /// Redeem or witness script for a P2SH or P2WSH coin.
    pub fn redeem_script(mut self, redeem: Script) -> Self {
        self.current().redeem = Some(redeem);
        self
    }

    pub fn sequence(mut self, sequence: u32) -> Self {
        self.current().sequence = sequence;
        self
    }

    /// Pay `value` to `address` from the current group.
    pub fn to_address(mut self, address: &Address, value: u64) -> Self {
        self.current().destination = Some((Destination::Address(address.clone()), value));
        self
    }

    /// Pay `value` to an explicit locking script, parsed at build time.
    pub fn to_script_hex(mut self, script_hex: impl Into<String>, value: u64) -> Self {
        self.current().destination = Some((Destination::ScriptHex(script_hex.into()), value));
        self
    }

    // -----------------------------------------------------------------
    // Transaction settings
    // -----------------------------------------------------------------

    /// Add a zero-value `OP_RETURN <data>` output after the change output.
    pub fn push_data(mut self, data: Vec<u8>) -> Self {
        self.data.push(data);
        self
    }

    pub fn set_change_address(mut self, address: Address) -> Self {
        self.change_address = Some(address);
        self
    }

    /// Flat fee, used when no relay fee rate is set.
    pub fn send_fees(mut self, fees: u64) -> Self {
        self.config.send_fees = fees;
        self
    }

    pub fn relay_fee_per_kb(mut self, rate: u64) -> Self {
        self.config.relay_fee_per_kb = Some(rate);
        self
    }

    pub fn max_fee(mut self, max_fee: u64) -> Self {
        self.config.max_fee = max_fee;
        self
    }

    pub fn sign(mut self, sign: bool) -> Self {
        self.config.sign = sign;
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn lock_time(mut self, lock_time: u32) -> Self {
        self.lock_time = lock_time;
        self
    }

    // -----------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------

    /// Assemble, fund and sign the transaction.
    ///
    /// 1. Every group's coin becomes an input.
    /// 2. Every group's destination becomes an output.
    /// 3. There must be at least one of each.
    /// 4. The fee is the flat fee or, with a relay rate, estimated from
    ///    the finished shape (change and data outputs included). It may
    ///    not exceed `max_fee`.
    /// 5. Outputs may not exceed inputs, and what is left must cover the
    ///    fee.
    /// 6. Any remainder goes to the change address.
    /// 7. Data outputs are appended.
    /// 8. If signing is on, every input is signed with its group's keys.
    ///
    /// # Returns
    /// The transaction, or the first [`BuilderError`] hit. Errors from a
    /// single group carry its index.
    pub fn build(self) -> Result<Transaction, BuilderError> {
        let mut tx = Transaction::new();
        tx.version = self.version;
        tx.lock_time = self.lock_time;

        let mut input_groups = Vec::new();
        let mut total_in = 0u64;
        for (g, group) in self.groups.iter().enumerate() {
            let Some(coin) = &group.coin else { continue };
            let input = TxIn::from_coin(coin, group.redeem.clone(), group.sequence)
                .map_err(|source| BuilderError::Group { group: g, source })?;
            total_in = total_in.checked_add(coin.value).ok_or(BuilderError::ValueOverflow)?;
            tx.add_input(input);
            input_groups.push(g);
        }

        let mut total_out = 0u64;
        for (g, group) in self.groups.iter().enumerate() {
            let Some((destination, value)) = &group.destination else { continue };
            let script = resolve(destination).map_err(|source| BuilderError::Group { group: g, source })?;
            total_out = total_out.checked_add(*value).ok_or(BuilderError::ValueOverflow)?;
            tx.add_output(TxOut::new(*value, script));
        }

        if tx.input_count() == 0 {
            return Err(BuilderError::NoInputs);
        }
        if tx.output_count() == 0 {
            return Err(BuilderError::NoOutputs);
        }

        let change_script = match &self.change_address {
            Some(address) => Some(address.locking_script().map_err(TransactionError::from)?),
            None => None,
        };
        let data_outputs = self
            .data
            .iter()
            .map(|data| Script::op_return(data).map(|script| TxOut::new(0, script)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(TransactionError::from)?;

        let fees = match self.config.relay_fee_per_kb {
            Some(rate) => {
                let mut draft = tx.clone();
                if let Some(script) = &change_script {
                    draft.add_output(TxOut::new(0, script.clone()));
                }
                for output in &data_outputs {
                    draft.add_output(output.clone());
                }
                let size = estimate_size(&draft);
                let fees = estimate_fees(size, rate);
                debug!(size, rate, fees, "estimated fee");
                fees
            }
            None => self.config.send_fees,
        };
        if fees > self.config.max_fee {
            return Err(BuilderError::FeeTooHigh {
                fee: fees,
                max: self.config.max_fee,
            });
        }

        if total_out > total_in {
            return Err(BuilderError::AmountNotEnough);
        }
        let available = total_in - total_out;
        let change = available
            .checked_sub(fees)
            .ok_or(BuilderError::InsufficientFee { fee: fees, available })?;

        if change > 0 {
            let script = change_script.ok_or(BuilderError::NoChangeAddress(change))?;
            let address = self
                .change_address
                .as_ref()
                .and_then(|a| a.to_text(self.config.network).ok())
                .unwrap_or_default();
            debug!(change, address = %address, "adding change output");
            tx.add_output(TxOut::new(change, script));
        }

        for output in data_outputs {
            tx.add_output(output);
        }

        if self.config.sign {
            for (idx, &g) in input_groups.iter().enumerate() {
                let group = &self.groups[g];
                if group.keys.is_empty() {
                    return Err(BuilderError::NoSigningKeys { group: g });
                }
                tx.sign_index(idx, &group.keys, group.compressed, group.hash_type)
                    .map_err(|source| BuilderError::Group { group: g, source })?;
            }
        }

        debug!(
            inputs = tx.input_count(),
            outputs = tx.output_count(),
            fees,
            change,
            "built transaction"
        );
        Ok(tx)
    }
}

fn resolve(destination: &Destination) -> Result<Script, TransactionError> {
    match destination {
        Destination::Address(address) => Ok(address.locking_script()?),
        Destination::ScriptHex(script_hex) => Ok(Script::from_hex(script_hex)?),
    }
}
