//! Builder settings.

use btc_script::Network;
use serde::{Deserialize, Serialize};

/// Default ceiling on the fee a builder will pay, in satoshis.
pub const DEFAULT_MAX_FEE: u64 = 1_000_000;

/// Settings for [`TransactionBuilder`](crate::TransactionBuilder).
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Network addresses are rendered for in logs.
    pub network: Network,
    /// Estimate the fee at this many satoshis per 1000 virtual bytes.
    /// Takes precedence over `send_fees`.
    pub relay_fee_per_kb: Option<u64>,
    pub max_fee: u64,
    /// Flat fee used when no relay fee rate is set.
    pub send_fees: u64,
    /// Sign every input after building.
    pub sign: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            network: Network::Mainnet,
            relay_fee_per_kb: None,
            max_fee: DEFAULT_MAX_FEE,
            send_fees: 0,
            sign: true,
        }
    }
}
