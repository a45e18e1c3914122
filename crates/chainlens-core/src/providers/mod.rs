//! Provider adapters.
//!
//! Defines the canonical [`ExplorerProvider`] operation set and one adapter
//! per explorer service. Adapters share the canonical record types and the
//! small helpers in `paging` and `parsing`; provider quirks stay inside each
//! adapter module.

mod blockchair;
mod chainso;
mod paging;
mod parsing;

pub use blockchair::Blockchair;
pub use chainso::Chainso;
pub use paging::{cap_listing, flag_provider_cap, limit_listing, FixedPacing, OffsetPager};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::gateway::RequestGateway;
use crate::types::{Broadcast, Listing, Transaction, Utxo};
use crate::units::Denominator;

/// Records returned by Chain.so listings when the caller sets no limit.
pub const DEFAULT_MAX_RECORDS: usize = 20;

/// Historical hard limit on records a provider returns for one listing call.
pub const DEFAULT_RESULT_CAP: usize = 1000;

// ==============================================================================
// Configuration
// ==============================================================================

/// Static adapter configuration, fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Network name, used for logging only.
    pub network: String,
    pub base_url: String,
    #[serde(default)]
    pub denominator: Denominator,
    /// Provider-specific coin identifier (e.g. `BTC`, `LTCTEST`).
    #[serde(default)]
    pub coin_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Hard cap on records one provider call can return.
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,
}

fn default_result_cap() -> usize {
    DEFAULT_RESULT_CAP
}

/// Cursor and size for listing operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only return records after this transaction id, where supported.
    pub after_txid: Option<String>,
    /// Caller limit on returned records. `None` leaves the count to the
    /// adapter: Blockchair pages up to the configured result cap, Chain.so
    /// returns [`DEFAULT_MAX_RECORDS`].
    pub max_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Blockchair,
    Chainso,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blockchair => write!(f, "blockchair"),
            Self::Chainso => write!(f, "chainso"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blockchair" => Ok(Self::Blockchair),
            "chainso" | "chain.so" => Ok(Self::Chainso),
            other => Err(format!(
                "unknown provider `{other}`; expected blockchair or chainso"
            )),
        }
    }
}

/// Construct the adapter for `kind` over an already configured gateway.
pub fn build_provider(
    kind: ProviderKind,
    config: ProviderConfig,
    gateway: Arc<dyn RequestGateway>,
) -> Box<dyn ExplorerProvider> {
    match kind {
        ProviderKind::Blockchair => Box::new(Blockchair::new(config, gateway)),
        ProviderKind::Chainso => Box::new(Chainso::new(config, gateway)),
    }
}

// ==============================================================================
// Canonical Operation Set
// ==============================================================================

/// Canonical explorer operations.
///
/// Every operation has a default body failing with
/// [`CoreError::Unsupported`]; adapters override what their provider offers.
/// Gateway errors are propagated unchanged.
#[async_trait]
pub trait ExplorerProvider: Send + Sync {
    /// Short provider name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Sum of the balances of `addresses` in smallest units. Any failing
    /// lookup aborts the whole call.
    async fn get_balance(&self, _addresses: &[String]) -> Result<u64, CoreError> {
        Err(unsupported(self.name(), "get_balance"))
    }

    async fn get_utxos(
        &self,
        _addresses: &[String],
        _query: &ListQuery,
    ) -> Result<Listing<Utxo>, CoreError> {
        Err(unsupported(self.name(), "get_utxos"))
    }

    async fn get_transaction(&self, _tx_id: &str) -> Result<Transaction, CoreError> {
        Err(unsupported(self.name(), "get_transaction"))
    }

    /// Hex-encoded serialized transaction.
    async fn get_raw_transaction(&self, _tx_id: &str) -> Result<String, CoreError> {
        Err(unsupported(self.name(), "get_raw_transaction"))
    }

    async fn get_transactions(
        &self,
        _address: &str,
        _query: &ListQuery,
    ) -> Result<Listing<Transaction>, CoreError> {
        Err(unsupported(self.name(), "get_transactions"))
    }

    /// Submit a raw transaction once. Failures are never retried.
    async fn send_raw_transaction(&self, _raw_hex: &str) -> Result<Broadcast, CoreError> {
        Err(unsupported(self.name(), "send_raw_transaction"))
    }

    /// Fee per kilobyte, in smallest units, for confirmation within
    /// `target_blocks`.
    async fn estimate_fee(&self, _target_blocks: u32) -> Result<u64, CoreError> {
        Err(unsupported(self.name(), "estimate_fee"))
    }

    /// Current chain tip height.
    async fn block_count(&self) -> Result<u64, CoreError> {
        Err(unsupported(self.name(), "block_count"))
    }

    /// `[tx_id]` when the transaction sits in the mempool unconfirmed,
    /// otherwise empty.
    async fn mempool_status(&self, _tx_id: &str) -> Result<Vec<String>, CoreError> {
        Err(unsupported(self.name(), "mempool_status"))
    }
}

fn unsupported(provider: &'static str, operation: &'static str) -> CoreError {
    CoreError::Unsupported {
        provider,
        operation,
    }
}
