//! Canonical record shapes shared by every provider adapter.
//!
//! Adapters translate each provider's wire format into [`Transaction`],
//! [`TxInput`], [`TxOutput`] and [`Utxo`]. Monetary values are always
//! integers in the network's smallest unit.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ==============================================================================
// Block Height
// ==============================================================================

/// A block height, wrapped for type safety.
///
/// `#[serde(transparent)]` keeps the JSON representation a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(pub u64);

impl From<u64> for BlockHeight {
    fn from(h: u64) -> Self {
        Self(h)
    }
}

impl std::ops::Deref for BlockHeight {
    type Target = u64;
    fn deref(&self) -> &u64 {
        &self.0
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Confirmations of a record mined at `block_height`, seen from chain tip `tip`.
/// Records without a known height have zero confirmations.
#[must_use]
pub fn confirmations_at(tip: u64, block_height: Option<BlockHeight>) -> u64 {
    block_height.map_or(0, |h| tip.saturating_sub(*h))
}

// ==============================================================================
// Status Enums
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Confirmed,
    Unconfirmed,
}

impl TxStatus {
    #[must_use]
    pub fn from_confirmations(confirmations: u64) -> Self {
        if confirmations > 0 {
            Self::Confirmed
        } else {
            Self::Unconfirmed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WitnessType {
    Legacy,
    Segwit,
}

// ==============================================================================
// Transaction Types
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub version: i32,
    pub locktime: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// `None` when neither the provider nor the input values can supply it.
    pub fee: Option<u64>,
    pub size: u64,
    pub confirmations: u64,
    pub block_height: Option<BlockHeight>,
    pub status: TxStatus,
    pub witness_type: WitnessType,
    #[serde(with = "time::serde::timestamp::option")]
    pub timestamp: Option<OffsetDateTime>,
    pub input_total: u64,
    pub output_total: u64,
    pub coinbase: bool,
}

impl Transaction {
    /// Recompute `input_total` and `output_total` from the records, and fill
    /// in `fee` as their difference when the provider did not supply one.
    ///
    /// Input totals are only replaced when every input value is known, so a
    /// provider-supplied total survives partially resolved inputs.
    pub fn recompute_totals(&mut self) {
        if let Some(total) = self.known_input_total() {
            self.input_total = total;
        }
        self.output_total = self.outputs.iter().map(|o| o.value).sum();
        if self.fee.is_none() && !self.coinbase && self.known_input_total().is_some() {
            self.fee = self.input_total.checked_sub(self.output_total);
        }
    }

    fn known_input_total(&self) -> Option<u64> {
        self.inputs
            .iter()
            .try_fold(0u64, |acc, input| acc.checked_add(input.value?))
    }
}

/// One consumed prior output. `index_n` is the position within the
/// consuming transaction; `output_n` indexes into the previous transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_hash: String,
    pub output_n: u32,
    pub index_n: u32,
    /// Hex-encoded unlocking script.
    pub unlocking_script: String,
    pub value: Option<u64>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    pub address: Option<String>,
    /// Hex-encoded locking script.
    pub lock_script: String,
    /// `None` when the provider does not report spend state.
    pub spent: Option<bool>,
    pub output_n: u32,
}

/// An unspent output seen from an address query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utxo {
    pub address: String,
    pub tx_hash: String,
    pub confirmations: u64,
    pub output_n: u32,
    /// Not meaningful for an unspent output; `None` unless the provider
    /// reports one.
    pub input_n: Option<u32>,
    pub block_height: Option<BlockHeight>,
    pub fee: Option<u64>,
    /// Zero when unknown.
    pub size: u64,
    pub value: u64,
    pub script: String,
    #[serde(with = "time::serde::timestamp::option")]
    pub timestamp: Option<OffsetDateTime>,
}

// ==============================================================================
// Operation Results
// ==============================================================================

/// Records the provider cap that cut a listing short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
    pub cap: usize,
    pub reason: String,
}

/// A possibly truncated result set. A listing with `truncation` set is valid
/// but incomplete; callers relying on completeness must check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub truncation: Option<Truncation>,
}

impl<T> Listing<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            truncation: None,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append another listing, keeping the first truncation seen.
    pub fn extend(&mut self, other: Listing<T>) {
        self.items.extend(other.items);
        if self.truncation.is_none() {
            self.truncation = other.truncation;
        }
    }
}

/// Result of broadcasting a raw transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    /// `None` when the provider accepted the call but returned no id.
    pub txid: Option<String>,
    pub response: serde_json::Value,
}
