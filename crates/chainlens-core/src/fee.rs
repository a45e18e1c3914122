//! Heuristic fee estimation from aggregate mempool statistics.
//!
//! The estimate blends the fee pressure of the current mempool with the fee
//! level accepted over the last 24 hours, then damps it by the confirmation
//! target. It is not a scientific estimate: only the ordering between targets
//! (sooner target, equal or higher fee) is meant to be relied upon.

use serde::Deserialize;

use crate::error::CoreError;

/// Converts the fiat-denominated mempool fee into smallest-unit terms.
const UNIT_SCALE: f64 = 100_000_000.0;

/// Base of the logarithm that damps the estimate by confirmation target.
const TARGET_LOG_BASE: f64 = 6.0;

/// Mempool statistics, named after the provider's own field spellings.
#[derive(Debug, Clone, Deserialize)]
pub struct MempoolStats {
    pub mempool_transactions: f64,
    /// Total mempool size in bytes.
    pub mempool_size: f64,
    #[serde(rename = "median_trasaction_fee_24h")]
    pub median_fee_24h: f64,
    #[serde(rename = "average_trasaction_fee_24h")]
    pub average_fee_24h: f64,
    pub mempool_total_fee_usd: f64,
    pub market_price_usd: f64,
}

/// Estimate a fee per kilobyte for confirmation within `target_blocks`.
///
/// All intermediate arithmetic stays in `f64`; the result is floored once,
/// at the very end.
pub fn estimate_fee_per_kb(stats: &MempoolStats, target_blocks: u32) -> Result<u64, CoreError> {
    if stats.mempool_transactions <= 0.0 {
        return Err(CoreError::InvalidResponse(
            "mempool statistics report no pending transactions".into(),
        ));
    }
    if stats.market_price_usd <= 0.0 || stats.average_fee_24h <= 0.0 {
        return Err(CoreError::InvalidResponse(
            "mempool statistics report a zero price or average fee".into(),
        ));
    }

    let average_tx_size = stats.mempool_size / stats.mempool_transactions;
    let mempool_fee_per_kb = ((stats.mempool_total_fee_usd / stats.market_price_usd * UNIT_SCALE)
        / stats.mempool_transactions)
        * stats.median_fee_24h
        / stats.average_fee_24h;
    let recent_fee_per_kb = average_tx_size * (stats.median_fee_24h / 1000.0);
    let raw_estimate = (mempool_fee_per_kb + recent_fee_per_kb) / 2.0;

    let damping = 1.0 / ((f64::from(target_blocks) + 2.0).ln() / TARGET_LOG_BASE.ln());
    let estimate = (raw_estimate * damping).floor();
    if !estimate.is_finite() || estimate < 0.0 {
        return Err(CoreError::InvalidResponse(format!(
            "fee estimate out of range: {estimate}"
        )));
    }
    Ok(estimate as u64)
}
