use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::CoreError;
use crate::fee::{estimate_fee_per_kb, MempoolStats};
use crate::gateway::{Method, QueryParams, RequestGateway};
use crate::types::{
    confirmations_at, BlockHeight, Listing, Transaction, TxInput, TxOutput, TxStatus, Utxo,
    WitnessType,
};

use super::paging::{limit_listing, OffsetPager};
use super::parsing::{
    array, bool_field, field, integer, opt_integer, opt_string, position_index, string,
    utc_datetime,
};
use super::{ExplorerProvider, ListQuery, ProviderConfig};

const PROVIDER_NAME: &str = "blockchair";

/// Records per page for list endpoints.
const REQUEST_LIMIT: usize = 50;

/// Adapter for the Blockchair API.
///
/// Amounts are reported natively in smallest units. Filters are passed as a
/// single `q` parameter holding a comma-joined `field(value)` list, and list
/// endpoints page with `offset`/`limit`.
pub struct Blockchair {
    config: ProviderConfig,
    gateway: Arc<dyn RequestGateway>,
}

impl Blockchair {
    pub fn new(config: ProviderConfig, gateway: Arc<dyn RequestGateway>) -> Self {
        Self { config, gateway }
    }

    async fn compose_request(
        &self,
        command: &str,
        data: Option<&str>,
        filters: &[(&str, &str)],
        offset: usize,
    ) -> Result<serde_json::Value, CoreError> {
        let path = format!("{command}{}", data.unwrap_or_default());
        let mut query = QueryParams::new();
        query.insert("offset".into(), offset.to_string());
        query.insert("limit".into(), REQUEST_LIMIT.to_string());
        if !filters.is_empty() {
            query.insert("q".into(), filter_expression(filters));
        }
        if let Some(key) = &self.config.api_key {
            query.insert("key".into(), key.clone());
        }
        debug!(
            provider = PROVIDER_NAME,
            network = %self.config.network,
            path = %path,
            offset,
            "compose request"
        );
        self.gateway.request(&path, &query, Method::Get).await
    }

    async fn stats(&self) -> Result<serde_json::Value, CoreError> {
        let res = self.compose_request("stats", None, &[], 0).await?;
        Ok(field(&res, &["data"])?.clone())
    }

    /// Fetch every unspent output of `address`, stopping early once more
    /// than `limit` records are known.
    async fn address_utxos(&self, address: &str, limit: usize) -> Result<Vec<Utxo>, CoreError> {
        let mut utxos = Vec::new();
        let mut pager = OffsetPager::new(REQUEST_LIMIT);
        loop {
            let res = self
                .compose_request(
                    "outputs",
                    None,
                    &[("recipient", address), ("is_spent", "false")],
                    pager.offset(),
                )
                .await?;
            let tip = integer::<u64>(field(&res, &["context"])?, "state")?;
            let page = array(&res, &["data"])?;

            for raw in page {
                // The unspent filter is not trusted: spent records are dropped
                // whatever the query asked for.
                if raw.get("is_spent").and_then(serde_json::Value::as_bool) != Some(false) {
                    continue;
                }
                utxos.push(parse_utxo(raw, address, tip)?);
            }

            if utxos.len() > limit || !pager.advance(page.len()) {
                break;
            }
        }
        Ok(utxos)
    }
}

#[async_trait]
impl ExplorerProvider for Blockchair {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn get_balance(&self, addresses: &[String]) -> Result<u64, CoreError> {
        let mut balance = 0u64;
        for address in addresses {
            let res = self
                .compose_request("dashboards/address/", Some(address.as_str()), &[], 0)
                .await?;
            let summary = field(&res, &["data", address.as_str(), "address"])?;
            let amount = integer::<u64>(summary, "balance")?;
            balance = balance
                .checked_add(amount)
                .ok_or_else(|| CoreError::InvalidResponse("balance overflow".into()))?;
        }
        Ok(balance)
    }

    async fn get_utxos(
        &self,
        addresses: &[String],
        query: &ListQuery,
    ) -> Result<Listing<Utxo>, CoreError> {
        // The outputs endpoint pages by offset only; there is no txid cursor.
        if query.after_txid.is_some() {
            return Err(CoreError::Unsupported {
                provider: PROVIDER_NAME,
                operation: "get_utxos cursor",
            });
        }
        let cap = self.config.result_cap;
        let limit = query.max_count.map_or(cap, |max| max.min(cap));
        let mut utxos = Vec::new();
        for address in addresses {
            let remaining = limit.saturating_sub(utxos.len());
            utxos.extend(self.address_utxos(address, remaining).await?);
            if utxos.len() > limit {
                break;
            }
        }
        Ok(limit_listing(
            utxos,
            query.max_count,
            cap,
            "blockchair utxo result cap reached",
        ))
    }

    async fn get_transaction(&self, tx_id: &str) -> Result<Transaction, CoreError> {
        let res = self
            .compose_request("dashboards/transaction/", Some(tx_id), &[], 0)
            .await?;
        let tip = integer::<u64>(field(&res, &["context"])?, "state")?;
        let entry = field(&res, &["data", tx_id])?;
        parse_transaction(entry, tip)
    }

    async fn estimate_fee(&self, target_blocks: u32) -> Result<u64, CoreError> {
        let data = self.stats().await?;
        let stats: MempoolStats = serde_json::from_value(data)
            .map_err(|e| CoreError::InvalidResponse(format!("invalid mempool stats: {e}")))?;
        estimate_fee_per_kb(&stats, target_blocks)
    }

    async fn block_count(&self) -> Result<u64, CoreError> {
        let data = self.stats().await?;
        integer(&data, "best_block_height")
    }
}

// ==============================================================================
// Normalization
// ==============================================================================

fn filter_expression(filters: &[(&str, &str)]) -> String {
    filters
        .iter()
        .map(|(name, value)| format!("{name}({value})"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Blockchair reports mempool records with `block_id = -1`.
fn block_height(raw: &serde_json::Value) -> Result<Option<BlockHeight>, CoreError> {
    Ok(opt_integer::<i64>(raw, "block_id")?
        .and_then(|id| u64::try_from(id).ok())
        .map(BlockHeight))
}

fn parse_utxo(raw: &serde_json::Value, address: &str, tip: u64) -> Result<Utxo, CoreError> {
    let block_height = block_height(raw)?;
    Ok(Utxo {
        address: address.to_owned(),
        tx_hash: string(raw, "transaction_hash")?,
        confirmations: confirmations_at(tip, block_height),
        output_n: integer(raw, "index")?,
        input_n: None,
        block_height,
        fee: None,
        size: 0,
        value: integer(raw, "value")?,
        script: opt_string(raw, "script_hex").unwrap_or_default(),
        timestamp: utc_datetime(raw, "time"),
    })
}

fn parse_transaction(entry: &serde_json::Value, tip: u64) -> Result<Transaction, CoreError> {
    let tx = field(entry, &["transaction"])?;
    let block_height = block_height(tx)?;
    let confirmations = confirmations_at(tip, block_height);

    let inputs = array(entry, &["inputs"])?
        .iter()
        .enumerate()
        .map(|(position, raw)| {
            Ok(TxInput {
                prev_hash: string(raw, "transaction_hash")?,
                output_n: integer(raw, "index")?,
                index_n: position_index(position, "inputs")?,
                unlocking_script: opt_string(raw, "spending_signature_hex")
                    .or_else(|| opt_string(raw, "script_hex"))
                    .unwrap_or_default(),
                value: opt_integer(raw, "value")?,
                address: opt_string(raw, "recipient"),
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    let outputs = array(entry, &["outputs"])?
        .iter()
        .map(|raw| {
            Ok(TxOutput {
                value: integer(raw, "value")?,
                address: opt_string(raw, "recipient"),
                lock_script: opt_string(raw, "script_hex").unwrap_or_default(),
                spent: raw.get("is_spent").and_then(serde_json::Value::as_bool),
                output_n: integer(raw, "index")?,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    let witness_type = if bool_field(tx, "has_witness").unwrap_or(false) {
        WitnessType::Segwit
    } else {
        WitnessType::Legacy
    };

    let mut transaction = Transaction {
        hash: string(tx, "hash")?,
        version: integer(tx, "version")?,
        locktime: integer(tx, "lock_time")?,
        inputs,
        outputs,
        fee: opt_integer(tx, "fee")?,
        size: integer(tx, "size")?,
        confirmations,
        block_height,
        status: TxStatus::from_confirmations(confirmations),
        witness_type,
        timestamp: utc_datetime(tx, "time"),
        input_total: opt_integer(tx, "input_total")?.unwrap_or_default(),
        output_total: opt_integer(tx, "output_total")?.unwrap_or_default(),
        coinbase: bool_field(tx, "is_coinbase").unwrap_or(false),
    };
    if transaction.fee.is_none() {
        transaction.recompute_totals();
    }
    Ok(transaction)
}
