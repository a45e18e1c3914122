use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::gateway::{Method, QueryParams, RequestGateway};
use crate::types::{
    confirmations_at, BlockHeight, Broadcast, Listing, Transaction, TxInput, TxOutput, TxStatus,
    Utxo, WitnessType,
};

use super::paging::{flag_provider_cap, limit_listing, FixedPacing};
use super::parsing::{
    array, field, integer, opt_integer, opt_string, position_index, string, unix_datetime,
};
use super::{ExplorerProvider, ListQuery, ProviderConfig, DEFAULT_MAX_RECORDS};

const PROVIDER_NAME: &str = "chainso";

/// Chain.so answers HTTP 429 when called more than about once per second.
const REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Adapter for the Chain.so v2 API.
///
/// Paths are `<command>/<coin>/<data>/<parameter>`, amounts are decimal
/// strings in display units, and every call is preceded by a fixed pause.
pub struct Chainso {
    config: ProviderConfig,
    gateway: Arc<dyn RequestGateway>,
    pacing: FixedPacing,
}

impl Chainso {
    pub fn new(config: ProviderConfig, gateway: Arc<dyn RequestGateway>) -> Self {
        Self {
            config,
            gateway,
            pacing: FixedPacing::new(REQUEST_INTERVAL),
        }
    }

    async fn compose_request(
        &self,
        command: &str,
        data: Option<&str>,
        parameter: Option<&str>,
        mut variables: QueryParams,
        method: Method,
    ) -> Result<serde_json::Value, CoreError> {
        let mut path = format!("{command}/{}", self.config.coin_id);
        for segment in [data, parameter].into_iter().flatten() {
            if !segment.is_empty() {
                path.push('/');
                path.push_str(segment);
            }
        }
        if let Some(key) = &self.config.api_key {
            variables.insert("api_key".into(), key.clone());
        }
        debug!(
            provider = PROVIDER_NAME,
            network = %self.config.network,
            path = %path,
            %method,
            pause = ?self.pacing.interval(),
            "compose request"
        );
        self.pacing.pause().await;
        self.gateway.request(&path, &variables, method).await
    }

    async fn fetch(
        &self,
        command: &str,
        data: Option<&str>,
        parameter: Option<&str>,
    ) -> Result<serde_json::Value, CoreError> {
        self.compose_request(command, data, parameter, QueryParams::new(), Method::Get)
            .await
    }

    /// Fetch and normalize one transaction. `tip` caches the chain height
    /// across calls so a batch resolves it at most once.
    async fn resolve_transaction(
        &self,
        tx_id: &str,
        tip: &mut Option<u64>,
    ) -> Result<Transaction, CoreError> {
        let res = self.fetch("get_tx", Some(tx_id), None).await?;
        let data = success_data(&res, "get_tx")?;
        let block_height = opt_integer::<u64>(data, "block_no")?.map(BlockHeight);
        let confirmations = match (block_height, *tip) {
            (None, _) => 0,
            (Some(height), Some(known)) => confirmations_at(known, Some(height)),
            (Some(height), None) => {
                let current = self.block_count().await?;
                *tip = Some(current);
                confirmations_at(current, Some(height))
            }
        };
        normalize_transaction(tx_id, data, block_height, confirmations, &self.config)
    }

    /// Transaction references from one address listing endpoint.
    async fn address_listing(
        &self,
        command: &str,
        address: &str,
        after_txid: Option<&str>,
    ) -> Result<Vec<(u64, String)>, CoreError> {
        let res = self.fetch(command, Some(address), after_txid).await?;
        let data = success_data(&res, command)?;
        array(data, &["txs"])?
            .iter()
            .map(|raw| Ok((integer(raw, "confirmations")?, string(raw, "txid")?)))
            .collect()
    }
}

#[async_trait]
impl ExplorerProvider for Chainso {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn get_balance(&self, addresses: &[String]) -> Result<u64, CoreError> {
        let mut balance = 0i64;
        for address in addresses {
            let res = self
                .fetch("get_address_balance", Some(address.as_str()), None)
                .await?;
            let data = success_data(&res, "get_address_balance")?;
            let denominator = self.config.denominator;
            let confirmed = denominator.to_signed_units(field(data, &["confirmed_balance"])?)?;
            let unconfirmed =
                denominator.to_signed_units(field(data, &["unconfirmed_balance"])?)?;
            balance = balance
                .checked_add(confirmed)
                .and_then(|b| b.checked_add(unconfirmed))
                .ok_or_else(|| CoreError::InvalidResponse("balance overflow".into()))?;
        }
        u64::try_from(balance)
            .map_err(|_| CoreError::InvalidResponse(format!("negative total balance {balance}")))
    }

    async fn get_utxos(
        &self,
        addresses: &[String],
        query: &ListQuery,
    ) -> Result<Listing<Utxo>, CoreError> {
        let max_count = query.max_count.unwrap_or(DEFAULT_MAX_RECORDS);
        let mut listing = Listing::complete(Vec::new());
        for address in addresses {
            let res = self
                .fetch(
                    "get_tx_unspent",
                    Some(address.as_str()),
                    query.after_txid.as_deref(),
                )
                .await?;
            let data = success_data(&res, "get_tx_unspent")?;
            let raw_utxos = array(data, &["txs"])?;

            let mut utxos = Vec::with_capacity(raw_utxos.len());
            for raw in raw_utxos {
                if raw.get("is_spent").and_then(serde_json::Value::as_bool) == Some(true) {
                    continue;
                }
                utxos.push(parse_utxo(raw, address, &self.config)?);
            }

            let mut capped = limit_listing(
                utxos,
                Some(max_count),
                self.config.result_cap,
                "chainso utxo result cap reached",
            );
            flag_provider_cap(
                &mut capped,
                raw_utxos.len(),
                self.config.result_cap,
                "chainso utxo list hit the provider cap",
            );
            listing.extend(capped);
        }
        Ok(listing)
    }

    async fn get_transaction(&self, tx_id: &str) -> Result<Transaction, CoreError> {
        self.resolve_transaction(tx_id, &mut None).await
    }

    async fn get_raw_transaction(&self, tx_id: &str) -> Result<String, CoreError> {
        let res = self.fetch("get_tx", Some(tx_id), None).await?;
        string(success_data(&res, "get_tx")?, "tx_hex")
    }

    async fn get_transactions(
        &self,
        address: &str,
        query: &ListQuery,
    ) -> Result<Listing<Transaction>, CoreError> {
        let after = query.after_txid.as_deref();
        let received = self
            .address_listing("get_tx_received", address, after)
            .await?;
        let spent = self.address_listing("get_tx_spent", address, after).await?;
        let provider_capped = received.len().max(spent.len());

        let mut seen = HashSet::new();
        let merged: Vec<(u64, String)> = received
            .into_iter()
            .chain(spent)
            .filter(|key| seen.insert(key.clone()))
            .collect();

        let mut refs = limit_listing(
            merged,
            Some(query.max_count.unwrap_or(DEFAULT_MAX_RECORDS)),
            self.config.result_cap,
            "chainso transaction result cap reached",
        );
        flag_provider_cap(
            &mut refs,
            provider_capped,
            self.config.result_cap,
            "chainso transaction list hit the provider cap",
        );

        let mut tip = None;
        let mut txs = Vec::with_capacity(refs.len());
        for (_, tx_id) in &refs.items {
            txs.push(self.resolve_transaction(tx_id, &mut tip).await?);
        }
        Ok(Listing {
            items: txs,
            truncation: refs.truncation,
        })
    }

    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<Broadcast, CoreError> {
        let mut variables = QueryParams::new();
        variables.insert("tx_hex".into(), raw_hex.to_owned());
        let res = self
            .compose_request("send_tx", None, None, variables, Method::Post)
            .await?;
        let txid = res
            .get("data")
            .and_then(|data| opt_string(data, "txid"));
        if txid.is_none() {
            warn!(provider = PROVIDER_NAME, response = %res, "broadcast returned no txid");
        }
        Ok(Broadcast { txid, response: res })
    }

    async fn block_count(&self) -> Result<u64, CoreError> {
        let res = self.fetch("get_info", None, None).await?;
        integer(success_data(&res, "get_info")?, "blocks")
    }

    async fn mempool_status(&self, tx_id: &str) -> Result<Vec<String>, CoreError> {
        let res = self.fetch("is_tx_confirmed", Some(tx_id), None).await?;
        let unconfirmed = is_success(&res)
            && res
                .get("data")
                .and_then(|data| data.get("confirmations"))
                .and_then(serde_json::Value::as_u64)
                == Some(0);
        Ok(if unconfirmed {
            vec![tx_id.to_owned()]
        } else {
            Vec::new()
        })
    }
}

// ==============================================================================
// Normalization
// ==============================================================================

fn is_success(res: &serde_json::Value) -> bool {
    res.get("status").and_then(serde_json::Value::as_str) == Some("success")
}

/// The `data` member of a response whose `status` is `success`.
fn success_data<'a>(
    res: &'a serde_json::Value,
    command: &str,
) -> Result<&'a serde_json::Value, CoreError> {
    if !is_success(res) {
        let status = res
            .get("status")
            .map_or_else(|| "missing".to_owned(), |s| s.as_str().unwrap_or("invalid").to_owned());
        return Err(CoreError::ProviderStatus {
            provider: PROVIDER_NAME,
            command: command.to_owned(),
            status,
        });
    }
    field(res, &["data"])
}

fn parse_utxo(
    raw: &serde_json::Value,
    address: &str,
    config: &ProviderConfig,
) -> Result<Utxo, CoreError> {
    Ok(Utxo {
        address: address.to_owned(),
        tx_hash: string(raw, "txid")?,
        confirmations: integer(raw, "confirmations")?,
        output_n: integer(raw, "output_no")?,
        input_n: opt_integer(raw, "input_no")?,
        block_height: None,
        fee: None,
        size: 0,
        value: config.denominator.to_units(field(raw, &["value"])?)?,
        script: opt_string(raw, "script_hex").unwrap_or_default(),
        timestamp: unix_datetime(raw, "time"),
    })
}

/// Build a canonical transaction from the serialized hex plus the provider's
/// input/output listing, which carries values and addresses the raw bytes
/// lack.
fn normalize_transaction(
    tx_id: &str,
    data: &serde_json::Value,
    block_height: Option<BlockHeight>,
    confirmations: u64,
    config: &ProviderConfig,
) -> Result<Transaction, CoreError> {
    let raw_hex = string(data, "tx_hex")?;
    let decoded: bitcoin::Transaction = bitcoin::consensus::encode::deserialize_hex(&raw_hex)
        .map_err(|e| CoreError::InvalidResponse(format!("undecodable tx_hex for {tx_id}: {e}")))?;

    let listed_inputs = array(data, &["inputs"])?;
    let listed_outputs = array(data, &["outputs"])?;

    let inputs = decoded
        .input
        .iter()
        .enumerate()
        .map(|(n, txin)| {
            let listed = listed_inputs.get(n);
            let value = match listed.and_then(|l| l.get("value")) {
                None | Some(serde_json::Value::Null) => None,
                Some(v) => Some(config.denominator.to_units(v)?),
            };
            Ok(TxInput {
                prev_hash: txin.previous_output.txid.to_string(),
                output_n: txin.previous_output.vout,
                index_n: position_index(n, "inputs")?,
                unlocking_script: txin.script_sig.to_hex_string(),
                value,
                address: listed.and_then(|l| opt_string(l, "address")),
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    let outputs = decoded
        .output
        .iter()
        .enumerate()
        .map(|(n, txout)| {
            Ok(TxOutput {
                value: txout.value.to_sat(),
                address: listed_outputs
                    .get(n)
                    .and_then(|l| opt_string(l, "address")),
                lock_script: txout.script_pubkey.to_hex_string(),
                spent: None,
                output_n: position_index(n, "outputs")?,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    let witness_type = if decoded.input.iter().any(|txin| !txin.witness.is_empty()) {
        WitnessType::Segwit
    } else {
        WitnessType::Legacy
    };

    let mut transaction = Transaction {
        hash: tx_id.to_owned(),
        version: decoded.version.0,
        locktime: decoded.lock_time.to_consensus_u32(),
        inputs,
        outputs,
        fee: None,
        size: opt_integer(data, "size")?.unwrap_or((raw_hex.len() / 2) as u64),
        confirmations,
        block_height,
        status: TxStatus::from_confirmations(confirmations),
        witness_type,
        timestamp: unix_datetime(data, "time"),
        input_total: 0,
        output_total: 0,
        coinbase: decoded.is_coinbase(),
    };
    transaction.recompute_totals();
    Ok(transaction)
}
