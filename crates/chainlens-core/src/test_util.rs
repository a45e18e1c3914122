//! Shared test helpers for `chainlens-core` unit tests.
//!
//! Builders for provider JSON payloads (Blockchair and Chain.so shapes) and a
//! real serialized transaction, so adapter tests share one source of truth
//! for dummy data.

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, TxIn, TxOut, Txid, Witness};
use serde_json::{json, Value};

use crate::providers::{ProviderConfig, DEFAULT_RESULT_CAP};
use crate::units::Denominator;

// ==============================================================================
// Identifiers and Config
// ==============================================================================

/// A deterministic 64-character hash from a single distinguishing byte.
pub fn hash_hex(b: u8) -> String {
    format!("{b:02x}").repeat(32)
}

pub fn provider_config(base_url: &str) -> ProviderConfig {
    ProviderConfig {
        network: "bitcoin".into(),
        base_url: base_url.into(),
        denominator: Denominator(8),
        coin_id: "BTC".into(),
        api_key: None,
        result_cap: DEFAULT_RESULT_CAP,
    }
}

// ==============================================================================
// Blockchair Payloads
// ==============================================================================

/// A single-member object; Blockchair keys dashboard payloads by the
/// queried address or hash.
fn keyed(key: &str, value: Value) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(key.to_owned(), value);
    Value::Object(map)
}

pub fn blockchair_balance(address: &str, sats: u64) -> Value {
    json!({
        "data": keyed(address, json!({ "address": { "balance": sats } })),
        "context": { "code": 200 }
    })
}

/// A page of `count` unspent outputs indexed from `start`, mined ten blocks
/// below `tip`.
pub fn blockchair_outputs_page(start: u32, count: u32, tip: u64) -> Value {
    let data: Vec<Value> = (start..start + count)
        .map(|index| {
            json!({
                "block_id": tip - 10,
                "transaction_hash": hash_hex(0xaa),
                "index": index,
                "value": 1_000 * u64::from(index + 1),
                "recipient": "addr1",
                "script_hex": "0014000102030405060708090a0b0c0d0e0f10111213",
                "is_spent": false,
                "time": "2019-01-01 00:00:10"
            })
        })
        .collect();
    json!({ "data": data, "context": { "code": 200, "state": tip } })
}

pub fn blockchair_transaction(txid: &str, block_id: i64, tip: u64) -> Value {
    json!({
        "data": keyed(txid, json!({
            "transaction": {
                "block_id": block_id,
                "hash": txid,
                "time": "2019-01-01 00:00:10",
                "size": 225,
                "version": 2,
                "lock_time": 0,
                "is_coinbase": false,
                "has_witness": true,
                "input_total": 50_000,
                "output_total": 49_000,
                "fee": 1_000
            },
            "inputs": [
                {
                    "transaction_hash": hash_hex(1),
                    "index": 0,
                    "value": 30_000,
                    "recipient": "in-addr-0",
                    "script_hex": "76a914",
                    "spending_signature_hex": "4830"
                },
                {
                    "transaction_hash": hash_hex(2),
                    "index": 3,
                    "value": 20_000,
                    "recipient": "in-addr-1",
                    "script_hex": "76a914"
                }
            ],
            "outputs": [
                {
                    "index": 0,
                    "value": 40_000,
                    "recipient": "out-addr-0",
                    "script_hex": "0014aa",
                    "is_spent": false
                },
                {
                    "index": 1,
                    "value": 9_000,
                    "recipient": "out-addr-1",
                    "script_hex": "0014bb",
                    "is_spent": true
                }
            ]
        })),
        "context": { "code": 200, "state": tip }
    })
}

pub fn blockchair_stats() -> Value {
    json!({
        "data": {
            "best_block_height": 812_345,
            "mempool_transactions": 1000,
            "mempool_size": 500_000,
            "median_trasaction_fee_24h": 50,
            "average_trasaction_fee_24h": 40,
            "mempool_total_fee_usd": 20.0,
            "market_price_usd": 2.0
        },
        "context": { "code": 200 }
    })
}

// ==============================================================================
// Chain.so Payloads
// ==============================================================================

pub fn chainso_ok(data: Value) -> Value {
    json!({ "status": "success", "data": data })
}

/// Unspent entries with the given display-unit values, one per output index.
pub fn chainso_unspent(values: &[&str]) -> Value {
    values
        .iter()
        .enumerate()
        .map(|(n, value)| {
            json!({
                "txid": hash_hex(0xbb),
                "output_no": n,
                "script_hex": "76a914",
                "value": value,
                "confirmations": 12,
                "time": 1_546_300_810
            })
        })
        .collect()
}

pub fn chainso_tx(
    txid: &str,
    raw_hex: &str,
    block_no: Option<u64>,
    input_values: &[&str],
) -> Value {
    let inputs: Vec<Value> = input_values
        .iter()
        .enumerate()
        .map(|(n, value)| {
            json!({ "input_no": n, "address": format!("in-addr-{n}"), "value": value })
        })
        .collect();
    chainso_ok(json!({
        "txid": txid,
        "blockhash": null,
        "block_no": block_no,
        "confirmations": 0,
        "time": 1_546_300_810,
        "size": raw_hex.len() / 2,
        "tx_hex": raw_hex,
        "inputs": inputs,
        "outputs": [
            { "output_no": 0, "address": "out-addr-0", "value": "0.00040000" },
            { "output_no": 1, "address": "out-addr-1", "value": "0.00009000" }
        ]
    }))
}

// ==============================================================================
// Serialized Transactions
// ==============================================================================

/// A two-in, two-out version 2 transaction spending `hash_hex(1):0` and
/// `hash_hex(2):3` into outputs of 40_000 and 9_000 sat. Returns the hex
/// serialization and the txid. The segwit variant carries witness data and a
/// different locktime, so the two variants have distinct txids.
pub fn sample_raw_tx(segwit: bool) -> (String, String) {
    let witness = if segwit {
        Witness::from_slice(&[vec![0x30, 0x44], vec![0x02, 0x21]])
    } else {
        Witness::new()
    };
    let prev = |b: u8, vout: u32| {
        let txid: Txid = hash_hex(b).parse().expect("static txid must parse");
        OutPoint::new(txid, vout)
    };
    let tx = bitcoin::Transaction {
        version: Version::TWO,
        lock_time: if segwit {
            LockTime::from_consensus(500_000)
        } else {
            LockTime::ZERO
        },
        input: vec![
            TxIn {
                previous_output: prev(1, 0),
                script_sig: ScriptBuf::from_bytes(vec![0x51]),
                sequence: Sequence::MAX,
                witness: witness.clone(),
            },
            TxIn {
                previous_output: prev(2, 3),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness,
            },
        ],
        output: vec![
            TxOut {
                value: Amount::from_sat(40_000),
                script_pubkey: ScriptBuf::from_bytes(vec![0x00, 0x14, 0xaa]),
            },
            TxOut {
                value: Amount::from_sat(9_000),
                script_pubkey: ScriptBuf::from_bytes(vec![0x00, 0x14, 0xbb]),
            },
        ],
    };
    (
        bitcoin::consensus::encode::serialize_hex(&tx),
        tx.compute_txid().to_string(),
    )
}
