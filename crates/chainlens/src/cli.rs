use clap::{Parser, Subcommand};

use chainlens_core::providers::{ProviderKind, DEFAULT_RESULT_CAP};

use crate::config::Network;

/// Chainlens: query public block explorers through one canonical interface.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Explorer service to query (blockchair, chainso).
    #[arg(long, default_value = "blockchair", env = "CHAINLENS_PROVIDER")]
    pub provider: ProviderKind,

    /// Network to query.
    #[arg(long, value_enum, default_value = "bitcoin", env = "CHAINLENS_NETWORK")]
    pub network: Network,

    /// Provider API base URL. Defaults to the public endpoint for the
    /// selected provider and network.
    #[arg(long, env = "CHAINLENS_BASE_URL")]
    pub base_url: Option<String>,

    /// API key appended to every provider request.
    #[arg(long, env = "CHAINLENS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Decimal exponent between display units and smallest units.
    #[arg(long, default_value = "8", env = "CHAINLENS_DENOMINATOR")]
    pub denominator: u32,

    /// Provider-specific coin identifier. Defaults per network.
    #[arg(long, env = "CHAINLENS_COIN_ID")]
    pub coin_id: Option<String>,

    /// Hard cap on records one provider call can return.
    #[arg(long, default_value_t = DEFAULT_RESULT_CAP, env = "CHAINLENS_RESULT_CAP")]
    pub result_cap: usize,

    /// Transport-level request rate limit (requests per second).
    #[arg(long, env = "CHAINLENS_REQUESTS_PER_SECOND")]
    pub requests_per_second: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Total balance of one or more addresses, in smallest units.
    Balance {
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Unspent outputs of one or more addresses.
    Utxos {
        #[arg(required = true)]
        addresses: Vec<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// A single transaction in canonical form.
    Tx { txid: String },
    /// Hex-encoded serialized transaction.
    RawTx { txid: String },
    /// Transaction history of an address.
    Txs {
        address: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Broadcast a hex-encoded raw transaction. Never retried.
    Send { raw_hex: String },
    /// Fee per kilobyte for confirmation within the given number of blocks.
    Fee {
        #[arg(default_value = "3")]
        blocks: u32,
    },
    /// Current chain tip height.
    Height,
    /// Whether a transaction sits unconfirmed in the mempool.
    Mempool { txid: String },
}

#[derive(clap::Args)]
pub struct PageArgs {
    /// Only return records after this transaction id.
    #[arg(long)]
    pub after: Option<String>,

    /// Maximum number of records to return. Blockchair defaults to every
    /// record up to the result cap, Chain.so to 20.
    #[arg(long)]
    pub max: Option<usize>,
}
