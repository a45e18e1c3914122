use clap::ValueEnum;
use eyre::eyre;

use chainlens_core::providers::{ProviderConfig, ProviderKind};
use chainlens_core::units::Denominator;

use crate::cli::Cli;

const BLOCKCHAIR_URL: &str = "https://api.blockchair.com/";
const CHAINSO_URL: &str = "https://chain.so/api/v2/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    Bitcoin,
    Testnet,
    Litecoin,
    Dogecoin,
}

impl Network {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Testnet => "testnet",
            Self::Litecoin => "litecoin",
            Self::Dogecoin => "dogecoin",
        }
    }

    /// Path segment Blockchair uses for this chain.
    fn blockchair_chain(self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Testnet => "bitcoin/testnet",
            Self::Litecoin => "litecoin",
            Self::Dogecoin => "dogecoin",
        }
    }

    /// Chain.so network code.
    fn chainso_coin(self) -> &'static str {
        match self {
            Self::Bitcoin => "BTC",
            Self::Testnet => "BTCTEST",
            Self::Litecoin => "LTC",
            Self::Dogecoin => "DOGE",
        }
    }
}

/// Public endpoint for `kind` on `network`.
pub fn default_base_url(kind: ProviderKind, network: Network) -> String {
    match kind {
        ProviderKind::Blockchair => format!("{BLOCKCHAIR_URL}{}/", network.blockchair_chain()),
        ProviderKind::Chainso => CHAINSO_URL.to_owned(),
    }
}

/// Resolve the adapter configuration from command-line arguments, filling
/// provider presets where the operator gave no override.
pub fn provider_config(args: &Cli) -> eyre::Result<ProviderConfig> {
    if args.result_cap == 0 {
        return Err(eyre!("--result-cap must be at least 1"));
    }
    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| default_base_url(args.provider, args.network));
    let coin_id = args
        .coin_id
        .clone()
        .unwrap_or_else(|| args.network.chainso_coin().to_owned());

    Ok(ProviderConfig {
        network: args.network.as_str().to_owned(),
        base_url,
        denominator: Denominator(args.denominator),
        coin_id,
        api_key: args.api_key.clone(),
        result_cap: args.result_cap,
    })
}
