mod cli;
mod config;

use std::sync::Arc;

use clap::Parser;
use eyre::{eyre, WrapErr};
use serde::Serialize;

use chainlens_core::providers::{build_provider, ListQuery};
use chainlens_core::{CoreError, HttpGateway, Listing};

use cli::{Command, PageArgs};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let config = config::provider_config(&args)?;
    let gateway = HttpGateway::new(&config.base_url, args.requests_per_second)
        .context("configure provider gateway")?;

    tracing::info!(
        provider = %args.provider,
        network = %config.network,
        base_url = %config.base_url,
        "querying explorer"
    );
    let base_url = config.base_url.clone();
    let provider = build_provider(args.provider, config, Arc::new(gateway));

    let output = match args.command {
        Command::Balance { addresses } => to_json(&provider.get_balance(&addresses).await),
        Command::Utxos { addresses, page } => {
            let listing = provider.get_utxos(&addresses, &list_query(page)).await;
            report_listing(&listing)
        }
        Command::Tx { txid } => to_json(&provider.get_transaction(&txid).await),
        Command::RawTx { txid } => to_json(&provider.get_raw_transaction(&txid).await),
        Command::Txs { address, page } => {
            let listing = provider.get_transactions(&address, &list_query(page)).await;
            report_listing(&listing)
        }
        Command::Send { raw_hex } => to_json(&provider.send_raw_transaction(&raw_hex).await),
        Command::Fee { blocks } => to_json(&provider.estimate_fee(blocks).await),
        Command::Height => to_json(&provider.block_count().await),
        Command::Mempool { txid } => to_json(&provider.mempool_status(&txid).await),
    };

    let output = output.map_err(|err| match err {
        OutputError::Core(err) => {
            eyre!(format_provider_error(&base_url, &err)).wrap_err("explorer request failed")
        }
        OutputError::Encode(err) => eyre!(err).wrap_err("encode output"),
    })?;
    println!("{output}");

    Ok(())
}

enum OutputError {
    Core(String),
    Encode(serde_json::Error),
}

fn list_query(page: PageArgs) -> ListQuery {
    ListQuery {
        after_txid: page.after,
        max_count: page.max,
    }
}

fn to_json<T: Serialize>(result: &Result<T, CoreError>) -> Result<String, OutputError> {
    match result {
        Ok(value) => serde_json::to_string_pretty(value).map_err(OutputError::Encode),
        Err(err) => Err(OutputError::Core(err.to_string())),
    }
}

/// Print a listing and surface its truncation warning on stderr.
fn report_listing<T: Serialize>(
    result: &Result<Listing<T>, CoreError>,
) -> Result<String, OutputError> {
    if let Ok(Listing {
        truncation: Some(truncation),
        items,
    }) = result
    {
        eprintln!(
            "warning: result truncated at {} records ({}); {} returned",
            truncation.cap,
            truncation.reason,
            items.len()
        );
    }
    to_json(result)
}

fn format_provider_error(base_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("request to explorer `{base_url}` failed"),
        format!("error: {source_error}"),
    ];

    if source_error.contains("dns error") || source_error.contains("Could not resolve host") {
        lines.push(
            "hint: hostname resolution failed; verify --base-url and your DNS/network".into(),
        );
    } else if source_error.contains("HTTP 401") || source_error.contains("HTTP 403") {
        lines.push("hint: the provider refused the request; verify --api-key".into());
    } else if source_error.contains("HTTP 402") || source_error.contains("HTTP 429") {
        lines.push(
            "hint: the provider rate limit was hit; lower --requests-per-second or use an API key"
                .into(),
        );
    } else if source_error.contains("HTTP 404") {
        lines.push("hint: unknown endpoint or record; verify --base-url and the identifier".into());
    } else if source_error.contains("does not support") {
        lines.push("hint: try another --provider for this operation".into());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_carry_hints() {
        let message = format_provider_error("https://chain.so/api/v2/", "HTTP 429: slow down");
        assert!(message.contains("chain.so"));
        assert!(message.contains("--requests-per-second"));
    }

    #[test]
    fn unknown_errors_have_no_hint() {
        let message = format_provider_error("https://x/", "boom");
        assert_eq!(message.lines().count(), 2);
    }
}
