mod args;
mod chain;
mod config;
mod core_asset;
mod keys;
mod token;
mod transfer;
mod types;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use args::Args;
use chain::RpcChain;
use clap::Parser;
use config::{Config, FileConfig};
use solana_sdk::signer::Signer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use types::{TransferOutcome, format_amount};

fn print_outcome(outcome: &TransferOutcome) {
    println!("\n{:-^80}", " TRANSFER RESULT ");
    match outcome {
        TransferOutcome::CoreAsset { asset, .. } => {
            println!("Type:       Core asset");
            println!("Asset:      {} ({})", asset.address, asset.name);
            println!("Metadata:   {}", asset.uri);
            if let Some(collection) = &asset.collection {
                println!("Collection: {} ({})", collection.address, collection.name);
            }
        }
        TransferOutcome::Token(transfer) => {
            println!("Type:       SPL token");
            println!("Mint:       {}", transfer.mint);
            println!(
                "Amount:     {} ({} base units)",
                format_amount(transfer.amount, transfer.decimals),
                transfer.amount
            );
            println!("From:       {}", transfer.source);
            println!("To:         {}", transfer.destination);
            if let Some(created) = &transfer.created_account {
                println!("Created recipient token account in {}", created);
            }
        }
    }
    println!("Signature:  {}", outcome.signature());
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args = Args::parse();

    // Dotenv values never override the real environment
    if let Err(e) = dotenvy::from_path(&args.env_file) {
        if !e.not_found() {
            return Err(e)
                .with_context(|| format!("Failed to load env file: {:?}", args.env_file));
        }
    }

    let file_config = args
        .config
        .as_ref()
        .map(|path| FileConfig::load(path))
        .transpose()?;

    let config = Config::from_env(file_config.as_ref()).context("Invalid configuration")?;
    let resolved = config.resolve().context("Invalid configuration")?;

    info!(
        "Transferring {} from holder {} to {} (fee payer {})",
        resolved.asset,
        resolved.holder.pubkey(),
        resolved.recipient,
        resolved.fee_payer.pubkey()
    );

    // Create RPC client
    let chain = RpcChain::new(&resolved.rpc_endpoint);

    match transfer::execute(&chain, &resolved.request()).await {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(e) => Err(e).context("Transfer failed"),
    }
}
