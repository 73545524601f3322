use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version)]
#[command(about = "Solana asset transfer utility")]
#[command(
    long_about = "Transfers a Metaplex Core asset, or the full balance of an SPL token, from a holder \
    to a recipient while a separate fee payer covers transaction and account rent costs. \
    Settings are read from RPC_ENDPOINT, HOLDER_SECRET, FEEPAYER_SECRET, ASSET_ADDRESS \
    and RECIPIENT_ADDRESS."
)]
pub struct Args {
    /// Optional YAML file supplying settings that are not set in the environment
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Dotenv file loaded before reading the environment (ignored when absent)
    #[clap(long, default_value = ".env")]
    pub env_file: PathBuf,
}
