use crate::core_asset::{CoreAsset, CoreAssetError};
use crate::token::{TokenError, TokenMint, TokenTransfer};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
};

/// One transfer of `asset` from `holder` to `recipient`, paid for by `fee_payer`.
pub struct TransferRequest<'a> {
    pub asset: Pubkey,
    pub recipient: Pubkey,
    pub holder: &'a Keypair,
    pub fee_payer: &'a Keypair,
}

/// What the asset address turned out to be.
#[derive(Debug)]
pub enum AssetKind {
    CoreAsset(CoreAsset),
    TokenMint {
        mint: TokenMint,
        core_rejection: CoreAssetError,
    },
    Unknown {
        core_rejection: CoreAssetError,
        token_rejection: TokenError,
    },
}

#[derive(Debug)]
pub enum TransferOutcome {
    CoreAsset {
        asset: CoreAsset,
        signature: Signature,
    },
    Token(TokenTransfer),
}

impl TransferOutcome {
    pub fn signature(&self) -> &Signature {
        match self {
            TransferOutcome::CoreAsset { signature, .. } => signature,
            TransferOutcome::Token(transfer) => &transfer.signature,
        }
    }
}

/// Renders a base-unit token amount using the mint's decimals, without trailing zeros.
pub fn format_amount(amount: u64, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}
