//! Asset type detection and dispatch to the matching transfer strategy.

use crate::chain::Chain;
use crate::core_asset::{self, CoreAssetError};
use crate::token::{self, TokenError};
use crate::types::{AssetKind, TransferOutcome, TransferRequest};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Core asset transfer failed: {0}")]
    CoreAsset(#[source] CoreAssetError),

    #[error("Core asset attempt failed: {core}; token attempt failed: {token}")]
    Exhausted {
        core: CoreAssetError,
        token: TokenError,
    },
}

/// Classifies `address` as a Core asset first and as a token mint second.
pub async fn detect<C: Chain + ?Sized>(chain: &C, address: &Pubkey) -> AssetKind {
    let core_rejection = match core_asset::fetch(chain, address).await {
        Ok(asset) => return AssetKind::CoreAsset(asset),
        Err(e) => e,
    };
    warn!(
        "{} is not a Core asset ({}), treating it as a token mint",
        address, core_rejection
    );

    match token::fetch_mint(chain, address).await {
        Ok(mint) => AssetKind::TokenMint {
            mint,
            core_rejection,
        },
        Err(token_rejection) => AssetKind::Unknown {
            core_rejection,
            token_rejection,
        },
    }
}

/// Performs exactly one transfer for `request`.
pub async fn execute<C: Chain + ?Sized>(
    chain: &C,
    request: &TransferRequest<'_>,
) -> Result<TransferOutcome, TransferError> {
    match detect(chain, &request.asset).await {
        AssetKind::CoreAsset(asset) => {
            info!("Detected Core asset {}", asset.address);
            let signature = core_asset::transfer(
                chain,
                &asset,
                request.holder,
                request.fee_payer,
                &request.recipient,
            )
            .await
            .map_err(TransferError::CoreAsset)?;
            Ok(TransferOutcome::CoreAsset { asset, signature })
        }
        AssetKind::TokenMint {
            mint,
            core_rejection,
        } => {
            info!(
                "Detected token mint {} owned by {}",
                mint.address, mint.program_id
            );
            token::transfer_full_balance(
                chain,
                &mint,
                request.holder,
                request.fee_payer,
                &request.recipient,
            )
            .await
            .map(TransferOutcome::Token)
            .map_err(|token| TransferError::Exhausted {
                core: core_rejection,
                token,
            })
        }
        AssetKind::Unknown {
            core_rejection,
            token_rejection,
        } => Err(TransferError::Exhausted {
            core: core_rejection,
            token: token_rejection,
        }),
    }
}
