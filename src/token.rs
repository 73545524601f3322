//! SPL token detection and full-balance transfer.

use crate::chain::{Chain, ChainError};
use crate::types::format_amount;
use solana_sdk::{
    account::Account,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};
use spl_token_2022::{
    extension::StateWithExtensions,
    instruction::transfer_checked,
    state::{Account as TokenAccount, Mint},
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("mint account {0} does not exist")]
    MintNotFound(Pubkey),

    #[error("account {address} is owned by {owner}, not a token program")]
    NotTokenProgram { address: Pubkey, owner: Pubkey },

    #[error("account {address} is not a token mint: {reason}")]
    InvalidMint { address: Pubkey, reason: String },

    #[error("token account {address} cannot receive mint {mint} for owner {owner}: {reason}")]
    AccountMismatch {
        address: Pubkey,
        mint: Pubkey,
        owner: Pubkey,
        reason: String,
    },

    #[error("failed to create associated token account {address}: {source}")]
    CreateAccount { address: Pubkey, source: ChainError },

    #[error("failed to read balance of token account {address}: {source}")]
    Balance { address: Pubkey, source: ChainError },

    #[error("failed to build transfer instruction: {0}")]
    Instruction(String),

    #[error("token transfer was not confirmed: {source}")]
    Transfer { source: ChainError },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// A mint together with the token program that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMint {
    pub address: Pubkey,
    pub program_id: Pubkey,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociatedAccount {
    pub address: Pubkey,
    /// Signature of the creation transaction, if the account had to be created.
    pub created: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub mint: Pubkey,
    pub source: Pubkey,
    pub destination: Pubkey,
    pub amount: u64,
    pub decimals: u8,
    pub signature: Signature,
    pub created_account: Option<Signature>,
}

pub fn is_token_program(program_id: &Pubkey) -> bool {
    *program_id == spl_token::id() || *program_id == spl_token_2022::id()
}

/// Loads `address` as a mint of either token program.
pub async fn fetch_mint<C: Chain + ?Sized>(
    chain: &C,
    address: &Pubkey,
) -> Result<TokenMint, TokenError> {
    let account = chain
        .account(address)
        .await?
        .ok_or(TokenError::MintNotFound(*address))?;

    if !is_token_program(&account.owner) {
        return Err(TokenError::NotTokenProgram {
            address: *address,
            owner: account.owner,
        });
    }

    let mint = StateWithExtensions::<Mint>::unpack(&account.data).map_err(|e| {
        TokenError::InvalidMint {
            address: *address,
            reason: e.to_string(),
        }
    })?;

    Ok(TokenMint {
        address: *address,
        program_id: account.owner,
        decimals: mint.base.decimals,
    })
}

pub fn associated_address(owner: &Pubkey, mint: &TokenMint) -> Pubkey {
    get_associated_token_address_with_program_id(owner, &mint.address, &mint.program_id)
}

fn check_token_account(
    address: &Pubkey,
    account: &Account,
    owner: &Pubkey,
    mint: &TokenMint,
) -> Result<(), TokenError> {
    let mismatch = |reason: String| TokenError::AccountMismatch {
        address: *address,
        mint: mint.address,
        owner: *owner,
        reason,
    };

    if account.owner != mint.program_id {
        return Err(mismatch(format!(
            "account is owned by {}, expected {}",
            account.owner, mint.program_id
        )));
    }

    let state = StateWithExtensions::<TokenAccount>::unpack(&account.data)
        .map_err(|e| mismatch(e.to_string()))?;
    if state.base.mint != mint.address {
        return Err(mismatch(format!("account holds mint {}", state.base.mint)));
    }
    if state.base.owner != *owner {
        return Err(mismatch(format!("account is owned by {}", state.base.owner)));
    }
    Ok(())
}

/// Returns the owner's associated token account, creating it with the fee
/// payer's funds when it does not exist yet.
pub async fn ensure_associated_account<C: Chain + ?Sized>(
    chain: &C,
    fee_payer: &Keypair,
    owner: &Pubkey,
    mint: &TokenMint,
) -> Result<AssociatedAccount, TokenError> {
    let address = associated_address(owner, mint);

    if let Some(account) = chain.account(&address).await? {
        check_token_account(&address, &account, owner, mint)?;
        return Ok(AssociatedAccount {
            address,
            created: None,
        });
    }

    info!(
        "Creating associated token account {} for {} (paid by {})",
        address,
        owner,
        fee_payer.pubkey()
    );
    let instruction = create_associated_token_account_idempotent(
        &fee_payer.pubkey(),
        owner,
        &mint.address,
        &mint.program_id,
    );
    let signature = chain
        .submit(&[instruction], fee_payer, &[])
        .await
        .map_err(|source| TokenError::CreateAccount { address, source })?;

    Ok(AssociatedAccount {
        address,
        created: Some(signature),
    })
}

/// Moves the holder's entire balance of `mint` to the recipient's associated account.
pub async fn transfer_full_balance<C: Chain + ?Sized>(
    chain: &C,
    mint: &TokenMint,
    holder: &Keypair,
    fee_payer: &Keypair,
    recipient: &Pubkey,
) -> Result<TokenTransfer, TokenError> {
    let holder_pubkey = holder.pubkey();
    let source = associated_address(&holder_pubkey, mint);
    let destination = ensure_associated_account(chain, fee_payer, recipient, mint).await?;

    let balance = chain
        .token_balance(&source)
        .await
        .map_err(|e| TokenError::Balance {
            address: source,
            source: e,
        })?;
    if balance.decimals != mint.decimals {
        warn!(
            "Token account {} reports {} decimals, mint {} has {}",
            source, balance.decimals, mint.address, mint.decimals
        );
    }
    if balance.amount == 0 {
        warn!("Holder token account {} is empty, sending a zero transfer", source);
    }

    info!(
        "Transferring {} of mint {} from {} to {}",
        format_amount(balance.amount, mint.decimals),
        mint.address,
        source,
        destination.address
    );

    let instruction = transfer_checked(
        &mint.program_id,
        &source,
        &mint.address,
        &destination.address,
        &holder_pubkey,
        &[],
        balance.amount,
        mint.decimals,
    )
    .map_err(|e| TokenError::Instruction(e.to_string()))?;

    let signature = chain
        .submit(&[instruction], fee_payer, &[holder])
        .await
        .map_err(|source| TokenError::Transfer { source })?;

    Ok(TokenTransfer {
        mint: mint.address,
        source,
        destination: destination.address,
        amount: balance.amount,
        decimals: mint.decimals,
        signature,
        created_account: destination.created,
    })
}
