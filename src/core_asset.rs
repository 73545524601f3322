//! Metaplex Core asset detection and transfer.

use crate::chain::{Chain, ChainError};
use borsh::BorshDeserialize;
use mpl_core::{
    accounts::{BaseAssetV1, BaseCollectionV1},
    instructions::TransferV1Builder,
    types::{Key, UpdateAuthority},
};
use solana_sdk::{
    account::Account,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CoreAssetError {
    #[error("account {0} does not exist")]
    NotFound(Pubkey),

    #[error("account {address} is owned by {owner}, not the Core program")]
    ForeignOwner { address: Pubkey, owner: Pubkey },

    #[error("account {address} could not be decoded: {reason}")]
    Decode { address: Pubkey, reason: String },

    #[error("account {address} holds a {key:?} record, expected {expected:?}")]
    UnexpectedKey {
        address: Pubkey,
        key: Key,
        expected: Key,
    },

    #[error("collection of asset {asset} could not be resolved: {source}")]
    Collection {
        asset: Pubkey,
        source: Box<CoreAssetError>,
    },

    #[error("Core transfer of {asset} was not confirmed: {source}")]
    Transfer { asset: Pubkey, source: ChainError },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub address: Pubkey,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreAsset {
    pub address: Pubkey,
    pub owner: Pubkey,
    pub name: String,
    pub uri: String,
    pub collection: Option<Collection>,
}

async fn fetch_core_account<C: Chain + ?Sized>(
    chain: &C,
    address: &Pubkey,
) -> Result<Account, CoreAssetError> {
    let account = chain
        .account(address)
        .await?
        .ok_or(CoreAssetError::NotFound(*address))?;

    if account.owner != mpl_core::ID {
        return Err(CoreAssetError::ForeignOwner {
            address: *address,
            owner: account.owner,
        });
    }
    Ok(account)
}

/// Checks the leading account discriminator before the body is decoded.
fn check_key(address: &Pubkey, data: &[u8], expected: Key) -> Result<(), CoreAssetError> {
    let key = Key::deserialize(&mut &data[..]).map_err(|e| CoreAssetError::Decode {
        address: *address,
        reason: e.to_string(),
    })?;
    if key != expected {
        return Err(CoreAssetError::UnexpectedKey {
            address: *address,
            key,
            expected,
        });
    }
    Ok(())
}

async fn fetch_collection<C: Chain + ?Sized>(
    chain: &C,
    address: &Pubkey,
) -> Result<Collection, CoreAssetError> {
    let account = fetch_core_account(chain, address).await?;
    check_key(address, &account.data, Key::CollectionV1)?;
    let collection =
        BaseCollectionV1::from_bytes(&account.data).map_err(|e| CoreAssetError::Decode {
            address: *address,
            reason: e.to_string(),
        })?;

    Ok(Collection {
        address: *address,
        name: collection.name,
    })
}

/// Loads `address` as a Core asset, resolving its collection when it has one.
pub async fn fetch<C: Chain + ?Sized>(
    chain: &C,
    address: &Pubkey,
) -> Result<CoreAsset, CoreAssetError> {
    let account = fetch_core_account(chain, address).await?;
    check_key(address, &account.data, Key::AssetV1)?;
    let base = BaseAssetV1::from_bytes(&account.data).map_err(|e| CoreAssetError::Decode {
        address: *address,
        reason: e.to_string(),
    })?;

    let collection = match base.update_authority {
        UpdateAuthority::Collection(collection) => Some(
            fetch_collection(chain, &collection)
                .await
                .map_err(|e| CoreAssetError::Collection {
                    asset: *address,
                    source: Box::new(e),
                })?,
        ),
        UpdateAuthority::Address(_) | UpdateAuthority::None => None,
    };

    Ok(CoreAsset {
        address: *address,
        owner: base.owner,
        name: base.name,
        uri: base.uri,
        collection,
    })
}

/// Builds a `TransferV1` instruction. The collection account is only attached
/// when the asset belongs to one.
pub fn transfer_instruction(
    asset: &CoreAsset,
    authority: &Pubkey,
    payer: &Pubkey,
    new_owner: &Pubkey,
) -> Instruction {
    TransferV1Builder::new()
        .asset(asset.address)
        .collection(asset.collection.as_ref().map(|c| c.address))
        .payer(*payer)
        .authority(Some(*authority))
        .new_owner(*new_owner)
        .instruction()
}

pub async fn transfer<C: Chain + ?Sized>(
    chain: &C,
    asset: &CoreAsset,
    holder: &Keypair,
    fee_payer: &Keypair,
    recipient: &Pubkey,
) -> Result<Signature, CoreAssetError> {
    let holder_pubkey = holder.pubkey();
    if asset.owner != holder_pubkey {
        warn!(
            "Asset {} is owned by {}, not the holder {}; relying on holder transfer authority",
            asset.address, asset.owner, holder_pubkey
        );
    }

    match &asset.collection {
        Some(collection) => info!(
            "Transferring Core asset {} ({}) in collection {} ({}) to {}",
            asset.name, asset.address, collection.name, collection.address, recipient
        ),
        None => info!(
            "Transferring Core asset {} ({}) to {}",
            asset.name, asset.address, recipient
        ),
    }

    let instruction = transfer_instruction(asset, &holder_pubkey, &fee_payer.pubkey(), recipient);
    chain
        .submit(&[instruction], fee_payer, &[holder])
        .await
        .map_err(|source| CoreAssetError::Transfer {
            asset: asset.address,
            source,
        })
}
