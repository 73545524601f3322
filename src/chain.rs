use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(Box<ClientError>),

    #[error("unexpected RPC response: {0}")]
    Response(String),
}

impl From<ClientError> for ChainError {
    fn from(err: ClientError) -> Self {
        ChainError::Rpc(Box::new(err))
    }
}

/// Raw balance of a token account in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    pub amount: u64,
    pub decimals: u8,
}

/// The on-chain operations the transfer strategies need.
#[async_trait]
pub trait Chain: Send + Sync {
    /// Fetches an account, `None` when it does not exist.
    async fn account(&self, address: &Pubkey) -> Result<Option<Account>, ChainError>;

    async fn token_balance(&self, token_account: &Pubkey) -> Result<TokenBalance, ChainError>;

    /// Signs with the fee payer plus `signers`, submits and waits for confirmation.
    async fn submit(
        &self,
        instructions: &[Instruction],
        fee_payer: &Keypair,
        signers: &[&Keypair],
    ) -> Result<Signature, ChainError>;
}

pub struct RpcChain {
    rpc_client: RpcClient,
}

impl RpcChain {
    pub fn new(rpc_url: &str) -> Self {
        let rpc_client =
            RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed());
        Self { rpc_client }
    }
}

#[async_trait]
impl Chain for RpcChain {
    async fn account(&self, address: &Pubkey) -> Result<Option<Account>, ChainError> {
        debug!("Fetching account {}", address);
        let response = self
            .rpc_client
            .get_account_with_commitment(address, self.rpc_client.commitment())
            .await?;
        Ok(response.value)
    }

    async fn token_balance(&self, token_account: &Pubkey) -> Result<TokenBalance, ChainError> {
        debug!("Fetching token balance of {}", token_account);
        let balance = self
            .rpc_client
            .get_token_account_balance(token_account)
            .await?;
        let amount = balance.amount.parse::<u64>().map_err(|e| {
            ChainError::Response(format!(
                "token amount {:?} for {} is not an integer: {}",
                balance.amount, token_account, e
            ))
        })?;
        Ok(TokenBalance {
            amount,
            decimals: balance.decimals,
        })
    }

    async fn submit(
        &self,
        instructions: &[Instruction],
        fee_payer: &Keypair,
        signers: &[&Keypair],
    ) -> Result<Signature, ChainError> {
        let recent_blockhash = self.rpc_client.get_latest_blockhash().await?;

        let mut all_signers: Vec<&Keypair> = vec![fee_payer];
        all_signers.extend(signers.iter().copied());

        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&fee_payer.pubkey()),
            &all_signers,
            recent_blockhash,
        );

        info!("Sending transaction...");
        let signature = self
            .rpc_client
            .send_and_confirm_transaction(&transaction)
            .await?;
        info!("Transaction confirmed with signature: {}", signature);
        Ok(signature)
    }
}
