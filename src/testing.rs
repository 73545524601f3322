//! In-memory chain used by the unit tests.

use crate::chain::{Chain, ChainError, TokenBalance};
use async_trait::async_trait;
use solana_sdk::{
    account::Account,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use spl_token::solana_program::{program_option::COption, program_pack::Pack};
use spl_token::state::{Account as TokenAccount, AccountState, Mint};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Account(Pubkey),
    TokenBalance(Pubkey),
    Submit(Vec<Pubkey>),
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub fee_payer: Pubkey,
    pub signers: Vec<Pubkey>,
    pub instructions: Vec<Instruction>,
}

#[derive(Default)]
pub struct FakeChain {
    accounts: HashMap<Pubkey, Account>,
    balances: HashMap<Pubkey, TokenBalance>,
    failing_programs: HashSet<Pubkey>,
    calls: Mutex<Vec<Call>>,
    submitted: Mutex<Vec<Submission>>,
}

impl FakeChain {
    pub fn with_account(mut self, address: Pubkey, owner: Pubkey, data: Vec<u8>) -> Self {
        self.accounts.insert(address, Account {
            lamports: 1_000_000,
            data,
            owner,
            executable: false,
            rent_epoch: 0,
        });
        self
    }

    pub fn with_balance(mut self, token_account: Pubkey, amount: u64, decimals: u8) -> Self {
        self.balances
            .insert(token_account, TokenBalance { amount, decimals });
        self
    }

    /// Rejects any transaction that invokes `program_id`.
    pub fn failing_program(mut self, program_id: Pubkey) -> Self {
        self.failing_programs.insert(program_id);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn submitted(&self) -> Vec<Submission> {
        self.submitted.lock().unwrap().clone()
    }

    /// All instructions sent, in order, across every submission.
    pub fn instructions(&self) -> Vec<Instruction> {
        self.submitted()
            .into_iter()
            .flat_map(|s| s.instructions)
            .collect()
    }
}

#[async_trait]
impl Chain for FakeChain {
    async fn account(&self, address: &Pubkey) -> Result<Option<Account>, ChainError> {
        self.calls.lock().unwrap().push(Call::Account(*address));
        Ok(self.accounts.get(address).cloned())
    }

    async fn token_balance(&self, token_account: &Pubkey) -> Result<TokenBalance, ChainError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::TokenBalance(*token_account));
        self.balances.get(token_account).copied().ok_or_else(|| {
            ChainError::Response(format!("could not find account {}", token_account))
        })
    }

    async fn submit(
        &self,
        instructions: &[Instruction],
        fee_payer: &Keypair,
        signers: &[&Keypair],
    ) -> Result<Signature, ChainError> {
        let programs: Vec<Pubkey> = instructions.iter().map(|ix| ix.program_id).collect();
        self.calls.lock().unwrap().push(Call::Submit(programs.clone()));

        if let Some(program) = programs.iter().find(|p| self.failing_programs.contains(p)) {
            return Err(ChainError::Response(format!(
                "transaction rejected by program {}",
                program
            )));
        }

        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(Submission {
            fee_payer: fee_payer.pubkey(),
            signers: signers.iter().map(|s| s.pubkey()).collect(),
            instructions: instructions.to_vec(),
        });
        Ok(Signature::from([submitted.len() as u8; 64]))
    }
}

fn push_string(data: &mut Vec<u8>, value: &str) {
    data.extend_from_slice(&(value.len() as u32).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
}

/// Borsh layout of a `BaseAssetV1` account with no plugins.
pub fn core_asset_data(owner: &Pubkey, collection: Option<&Pubkey>, name: &str) -> Vec<u8> {
    let mut data = vec![1u8]; // Key::AssetV1
    data.extend_from_slice(owner.as_ref());
    match collection {
        Some(collection) => {
            data.push(2); // UpdateAuthority::Collection
            data.extend_from_slice(collection.as_ref());
        }
        None => {
            data.push(1); // UpdateAuthority::Address
            data.extend_from_slice(Pubkey::new_unique().as_ref());
        }
    }
    push_string(&mut data, name);
    push_string(&mut data, "https://example.com/asset.json");
    data.push(0); // seq: None
    data
}

/// Borsh layout of a `BaseCollectionV1` account with no plugins.
pub fn core_collection_data(name: &str) -> Vec<u8> {
    let mut data = vec![5u8]; // Key::CollectionV1
    data.extend_from_slice(Pubkey::new_unique().as_ref());
    push_string(&mut data, name);
    push_string(&mut data, "https://example.com/collection.json");
    data.extend_from_slice(&1u32.to_le_bytes()); // num_minted
    data.extend_from_slice(&1u32.to_le_bytes()); // current_size
    data
}

pub fn mint_data(decimals: u8) -> Vec<u8> {
    let mint = Mint {
        mint_authority: COption::None,
        supply: 1_000_000,
        decimals,
        is_initialized: true,
        freeze_authority: COption::None,
    };
    let mut data = vec![0u8; Mint::LEN];
    mint.pack_into_slice(&mut data);
    data
}

pub fn token_account_data(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Vec<u8> {
    let account = TokenAccount {
        mint: *mint,
        owner: *owner,
        amount,
        delegate: COption::None,
        state: AccountState::Initialized,
        is_native: COption::None,
        delegated_amount: 0,
        close_authority: COption::None,
    };
    let mut data = vec![0u8; TokenAccount::LEN];
    account.pack_into_slice(&mut data);
    data
}
