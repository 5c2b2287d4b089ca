//! In-memory [`Ledger`] that executes transactions through a scripted handler.

use crate::{
    ledger::{Ledger, LedgerError, SignatureStatus},
    provision::{ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_PROGRAM_ID},
};
use async_trait::async_trait;
use solana_sdk::{
    account::Account,
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::Message,
    pubkey::Pubkey,
    signature::Signature,
    system_program,
    transaction::Transaction,
};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Rent-exempt minimum of a token account.
pub const TOKEN_ACCOUNT_LAMPORTS: u64 = 2_039_280;
pub const TOKEN_ACCOUNT_LEN: usize = 165;

/// What happens to a transaction, decided per instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Land,
    /// Lands, but the status stays unknown for this many status reads.
    LandAfter(u32),
    /// Refused at submission, nothing is written.
    Reject(String),
    /// Refused at submission because someone else wrote first. Writes made by
    /// the handler are kept: they stand for the other writer.
    LostRace(String),
    /// Accepted, then failed while executing.
    FailOnChain(String),
    /// Accepted and never seen again.
    Drop,
}

pub type Accounts = HashMap<Pubkey, Account>;

type Handler = dyn Fn(&mut Accounts, &Instruction) -> Effect + Send + Sync;

enum Status {
    Landed,
    Failed(String),
    Hidden(u32),
    Dropped,
}

#[derive(Default)]
struct State {
    accounts: Accounts,
    statuses: HashMap<Signature, Status>,
    sent: Vec<Transaction>,
    airdrops: Vec<(Pubkey, u64)>,
    airdrop_error: Option<String>,
    /// Blockhashes handed out before `latest_blockhash` starts failing.
    blockhash_budget: Option<usize>,
    route_holding_accounts: bool,
    counter: u64,
}

impl State {
    fn next_bytes(&mut self) -> [u8; 8] {
        self.counter += 1;
        self.counter.to_le_bytes()
    }
}

pub struct MockLedger {
    state: Mutex<State>,
    handler: Box<Handler>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    /// Every instruction lands without side effects.
    pub fn new() -> Self {
        Self::with_handler(|_, _| Effect::Land)
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&mut Accounts, &Instruction) -> Effect + Send + Sync + 'static,
    {
        Self {
            state: Mutex::new(State::default()),
            handler: Box::new(handler),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send associated token program instructions to the handler instead of
    /// creating the account directly.
    pub fn route_holding_accounts_to_handler(&self) {
        self.state().route_holding_accounts = true;
    }

    pub fn fail_airdrops(&self, reason: &str) {
        self.state().airdrop_error = Some(reason.to_owned());
    }

    /// Hand out `n` more blockhashes, then fail every request.
    pub fn fail_blockhashes_after(&self, n: usize) {
        self.state().blockhash_budget = Some(n);
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.state().accounts.insert(address, account);
    }

    pub fn account(&self, address: &Pubkey) -> Option<Account> {
        self.state().accounts.get(address).cloned()
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.state().sent.clone()
    }

    pub fn airdrops(&self) -> Vec<(Pubkey, u64)> {
        self.state().airdrops.clone()
    }
}

pub fn decompile(message: &Message) -> Vec<Instruction> {
    let header = &message.header;
    let len = message.account_keys.len();
    let signed = header.num_required_signatures as usize;
    let is_writable = |i: usize| {
        if i < signed {
            i < signed - header.num_readonly_signed_accounts as usize
        } else {
            i < len - header.num_readonly_unsigned_accounts as usize
        }
    };
    message
        .instructions
        .iter()
        .map(|ix| Instruction {
            program_id: message.account_keys[ix.program_id_index as usize],
            accounts: ix
                .accounts
                .iter()
                .map(|&i| {
                    let i = i as usize;
                    AccountMeta {
                        pubkey: message.account_keys[i],
                        is_signer: i < signed,
                        is_writable: is_writable(i),
                    }
                })
                .collect(),
            data: ix.data.clone(),
        })
        .collect()
}

pub fn token_account(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Account {
    let mut data = vec![0; TOKEN_ACCOUNT_LEN];
    data[..32].copy_from_slice(mint.as_ref());
    data[32..64].copy_from_slice(owner.as_ref());
    data[64..72].copy_from_slice(&amount.to_le_bytes());
    // initialized
    data[108] = 1;
    Account {
        lamports: TOKEN_ACCOUNT_LAMPORTS,
        data,
        owner: TOKEN_PROGRAM_ID,
        executable: false,
        rent_epoch: 0,
    }
}

fn create_holding_account(accounts: &mut Accounts, ix: &Instruction) -> Effect {
    let [_, address, wallet, mint, ..] = ix.accounts.as_slice() else {
        return Effect::Reject("not enough account keys".to_owned());
    };
    if accounts.contains_key(&address.pubkey) {
        return Effect::Reject(format!("account {} already in use", address.pubkey));
    }
    accounts.insert(
        address.pubkey,
        token_account(&mint.pubkey, &wallet.pubkey, 0),
    );
    Effect::Land
}

#[async_trait]
impl Ledger for MockLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, LedgerError> {
        Ok(self.account(address))
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        Ok(self.account(address).map(|a| a.lamports).unwrap_or(0))
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        let mut state = self.state();
        match &mut state.blockhash_budget {
            Some(0) => return Err(LedgerError::Unavailable("blockhash unavailable".to_owned())),
            Some(n) => *n -= 1,
            None => {}
        }
        let mut bytes = [0; 32];
        bytes[..8].copy_from_slice(&state.next_bytes());
        Ok(Hash::new_from_array(bytes))
    }

    async fn is_blockhash_valid(&self, _: &Hash) -> Result<bool, LedgerError> {
        Ok(true)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, LedgerError> {
        if tx.verify().is_err() {
            return Err(LedgerError::Rejected(
                "signature verification failed".to_owned(),
            ));
        }
        let signature = tx.signatures[0];

        let mut state = self.state();
        state.sent.push(tx.clone());

        let mut working = state.accounts.clone();
        let mut effect = Effect::Land;
        for ix in decompile(&tx.message) {
            effect = if ix.program_id == ASSOCIATED_TOKEN_PROGRAM_ID && !state.route_holding_accounts
            {
                create_holding_account(&mut working, &ix)
            } else {
                (self.handler)(&mut working, &ix)
            };
            if !matches!(effect, Effect::Land | Effect::LandAfter(_)) {
                break;
            }
        }

        match effect {
            Effect::Land => {
                state.accounts = working;
                state.statuses.insert(signature, Status::Landed);
                Ok(signature)
            }
            Effect::LandAfter(reads) => {
                state.accounts = working;
                state.statuses.insert(signature, Status::Hidden(reads));
                Ok(signature)
            }
            Effect::Reject(reason) => Err(LedgerError::Rejected(reason)),
            Effect::LostRace(reason) => {
                state.accounts = working;
                Err(LedgerError::Rejected(reason))
            }
            Effect::FailOnChain(reason) => {
                state.statuses.insert(signature, Status::Failed(reason));
                Ok(signature)
            }
            Effect::Drop => {
                state.statuses.insert(signature, Status::Dropped);
                Ok(signature)
            }
        }
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureStatus, LedgerError> {
        let mut state = self.state();
        Ok(match state.statuses.get_mut(signature) {
            Some(Status::Landed) => SignatureStatus::Landed,
            Some(Status::Failed(reason)) => SignatureStatus::Failed(reason.clone()),
            Some(status @ Status::Hidden(0)) => {
                *status = Status::Landed;
                SignatureStatus::Landed
            }
            Some(Status::Hidden(reads)) => {
                *reads -= 1;
                SignatureStatus::Unknown
            }
            Some(Status::Dropped) | None => SignatureStatus::Unknown,
        })
    }

    async fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, LedgerError> {
        let mut state = self.state();
        if let Some(reason) = &state.airdrop_error {
            return Err(LedgerError::Unavailable(reason.clone()));
        }
        let account = state.accounts.entry(*address).or_insert_with(|| Account {
            lamports: 0,
            data: Vec::new(),
            owner: system_program::ID,
            executable: false,
            rent_epoch: 0,
        });
        account.lamports += lamports;
        state.airdrops.push((*address, lamports));

        let mut bytes = [0; 64];
        bytes[..8].copy_from_slice(&state.next_bytes());
        let signature = Signature::from(bytes);
        state.statuses.insert(signature, Status::Landed);
        Ok(signature)
    }
}
