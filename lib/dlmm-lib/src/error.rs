use crate::{config::ConfigError, idl::IdlError, ledger::LedgerError, negotiate::AttemptRecord};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::result::Result as StdResult;
use thiserror::Error as ThisError;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("no runtime environment could be resolved: {0}")]
    RuntimeResolution(String),
    #[error("no viable bump seed for program {program_id}")]
    AddressDerivationExhausted { program_id: Pubkey },
    #[error("invalid seeds: {0}")]
    InvalidSeeds(String),
    #[error("failed to provision holding account {address}: {reason}")]
    AccountProvisioning { address: Pubkey, reason: String },
    #[error("{}", exhausted_message(.attempts, .last_error))]
    InvocationExhausted {
        attempts: Vec<AttemptRecord>,
        last_error: String,
    },
    #[error("outcome of transaction {signature} is unknown, confirmation timed out")]
    ConfirmationTimeout {
        signature: Signature,
        attempts: Vec<AttemptRecord>,
    },
    #[error("cancelled after {} attempt(s)", .attempts.len())]
    Cancelled { attempts: Vec<AttemptRecord> },
    #[error("account not found: {0}")]
    AccountNotFound(Pubkey),
    #[error("failed to decode {name} account: {reason}")]
    Decode { name: String, reason: String },
    #[error("failed to encode arguments: {0}")]
    Encode(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Idl(#[from] IdlError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Signer(#[from] solana_sdk::signer::SignerError),
}

impl Error {
    /// Attempt trail carried by negotiation errors, empty for everything else.
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            Error::InvocationExhausted { attempts, .. }
            | Error::ConfirmationTimeout { attempts, .. }
            | Error::Cancelled { attempts } => attempts,
            _ => &[],
        }
    }
}

fn exhausted_message(attempts: &[AttemptRecord], last_error: &str) -> String {
    use std::fmt::Write;
    let mut s = format!(
        "all {} invocation variant(s) failed, last error: {}",
        attempts.len(),
        last_error
    );
    for (i, attempt) in attempts.iter().enumerate() {
        write!(s, "\n{}: {}", i + 1, attempt).ok();
    }
    s
}
