//! Associated token accounts ("holding accounts"), created on demand.

use crate::{
    derive::find_program_address,
    error::{Error, Result},
    runtime::RuntimeEnvironment,
    solana::Submission,
};
use solana_sdk::{pubkey, pubkey::Pubkey, signature::Signature};
use spl_associated_token_account_interface::instruction::create_associated_token_account;

pub const TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldingAccount {
    pub address: Pubkey,
    /// Set when this call created the account.
    pub created: Option<Signature>,
}

pub fn holding_account_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey> {
    Ok(find_program_address(
        &[owner.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )?
    .address)
}

/// Make sure `owner` has a holding account for `mint`, paid by the environment's payer.
///
/// An existing account is returned without sending anything. If creation fails
/// but the account exists afterwards, someone else created it first and the
/// call still succeeds.
pub async fn ensure_holding_account(
    env: &RuntimeEnvironment,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<HoldingAccount> {
    let address = holding_account_address(owner, mint)?;
    if exists(env, &address).await? {
        return Ok(HoldingAccount {
            address,
            created: None,
        });
    }

    let ix = create_associated_token_account(&env.payer_pubkey(), owner, mint, &TOKEN_PROGRAM_ID);
    let reason = match env.submit(vec![ix]).await {
        Ok(Submission::Confirmed(signature)) => {
            tracing::info!("created holding account {} for {}", address, owner);
            return Ok(HoldingAccount {
                address,
                created: Some(signature),
            });
        }
        Ok(Submission::Rejected { reason, .. }) => reason,
        Ok(Submission::Unconfirmed(signature)) => {
            if exists(env, &address).await.unwrap_or(false) {
                return Ok(HoldingAccount {
                    address,
                    created: None,
                });
            }
            return Err(Error::ConfirmationTimeout {
                signature,
                attempts: Vec::new(),
            });
        }
        Err(error) => error.to_string(),
    };

    match exists(env, &address).await {
        Ok(true) => {
            tracing::debug!("holding account {} appeared concurrently", address);
            Ok(HoldingAccount {
                address,
                created: None,
            })
        }
        _ => Err(Error::AccountProvisioning { address, reason }),
    }
}

async fn exists(env: &RuntimeEnvironment, address: &Pubkey) -> Result<bool> {
    Ok(env.ledger().get_account(address).await?.is_some())
}
