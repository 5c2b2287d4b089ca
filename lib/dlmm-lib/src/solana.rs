use crate::{
    error::Result,
    ledger::{Ledger, SignatureStatus},
};
use solana_rpc_client_api::{
    client_error::{Error as ClientError, ErrorKind as ClientErrorKind},
    request::{RpcError, RpcResponseErrorData},
    response::RpcSimulateTransactionResult,
};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use std::time::{Duration, Instant};

pub fn verbose_solana_error(err: &ClientError) -> String {
    use std::fmt::Write;
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError {
        code,
        message,
        data,
    }) = err.kind()
    {
        let mut s = String::new();
        writeln!(s, "{} ({})", message, code).ok();
        if let RpcResponseErrorData::SendTransactionPreflightFailure(
            RpcSimulateTransactionResult {
                logs: Some(logs), ..
            },
        ) = data
        {
            for (i, log) in logs.iter().enumerate() {
                writeln!(s, "{}: {}", i + 1, log).ok();
            }
        }
        s
    } else {
        err.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// What is known about a transaction after submitting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Confirmed(Signature),
    /// Definitely did not and will not land.
    Rejected {
        signature: Signature,
        reason: String,
    },
    /// Confirmation bound elapsed while the outcome was still unknown.
    Unconfirmed(Signature),
}

impl Submission {
    pub fn signature(&self) -> Signature {
        match self {
            Submission::Confirmed(signature)
            | Submission::Rejected { signature, .. }
            | Submission::Unconfirmed(signature) => *signature,
        }
    }
}

#[derive(Debug)]
pub struct Instructions {
    pub fee_payer: Pubkey,
    pub instructions: Vec<Instruction>,
}

impl Instructions {
    pub fn new(fee_payer: Pubkey, instructions: Vec<Instruction>) -> Self {
        Self {
            fee_payer,
            instructions,
        }
    }

    /// Sign with `signer`, submit once and wait for the outcome.
    ///
    /// Errors are only returned for failures before submission.
    pub async fn execute(
        self,
        ledger: &dyn Ledger,
        signer: &Keypair,
        settings: &ConfirmSettings,
    ) -> Result<Submission> {
        let recent_blockhash = ledger.latest_blockhash().await?;

        let message = Message::new_with_blockhash(
            &self.instructions,
            Some(&self.fee_payer),
            &recent_blockhash,
        );
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(&[signer], recent_blockhash)?;
        let signature = tx.signatures[0];

        tracing::trace!("submitting transaction");
        match ledger.send_transaction(&tx).await {
            Ok(_) => tracing::info!("submitted {}", signature),
            Err(error) if error.is_rejection() => {
                tracing::debug!("{} rejected: {}", signature, error);
                return Ok(Submission::Rejected {
                    signature,
                    reason: error.to_string(),
                });
            }
            Err(error) => {
                tracing::warn!("submitting {} failed, outcome unknown: {}", signature, error);
            }
        }

        Ok(confirm_transaction(ledger, &signature, Some(&recent_blockhash), settings).await)
    }
}

/// Poll the signature status until it lands, fails, its blockhash expires, or
/// `settings.timeout` elapses.
///
/// Without a blockhash (airdrops) only the timeout ends an unknown status.
pub async fn confirm_transaction(
    ledger: &dyn Ledger,
    signature: &Signature,
    recent_blockhash: Option<&Hash>,
    settings: &ConfirmSettings,
) -> Submission {
    let now = Instant::now();
    loop {
        match ledger.signature_status(signature).await {
            Ok(SignatureStatus::Landed) => return Submission::Confirmed(*signature),
            Ok(SignatureStatus::Failed(reason)) => {
                return Submission::Rejected {
                    signature: *signature,
                    reason,
                }
            }
            Ok(SignatureStatus::Unknown) => {
                let expired = match recent_blockhash {
                    Some(blockhash) => !ledger.is_blockhash_valid(blockhash).await.unwrap_or(true),
                    None => false,
                };
                if expired {
                    return Submission::Rejected {
                        signature: *signature,
                        reason: "blockhash expired before the transaction landed".to_owned(),
                    };
                }
            }
            Err(error) => tracing::debug!("signature status for {}: {}", signature, error),
        }

        if now.elapsed() >= settings.timeout {
            return Submission::Unconfirmed(*signature);
        }
        tokio::time::sleep(settings.poll_interval).await;
    }
}
