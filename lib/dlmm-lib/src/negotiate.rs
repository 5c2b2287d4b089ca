//! Ordered trial of entry point names and account naming variants.
//!
//! Every variant is attempted at most once, one at a time, in declared order.
//! A variant whose outcome is unknown ends the negotiation: trying the next one
//! could execute the same operation twice. A variant that builds the same
//! instruction as one already sent for the method is not sent again.

use crate::{
    error::{Error, Result},
    idl::NamingConvention,
    ledger::SignatureStatus,
    runtime::RuntimeEnvironment,
    solana::Submission,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Role name to account key, all names in one convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMapping {
    convention: NamingConvention,
    entries: Vec<(String, Option<Pubkey>)>,
}

impl AccountMapping {
    pub fn new(convention: NamingConvention) -> Self {
        Self {
            convention,
            entries: Vec::new(),
        }
    }

    /// `role` is snake_case; it is stored in this mapping's convention.
    pub fn with(self, role: &str, key: Pubkey) -> Self {
        self.with_optional(role, Some(key))
    }

    /// `None` explicitly leaves an optional account out.
    pub fn with_optional(mut self, role: &str, key: Option<Pubkey>) -> Self {
        let name = self.convention.apply(role);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = key,
            None => self.entries.push((name, key)),
        }
        self
    }

    /// Same roles rendered in each of `conventions`, in that order.
    pub fn variants(
        roles: &[(&str, Option<Pubkey>)],
        conventions: impl IntoIterator<Item = NamingConvention>,
    ) -> Vec<Self> {
        conventions
            .into_iter()
            .map(|convention| {
                roles.iter().fold(Self::new(convention), |m, (role, key)| {
                    m.with_optional(role, *key)
                })
            })
            .collect()
    }

    pub fn convention(&self) -> NamingConvention {
        self.convention
    }

    /// `None` if the name is unknown, `Some(None)` if explicitly omitted.
    pub fn get(&self, name: &str) -> Option<Option<Pubkey>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, key)| *key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Entry point not in the interface; skipped without an attempt.
    Absent,
    /// Instruction could not be built from the mapping, or the transaction
    /// could not be prepared; nothing was sent.
    BuildFailed(String),
    /// Same instruction as an earlier attempt of this method; not sent again.
    Duplicate,
    Rejected {
        signature: Signature,
        reason: String,
    },
    Landed(Signature),
    Unknown(Signature),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub method: String,
    pub convention: Option<NamingConvention>,
    pub outcome: Outcome,
}

impl AttemptRecord {
    /// Whether this record is an actual attempt rather than a skipped variant.
    pub fn is_attempt(&self) -> bool {
        !matches!(self.outcome, Outcome::Absent | Outcome::Duplicate)
    }
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method)?;
        if let Some(convention) = self.convention {
            write!(f, " ({} accounts)", convention)?;
        }
        match &self.outcome {
            Outcome::Absent => write!(f, ": not in interface"),
            Outcome::BuildFailed(reason) => write!(f, ": {}", reason),
            Outcome::Duplicate => write!(f, ": same instruction as an earlier variant, skipped"),
            Outcome::Rejected { signature, reason } => {
                write!(f, ": {} rejected: {}", signature, reason)
            }
            Outcome::Landed(signature) => write!(f, ": landed {}", signature),
            Outcome::Unknown(signature) => write!(f, ": {} unknown", signature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub signature: Signature,
    pub method: String,
    pub convention: NamingConvention,
    pub attempts: Vec<AttemptRecord>,
}

pub struct Negotiator<'a> {
    env: &'a RuntimeEnvironment,
    cancel: CancellationToken,
}

impl<'a> Negotiator<'a> {
    pub fn new(env: &'a RuntimeEnvironment) -> Self {
        Self {
            env,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop before the next attempt once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Try `methods` (outer) times `mappings` (inner) until one lands.
    pub async fn invoke(
        &self,
        methods: &[String],
        args: &[u8],
        mappings: &[AccountMapping],
    ) -> Result<Invocation> {
        let program = self.env.program();
        let signers = [self.env.payer_pubkey()];
        let mut attempts = Vec::new();
        let mut last_error = None;
        let mut submitted = Vec::new();

        for method in methods {
            let Some(entry) = program.entry_point(method) else {
                tracing::debug!("{} is not in the interface, skipping", method);
                attempts.push(AttemptRecord {
                    method: method.clone(),
                    convention: None,
                    outcome: Outcome::Absent,
                });
                continue;
            };

            submitted.clear();
            for mapping in mappings {
                if self.cancel.is_cancelled() {
                    return Err(Error::Cancelled { attempts });
                }

                let convention = mapping.convention();
                let record = |outcome| AttemptRecord {
                    method: method.clone(),
                    convention: Some(convention),
                    outcome,
                };

                let ix = match entry.build(args, mapping, &signers) {
                    Ok(ix) => ix,
                    Err(error) => {
                        tracing::debug!("{} with {} accounts: {}", method, convention, error);
                        last_error = Some(error.to_string());
                        attempts.push(record(Outcome::BuildFailed(error.to_string())));
                        continue;
                    }
                };

                if submitted.contains(&ix) {
                    tracing::debug!("{} with {} accounts repeats an earlier variant", method, convention);
                    attempts.push(record(Outcome::Duplicate));
                    continue;
                }

                tracing::debug!("invoking {} with {} accounts", method, convention);
                let submission = match self.env.submit(vec![ix.clone()]).await {
                    Ok(submission) => {
                        submitted.push(ix);
                        submission
                    }
                    Err(error) => {
                        tracing::warn!("{} with {} accounts not submitted: {}", method, convention, error);
                        last_error = Some(error.to_string());
                        attempts.push(record(Outcome::BuildFailed(error.to_string())));
                        continue;
                    }
                };
                let submission = match submission {
                    Submission::Unconfirmed(signature) => self.recheck(signature).await,
                    other => other,
                };

                match submission {
                    Submission::Confirmed(signature) => {
                        attempts.push(record(Outcome::Landed(signature)));
                        tracing::info!("{} landed: {}", method, signature);
                        return Ok(Invocation {
                            signature,
                            method: method.clone(),
                            convention,
                            attempts,
                        });
                    }
                    Submission::Rejected { signature, reason } => {
                        tracing::debug!("{} with {} accounts rejected: {}", method, convention, reason);
                        last_error = Some(reason.clone());
                        attempts.push(record(Outcome::Rejected { signature, reason }));
                    }
                    Submission::Unconfirmed(signature) => {
                        tracing::warn!(
                            "{} with {} accounts: outcome of {} unknown, not trying further variants",
                            method,
                            convention,
                            signature
                        );
                        attempts.push(record(Outcome::Unknown(signature)));
                        return Err(Error::ConfirmationTimeout {
                            signature,
                            attempts,
                        });
                    }
                }
            }
        }

        Err(Error::InvocationExhausted {
            attempts,
            last_error: last_error.unwrap_or_else(|| "no matching entry point".to_owned()),
        })
    }

    /// One more status read before deciding an attempt's outcome is unknown.
    async fn recheck(&self, signature: Signature) -> Submission {
        match self.env.ledger().signature_status(&signature).await {
            Ok(SignatureStatus::Landed) => Submission::Confirmed(signature),
            Ok(SignatureStatus::Failed(reason)) => Submission::Rejected { signature, reason },
            Ok(SignatureStatus::Unknown) => Submission::Unconfirmed(signature),
            Err(error) => {
                tracing::debug!("status of {}: {}", signature, error);
                Submission::Unconfirmed(signature)
            }
        }
    }
}
