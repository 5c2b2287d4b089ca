//! Discovering where to run: a ledger connection, a payer, and the program handle.

use crate::{
    config::{read_keypair, ClientConfig},
    error::{Error, Result},
    ledger::{Ledger, RpcLedger},
    program::RemoteProgram,
    solana::{confirm_transaction, ConfirmSettings, Instructions, Submission},
};
use async_trait::async_trait;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::{collections::HashMap, fmt, path::Path, sync::Arc};

pub mod env {
    pub const ANCHOR_PROVIDER_URL: &str = "ANCHOR_PROVIDER_URL";
    pub const ANCHOR_WALLET: &str = "ANCHOR_WALLET";
}

/// How the payer signer came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerProvisioning {
    /// The source supplied a signer.
    Provided,
    /// Ephemeral signer, airdrop confirmed.
    Funded { signature: Signature },
    /// Ephemeral signer, airdrop did not go through.
    Unfunded { reason: String },
}

pub struct RuntimeEnvironment {
    ledger: Arc<dyn Ledger>,
    program: Arc<RemoteProgram>,
    payer: Keypair,
    confirm: ConfirmSettings,
    provisioning: SignerProvisioning,
    source: String,
}

impl fmt::Debug for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeEnvironment")
            .field("program", &self.program.program_id())
            .field("payer", &self.payer.pubkey())
            .field("provisioning", &self.provisioning)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl RuntimeEnvironment {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        program: Arc<RemoteProgram>,
        payer: Keypair,
        config: ClientConfig,
    ) -> Self {
        let confirm = ConfirmSettings {
            timeout: config.confirm_timeout(),
            poll_interval: config.poll_interval(),
        };
        Self {
            ledger,
            program,
            payer,
            confirm,
            provisioning: SignerProvisioning::Provided,
            source: "injected".to_owned(),
        }
    }

    pub fn with_confirm_settings(mut self, confirm: ConfirmSettings) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn ledger(&self) -> &dyn Ledger {
        &*self.ledger
    }

    pub fn program(&self) -> &RemoteProgram {
        &self.program
    }

    pub fn confirm_settings(&self) -> &ConfirmSettings {
        &self.confirm
    }

    pub fn payer_pubkey(&self) -> Pubkey {
        self.payer.pubkey()
    }

    pub fn signer_provisioning(&self) -> &SignerProvisioning {
        &self.provisioning
    }

    /// Name of the source this environment was resolved from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Submit `instructions` in one transaction paid and signed by the payer.
    pub async fn submit(&self, instructions: Vec<Instruction>) -> Result<Submission> {
        Instructions::new(self.payer.pubkey(), instructions)
            .execute(&*self.ledger, &self.payer, &self.confirm)
            .await
    }

    pub async fn balance(&self) -> Result<u64> {
        Ok(self.ledger.get_balance(&self.payer.pubkey()).await?)
    }
}

/// What a [`RuntimeSource`] found.
pub struct Discovered {
    pub ledger: Arc<dyn Ledger>,
    pub program: Option<Arc<RemoteProgram>>,
    pub payer: Option<Keypair>,
}

#[async_trait]
pub trait RuntimeSource: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when this source is not present.
    async fn discover(&self) -> Result<Option<Discovered>>;
}

/// An environment handed in by the host, e.g. an interactive console.
pub struct Injected {
    ledger: Arc<dyn Ledger>,
    program: Option<Arc<RemoteProgram>>,
    payer: Option<Keypair>,
}

impl Injected {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            program: None,
            payer: None,
        }
    }

    pub fn with_program(mut self, program: Arc<RemoteProgram>) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_payer(mut self, payer: Keypair) -> Self {
        self.payer = Some(payer);
        self
    }
}

#[async_trait]
impl RuntimeSource for Injected {
    fn name(&self) -> &str {
        "injected"
    }

    async fn discover(&self) -> Result<Option<Discovered>> {
        Ok(Some(Discovered {
            ledger: self.ledger.clone(),
            program: self.program.clone(),
            payer: self.payer.as_ref().map(Keypair::insecure_clone),
        }))
    }
}

/// Provider configured through `ANCHOR_PROVIDER_URL` and `ANCHOR_WALLET`.
pub struct AnchorProviderEnv {
    vars: HashMap<String, String>,
    commitment: CommitmentConfig,
}

impl AnchorProviderEnv {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self {
            vars,
            commitment: CommitmentConfig::confirmed(),
        }
    }

    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }
}

#[async_trait]
impl RuntimeSource for AnchorProviderEnv {
    fn name(&self) -> &str {
        "anchor provider"
    }

    async fn discover(&self) -> Result<Option<Discovered>> {
        let Some(url) = self.vars.get(env::ANCHOR_PROVIDER_URL) else {
            return Ok(None);
        };
        let payer = self
            .vars
            .get(env::ANCHOR_WALLET)
            .map(|path| read_keypair(Path::new(path)))
            .transpose()?;
        let rpc = RpcClient::new_with_commitment(url.clone(), self.commitment);
        Ok(Some(Discovered {
            ledger: Arc::new(RpcLedger::new(rpc)),
            program: None,
            payer,
        }))
    }
}

/// RPC url and keypair from [`ClientConfig`].
pub struct ConfigSource {
    config: ClientConfig,
}

impl ConfigSource {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RuntimeSource for ConfigSource {
    fn name(&self) -> &str {
        "config"
    }

    async fn discover(&self) -> Result<Option<Discovered>> {
        let payer = self.config.read_keypair()?;
        Ok(Some(Discovered {
            ledger: Arc::new(RpcLedger::new(self.config.build_client())),
            program: None,
            payer,
        }))
    }
}

/// Tries sources in order; the first that discovers anything wins.
pub struct RuntimeResolver {
    sources: Vec<Box<dyn RuntimeSource>>,
    program: Option<Arc<RemoteProgram>>,
    config: ClientConfig,
}

impl RuntimeResolver {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            sources: Vec::new(),
            program: None,
            config,
        }
    }

    pub fn with_source<S: RuntimeSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Program handle for sources that do not bring their own.
    pub fn with_program(mut self, program: Arc<RemoteProgram>) -> Self {
        self.program = Some(program);
        self
    }

    pub async fn resolve(&self) -> Result<Arc<RuntimeEnvironment>> {
        let mut reasons = Vec::new();
        for source in &self.sources {
            match source.discover().await {
                Ok(Some(discovered)) => {
                    tracing::info!("runtime resolved from {}", source.name());
                    return self.assemble(source.name(), discovered).await.map(Arc::new);
                }
                Ok(None) => tracing::debug!("{}: not present", source.name()),
                Err(error) => {
                    tracing::warn!("{}: {}", source.name(), error);
                    reasons.push(format!("{}: {}", source.name(), error));
                }
            }
        }
        Err(Error::RuntimeResolution(if reasons.is_empty() {
            "no source discovered a connection".to_owned()
        } else {
            reasons.join("; ")
        }))
    }

    async fn assemble(&self, source: &str, discovered: Discovered) -> Result<RuntimeEnvironment> {
        let program = discovered
            .program
            .or_else(|| self.program.clone())
            .ok_or_else(|| {
                Error::RuntimeResolution(format!("{} provided no program handle", source))
            })?;

        let mut env = RuntimeEnvironment::new(
            discovered.ledger,
            program,
            Keypair::new(),
            self.config.clone(),
        );
        env.source = source.to_owned();

        match discovered.payer {
            Some(payer) => env.payer = payer,
            None => {
                tracing::info!("no signer found, using ephemeral {}", env.payer.pubkey());
                env.provisioning = fund_ephemeral(
                    env.ledger(),
                    &env.payer.pubkey(),
                    self.config.airdrop_lamports,
                    &env.confirm,
                )
                .await;
            }
        }
        Ok(env)
    }
}

/// Best-effort airdrop; failure is reported, not raised.
pub async fn fund_ephemeral(
    ledger: &dyn Ledger,
    address: &Pubkey,
    lamports: u64,
    settings: &ConfirmSettings,
) -> SignerProvisioning {
    let provisioning = match ledger.request_airdrop(address, lamports).await {
        Ok(signature) => match confirm_transaction(ledger, &signature, None, settings).await {
            Submission::Confirmed(signature) => SignerProvisioning::Funded { signature },
            Submission::Rejected { reason, .. } => SignerProvisioning::Unfunded { reason },
            Submission::Unconfirmed(signature) => SignerProvisioning::Unfunded {
                reason: format!("airdrop {} not confirmed", signature),
            },
        },
        Err(error) => SignerProvisioning::Unfunded {
            reason: error.to_string(),
        },
    };
    if let SignerProvisioning::Unfunded { reason } = &provisioning {
        tracing::warn!("airdrop to {} failed, continuing unfunded: {}", address, reason);
    }
    provisioning
}
