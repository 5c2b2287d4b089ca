use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::LazyLock,
    time::Duration,
};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("error parsing config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to read keypair from {path}: {reason}")]
    Keypair { path: PathBuf, reason: String },
    #[error(transparent)]
    UnknownNetwork(#[from] UnknownNetwork),
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub solana: SolanaClientConfig,
    #[serde(default)]
    pub commitment: Commitment,
    #[serde(default = "ClientConfig::default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    #[serde(default = "ClientConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "ClientConfig::default_airdrop_lamports")]
    pub airdrop_lamports: u64,
    #[serde(default)]
    pub keypair_path: Option<PathBuf>,
    /// Overrides the program id of the bundled interface description.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub program_id: Option<Pubkey>,
    /// Loads the interface description from disk instead of the bundled one.
    #[serde(default)]
    pub idl_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            solana: <_>::default(),
            commitment: <_>::default(),
            confirm_timeout_secs: Self::default_confirm_timeout_secs(),
            poll_interval_ms: Self::default_poll_interval_ms(),
            airdrop_lamports: Self::default_airdrop_lamports(),
            keypair_path: None,
            program_id: None,
            idl_path: None,
        }
    }
}

impl ClientConfig {
    pub fn default_confirm_timeout_secs() -> u64 {
        60
    }

    pub fn default_poll_interval_ms() -> u64 {
        500
    }

    /// 1 SOL
    pub fn default_airdrop_lamports() -> u64 {
        crate::LAMPORTS_PER_SOL
    }

    /// Read the config from `path`, or from STDIN if `path` is `-`.
    ///
    /// Falls back to the default config when nothing is given or the file is invalid.
    pub fn get_config(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::read(path)
                .map_err(|error| {
                    tracing::error!("{}", error);
                    tracing::warn!("invalid config file, using default");
                })
                .unwrap_or_default(),
            None => {
                tracing::info!("no config specified, using default");
                Self::default()
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let s = if path == Path::new("-") {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(path)?
        };
        Ok(toml::from_str(&s)?)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment.level(),
        }
    }

    pub fn build_client(&self) -> RpcClient {
        RpcClient::new_with_timeouts_and_commitment(
            self.solana.url.clone(),
            Duration::from_secs(30),
            self.commitment_config(),
            self.confirm_timeout(),
        )
    }

    pub fn read_keypair(&self) -> Result<Option<Keypair>, ConfigError> {
        self.keypair_path.as_deref().map(read_keypair).transpose()
    }
}

pub fn read_keypair(path: &Path) -> Result<Keypair, ConfigError> {
    read_keypair_file(path).map_err(|error| ConfigError::Keypair {
        path: path.to_owned(),
        reason: error.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn level(&self) -> CommitmentLevel {
        match self {
            Commitment::Processed => CommitmentLevel::Processed,
            Commitment::Confirmed => CommitmentLevel::Confirmed,
            Commitment::Finalized => CommitmentLevel::Finalized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolanaClientConfig {
    pub url: String,
    pub cluster: SolanaNet,
}

impl SolanaClientConfig {
    pub fn for_cluster(cluster: SolanaNet) -> Self {
        Self {
            url: cluster.url(),
            cluster,
        }
    }
}

impl Default for SolanaClientConfig {
    fn default() -> Self {
        Self::for_cluster(SolanaNet::Localnet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolanaNet {
    #[serde(rename = "localnet")]
    Localnet,
    #[serde(rename = "devnet")]
    Devnet,
    #[serde(rename = "testnet")]
    Testnet,
    #[serde(rename = "mainnet-beta")]
    Mainnet,
}

#[derive(Debug, ThisError)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);

impl FromStr for SolanaNet {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "localnet" => Ok(Self::Localnet),
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet-beta" => Ok(Self::Mainnet),
            s => Err(UnknownNetwork(s.to_owned())),
        }
    }
}

impl SolanaNet {
    pub fn url(&self) -> String {
        match self {
            SolanaNet::Localnet => {
                static URL: LazyLock<String> = LazyLock::new(|| {
                    std::env::var("SOLANA_LOCALNET_URL")
                        .unwrap_or_else(|_| "http://127.0.0.1:8899".to_owned())
                });
                URL.clone()
            }
            SolanaNet::Devnet => {
                static URL: LazyLock<String> = LazyLock::new(|| {
                    std::env::var("SOLANA_DEVNET_URL")
                        .unwrap_or_else(|_| "https://api.devnet.solana.com".to_owned())
                });
                URL.clone()
            }
            SolanaNet::Testnet => {
                static URL: LazyLock<String> = LazyLock::new(|| {
                    std::env::var("SOLANA_TESTNET_URL")
                        .unwrap_or_else(|_| "https://api.testnet.solana.com".to_owned())
                });
                URL.clone()
            }
            SolanaNet::Mainnet => {
                static URL: LazyLock<String> = LazyLock::new(|| {
                    std::env::var("SOLANA_MAINNET_URL")
                        .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_owned())
                });
                URL.clone()
            }
        }
    }

    pub fn from_url(url: &str) -> Result<Self, UnknownNetwork> {
        if url.contains("localhost") || url.contains("127.0.0.1") {
            Ok(SolanaNet::Localnet)
        } else if url.contains("devnet") {
            Ok(SolanaNet::Devnet)
        } else if url.contains("testnet") {
            Ok(SolanaNet::Testnet)
        } else if url.contains("mainnet") {
            Ok(SolanaNet::Mainnet)
        } else {
            Err(UnknownNetwork(url.to_owned()))
        }
    }
}
