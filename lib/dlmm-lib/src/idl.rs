//! Anchor interface descriptions, in both the legacy layout (camelCase names,
//! `isMut`/`isSigner`) and the Anchor 0.30 layout (snake_case names, explicit
//! discriminators, `metadata.spec` set).

use serde::Deserialize;
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;
use std::{fmt, path::Path};
use thiserror::Error as ThisError;

#[macro_export]
macro_rules! idl_definition {
    ($file:expr $(,)?) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/idl/", $file))
    };
}

#[derive(Debug, ThisError)]
pub enum IdlError {
    #[error("error parsing interface description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("error reading interface description: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid discriminator for {0}, expected 8 bytes")]
    InvalidDiscriminator(String),
    #[error("invalid address {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdlFormat {
    Legacy,
    Spec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingConvention {
    Snake,
    Camel,
}

impl NamingConvention {
    /// Render a snake_case identifier in this convention.
    pub fn apply(&self, snake: &str) -> String {
        match self {
            NamingConvention::Snake => snake.to_owned(),
            NamingConvention::Camel => to_camel_case(snake),
        }
    }

    pub fn other(&self) -> Self {
        match self {
            NamingConvention::Snake => NamingConvention::Camel,
            NamingConvention::Camel => NamingConvention::Snake,
        }
    }

    /// Detected convention first, then the other one.
    pub fn preference_order(&self) -> [Self; 2] {
        [*self, self.other()]
    }

    /// Guess from a set of identifiers; `None` when nothing is conclusive.
    pub fn detect<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let (mut snake, mut camel) = (0usize, 0usize);
        for name in names {
            if name.contains('_') {
                snake += 1;
            } else if name.chars().any(|c| c.is_ascii_uppercase()) {
                camel += 1;
            }
        }
        match snake.cmp(&camel) {
            std::cmp::Ordering::Greater => Some(NamingConvention::Snake),
            std::cmp::Ordering::Less => Some(NamingConvention::Camel),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NamingConvention::Snake => "snake_case",
            NamingConvention::Camel => "camelCase",
        })
    }
}

pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for c in s.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// Instruction discriminator. Anchor hashes the snake_case name regardless of
/// how the interface description spells it.
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    sighash("global", &to_snake_case(name))
}

pub fn account_discriminator(name: &str) -> [u8; 8] {
    sighash("account", name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idl {
    pub name: String,
    pub version: String,
    pub address: Option<Pubkey>,
    pub format: IdlFormat,
    pub instructions: Vec<IdlInstruction>,
    pub accounts: Vec<IdlAccountDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlInstruction {
    pub name: String,
    pub discriminator: [u8; 8],
    pub accounts: Vec<IdlAccount>,
    pub args: Vec<IdlField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlAccount {
    pub name: String,
    pub writable: bool,
    pub signer: bool,
    pub optional: bool,
    pub address: Option<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdlField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlAccountDef {
    pub name: String,
    pub discriminator: [u8; 8],
}

impl Idl {
    pub fn from_json(s: &str) -> Result<Self, IdlError> {
        let raw: RawIdl = serde_json::from_str(s)?;
        raw.try_into()
    }

    pub fn from_file(path: &Path) -> Result<Self, IdlError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn instruction(&self, name: &str) -> Option<&IdlInstruction> {
        self.instructions.iter().find(|i| i.name == name)
    }

    pub fn account(&self, name: &str) -> Option<&IdlAccountDef> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Naming convention of entry points and account roles.
    ///
    /// The layout decides it; a legacy description whose names say otherwise
    /// is trusted over its layout.
    pub fn naming_convention(&self) -> NamingConvention {
        let names = self.instructions.iter().flat_map(|i| {
            std::iter::once(i.name.as_str()).chain(i.accounts.iter().map(|a| a.name.as_str()))
        });
        match (self.format, NamingConvention::detect(names)) {
            (IdlFormat::Spec, _) => NamingConvention::Snake,
            (IdlFormat::Legacy, Some(detected)) => detected,
            (IdlFormat::Legacy, None) => NamingConvention::Camel,
        }
    }
}

#[derive(Deserialize)]
struct RawIdl {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    #[serde(default)]
    instructions: Vec<RawInstruction>,
    #[serde(default)]
    accounts: Vec<RawAccountDef>,
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    spec: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Deserialize)]
struct RawInstruction {
    name: String,
    #[serde(default)]
    discriminator: Option<Vec<u8>>,
    #[serde(default)]
    accounts: Vec<RawAccountItem>,
    #[serde(default)]
    args: Vec<IdlField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAccountItem {
    Group {
        #[allow(dead_code)]
        name: String,
        accounts: Vec<RawAccountItem>,
    },
    Single(RawAccount),
}

#[derive(Deserialize)]
struct RawAccount {
    name: String,
    #[serde(default, alias = "isMut")]
    writable: bool,
    #[serde(default, alias = "isSigner")]
    signer: bool,
    #[serde(default, alias = "isOptional")]
    optional: bool,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Deserialize)]
struct RawAccountDef {
    name: String,
    #[serde(default)]
    discriminator: Option<Vec<u8>>,
}

fn parse_pubkey(s: &str) -> Result<Pubkey, IdlError> {
    s.parse()
        .map_err(|_| IdlError::InvalidAddress(s.to_owned()))
}

fn to_discriminator(name: &str, bytes: Vec<u8>) -> Result<[u8; 8], IdlError> {
    bytes
        .try_into()
        .map_err(|_| IdlError::InvalidDiscriminator(name.to_owned()))
}

fn flatten(items: Vec<RawAccountItem>, out: &mut Vec<IdlAccount>) -> Result<(), IdlError> {
    for item in items {
        match item {
            RawAccountItem::Group { accounts, .. } => flatten(accounts, out)?,
            RawAccountItem::Single(a) => out.push(IdlAccount {
                address: a.address.as_deref().map(parse_pubkey).transpose()?,
                name: a.name,
                writable: a.writable,
                signer: a.signer,
                optional: a.optional,
            }),
        }
    }
    Ok(())
}

impl TryFrom<RawIdl> for Idl {
    type Error = IdlError;

    fn try_from(raw: RawIdl) -> Result<Self, Self::Error> {
        let metadata = raw.metadata.unwrap_or(RawMetadata {
            name: None,
            version: None,
            spec: None,
            address: None,
        });
        let format = if metadata.spec.is_some() || raw.address.is_some() {
            IdlFormat::Spec
        } else {
            IdlFormat::Legacy
        };
        let address = raw
            .address
            .or(metadata.address)
            .as_deref()
            .map(parse_pubkey)
            .transpose()?;

        let instructions = raw
            .instructions
            .into_iter()
            .map(|i| {
                let discriminator = match i.discriminator {
                    Some(bytes) => to_discriminator(&i.name, bytes)?,
                    None => anchor_discriminator(&i.name),
                };
                let mut accounts = Vec::new();
                flatten(i.accounts, &mut accounts)?;
                Ok(IdlInstruction {
                    name: i.name,
                    discriminator,
                    accounts,
                    args: i.args,
                })
            })
            .collect::<Result<Vec<_>, IdlError>>()?;

        let accounts = raw
            .accounts
            .into_iter()
            .map(|a| {
                let discriminator = match a.discriminator {
                    Some(bytes) => to_discriminator(&a.name, bytes)?,
                    None => account_discriminator(&a.name),
                };
                Ok(IdlAccountDef {
                    name: a.name,
                    discriminator,
                })
            })
            .collect::<Result<Vec<_>, IdlError>>()?;

        Ok(Idl {
            name: metadata.name.or(raw.name).unwrap_or_default(),
            version: metadata.version.or(raw.version).unwrap_or_default(),
            address,
            format,
            instructions,
            accounts,
        })
    }
}
