use crate::{
    error::{Error, Result},
    idl::{Idl, IdlAccountDef, IdlInstruction, NamingConvention},
    ledger::Ledger,
    negotiate::AccountMapping,
};
use borsh::BorshDeserialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum BuildError {
    #[error("no key for required account \"{0}\"")]
    MissingAccount(String),
    #[error("account \"{name}\" must sign, but {key} is not an available signer")]
    MissingSigner { name: String, key: Pubkey },
}

/// Handle to a deployed program and its interface description.
#[derive(Debug, Clone)]
pub struct RemoteProgram {
    program_id: Pubkey,
    idl: Idl,
}

impl RemoteProgram {
    pub fn new(program_id: Pubkey, idl: Idl) -> Self {
        Self { program_id, idl }
    }

    /// Use the address recorded in the interface description.
    pub fn from_idl(idl: Idl) -> Result<Self> {
        let program_id = idl.address.ok_or_else(|| {
            Error::RuntimeResolution(format!("interface description \"{}\" has no address", idl.name))
        })?;
        Ok(Self::new(program_id, idl))
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Capability handshake: which naming convention the deployed interface uses.
    pub fn naming_convention(&self) -> NamingConvention {
        self.idl.naming_convention()
    }

    pub fn entry_point(&self, name: &str) -> Option<EntryPoint<'_>> {
        self.idl.instruction(name).map(|ix| EntryPoint {
            program_id: self.program_id,
            ix,
        })
    }

    pub fn account_type(&self, name: &str) -> Option<&IdlAccountDef> {
        self.idl.account(name)
    }

    /// Decode an account of type `name`: 8-byte discriminator, then a borsh body.
    ///
    /// Trailing bytes after the body are allowed, accounts are usually allocated
    /// with spare room.
    pub fn decode_account<T: BorshDeserialize>(&self, name: &str, data: &[u8]) -> Result<T> {
        let def = self.account_type(name).ok_or_else(|| Error::Decode {
            name: name.to_owned(),
            reason: "account type not declared by the program".to_owned(),
        })?;
        decode_account(def, data)
    }

    pub async fn fetch_account<T: BorshDeserialize>(
        &self,
        ledger: &dyn Ledger,
        name: &str,
        address: &Pubkey,
    ) -> Result<T> {
        let account = ledger
            .get_account(address)
            .await?
            .ok_or(Error::AccountNotFound(*address))?;
        if account.owner != self.program_id {
            return Err(Error::Decode {
                name: name.to_owned(),
                reason: format!("{} is owned by {}", address, account.owner),
            });
        }
        self.decode_account(name, &account.data)
    }
}

pub fn decode_account<T: BorshDeserialize>(def: &IdlAccountDef, data: &[u8]) -> Result<T> {
    let decode_error = |reason: String| Error::Decode {
        name: def.name.clone(),
        reason,
    };
    if data.len() < 8 {
        return Err(decode_error(format!("{} bytes is too short", data.len())));
    }
    if data[..8] != def.discriminator {
        return Err(decode_error("discriminator mismatch".to_owned()));
    }
    T::deserialize(&mut &data[8..]).map_err(|e| decode_error(e.to_string()))
}

/// A named entry point that exists in the program's interface.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoint<'a> {
    program_id: Pubkey,
    ix: &'a IdlInstruction,
}

impl<'a> EntryPoint<'a> {
    pub fn name(&self) -> &'a str {
        &self.ix.name
    }

    /// Lay out accounts in declared order, resolving each by name from `mapping`.
    ///
    /// Omitted optional accounts are passed as the program id.
    pub fn build(
        &self,
        args: &[u8],
        mapping: &AccountMapping,
        signers: &[Pubkey],
    ) -> std::result::Result<Instruction, BuildError> {
        let mut accounts = Vec::with_capacity(self.ix.accounts.len());
        for account in &self.ix.accounts {
            let key = match mapping.get(&account.name) {
                Some(Some(key)) => Some(key),
                Some(None) => None,
                None => account.address,
            };
            let meta = match key {
                Some(pubkey) => {
                    if account.signer && !signers.contains(&pubkey) {
                        return Err(BuildError::MissingSigner {
                            name: account.name.clone(),
                            key: pubkey,
                        });
                    }
                    AccountMeta {
                        pubkey,
                        is_signer: account.signer,
                        is_writable: account.writable,
                    }
                }
                None if account.optional => AccountMeta::new_readonly(self.program_id, false),
                None => return Err(BuildError::MissingAccount(account.name.clone())),
            };
            accounts.push(meta);
        }

        let mut data = Vec::with_capacity(8 + args.len());
        data.extend_from_slice(&self.ix.discriminator);
        data.extend_from_slice(args);

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data,
        })
    }
}
