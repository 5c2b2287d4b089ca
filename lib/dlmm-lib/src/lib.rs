//! Client-side access layer for programs that expose an Anchor-style
//! interface description.
//!
//! The pieces are layered leaf-first: [`derive`] computes program derived
//! addresses, [`provision`] makes sure holding accounts exist, [`negotiate`]
//! tries entry point and account naming variants in a fixed order, and
//! [`runtime`] assembles the [`RuntimeEnvironment`] everything else runs in.

pub mod config;
pub mod derive;
pub mod error;
pub mod idl;
pub mod ledger;
pub mod negotiate;
pub mod program;
pub mod provision;
pub mod runtime;
pub mod solana;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ClientConfig, SolanaNet};
pub use derive::{DerivedAddress, SeedTuple};
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use negotiate::{AccountMapping, AttemptRecord, Invocation, Negotiator, Outcome};
pub use program::RemoteProgram;
pub use runtime::{RuntimeEnvironment, RuntimeResolver, SignerProvisioning};

pub use solana_sdk::{pubkey::Pubkey, signature::Signature};

pub mod prelude {
    pub use crate::{
        config::ClientConfig,
        derive::{find_program_address, DerivedAddress, SeedTuple},
        error::{Error, Result},
        idl::NamingConvention,
        negotiate::{AccountMapping, Invocation, Negotiator},
        program::RemoteProgram,
        provision::{ensure_holding_account, HoldingAccount},
        runtime::RuntimeEnvironment,
    };
    pub use solana_sdk::{
        instruction::{AccountMeta, Instruction},
        pubkey::Pubkey,
        signature::Signature,
    };
    pub use std::sync::Arc;
}

/// Lamports per SOL, for display.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}
