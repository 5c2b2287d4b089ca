//! Protocol operations. Each one derives its addresses, provisions holding
//! accounts where the program expects them, then negotiates the entry point.

use borsh::BorshSerialize;
use dlmm_lib::{prelude::*, provision::TOKEN_PROGRAM_ID};
use solana_sdk::system_program;
use tokio_util::sync::CancellationToken;

pub mod add_liquidity;
pub mod init_orderbook;
pub mod initialize_pool;
pub mod place_order;
pub mod post_yields_and_update;
pub mod show_identity;
pub mod view_pool_state;
pub mod view_position;

/// Role name (snake_case) and key; `None` leaves an optional account out.
pub type Roles<'a> = [(&'a str, Option<Pubkey>)];

/// What every operation runs against.
#[derive(Debug, Clone)]
pub struct Context {
    env: Arc<RuntimeEnvironment>,
    cancel: CancellationToken,
}

impl Context {
    pub fn new(env: Arc<RuntimeEnvironment>) -> Self {
        Self {
            env,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn env(&self) -> &RuntimeEnvironment {
        &self.env
    }

    pub fn program_id(&self) -> Pubkey {
        self.env.program().program_id()
    }

    pub fn payer(&self) -> Pubkey {
        self.env.payer_pubkey()
    }

    /// Entry point names for `snake`, the convention the interface uses first.
    pub fn method_candidates(&self, snake: &str) -> Vec<String> {
        self.env
            .program()
            .naming_convention()
            .preference_order()
            .iter()
            .map(|c| c.apply(snake))
            .collect()
    }

    pub fn mappings(&self, roles: &Roles<'_>) -> Vec<AccountMapping> {
        AccountMapping::variants(
            roles,
            self.env.program().naming_convention().preference_order(),
        )
    }

    /// Holding account of `owner` for `mint`, created if absent.
    pub async fn ensure_holding_account(&self, mint: &Pubkey, owner: &Pubkey) -> Result<HoldingAccount> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled {
                attempts: Vec::new(),
            });
        }
        ensure_holding_account(&self.env, mint, owner).await
    }

    /// Negotiate `snake` with borsh-encoded `args` and `roles`.
    pub async fn invoke<A: BorshSerialize>(
        &self,
        snake: &str,
        args: &A,
        roles: &Roles<'_>,
    ) -> Result<Invocation> {
        let data = borsh::to_vec(args).map_err(|e| Error::Encode(e.to_string()))?;
        Negotiator::new(&self.env)
            .with_cancellation(self.cancel.clone())
            .invoke(&self.method_candidates(snake), &data, &self.mappings(roles))
            .await
    }
}

pub(crate) const TOKEN_PROGRAM: (&str, Option<Pubkey>) = ("token_program", Some(TOKEN_PROGRAM_ID));
pub(crate) const SYSTEM_PROGRAM: (&str, Option<Pubkey>) =
    ("system_program", Some(system_program::ID));
