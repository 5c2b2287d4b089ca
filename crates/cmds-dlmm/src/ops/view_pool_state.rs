use super::Context;
use crate::{pda, state::Pool, state::ProgramAccount};
use dlmm_lib::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub mint_a: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub mint_b: Pubkey,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PoolView {
    Decoded { address: Pubkey, pool: Box<Pool> },
    /// The interface declares no pool account type.
    Address(Pubkey),
}

impl PoolView {
    pub fn address(&self) -> Pubkey {
        match self {
            PoolView::Decoded { address, .. } | PoolView::Address(address) => *address,
        }
    }
}

pub async fn run(ctx: &Context, input: Input) -> Result<PoolView> {
    let program = ctx.env().program();
    let address = pda::find_pool(&input.mint_a, &input.mint_b, &program.program_id())?.address;
    if program.account_type(Pool::NAME).is_none() {
        tracing::info!("no {} account type, showing address only", Pool::NAME);
        return Ok(PoolView::Address(address));
    }
    let pool: Pool = program
        .fetch_account(ctx.env().ledger(), Pool::NAME, &address)
        .await?;
    Ok(PoolView::Decoded {
        address,
        pool: Box::new(pool),
    })
}
