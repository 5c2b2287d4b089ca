use super::{Context, SYSTEM_PROGRAM};
use crate::{args::InitOrderbookArgs, pda};
use dlmm_lib::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub const NAME: &str = "init_orderbook";

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub mint_a: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub mint_b: Pubkey,
    pub tick_1e6: u64,
    /// Raised to the pool's band count by the program.
    #[serde(default)]
    pub max_levels: u16,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    pub method: String,
    #[serde_as(as = "DisplayFromStr")]
    pub orderbook: Pubkey,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output> {
    let program_id = ctx.program_id();
    let pool = pda::find_pool(&input.mint_a, &input.mint_b, &program_id)?.address;
    let orderbook = pda::find_orderbook(&pool, &program_id)?.address;

    let args = InitOrderbookArgs {
        tick_1e6: input.tick_1e6,
        max_levels: input.max_levels,
    };
    let invocation = ctx
        .invoke(
            NAME,
            &args,
            &[
                ("payer", Some(ctx.payer())),
                ("pool", Some(pool)),
                ("orderbook", Some(orderbook)),
                SYSTEM_PROGRAM,
            ],
        )
        .await?;

    Ok(Output {
        signature: invocation.signature,
        method: invocation.method,
        orderbook,
    })
}
