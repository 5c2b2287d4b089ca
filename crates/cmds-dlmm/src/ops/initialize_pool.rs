use super::{Context, SYSTEM_PROGRAM, TOKEN_PROGRAM};
use crate::{
    args::{InitParamsV3, InitializePoolArgs},
    pda::PoolAddresses,
};
use dlmm_lib::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub const NAME: &str = "initialize_pool";

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub mint_a: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub mint_b: Pubkey,
    /// Unset roles are filled with the payer.
    #[serde(default)]
    pub params: InitParamsV3,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    pub method: String,
    #[serde(flatten)]
    pub addresses: PoolAddresses,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output> {
    let addresses = PoolAddresses::derive(&input.mint_a, &input.mint_b, &ctx.program_id())?;
    tracing::info!("pool {}", addresses.pool);

    let args = InitializePoolArgs {
        p: input.params.with_authority(ctx.payer()),
    };
    let invocation = ctx
        .invoke(
            NAME,
            &args,
            &[
                ("payer", Some(ctx.payer())),
                ("mint_a", Some(input.mint_a)),
                ("mint_b", Some(input.mint_b)),
                ("pool", Some(addresses.pool)),
                ("vault_a", Some(addresses.vault_a)),
                ("vault_b", Some(addresses.vault_b)),
                ("treasury_a", Some(addresses.treasury_a)),
                ("treasury_b", Some(addresses.treasury_b)),
                TOKEN_PROGRAM,
                SYSTEM_PROGRAM,
            ],
        )
        .await?;

    Ok(Output {
        signature: invocation.signature,
        method: invocation.method,
        addresses,
    })
}
