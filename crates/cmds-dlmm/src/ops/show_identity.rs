use super::Context;
use dlmm_lib::{lamports_to_sol, prelude::*};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub address: Pubkey,
    pub lamports: u64,
    pub sol: f64,
}

pub async fn run(ctx: &Context) -> Result<Output> {
    let address = ctx.payer();
    let lamports = ctx.env().balance().await?;
    tracing::info!("{} holds {} SOL", address, lamports_to_sol(lamports));
    Ok(Output {
        address,
        lamports,
        sol: lamports_to_sol(lamports),
    })
}
