use super::Context;
use crate::{
    pda,
    state::{Position, ProgramAccount},
};
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
    /// Defaults to the payer.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub owner: Option<Pubkey>,
    #[serde(default)]
    pub receipt_nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub address: Pubkey,
    pub position: Position,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output> {
    let program_id = ctx.program_id();
    let owner = input.owner.unwrap_or_else(|| ctx.payer());
    let pool = pda::find_pool(&input.mint_a, &input.mint_b, &program_id)?.address;
    let address = pda::find_position(&pool, &owner, input.receipt_nonce, &program_id)?.address;
    let position = ctx
        .env()
        .program()
        .fetch_account(ctx.env().ledger(), Position::NAME, &address)
        .await?;
    Ok(Output { address, position })
}
