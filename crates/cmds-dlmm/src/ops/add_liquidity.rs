use super::{Context, SYSTEM_PROGRAM, TOKEN_PROGRAM};
use crate::{
    args::AddLiquidityArgs,
    pda::{self, PoolAddresses},
};
use dlmm_lib::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub const NAME: &str = "add_liquidity";

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub mint_a: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub mint_b: Pubkey,
    #[serde(default)]
    pub band_idx: u8,
    pub amount_a: u64,
    pub amount_b: u64,
    /// Distinguishes positions of one owner in one pool.
    #[serde(default)]
    pub receipt_nonce: u64,
    #[serde(default)]
    pub min_unlock_after_slots: u64,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    pub method: String,
    #[serde_as(as = "DisplayFromStr")]
    pub position: Pubkey,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output> {
    let program_id = ctx.program_id();
    let user = ctx.payer();
    let addresses = PoolAddresses::derive(&input.mint_a, &input.mint_b, &program_id)?;
    let position = pda::find_position(&addresses.pool, &user, input.receipt_nonce, &program_id)?;
    tracing::info!("position {} (bump {})", position.address, position.bump);

    let ata_a = ctx.ensure_holding_account(&input.mint_a, &user).await?;
    let ata_b = ctx.ensure_holding_account(&input.mint_b, &user).await?;

    let args = AddLiquidityArgs {
        band_idx: input.band_idx,
        amount_a: input.amount_a,
        amount_b: input.amount_b,
        receipt_nonce: input.receipt_nonce,
        min_unlock_after_slots: input.min_unlock_after_slots,
    };
    let invocation = ctx
        .invoke(
            NAME,
            &args,
            &[
                ("user", Some(user)),
                ("pool", Some(addresses.pool)),
                ("vault_a", Some(addresses.vault_a)),
                ("vault_b", Some(addresses.vault_b)),
                ("user_ata_a", Some(ata_a.address)),
                ("user_ata_b", Some(ata_b.address)),
                ("position", Some(position.address)),
                TOKEN_PROGRAM,
                SYSTEM_PROGRAM,
                ("mint_a", Some(input.mint_a)),
                ("mint_b", Some(input.mint_b)),
            ],
        )
        .await?;

    Ok(Output {
        signature: invocation.signature,
        method: invocation.method,
        position: position.address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ops::{initialize_pool, view_position},
        simulator,
    };
    use dlmm_lib::provision::holding_account_address;
    use tokio_util::sync::CancellationToken;

    async fn pool(ctx: &Context) -> (Pubkey, Pubkey) {
        let (mint_a, mint_b) = (Pubkey::new_unique(), Pubkey::new_unique());
        initialize_pool::run(
            ctx,
            initialize_pool::Input {
                mint_a,
                mint_b,
                params: <_>::default(),
            },
        )
        .await
        .unwrap();
        (mint_a, mint_b)
    }

    #[tokio::test]
    async fn test_single_sided_deposit() {
        tracing_subscriber::fmt::try_init().ok();
        let (ctx, ledger) = simulator::context();
        let (mint_a, mint_b) = pool(&ctx).await;

        let output = run(
            &ctx,
            Input {
                mint_a,
                mint_b,
                band_idx: 0,
                amount_a: 1000,
                amount_b: 0,
                receipt_nonce: 0,
                min_unlock_after_slots: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(output.method, "addLiquidity");
        for mint in [mint_a, mint_b] {
            let ata = holding_account_address(&ctx.payer(), &mint).unwrap();
            assert!(ledger.account(&ata).is_some());
        }

        let position = view_position::run(
            &ctx,
            view_position::Input {
                mint_a,
                mint_b,
                owner: None,
                receipt_nonce: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(position.address, output.position);
        assert!(position.position.shares > 0);
        assert_eq!(position.position.owner, ctx.payer());
    }

    #[tokio::test]
    async fn test_cancelled_before_provisioning() {
        let (ctx, ledger) = simulator::context();
        let (mint_a, mint_b) = pool(&ctx).await;
        let sent = ledger.sent().len();

        let token = CancellationToken::new();
        token.cancel();
        let ctx = ctx.with_cancellation(token);
        let err = run(
            &ctx,
            Input {
                mint_a,
                mint_b,
                band_idx: 0,
                amount_a: 1000,
                amount_b: 0,
                receipt_nonce: 0,
                min_unlock_after_slots: 0,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Cancelled { .. }));
        assert_eq!(ledger.sent().len(), sent);
        let ata = holding_account_address(&ctx.payer(), &mint_a).unwrap();
        assert!(ledger.account(&ata).is_none());
    }

    #[tokio::test]
    async fn test_band_out_of_range() {
        let (ctx, ledger) = simulator::context();
        let (mint_a, mint_b) = pool(&ctx).await;

        let err = run(
            &ctx,
            Input {
                mint_a,
                mint_b,
                band_idx: 200,
                amount_a: 1,
                amount_b: 1,
                receipt_nonce: 3,
                min_unlock_after_slots: 0,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvocationExhausted { .. }));

        // holding accounts stay provisioned
        let position = pda::find_position(
            &PoolAddresses::derive(&mint_a, &mint_b, &ctx.program_id())
                .unwrap()
                .pool,
            &ctx.payer(),
            3,
            &ctx.program_id(),
        )
        .unwrap();
        assert!(ledger.account(&position.address).is_none());
        let ata = holding_account_address(&ctx.payer(), &mint_b).unwrap();
        assert!(ledger.account(&ata).is_some());
    }
}
