use super::{Context, TOKEN_PROGRAM};
use crate::{args::PostYieldsArgs, pda::PoolAddresses};
use dlmm_lib::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub const NAME: &str = "post_yields_and_update";

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub mint_a: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub mint_b: Pubkey,
    pub y_a_bps: u16,
    pub y_b_bps: u16,
    pub spot_price_1e6: u64,
    #[serde(default)]
    pub cu_price_micro_lamports: u64,
    /// Pass the pool's metrics ring.
    #[serde(default)]
    pub with_metrics: bool,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub oracle_signer: Option<Pubkey>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    pub method: String,
    /// Holding accounts of the caller that receive the bounty.
    #[serde_as(as = "[DisplayFromStr; 2]")]
    pub caller_holding_accounts: [Pubkey; 2],
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output> {
    let addresses = PoolAddresses::derive(&input.mint_a, &input.mint_b, &ctx.program_id())?;
    let caller = ctx.payer();
    let ata_a = ctx.ensure_holding_account(&input.mint_a, &caller).await?;
    let ata_b = ctx.ensure_holding_account(&input.mint_b, &caller).await?;

    let args = PostYieldsArgs {
        y_a_bps: input.y_a_bps,
        y_b_bps: input.y_b_bps,
        spot_price_1e6: input.spot_price_1e6,
        cu_price_micro_lamports: input.cu_price_micro_lamports,
    };
    let invocation = ctx
        .invoke(
            NAME,
            &args,
            &[
                ("caller", Some(caller)),
                ("oracle_signer_opt", input.oracle_signer),
                ("pool", Some(addresses.pool)),
                ("treasury_a", Some(addresses.treasury_a)),
                ("treasury_b", Some(addresses.treasury_b)),
                ("caller_ata_a", Some(ata_a.address)),
                ("caller_ata_b", Some(ata_b.address)),
                ("mint_a", Some(input.mint_a)),
                ("mint_b", Some(input.mint_b)),
                ("vault_a", Some(addresses.vault_a)),
                ("vault_b", Some(addresses.vault_b)),
                ("metrics", input.with_metrics.then_some(addresses.metrics)),
                TOKEN_PROGRAM,
            ],
        )
        .await?;

    Ok(Output {
        signature: invocation.signature,
        method: invocation.method,
        caller_holding_accounts: [ata_a.address, ata_b.address],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ops::{initialize_pool, view_pool_state},
        simulator,
        state::Pool,
    };
    use dlmm_lib::testing::decompile;

    #[tokio::test]
    async fn test_post_yields() {
        tracing_subscriber::fmt::try_init().ok();
        let (ctx, ledger) = simulator::context();
        let (mint_a, mint_b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let pool = initialize_pool::run(
            &ctx,
            initialize_pool::Input {
                mint_a,
                mint_b,
                params: <_>::default(),
            },
        )
        .await
        .unwrap()
        .addresses
        .pool;

        let input = Input {
            mint_a,
            mint_b,
            y_a_bps: 700,
            y_b_bps: 300,
            spot_price_1e6: 1_050_000,
            cu_price_micro_lamports: 0,
            with_metrics: false,
            oracle_signer: None,
        };
        let output = run(&ctx, input.clone()).await.unwrap();
        assert_eq!(output.method, "postYieldsAndUpdate");
        for address in output.caller_holding_accounts {
            assert!(ledger.account(&address).is_some());
        }

        // holding accounts (one each) then the update
        let sent = ledger.sent();
        assert_eq!(sent.len(), 4);
        let ix = decompile(&sent[3].message).remove(0);
        // omitted optional accounts are the program id
        assert_eq!(ix.accounts[1].pubkey, ctx.program_id());
        assert_eq!(ix.accounts[11].pubkey, ctx.program_id());

        let state: Pool = ctx
            .env()
            .program()
            .fetch_account(ctx.env().ledger(), "Pool", &pool)
            .await
            .unwrap();
        assert_eq!((state.y_a_bps, state.y_b_bps), (700, 300));
        assert_eq!(state.spot_price_1e6, 1_050_000);

        // holding accounts now exist, only the update is sent
        run(&ctx, input).await.unwrap();
        assert_eq!(ledger.sent().len(), 5);
        assert!(matches!(
            view_pool_state::run(&ctx, view_pool_state::Input { mint_a, mint_b })
                .await
                .unwrap(),
            view_pool_state::PoolView::Decoded { .. }
        ));
    }

    #[tokio::test]
    async fn test_metrics_account_passed() {
        let (ctx, ledger) = simulator::context();
        let (mint_a, mint_b) = (Pubkey::new_unique(), Pubkey::new_unique());
        initialize_pool::run(
            &ctx,
            initialize_pool::Input {
                mint_a,
                mint_b,
                params: <_>::default(),
            },
        )
        .await
        .unwrap();

        run(
            &ctx,
            Input {
                mint_a,
                mint_b,
                y_a_bps: 1,
                y_b_bps: 1,
                spot_price_1e6: 1,
                cu_price_micro_lamports: 0,
                with_metrics: true,
                oracle_signer: None,
            },
        )
        .await
        .unwrap();

        let sent = ledger.sent();
        let ix = decompile(&sent[sent.len() - 1].message).remove(0);
        let metrics = PoolAddresses::derive(&mint_a, &mint_b, &ctx.program_id())
            .unwrap()
            .metrics;
        assert_eq!(ix.accounts[11].pubkey, metrics);
        assert!(ix.accounts[11].is_writable);
    }
}
