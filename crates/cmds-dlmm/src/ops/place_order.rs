use super::Context;
use crate::{
    args::{PlaceOrderArgs, Side, TimeInForce},
    pda,
};
use dlmm_lib::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub const NAME: &str = "place_order";

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Input {
    #[serde_as(as = "DisplayFromStr")]
    pub mint_a: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub mint_b: Pubkey,
    pub side: Side,
    pub qty: u64,
    /// Market order when absent.
    #[serde(default)]
    pub limit_price_1e6: Option<u64>,
    #[serde(default)]
    pub tif: TimeInForce,
    #[serde(default)]
    pub post_only: bool,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub client_id: u64,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Output {
    #[serde_as(as = "DisplayFromStr")]
    pub signature: Signature,
    pub method: String,
}

pub async fn run(ctx: &Context, input: Input) -> Result<Output> {
    let program_id = ctx.program_id();
    let pool = pda::find_pool(&input.mint_a, &input.mint_b, &program_id)?.address;
    let orderbook = pda::find_orderbook(&pool, &program_id)?.address;

    let args = PlaceOrderArgs {
        side: input.side,
        qty: input.qty,
        limit_price_opt_1e6: input.limit_price_1e6,
        tif: input.tif.into(),
        post_only: input.post_only,
        reduce_only: input.reduce_only,
        client_id: input.client_id,
    };
    let invocation = ctx
        .invoke(
            NAME,
            &args,
            &[
                ("user", Some(ctx.payer())),
                ("pool", Some(pool)),
                ("orderbook", Some(orderbook)),
            ],
        )
        .await?;

    Ok(Output {
        signature: invocation.signature,
        method: invocation.method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ops::{init_orderbook, initialize_pool},
        simulator,
        state::{BookEvent, OrderBook},
    };

    #[tokio::test]
    async fn test_place_order() {
        tracing_subscriber::fmt::try_init().ok();
        let (ctx, _) = simulator::context();
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
        let orderbook = init_orderbook::run(
            &ctx,
            init_orderbook::Input {
                mint_a,
                mint_b,
                tick_1e6: 1_000,
                max_levels: 4,
            },
        )
        .await
        .unwrap()
        .orderbook;

        let input = Input {
            mint_a,
            mint_b,
            side: Side::Bid,
            qty: 10,
            limit_price_1e6: Some(990_000),
            tif: TimeInForce::GoodTillSlot(500),
            post_only: true,
            reduce_only: false,
            client_id: 42,
        };
        let output = run(&ctx, input).await.unwrap();
        assert_eq!(output.method, "placeOrder");

        let book: OrderBook = ctx
            .env()
            .program()
            .fetch_account(ctx.env().ledger(), "OrderBook", &orderbook)
            .await
            .unwrap();
        assert_eq!(book.next_order_id, 2);
        assert_eq!(book.max_levels, 8);
        assert_eq!(book.best_bid_band, -1);
        let Some(BookEvent::Place {
            order_id,
            client_id,
            tif_expiry,
            ..
        }) = book.event_q.last()
        else {
            panic!("no place event");
        };
        assert_eq!((*order_id, *client_id, *tif_expiry), (1, 42, 500));
    }

    #[tokio::test]
    async fn test_order_without_book() {
        let (ctx, ledger) = simulator::context();
        let err = run(
            &ctx,
            Input {
                mint_a: Pubkey::new_unique(),
                mint_b: Pubkey::new_unique(),
                side: Side::Ask,
                qty: 1,
                limit_price_1e6: None,
                tif: TimeInForce::ImmediateOrCancel,
                post_only: false,
                reduce_only: false,
                client_id: 0,
            },
        )
        .await
        .unwrap_err();
        let Error::InvocationExhausted { last_error, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(last_error.contains("AccountNotInitialized"), "{last_error}");
        // account names are the same in both conventions
        assert!(err
            .attempts()
            .iter()
            .any(|a| a.outcome == dlmm_lib::negotiate::Outcome::Duplicate));
        assert_eq!(ledger.sent().len(), 1);
    }
}
