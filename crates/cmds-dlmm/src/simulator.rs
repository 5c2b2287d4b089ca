//! Program behavior for the in-memory ledger: just enough state transitions to
//! exercise the operations end to end.

use crate::{args::*, ops::Context, pda, state::*};
use borsh::{BorshDeserialize, BorshSerialize};
use dlmm_lib::{
    idl::{account_discriminator, anchor_discriminator, Idl},
    prelude::*,
    solana::ConfirmSettings,
    testing::{token_account, Accounts, Effect, MockLedger},
};
use solana_sdk::{account::Account, signature::Keypair};
use std::time::Duration;

fn read<T: ProgramAccount>(accounts: &Accounts, address: &Pubkey) -> Option<T> {
    let data = &accounts.get(address)?.data;
    if data.len() < 8 || data[..8] != account_discriminator(T::NAME) {
        return None;
    }
    T::deserialize(&mut &data[8..]).ok()
}

fn write<T: ProgramAccount + BorshSerialize>(
    accounts: &mut Accounts,
    address: Pubkey,
    value: &T,
    program_id: &Pubkey,
) {
    let mut data = account_discriminator(T::NAME).to_vec();
    borsh::to_writer(&mut data, value).ok();
    accounts.insert(
        address,
        Account {
            lamports: 1_000_000,
            data,
            owner: *program_id,
            executable: false,
            rent_epoch: 0,
        },
    );
}

fn reject(reason: &str) -> Effect {
    Effect::Reject(format!("custom program error: {}", reason))
}

/// Ledger handler that runs the program's entry points.
pub fn handler(program_id: Pubkey) -> impl Fn(&mut Accounts, &Instruction) -> Effect + Send + Sync {
    move |accounts: &mut Accounts, ix: &Instruction| {
        if ix.program_id != program_id {
            return Effect::Land;
        }
        if ix.data.len() < 8 {
            return reject("InstructionDidNotDeserialize");
        }
        let (tag, mut body) = ix.data.split_at(8);
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|a| a.pubkey).collect();
        let tag: [u8; 8] = match tag.try_into() {
            Ok(tag) => tag,
            Err(_) => return reject("InstructionDidNotDeserialize"),
        };

        if tag == anchor_discriminator("initialize_pool") {
            match InitializePoolArgs::deserialize(&mut body) {
                Ok(args) => initialize_pool(accounts, &keys, args.p, &program_id),
                Err(_) => reject("InstructionDidNotDeserialize"),
            }
        } else if tag == anchor_discriminator("post_yields_and_update") {
            match PostYieldsArgs::deserialize(&mut body) {
                Ok(args) => post_yields(accounts, &keys, args, &program_id),
                Err(_) => reject("InstructionDidNotDeserialize"),
            }
        } else if tag == anchor_discriminator("add_liquidity") {
            match AddLiquidityArgs::deserialize(&mut body) {
                Ok(args) => add_liquidity(accounts, &keys, args, &program_id),
                Err(_) => reject("InstructionDidNotDeserialize"),
            }
        } else if tag == anchor_discriminator("init_orderbook") {
            match InitOrderbookArgs::deserialize(&mut body) {
                Ok(args) => init_orderbook(accounts, &keys, args, &program_id),
                Err(_) => reject("InstructionDidNotDeserialize"),
            }
        } else if tag == anchor_discriminator("place_order") {
            match PlaceOrderArgs::deserialize(&mut body) {
                Ok(args) => place_order(accounts, &keys, args, &program_id),
                Err(_) => reject("InstructionDidNotDeserialize"),
            }
        } else {
            reject("InstructionFallbackNotFound")
        }
    }
}

fn initialize_pool(
    accounts: &mut Accounts,
    keys: &[Pubkey],
    p: InitParamsV3,
    program_id: &Pubkey,
) -> Effect {
    let [_, mint_a, mint_b, pool, vault_a, vault_b, treasury_a, treasury_b, ..] = *keys else {
        return reject("AccountNotEnoughKeys");
    };
    if accounts.contains_key(&pool) {
        return reject("AccountAlreadyInitialized");
    }
    let Ok(derived) = pda::find_pool(&mint_a, &mint_b, program_id) else {
        return reject("ConstraintSeeds");
    };
    if derived.address != pool {
        return reject("ConstraintSeeds");
    }

    for (address, mint) in [
        (vault_a, mint_a),
        (vault_b, mint_b),
        (treasury_a, mint_a),
        (treasury_b, mint_b),
    ] {
        accounts.insert(address, token_account(&mint, &pool, 0));
    }

    let state = Pool {
        version: POOL_VERSION,
        bump: derived.bump,
        admin_threshold: p.admin_threshold,
        admins: p.admins,
        risk_admin: p.risk_admin,
        ops_admin: p.ops_admin,
        fee_admin: p.fee_admin,
        mint_a,
        mint_b,
        vault_a,
        vault_b,
        treasury_a,
        treasury_b,
        updater: p.updater,
        oracle_signer: p.oracle_signer,
        base_width_bps: p.base_width_bps,
        min_width_bps: p.min_width_bps,
        max_width_bps: p.max_width_bps,
        width_slope_per_kbps: p.width_slope_per_kbps,
        bias_per_kbps: p.bias_per_kbps,
        decay_per_band_bps: p.decay_per_band_bps,
        n_bands: p.n_bands,
        y_a_bps: p.initial_y_a_bps,
        y_b_bps: p.initial_y_b_bps,
        spot_price_1e6: p.initial_spot_price_1e6,
        ema_y_a_bps: p.initial_y_a_bps,
        ema_y_b_bps: p.initial_y_b_bps,
        ema_spot_1e6: p.initial_spot_price_1e6,
        alpha_y_bps: p.alpha_y_bps,
        alpha_spot_bps: p.alpha_spot_bps,
        alpha_twap_bps: p.alpha_twap_bps,
        alpha_vol_bps: p.alpha_vol_bps,
        twap_center_1e6: p.initial_spot_price_1e6,
        max_twap_dev_bps: p.max_twap_dev_bps,
        vol_ema_bps: 0,
        fee_base_bps: p.fee_base_bps,
        fee_k_per_bps: p.fee_k_per_bps,
        fee_max_bps: p.fee_max_bps,
        fee_current_bps: p.fee_base_bps,
        maker_rebate_max_bps: p.maker_rebate_max_bps,
        taker_min_bps: p.taker_min_bps,
        max_center_move_bps: p.max_center_move_bps,
        max_width_change_bps: p.max_width_change_bps,
        max_weight_shift_bps: p.max_weight_shift_bps,
        min_update_interval_slots: p.min_update_interval_slots,
        last_update_slot: 0,
        hyst_center_bps: p.hyst_center_bps,
        hyst_width_bps: p.hyst_width_bps,
        hyst_required_n: p.hyst_required_n,
        hyst_ctr_center: 0,
        hyst_ctr_width: 0,
        deposit_ratio_min_bps: p.deposit_ratio_min_bps,
        deposit_ratio_max_bps: p.deposit_ratio_max_bps,
        inactive_floor_a: p.inactive_floor_a,
        inactive_floor_b: p.inactive_floor_b,
        bounty_rate_microunits: p.bounty_rate_microunits,
        bounty_max: p.bounty_max,
        stale_slots_for_boost: p.stale_slots_for_boost,
        bounty_boost_bps: p.bounty_boost_bps,
        needs_update: false,
        min_cu_price: p.min_cu_price,
        last_width_bps: p.base_width_bps,
        last_center_price_1e6: p.initial_spot_price_1e6,
        total_weight_bps: 10_000,
        is_paused: false,
        pause_bands: false,
        pause_deposits: false,
        pause_withdraws: false,
        pause_orderbook: false,
        post_only_until_slot: 0,
        g_pending: None,
        proposed_mint_a: None,
        proposed_mint_b: None,
        stp_mode: p.stp_mode as u8,
        route_mode: p.route_mode as u8,
        best_bid_1e6: 0,
        best_ask_1e6: 0,
        book_depth_bps: 0,
        bands: (0..p.n_bands)
            .map(|_| Band {
                weight_bps: 10_000 / u16::from(p.n_bands.max(1)),
                is_active: true,
                ..<_>::default()
            })
            .collect(),
        reserved: [0; 128],
    };
    write(accounts, pool, &state, program_id);
    Effect::Land
}

fn post_yields(
    accounts: &mut Accounts,
    keys: &[Pubkey],
    args: PostYieldsArgs,
    program_id: &Pubkey,
) -> Effect {
    let [_, _, pool, _, _, caller_ata_a, caller_ata_b, ..] = *keys else {
        return reject("AccountNotEnoughKeys");
    };
    let Some(mut state) = read::<Pool>(accounts, &pool) else {
        return reject("AccountNotInitialized");
    };
    if !accounts.contains_key(&caller_ata_a) || !accounts.contains_key(&caller_ata_b) {
        return reject("AccountNotInitialized");
    }
    state.y_a_bps = args.y_a_bps;
    state.y_b_bps = args.y_b_bps;
    state.spot_price_1e6 = args.spot_price_1e6;
    state.last_update_slot += 1;
    write(accounts, pool, &state, program_id);
    Effect::Land
}

fn add_liquidity(
    accounts: &mut Accounts,
    keys: &[Pubkey],
    args: AddLiquidityArgs,
    program_id: &Pubkey,
) -> Effect {
    let [user, pool, _, _, user_ata_a, user_ata_b, position, ..] = *keys else {
        return reject("AccountNotEnoughKeys");
    };
    let Some(mut state) = read::<Pool>(accounts, &pool) else {
        return reject("AccountNotInitialized");
    };
    if !accounts.contains_key(&user_ata_a) || !accounts.contains_key(&user_ata_b) {
        return reject("AccountNotInitialized");
    }
    let Ok(derived) = pda::find_position(&pool, &user, args.receipt_nonce, program_id) else {
        return reject("ConstraintSeeds");
    };
    if derived.address != position {
        return reject("ConstraintSeeds");
    }
    if accounts.contains_key(&position) {
        return reject("AccountAlreadyInitialized");
    }
    let Some(band) = state.bands.get_mut(args.band_idx as usize) else {
        return reject("InvalidBand");
    };
    let shares = args.amount_a.max(args.amount_b);
    if shares == 0 {
        return reject("ZeroAmount");
    }
    band.reserves_a += args.amount_a;
    band.reserves_b += args.amount_b;
    band.total_shares += shares;

    let receipt = Position {
        bump: derived.bump,
        pool,
        owner: user,
        band_idx: args.band_idx,
        shares,
        last_fee_growth_a_1e18: band.fee_growth_a_1e18,
        last_fee_growth_b_1e18: band.fee_growth_b_1e18,
        receipt_nonce: args.receipt_nonce,
        min_unlock_slot: state.last_update_slot + args.min_unlock_after_slots,
        approved: None,
    };
    write(accounts, pool, &state, program_id);
    write(accounts, position, &receipt, program_id);
    Effect::Land
}

fn init_orderbook(
    accounts: &mut Accounts,
    keys: &[Pubkey],
    args: InitOrderbookArgs,
    program_id: &Pubkey,
) -> Effect {
    let [_, pool, orderbook, ..] = *keys else {
        return reject("AccountNotEnoughKeys");
    };
    let Some(state) = read::<Pool>(accounts, &pool) else {
        return reject("AccountNotInitialized");
    };
    if accounts.contains_key(&orderbook) {
        return reject("AccountAlreadyInitialized");
    }
    let Ok(derived) = pda::find_orderbook(&pool, program_id) else {
        return reject("ConstraintSeeds");
    };
    let levels = |_| PriceLevel::default();
    let book = OrderBook {
        bump: derived.bump,
        pool,
        tick_1e6: args.tick_1e6,
        best_bid_band: -1,
        best_ask_band: -1,
        next_order_id: 1,
        bids: (0..state.n_bands).map(levels).collect(),
        asks: (0..state.n_bands).map(levels).collect(),
        event_q_head: 0,
        event_q: Vec::new(),
        max_levels: args.max_levels.max(u16::from(state.n_bands)),
        max_queue_per_level: 32,
    };
    write(accounts, orderbook, &book, program_id);
    Effect::Land
}

fn place_order(
    accounts: &mut Accounts,
    keys: &[Pubkey],
    args: PlaceOrderArgs,
    program_id: &Pubkey,
) -> Effect {
    let [user, _, orderbook, ..] = *keys else {
        return reject("AccountNotEnoughKeys");
    };
    let Some(mut book) = read::<OrderBook>(accounts, &orderbook) else {
        return reject("AccountNotInitialized");
    };
    if args.qty == 0 {
        return reject("ZeroAmount");
    }
    let order_id = book.next_order_id;
    book.next_order_id += 1;
    book.event_q.push(BookEvent::Place {
        order_id,
        side: args.side,
        band_idx: 0,
        owner: user,
        qty: args.qty,
        client_id: args.client_id,
        tif_expiry: args.tif.gtt_expiry_slot,
        reduce_only: args.reduce_only,
    });
    write(accounts, orderbook, &book, program_id);
    Effect::Land
}

/// Operation context over a simulated program with the bundled interface.
pub fn context() -> (Context, Arc<MockLedger>) {
    let program = crate::remote_program(&<_>::default()).unwrap();
    context_with(program)
}

pub fn context_with(program: RemoteProgram) -> (Context, Arc<MockLedger>) {
    let ledger = Arc::new(MockLedger::with_handler(handler(program.program_id())));
    let env = RuntimeEnvironment::new(
        ledger.clone(),
        Arc::new(program),
        Keypair::new(),
        <_>::default(),
    )
    .with_confirm_settings(ConfirmSettings {
        timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(1),
    });
    (Context::new(Arc::new(env)), ledger)
}

/// The bundled interface with `edit` applied to its JSON.
pub fn edited_program(edit: impl FnOnce(&mut serde_json::Value)) -> RemoteProgram {
    let mut json: serde_json::Value = serde_json::from_str(crate::IDL_JSON).unwrap();
    edit(&mut json);
    let idl = Idl::from_json(&json.to_string()).unwrap();
    RemoteProgram::new(crate::PROGRAM_ID, idl)
}
