//! Account layouts owned by the program.

use crate::args::{RouteMode, Side, StpMode, MAX_ADMINS};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

/// Layout version written by `initialize_pool`.
pub const POOL_VERSION: u8 = 3;

/// Account type name as declared in the interface description.
pub trait ProgramAccount: BorshDeserialize {
    const NAME: &'static str;
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub version: u8,
    pub bump: u8,

    pub admin_threshold: u8,
    pub admins: [Pubkey; MAX_ADMINS],

    pub risk_admin: Pubkey,
    pub ops_admin: Pubkey,
    pub fee_admin: Pubkey,

    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub treasury_a: Pubkey,
    pub treasury_b: Pubkey,

    pub updater: Pubkey,
    pub oracle_signer: Option<Pubkey>,

    pub base_width_bps: u16,
    pub min_width_bps: u16,
    pub max_width_bps: u16,
    pub width_slope_per_kbps: u16,
    pub bias_per_kbps: u16,
    pub decay_per_band_bps: u16,
    pub n_bands: u8,

    pub y_a_bps: u16,
    pub y_b_bps: u16,
    pub spot_price_1e6: u64,
    pub ema_y_a_bps: u16,
    pub ema_y_b_bps: u16,
    pub ema_spot_1e6: u64,
    pub alpha_y_bps: u16,
    pub alpha_spot_bps: u16,
    pub alpha_twap_bps: u16,
    pub alpha_vol_bps: u16,
    pub twap_center_1e6: u64,
    pub max_twap_dev_bps: u16,
    pub vol_ema_bps: u16,

    pub fee_base_bps: u16,
    pub fee_k_per_bps: u16,
    pub fee_max_bps: u16,
    pub fee_current_bps: u16,
    pub maker_rebate_max_bps: u16,
    pub taker_min_bps: u16,

    pub max_center_move_bps: u16,
    pub max_width_change_bps: u16,
    pub max_weight_shift_bps: u16,
    pub min_update_interval_slots: u32,
    pub last_update_slot: u64,

    pub hyst_center_bps: u16,
    pub hyst_width_bps: u16,
    pub hyst_required_n: u8,
    pub hyst_ctr_center: u8,
    pub hyst_ctr_width: u8,

    pub deposit_ratio_min_bps: u16,
    pub deposit_ratio_max_bps: u16,

    pub inactive_floor_a: u64,
    pub inactive_floor_b: u64,

    pub bounty_rate_microunits: u64,
    pub bounty_max: u64,
    pub stale_slots_for_boost: u64,
    pub bounty_boost_bps: u16,
    pub needs_update: bool,
    pub min_cu_price: u64,

    pub last_width_bps: u16,
    pub last_center_price_1e6: u64,
    pub total_weight_bps: u32,

    pub is_paused: bool,
    pub pause_bands: bool,
    pub pause_deposits: bool,
    pub pause_withdraws: bool,
    pub pause_orderbook: bool,
    pub post_only_until_slot: u64,

    /// Timelocked parameter change, if one is queued.
    pub g_pending: Option<GovProposal>,

    pub proposed_mint_a: Option<Pubkey>,
    pub proposed_mint_b: Option<Pubkey>,

    pub stp_mode: u8,
    pub route_mode: u8,
    pub best_bid_1e6: u64,
    pub best_ask_1e6: u64,
    pub book_depth_bps: u16,

    pub bands: Vec<Band>,

    pub reserved: [u8; 128],
}

impl ProgramAccount for Pool {
    const NAME: &'static str = "Pool";
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Band {
    pub lower_price_1e6: u64,
    pub upper_price_1e6: u64,
    pub weight_bps: u16,
    pub fee_growth_a_1e18: u128,
    pub fee_growth_b_1e18: u128,
    pub reserves_a: u64,
    pub reserves_b: u64,
    pub total_shares: u64,
    pub util_a: u64,
    pub util_b: u64,
    pub is_active: bool,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct GovProposal {
    pub new: SettableParamsV3,
    pub queued_at: u64,
    pub earliest_exec: u64,
    pub deadline: u64,
    pub executed: bool,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SettableParamsV3 {
    pub n_bands: Option<u8>,
    pub base_width_bps: Option<u16>,
    pub min_width_bps: Option<u16>,
    pub max_width_bps: Option<u16>,
    pub width_slope_per_kbps: Option<u16>,
    pub bias_per_kbps: Option<u16>,
    pub decay_per_band_bps: Option<u16>,

    pub alpha_y_bps: Option<u16>,
    pub alpha_spot_bps: Option<u16>,
    pub alpha_twap_bps: Option<u16>,
    pub alpha_vol_bps: Option<u16>,
    pub max_twap_dev_bps: Option<u16>,

    pub fee_base_bps: Option<u16>,
    pub fee_k_per_bps: Option<u16>,
    pub fee_max_bps: Option<u16>,

    pub hyst_center_bps: Option<u16>,
    pub hyst_width_bps: Option<u16>,
    pub hyst_required_n: Option<u8>,

    pub deposit_ratio_min_bps: Option<u16>,
    pub deposit_ratio_max_bps: Option<u16>,

    pub inactive_floor_a: Option<u64>,
    pub inactive_floor_b: Option<u64>,

    pub bounty_rate_microunits: Option<u64>,
    pub bounty_max: Option<u64>,
    pub stale_slots_for_boost: Option<u64>,
    pub bounty_boost_bps: Option<u16>,
    pub min_cu_price: Option<u64>,

    pub max_center_move_bps: Option<u16>,
    pub max_width_change_bps: Option<u16>,
    pub max_weight_shift_bps: Option<u16>,
    pub min_update_interval_slots: Option<u32>,

    pub maker_rebate_max_bps: Option<u16>,
    pub taker_min_bps: Option<u16>,
    pub stp_mode: Option<StpMode>,
    pub route_mode: Option<RouteMode>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub bump: u8,
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub band_idx: u8,
    pub shares: u64,
    pub last_fee_growth_a_1e18: u128,
    pub last_fee_growth_b_1e18: u128,
    pub receipt_nonce: u64,
    pub min_unlock_slot: u64,
    pub approved: Option<Pubkey>,
}

impl ProgramAccount for Position {
    const NAME: &'static str = "Position";
}

impl Position {
    pub const SIZE: usize = 1 + 32 + 32 + 1 + 8 + 16 + 16 + 8 + 8 + 1 + 32;
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderBook {
    pub bump: u8,
    pub pool: Pubkey,
    pub tick_1e6: u64,
    /// -1 when the side is empty.
    pub best_bid_band: i16,
    pub best_ask_band: i16,
    pub next_order_id: u64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub event_q_head: u16,
    pub event_q: Vec<BookEvent>,
    pub max_levels: u16,
    pub max_queue_per_level: u16,
}

impl ProgramAccount for OrderBook {
    const NAME: &'static str = "OrderBook";
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceLevel {
    pub band_idx: i16,
    pub total_qty: u64,
    pub head: u32,
    pub tail: u32,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum BookEvent {
    Fill {
        order_id: u64,
        qty: u64,
        price_1e6: u64,
        side: Side,
    },
    Out {
        order_id: u64,
        reason: u8,
    },
    Place {
        order_id: u64,
        side: Side,
        band_idx: i16,
        owner: Pubkey,
        qty: u64,
        client_id: u64,
        tif_expiry: u64,
        reduce_only: bool,
    },
}
