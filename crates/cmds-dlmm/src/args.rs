//! Instruction arguments, borsh-encoded after the discriminator.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::pubkey::Pubkey;

pub const MAX_ADMINS: usize = 8;

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum StpMode {
    #[default]
    None,
    DecrementAndCancel,
    CancelNewest,
    CancelOldest,
}

#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    #[default]
    BookFirst,
    DlmmFirst,
}

/// Time in force as the program encodes it.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TifParam {
    pub kind: u8,
    pub gtt_expiry_slot: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    ImmediateOrCancel,
    #[default]
    GoodTillCancel,
    GoodTillSlot(u64),
}

impl From<TimeInForce> for TifParam {
    fn from(tif: TimeInForce) -> Self {
        match tif {
            TimeInForce::ImmediateOrCancel => TifParam {
                kind: 0,
                gtt_expiry_slot: 0,
            },
            TimeInForce::GoodTillCancel => TifParam {
                kind: 1,
                gtt_expiry_slot: 0,
            },
            TimeInForce::GoodTillSlot(slot) => TifParam {
                kind: 2,
                gtt_expiry_slot: slot,
            },
        }
    }
}

/// Pool creation parameters. Roles default to the default pubkey and are
/// usually filled in from the payer, see [`InitParamsV3::with_authority`].
#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct InitParamsV3 {
    #[serde_as(as = "[DisplayFromStr; MAX_ADMINS]")]
    pub admins: [Pubkey; MAX_ADMINS],
    pub admin_threshold: u8,
    #[serde_as(as = "DisplayFromStr")]
    pub risk_admin: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub ops_admin: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub fee_admin: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub updater: Pubkey,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub oracle_signer: Option<Pubkey>,

    pub n_bands: u8,
    pub base_width_bps: u16,
    pub min_width_bps: u16,
    pub max_width_bps: u16,
    pub width_slope_per_kbps: u16,
    pub bias_per_kbps: u16,
    pub decay_per_band_bps: u16,

    pub alpha_y_bps: u16,
    pub alpha_spot_bps: u16,
    pub alpha_twap_bps: u16,
    pub alpha_vol_bps: u16,
    pub max_twap_dev_bps: u16,

    pub fee_base_bps: u16,
    pub fee_k_per_bps: u16,
    pub fee_max_bps: u16,

    pub initial_y_a_bps: u16,
    pub initial_y_b_bps: u16,
    pub initial_spot_price_1e6: u64,

    pub hyst_center_bps: u16,
    pub hyst_width_bps: u16,
    pub hyst_required_n: u8,

    pub deposit_ratio_min_bps: u16,
    pub deposit_ratio_max_bps: u16,

    pub inactive_floor_a: u64,
    pub inactive_floor_b: u64,

    pub bounty_rate_microunits: u64,
    pub bounty_max: u64,
    pub stale_slots_for_boost: u64,
    pub bounty_boost_bps: u16,
    pub min_cu_price: u64,

    pub max_center_move_bps: u16,
    pub max_width_change_bps: u16,
    pub max_weight_shift_bps: u16,
    pub min_update_interval_slots: u32,

    pub maker_rebate_max_bps: u16,
    pub taker_min_bps: u16,
    pub stp_mode: StpMode,
    pub route_mode: RouteMode,
}

impl Default for InitParamsV3 {
    fn default() -> Self {
        Self {
            admins: [Pubkey::default(); MAX_ADMINS],
            admin_threshold: 1,
            risk_admin: Pubkey::default(),
            ops_admin: Pubkey::default(),
            fee_admin: Pubkey::default(),
            updater: Pubkey::default(),
            oracle_signer: None,
            n_bands: 8,
            base_width_bps: 1000,
            min_width_bps: 500,
            max_width_bps: 5000,
            width_slope_per_kbps: 10,
            bias_per_kbps: 0,
            decay_per_band_bps: 10,
            alpha_y_bps: 500,
            alpha_spot_bps: 500,
            alpha_twap_bps: 500,
            alpha_vol_bps: 500,
            max_twap_dev_bps: 500,
            fee_base_bps: 10,
            fee_k_per_bps: 0,
            fee_max_bps: 200,
            initial_y_a_bps: 500,
            initial_y_b_bps: 500,
            initial_spot_price_1e6: 1_000_000,
            hyst_center_bps: 10,
            hyst_width_bps: 10,
            hyst_required_n: 1,
            deposit_ratio_min_bps: 100,
            deposit_ratio_max_bps: 10_000,
            inactive_floor_a: 0,
            inactive_floor_b: 0,
            bounty_rate_microunits: 1,
            bounty_max: 1_000_000,
            stale_slots_for_boost: 100,
            bounty_boost_bps: 1000,
            min_cu_price: 0,
            max_center_move_bps: 100,
            max_width_change_bps: 100,
            max_weight_shift_bps: 100,
            min_update_interval_slots: 0,
            maker_rebate_max_bps: 5,
            taker_min_bps: 1,
            stp_mode: StpMode::None,
            route_mode: RouteMode::BookFirst,
        }
    }
}

impl InitParamsV3 {
    /// Single-admin setup: `authority` as first admin and in every unset role.
    pub fn with_authority(mut self, authority: Pubkey) -> Self {
        let unset = Pubkey::default();
        if self.admins.iter().all(|a| *a == unset) {
            self.admins[0] = authority;
        }
        for role in [
            &mut self.risk_admin,
            &mut self.ops_admin,
            &mut self.fee_admin,
            &mut self.updater,
        ] {
            if *role == unset {
                *role = authority;
            }
        }
        self
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct InitializePoolArgs {
    pub p: InitParamsV3,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostYieldsArgs {
    pub y_a_bps: u16,
    pub y_b_bps: u16,
    pub spot_price_1e6: u64,
    pub cu_price_micro_lamports: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityArgs {
    pub band_idx: u8,
    pub amount_a: u64,
    pub amount_b: u64,
    pub receipt_nonce: u64,
    pub min_unlock_after_slots: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOrderbookArgs {
    pub tick_1e6: u64,
    pub max_levels: u16,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceOrderArgs {
    pub side: Side,
    pub qty: u64,
    pub limit_price_opt_1e6: Option<u64>,
    pub tif: TifParam,
    pub post_only: bool,
    pub reduce_only: bool,
    pub client_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_order_layout() {
        let args = PlaceOrderArgs {
            side: Side::Ask,
            qty: 5,
            limit_price_opt_1e6: Some(1_000_000),
            tif: TimeInForce::GoodTillSlot(9).into(),
            post_only: true,
            reduce_only: false,
            client_id: 7,
        };
        let bytes = borsh::to_vec(&args).unwrap();
        let mut expected = vec![1u8];
        expected.extend_from_slice(&5u64.to_le_bytes());
        expected.push(1);
        expected.extend_from_slice(&1_000_000u64.to_le_bytes());
        expected.push(2);
        expected.extend_from_slice(&9u64.to_le_bytes());
        expected.extend_from_slice(&[1, 0]);
        expected.extend_from_slice(&7u64.to_le_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_init_params_len() {
        let bytes = borsh::to_vec(&InitParamsV3::default()).unwrap();
        // 8 admins, 5 role keys, no oracle signer, then the tunables
        assert_eq!(bytes.len(), 8 * 32 + 1 + 3 * 32 + 32 + 1 + 116);
    }

    #[test]
    fn test_with_authority() {
        let authority = Pubkey::new_unique();
        let params = InitParamsV3::default().with_authority(authority);
        assert_eq!(params.admins[0], authority);
        assert_eq!(params.admins[1], Pubkey::default());
        assert_eq!(params.updater, authority);

        let kept = Pubkey::new_unique();
        let params = InitParamsV3 {
            fee_admin: kept,
            ..<_>::default()
        }
        .with_authority(authority);
        assert_eq!(params.fee_admin, kept);
    }

    #[test]
    fn test_params_from_json() {
        let authority = Pubkey::new_unique();
        let json = format!(
            r#"{{ "updater": "{authority}", "n_bands": 4, "stp_mode": "cancel_newest" }}"#
        );
        let params: InitParamsV3 = serde_json::from_str(&json).unwrap();
        assert_eq!(params.updater, authority);
        assert_eq!(params.n_bands, 4);
        assert_eq!(params.stp_mode, StpMode::CancelNewest);
        assert_eq!(params.fee_max_bps, 200);
    }
}
