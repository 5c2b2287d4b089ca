//! Seed vocabulary of the program. Every seed tuple starts with the `v3` namespace tag.

use dlmm_lib::{derive::find_program_address, DerivedAddress, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::{pubkey, pubkey::Pubkey};

pub const PROGRAM_ID: Pubkey = pubkey!("ebvdBEBKz6UK1Xs9mnGs7TsR2vgKyPP2idaFEqGRTRQ");

pub const NAMESPACE: &[u8] = b"v3";
pub const POOL: &[u8] = b"pool";
pub const VAULT: &[u8] = b"vault";
pub const TREASURY: &[u8] = b"treasury";
pub const ORDERBOOK: &[u8] = b"orderbook";
pub const POSITION: &[u8] = b"pos";
pub const METRICS: &[u8] = b"metrics";

/// Pool PDA: seeds = ["v3", "pool", mint_a, mint_b]
pub fn find_pool(mint_a: &Pubkey, mint_b: &Pubkey, program_id: &Pubkey) -> Result<DerivedAddress> {
    find_program_address(
        &[NAMESPACE, POOL, mint_a.as_ref(), mint_b.as_ref()],
        program_id,
    )
}

/// Vault PDA: seeds = ["v3", "vault", pool, mint]
pub fn find_vault(pool: &Pubkey, mint: &Pubkey, program_id: &Pubkey) -> Result<DerivedAddress> {
    find_program_address(&[NAMESPACE, VAULT, pool.as_ref(), mint.as_ref()], program_id)
}

/// Treasury PDA: seeds = ["v3", "treasury", pool, mint]
pub fn find_treasury(pool: &Pubkey, mint: &Pubkey, program_id: &Pubkey) -> Result<DerivedAddress> {
    find_program_address(
        &[NAMESPACE, TREASURY, pool.as_ref(), mint.as_ref()],
        program_id,
    )
}

/// Order book PDA: seeds = ["v3", "orderbook", pool]
pub fn find_orderbook(pool: &Pubkey, program_id: &Pubkey) -> Result<DerivedAddress> {
    find_program_address(&[NAMESPACE, ORDERBOOK, pool.as_ref()], program_id)
}

/// Position PDA: seeds = ["v3", "pos", pool, owner, le64(nonce)]
pub fn find_position(
    pool: &Pubkey,
    owner: &Pubkey,
    receipt_nonce: u64,
    program_id: &Pubkey,
) -> Result<DerivedAddress> {
    find_program_address(
        &[
            NAMESPACE,
            POSITION,
            pool.as_ref(),
            owner.as_ref(),
            &receipt_nonce.to_le_bytes(),
        ],
        program_id,
    )
}

/// Metrics ring PDA: seeds = ["v3", "metrics", pool]
pub fn find_metrics(pool: &Pubkey, program_id: &Pubkey) -> Result<DerivedAddress> {
    find_program_address(&[NAMESPACE, METRICS, pool.as_ref()], program_id)
}

/// Every address a pool owns.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAddresses {
    #[serde_as(as = "DisplayFromStr")]
    pub pool: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub vault_a: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub vault_b: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub treasury_a: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub treasury_b: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub orderbook: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub metrics: Pubkey,
}

impl PoolAddresses {
    pub fn derive(mint_a: &Pubkey, mint_b: &Pubkey, program_id: &Pubkey) -> Result<Self> {
        let pool = find_pool(mint_a, mint_b, program_id)?.address;
        Ok(Self {
            pool,
            vault_a: find_vault(&pool, mint_a, program_id)?.address,
            vault_b: find_vault(&pool, mint_b, program_id)?.address,
            treasury_a: find_treasury(&pool, mint_a, program_id)?.address,
            treasury_b: find_treasury(&pool, mint_b, program_id)?.address,
            orderbook: find_orderbook(&pool, program_id)?.address,
            metrics: find_metrics(&pool, program_id)?.address,
        })
    }
}
