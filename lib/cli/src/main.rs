#![allow(clippy::print_stdout)]

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use cmds_dlmm::{
    args::{InitParamsV3, Side, TimeInForce},
    ops::{self, Context},
    pda::{self, PoolAddresses},
};
use dlmm_lib::{
    config::SolanaClientConfig,
    runtime::{AnchorProviderEnv, ConfigSource},
    ClientConfig, Pubkey, RuntimeResolver, SolanaNet,
};
use serde::Serialize;
use std::{path::PathBuf, str::FromStr, sync::Arc};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dlmm", version, about = "Client for the yield-sensitive DLMM program")]
struct Args {
    /// Path to a TOML config file, `-` for STDIN
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// RPC URL or cluster name (localnet, devnet, testnet, mainnet-beta)
    #[arg(long, short)]
    url: Option<String>,
    /// Payer keypair file
    #[arg(long, short)]
    keypair: Option<PathBuf>,
    /// Program id, overrides the interface description's address
    #[arg(long)]
    program_id: Option<Pubkey>,
    /// Interface description to load instead of the bundled one
    #[arg(long)]
    idl: Option<PathBuf>,
    /// Ignore ANCHOR_PROVIDER_URL and ANCHOR_WALLET
    #[arg(long)]
    no_anchor_env: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct Mints {
    /// First mint of the pair
    mint_a: Pubkey,
    /// Second mint of the pair
    mint_b: Pubkey,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the payer address and balance
    #[command(visible_alias = "id")]
    Identity,
    /// Print the addresses derived for a pool, without touching the network
    Pda {
        #[command(flatten)]
        mints: Mints,
        /// Also derive the position of this owner
        #[arg(long)]
        owner: Option<Pubkey>,
        #[arg(long, default_value_t = 0)]
        nonce: u64,
    },
    /// Create a pool
    InitPool {
        #[command(flatten)]
        mints: Mints,
        /// JSON file with pool parameters, unset fields use defaults
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Post yields and the spot price
    PostYields {
        #[command(flatten)]
        mints: Mints,
        y_a_bps: u16,
        y_b_bps: u16,
        spot_price_1e6: u64,
        #[arg(long, default_value_t = 0)]
        cu_price: u64,
        /// Pass the metrics ring account
        #[arg(long)]
        metrics: bool,
        #[arg(long)]
        oracle_signer: Option<Pubkey>,
    },
    /// Deposit into a band
    AddLiquidity {
        #[command(flatten)]
        mints: Mints,
        amount_a: u64,
        amount_b: u64,
        #[arg(long, default_value_t = 0)]
        band: u8,
        #[arg(long, default_value_t = 0)]
        nonce: u64,
        #[arg(long, default_value_t = 0)]
        min_unlock_after_slots: u64,
    },
    /// Create the pool's order book
    InitOrderbook {
        #[command(flatten)]
        mints: Mints,
        tick_1e6: u64,
        #[arg(long, default_value_t = 0)]
        max_levels: u16,
    },
    /// Place a limit or market order
    PlaceOrder {
        #[command(flatten)]
        mints: Mints,
        /// bid or ask
        #[arg(value_parser = parse_side)]
        side: Side,
        qty: u64,
        /// Limit price, market order when absent
        #[arg(long)]
        price_1e6: Option<u64>,
        /// Immediate or cancel
        #[arg(long, conflicts_with = "expiry_slot")]
        ioc: bool,
        /// Good till this slot
        #[arg(long)]
        expiry_slot: Option<u64>,
        #[arg(long)]
        post_only: bool,
        #[arg(long)]
        reduce_only: bool,
        #[arg(long, default_value_t = 0)]
        client_id: u64,
    },
    /// Show a pool
    ViewPool {
        #[command(flatten)]
        mints: Mints,
    },
    /// Show a liquidity position
    ViewPosition {
        #[command(flatten)]
        mints: Mints,
        /// Defaults to the payer
        #[arg(long)]
        owner: Option<Pubkey>,
        #[arg(long, default_value_t = 0)]
        nonce: u64,
    },
}

fn parse_side(s: &str) -> Result<Side, String> {
    match s {
        "bid" | "buy" => Ok(Side::Bid),
        "ask" | "sell" => Ok(Side::Ask),
        s => Err(format!("unknown side: {}", s)),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(args: &Args) -> ClientConfig {
    let mut config = ClientConfig::get_config(args.config.as_deref());
    if let Some(url) = &args.url {
        config.solana = match SolanaNet::from_str(url) {
            Ok(cluster) => SolanaClientConfig::for_cluster(cluster),
            Err(_) => SolanaClientConfig {
                url: url.clone(),
                cluster: SolanaNet::from_url(url).unwrap_or(SolanaNet::Localnet),
            },
        };
    }
    if let Some(path) = &args.keypair {
        config.keypair_path = Some(path.clone());
    }
    if args.program_id.is_some() {
        config.program_id = args.program_id;
    }
    if let Some(path) = &args.idl {
        config.idl_path = Some(path.clone());
    }
    config
}

async fn connect(args: &Args, config: &ClientConfig) -> anyhow::Result<Context> {
    let program = cmds_dlmm::remote_program(config)?;
    tracing::info!("program {}", program.program_id());
    let mut resolver = RuntimeResolver::new(config.clone()).with_program(Arc::new(program));
    // explicit flags win over the anchor environment
    if !args.no_anchor_env && args.url.is_none() && args.keypair.is_none() {
        resolver = resolver.with_source(AnchorProviderEnv::from_env());
    }
    let env = resolver
        .with_source(ConfigSource::new(config.clone()))
        .resolve()
        .await?;
    Ok(Context::new(env))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args);

    if let Commands::Pda { mints, owner, nonce } = &args.command {
        let program_id = cmds_dlmm::remote_program(&config)?.program_id();
        let addresses = PoolAddresses::derive(&mints.mint_a, &mints.mint_b, &program_id)?;
        print_json(&addresses)?;
        if let Some(owner) = owner {
            let position = pda::find_position(&addresses.pool, owner, *nonce, &program_id)?;
            println!("position: {} (bump {})", position.address, position.bump);
        }
        return Ok(());
    }

    let ctx = connect(&args, &config).await?;
    match args.command {
        Commands::Pda { .. } => {}
        Commands::Identity => {
            print_json(&ops::show_identity::run(&ctx).await?)?;
        }
        Commands::InitPool { mints, params } => {
            let params = match params {
                Some(path) => {
                    let s = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str::<InitParamsV3>(&s)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => InitParamsV3::default(),
            };
            let output = ops::initialize_pool::run(
                &ctx,
                ops::initialize_pool::Input {
                    mint_a: mints.mint_a,
                    mint_b: mints.mint_b,
                    params,
                },
            )
            .await?;
            print_json(&output)?;
        }
        Commands::PostYields {
            mints,
            y_a_bps,
            y_b_bps,
            spot_price_1e6,
            cu_price,
            metrics,
            oracle_signer,
        } => {
            let output = ops::post_yields_and_update::run(
                &ctx,
                ops::post_yields_and_update::Input {
                    mint_a: mints.mint_a,
                    mint_b: mints.mint_b,
                    y_a_bps,
                    y_b_bps,
                    spot_price_1e6,
                    cu_price_micro_lamports: cu_price,
                    with_metrics: metrics,
                    oracle_signer,
                },
            )
            .await?;
            print_json(&output)?;
        }
        Commands::AddLiquidity {
            mints,
            amount_a,
            amount_b,
            band,
            nonce,
            min_unlock_after_slots,
        } => {
            let output = ops::add_liquidity::run(
                &ctx,
                ops::add_liquidity::Input {
                    mint_a: mints.mint_a,
                    mint_b: mints.mint_b,
                    band_idx: band,
                    amount_a,
                    amount_b,
                    receipt_nonce: nonce,
                    min_unlock_after_slots,
                },
            )
            .await?;
            print_json(&output)?;
        }
        Commands::InitOrderbook {
            mints,
            tick_1e6,
            max_levels,
        } => {
            let output = ops::init_orderbook::run(
                &ctx,
                ops::init_orderbook::Input {
                    mint_a: mints.mint_a,
                    mint_b: mints.mint_b,
                    tick_1e6,
                    max_levels,
                },
            )
            .await?;
            print_json(&output)?;
        }
        Commands::PlaceOrder {
            mints,
            side,
            qty,
            price_1e6,
            ioc,
            expiry_slot,
            post_only,
            reduce_only,
            client_id,
        } => {
            let tif = match (ioc, expiry_slot) {
                (true, _) => TimeInForce::ImmediateOrCancel,
                (false, Some(slot)) => TimeInForce::GoodTillSlot(slot),
                (false, None) => TimeInForce::GoodTillCancel,
            };
            let output = ops::place_order::run(
                &ctx,
                ops::place_order::Input {
                    mint_a: mints.mint_a,
                    mint_b: mints.mint_b,
                    side,
                    qty,
                    limit_price_1e6: price_1e6,
                    tif,
                    post_only,
                    reduce_only,
                    client_id,
                },
            )
            .await?;
            print_json(&output)?;
        }
        Commands::ViewPool { mints } => {
            let view = ops::view_pool_state::run(
                &ctx,
                ops::view_pool_state::Input {
                    mint_a: mints.mint_a,
                    mint_b: mints.mint_b,
                },
            )
            .await?;
            match view {
                ops::view_pool_state::PoolView::Decoded { address, pool } => {
                    println!("pool: {}", address);
                    println!("{:#?}", pool);
                }
                ops::view_pool_state::PoolView::Address(address) => {
                    println!("pool: {}", address);
                }
            }
        }
        Commands::ViewPosition {
            mints,
            owner,
            nonce,
        } => {
            let output = ops::view_position::run(
                &ctx,
                ops::view_position::Input {
                    mint_a: mints.mint_a,
                    mint_b: mints.mint_b,
                    owner,
                    receipt_nonce: nonce,
                },
            )
            .await?;
            println!("position: {}", output.address);
            println!("{:#?}", output.position);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run(Args::parse()).await {
        tracing::error!("{:#}", error);
        std::process::exit(1);
    }
}
