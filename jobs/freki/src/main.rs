/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use bigdecimal::BigDecimal;
use shillzzz_gungnir::{
    Engine, EngineConfig, NewBoosterPack, NullNotifier, PaymentConfig, PgStore, PotConfig,
    PriceCache, RankingBasis, SystemClock,
};
use shillzzz_hugin::{CoinGeckoSource, SolanaRpcVerifier};
use std::env;
use std::sync::Arc;
use structopt::StructOpt;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

#[derive(Debug, StructOpt)]
#[structopt(
    name = "freki",
    about = "Scheduled jobs for the Shillzzz weekly pot, shills and booster catalog."
)]
struct Opt {
    #[structopt(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[structopt(long, default_value = "2")]
    pool_size: u32,

    #[structopt(long, default_value = "40")]
    take_rate_percent: u32,

    #[structopt(long, default_value = "all_time_shills", help = "all_time_shills or weekly_shills")]
    ranking: RankingBasis,

    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    utc_offset_minutes: i32,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Freeze the current weekly pot and its winners
    Snapshot,
    /// Purge week-old shills and expire stale boosters
    Cleanup,
    /// Rebuild daily and weekly shill counters
    Counters,
    /// Print the current weekly pot
    Pot,
    /// List booster packs
    Packs,
    /// Add a booster pack to the catalog
    AddPack {
        #[structopt(long)]
        name: String,
        #[structopt(long)]
        price_sol: BigDecimal,
        #[structopt(long)]
        multiplier: i32,
        #[structopt(long)]
        duration_hours: i32,
    },
}

fn engine(opt: &Opt) -> Result<Engine> {
    let store = PgStore::connect(&opt.database_url, opt.pool_size)?;
    let price_url = env::var("PRICE_URL")
        .unwrap_or_else(|_| shillzzz_hugin::price::COINGECKO_SOL_USD.to_string());
    let rpc_url = env::var("SOLANA_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());

    Ok(Engine {
        store: Arc::new(store),
        clock: Arc::new(SystemClock),
        prices: Arc::new(PriceCache::new(Arc::new(CoinGeckoSource::new(&price_url)))),
        verifier: Arc::new(SolanaRpcVerifier::new(&rpc_url)),
        notifier: Arc::new(NullNotifier),
        config: EngineConfig {
            payments: PaymentConfig {
                treasury_wallet: env::var("TREASURY_WALLET").unwrap_or_default(),
                allow_test_payments: false,
            },
            pot: PotConfig {
                take_rate_percent: opt.take_rate_percent,
                ranking: opt.ranking,
                utc_offset_minutes: opt.utc_offset_minutes,
                ..Default::default()
            },
        },
    })
}

fn print<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "freki=info");
    }
    pretty_env_logger::init();

    let opt = Opt::from_args();
    let engine = engine(&opt)?;

    match opt.cmd {
        Command::Snapshot => {
            let outcome = engine.take_weekly_snapshot().await?;
            match outcome.snapshot_id() {
                Some(id) if outcome.created() => log::info!("snapshot {id} created"),
                Some(id) => log::info!("snapshot {id} already covers the current pot"),
                None => log::info!("pot below the snapshot minimum, nothing stored"),
            }
            print(&outcome)?;
        }
        Command::Cleanup => print(&engine.cleanup()?)?,
        Command::Counters => {
            let updated = engine.recompute_counters()?;
            log::info!("updated counters of {updated} users");
        }
        Command::Pot => print(&engine.weekly_pot().await?)?,
        Command::Packs => print(&engine.booster_catalog()?)?,
        Command::AddPack {
            name,
            price_sol,
            multiplier,
            duration_hours,
        } => {
            let pack = engine.add_booster_pack(&NewBoosterPack {
                name,
                price_sol,
                multiplier,
                duration_hours,
            })?;
            log::info!("added booster pack {} ({})", pack.id, pack.name);
            print(&pack)?;
        }
    }
    Ok(())
}
