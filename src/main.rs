//! Binary entrypoint for the playerwarps admin CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and create the data directory
//! - `status` - print warp, owner and visit totals for the configured store
//! - `list [--owner <uuid>] [--json]` - list warps ranked by visits
//! - `show <warp>` - print one warp in full
//! - `transfer <warp> <player>` - hand a warp to another player
//! - `rename <warp> <name>` - rename a warp, keeping per-owner uniqueness
//! - `delete <warp>` - delete a warp (no refund)
//! - `reset-visits <warp>` - zero a warp's visit counter
//! - `ban <owner> <player>` / `unban <owner> <player>` / `bans <owner>`
//!
//! Warps and players are addressed by UUID. See the library crate docs for
//! module-level details: `playerwarps::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;

use playerwarps::config::Config;
use playerwarps::warps::{PlayerId, SledWarpStore, Warp, WarpId, WarpRegistry};

#[derive(Parser)]
#[command(name = "playerwarps")]
#[command(about = "Administer a player warp registry")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the data directory
    Init,
    /// Show registry statistics
    Status,
    /// List warps, most visited first
    List {
        /// Only warps owned by this player
        #[arg(short, long)]
        owner: Option<PlayerId>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show a single warp
    Show { warp: WarpId },
    /// Transfer a warp to a new owner
    Transfer { warp: WarpId, new_owner: PlayerId },
    /// Rename a warp
    Rename { warp: WarpId, name: String },
    /// Delete a warp
    Delete { warp: WarpId },
    /// Reset a warp's visit counter to zero
    ResetVisits { warp: WarpId },
    /// Ban a player from an owner's warps
    Ban { owner: PlayerId, player: PlayerId },
    /// Lift a ban
    Unban { owner: PlayerId, player: PlayerId },
    /// List the players an owner has banned
    Bans { owner: PlayerId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        let config = Config::load(&cli.config).await?;
        tokio::fs::create_dir_all(&config.storage.data_dir).await?;
        info!("Configuration file created at {}", cli.config);
        info!("Data directory ready at {}", config.storage.data_dir);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    let db_path = config.storage.warp_db_path();
    let store = SledWarpStore::open(&db_path)?;
    let mut registry = WarpRegistry::open(store)?.with_default_icon(config.warps.default_icon()?);

    match cli.command {
        // Written before the store is opened
        Commands::Init => {}
        Commands::Status => {
            let owners = registry.owner_ids();
            let total_visits: u64 = registry.list_all().iter().map(Warp::visits).sum();
            println!("Store:        {}", db_path.display());
            println!("Warps:        {}", registry.store().warp_count());
            println!("Owners:       {}", owners.len());
            println!("Total visits: {}", total_visits);
            let table = config.warps.price_table();
            println!("Max warps per player: {}", table.max_warps());
        }
        Commands::List { owner, json } => {
            let mut warps = registry.ranked();
            if let Some(owner) = owner {
                warps.retain(|w| w.owner() == owner);
            }
            if json {
                let rows: Vec<serde_json::Value> = warps.iter().map(warp_json).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if warps.is_empty() {
                println!("No warps.");
            } else {
                for (rank, warp) in warps.iter().enumerate() {
                    println!(
                        "{:>3}. {:<24} {:>6} visits  owner {}  [{}]",
                        rank + 1,
                        warp.name(),
                        warp.visits(),
                        warp.owner(),
                        warp.id()
                    );
                }
            }
        }
        Commands::Show { warp } => {
            let found = registry
                .find_by_id(warp)
                .ok_or_else(|| anyhow!("No warp with id {}", warp))?;
            println!("{}", serde_json::to_string_pretty(&warp_json(found))?);
        }
        Commands::Transfer { warp, new_owner } => {
            let updated = registry.transfer_ownership(warp, new_owner)?;
            println!("'{}' now belongs to {}", updated.name(), updated.owner());
        }
        Commands::Rename { warp, name } => {
            let updated = registry.rename(warp, &name)?;
            println!("Renamed {} to '{}'", updated.id(), updated.name());
        }
        Commands::Delete { warp } => {
            if registry.remove_by_id(warp)? {
                println!("Deleted {}", warp);
            } else {
                println!("No warp with id {}", warp);
            }
        }
        Commands::ResetVisits { warp } => {
            let updated = registry.reset_visits(warp)?;
            println!("Visits for '{}' reset", updated.name());
        }
        Commands::Ban { owner, player } => {
            if registry.ban(owner, player)? {
                println!("{} is now banned from {}'s warps", player, owner);
            } else {
                println!("{} was already banned", player);
            }
        }
        Commands::Unban { owner, player } => {
            if registry.unban(owner, player)? {
                println!("{} is no longer banned from {}'s warps", player, owner);
            } else {
                println!("{} was not banned", player);
            }
        }
        Commands::Bans { owner } => {
            let banned = registry.banned_ids(owner);
            if banned.is_empty() {
                println!("{} has not banned anyone.", owner);
            }
            for player in banned {
                println!("{}", player);
            }
        }
    }

    Ok(())
}

fn warp_json(warp: &Warp) -> serde_json::Value {
    let location = warp.location().map(|loc| {
        serde_json::json!({
            "world": loc.world,
            "x": loc.x,
            "y": loc.y,
            "z": loc.z,
            "pitch": loc.pitch,
            "yaw": loc.yaw,
        })
    });
    serde_json::json!({
        "id": warp.id().to_string(),
        "name": warp.name(),
        "owner": warp.owner().to_string(),
        "creator": warp.creator().to_string(),
        "description": warp.description(),
        "icon": warp.icon().as_str(),
        "visits": warp.visits(),
        "created_at": warp.created_at().to_rfc3339(),
        "location": location,
    })
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let file = config.as_ref().and_then(|cfg| {
        cfg.logging.file.as_ref().and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        })
    });
    if let Some(f) = file {
        let security_path = config
            .as_ref()
            .and_then(|cfg| cfg.logging.security_file.clone());
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        let is_tty = atty::is(atty::Stream::Stdout);

        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());

            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }

            // Bans and bypasses also go to the security log
            if record.target() == "security" {
                if let Some(ref sec_path) = security_path {
                    if let Ok(mut sf) = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(sec_path)
                    {
                        let _ = writeln!(sf, "{}", line);
                    }
                }
            }

            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
