use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{error, info, warn};

use common::utils::logging::init_logging;
use configs::AppConfig;
use models::{EntityId, Outcome, SkillBook};
use service::runtime::Services;
use service::skill::{EntryOutcome, RecomputeReport};

/// Maintenance tool for per-player skill ledgers.
#[derive(Debug, Parser)]
#[command(name = "skillctl", version)]
struct Cli {
    /// TOML config file; falls back to $CONFIG_PATH, then config.toml, then defaults.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a player's skill ledger.
    Show { player: String },
    /// Create an empty ledger for a player.
    Init { player: String },
    /// Study a skill book from the item catalog.
    Learn { player: String, book: String },
    /// Forget a learned skill.
    Forget { player: String, skill: String },
    /// Set a player's spiritual roots.
    Roots { player: String, roots: Vec<String> },
    /// Recompute skill power for the given players.
    Refresh { players: Vec<String> },
}

/// An explicit `--config` must load; the implicit one may be missing, in
/// which case the load error is handed back for logging.
fn load_config(path: Option<&str>) -> anyhow::Result<(AppConfig, Option<anyhow::Error>)> {
    let (mut cfg, fallback) = match path {
        Some(path) => (configs::load_from_file(path).with_context(|| format!("load {path}"))?, None),
        None => match configs::load_default() {
            Ok(cfg) => (cfg, None),
            Err(e) => (AppConfig::default(), Some(e)),
        },
    };
    cfg.normalize_and_validate()?;
    Ok((cfg, fallback))
}

fn player(raw: &str) -> anyhow::Result<EntityId> {
    EntityId::parse(raw).map_err(|e| anyhow!("bad player id `{raw}`: {e}"))
}

fn print_outcome(outcome: &Outcome) {
    for line in &outcome.messages {
        println!("{line}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let (cfg, fallback) = load_config(cli.config.as_deref())?;
    init_logging(&cfg.logging.format);
    if let Some(e) = fallback {
        warn!(error = %e, "config file not loaded; using defaults");
    }
    common::env::ensure_env(&cfg.storage.data_dir, &cfg.storage.item_catalog_path()).await?;

    let services = Services::from_config(&cfg).await?;

    match cli.command {
        Command::Show { player: raw } => {
            let id = player(&raw)?;
            match services.skills.fetch_all(&id).await? {
                None => println!("玩家{id}尚无技能数据"),
                Some(skills) if skills.is_empty() => println!("玩家{id}尚未学习任何技能"),
                Some(skills) => {
                    for s in skills {
                        println!("{}\t倍率 {}\t熟练度 {}", s.name, s.power, s.proficiency);
                    }
                }
            }
        }
        Command::Init { player: raw } => {
            let id = player(&raw)?;
            let created = services.skills.init(&id).await?;
            info!(player = %id, created, "init_done");
        }
        Command::Learn { player: raw, book } => {
            let id = player(&raw)?;
            let name = if book.starts_with(models::SKILL_BOOK_PREFIX) { book } else { SkillBook::book_name_for(&book) };
            let Some(book) = services.catalog.get(&name).cloned() else {
                return Err(anyhow!("{name} is not in the item catalog"));
            };
            match services.skills.learn(&id, &book).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => {
                    error!(player = %id, error = %e, "learn_failed");
                    println!("{}", e.user_message());
                }
            }
        }
        Command::Forget { player: raw, skill } => {
            let id = player(&raw)?;
            match services.skills.forget(&id, &skill).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => {
                    error!(player = %id, error = %e, "forget_failed");
                    println!("{}", e.user_message());
                }
            }
        }
        Command::Roots { player: raw, roots } => {
            let id = player(&raw)?;
            print_outcome(&services.talents.set_spiritual_roots(&id, roots).await?);
        }
        Command::Refresh { players } => {
            for raw in players {
                let id = player(&raw)?;
                match services.skills.recompute_all(&id).await {
                    Ok(RecomputeReport::Skipped(reason)) => println!("{id}: skipped ({reason:?})"),
                    Ok(report) => {
                        for entry in report.entries() {
                            match entry {
                                EntryOutcome::Updated { name, old_power, new_power } => {
                                    println!("{id}: {name} {old_power} -> {new_power}")
                                }
                                EntryOutcome::Skipped { name, reason } => println!("{id}: {name} unchanged ({reason})"),
                            }
                        }
                    }
                    // keep going with the remaining players
                    Err(e) => error!(player = %id, error = %e, "refresh_failed"),
                }
            }
        }
    }
    Ok(())
}
