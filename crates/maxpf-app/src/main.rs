// maxpf entry point.
//
// Startup sequence:
// 1. Load config
// 2. Initialize tracing (log to file, filter from RUST_LOG or config)
// 3. Open database
// 4. Migrate stored leagues to the current rule version
// 5. Ingest configured league seasons and refresh their derived stats
// 6. Print a per-league summary

use std::sync::Arc;

use maxpf_app::config::{self, Config};
use maxpf_app::db::Database;
use maxpf_app::ingest;
use maxpf_app::migration;
use maxpf_app::source::JsonDirSource;
use maxpf_football::RULE_VERSION;

use anyhow::Context;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = config::load_config().context("failed to load configuration")?;

    // 2. Initialize tracing
    init_tracing(&config)?;
    info!(
        "maxpf starting: rule version {RULE_VERSION}, {} league(s), {} worker(s)",
        config.leagues.len(),
        config.effective_workers()
    );

    // 3. Open database
    let db = Arc::new(Database::open(&config.db_path).context("failed to open database")?);
    info!("Database opened at {}", config.db_path);

    // 4. Migrate
    let workers = config.effective_workers();
    let report = migration::migrate(Arc::clone(&db), workers)
        .await
        .context("migration failed")?;
    info!(
        "Migration: {} rebuilt, {} current, {} failed",
        report.rebuilt.len(),
        report.current.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!("migration: {failure}");
    }

    // 5. Ingest and refresh
    let source = JsonDirSource::new(&config.data_dir);
    for league in &config.leagues {
        match ingest::refresh_league(Arc::clone(&db), &source, league, workers).await {
            Ok(summary) => {
                if !summary.missing.is_empty() {
                    info!("league {}: missing seasons {:?}", league.id, summary.missing);
                }
            }
            Err(e) => {
                error!("league {}: refresh failed: {e}", league.id);
                eprintln!("league {}: {e}", league.id);
            }
        }
    }

    // 6. Summary
    print_summary(&config, &db)?;

    info!("maxpf finished");
    Ok(())
}

fn print_summary(config: &Config, db: &Database) -> anyhow::Result<()> {
    for league in &config.leagues {
        let owners = db.load_owner_stats(&league.id)?;
        let label = if league.name.is_empty() {
            league.id.as_str()
        } else {
            league.name.as_str()
        };
        println!("{label}: {} owner(s)", owners.len());
        for owner in owners {
            println!(
                "  {:<24} {:>3}-{:<3} pf {:>9.2}  max {:>9.2}  mgmt {:>5.1}%  titles {}",
                owner.owner_id,
                owner.record.wins,
                owner.record.losses,
                owner.points_for,
                owner.max_points_for,
                owner.management_percent,
                owner.championships
            );
        }
    }
    Ok(())
}

/// Initialize tracing to log to `logs/maxpf.log`. `RUST_LOG` wins over the
/// configured filter.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("maxpf.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
