use std::path::PathBuf;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info};

use trove_db::Database;
use trove_maintenance::{AssignOptions, assign_collection_owners};

/// Assign a random owning user to every collection.
#[derive(Debug, Parser)]
#[command(name = "assign-collection-owners", version)]
struct Args {
    /// SQLite database path (defaults to TROVE_DB_PATH, then trove.db)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Only touch collections that have no owner yet
    #[arg(long)]
    resume: bool,

    /// Seed the random choice for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trove_maintenance=info,trove_db=info".into()),
        )
        .init();

    let args = Args::parse();
    let db_path = args
        .db
        .or_else(|| std::env::var("TROVE_DB_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("trove.db"));

    let db = Database::open(&db_path)?;
    info!("Connected to database!");

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let result = assign_collection_owners(&db, &mut rng, AssignOptions { resume: args.resume });
    drop(db);
    info!("Disconnected from database.");

    match result {
        Ok(report) => {
            info!(
                "Collections updated successfully ({} assigned across {} user(s)).",
                report.assigned,
                report.per_user.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("Assignment aborted: {}", e);
            Err(e.into())
        }
    }
}
