//! # Shop Recommender CLI (`shoprec`)
//!
//! The `shoprec` binary is the interface to the recommender. It provides
//! commands for database initialization, data loading, snapshot rebuilds,
//! and the two recommendation queries.
//!
//! ## Usage
//!
//! ```bash
//! shoprec --config ./config/shoprec.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shoprec init` | Create the SQLite database and run schema migrations |
//! | `shoprec load <file>` | Execute a SQL data file against the database |
//! | `shoprec rebuild` | Recompute the popular-item and elite-rating snapshots |
//! | `shoprec top` | Generic top-k recommendations |
//! | `shoprec suggest <cid>` | Personalized top-k recommendations for a customer |
//! | `shoprec stats` | Print row counts and database overview |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use shop_recommender::{config, load, migrate, recommend, stats};

/// Shop Recommender CLI — popularity snapshots and elite-analog
/// recommendations over a purchase history store.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "shoprec",
    about = "Shop Recommender — popularity snapshots and elite-analog recommendations",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/shoprec.toml`. Database path and
    /// recommendation defaults are read from this file.
    #[arg(long, global = true, default_value = "./config/shoprec.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (base
    /// relations and the two snapshot relations). This command is
    /// idempotent — running it multiple times is safe.
    Init,

    /// Execute a SQL data file against the database.
    ///
    /// Used to populate the base relations (categories, items, customers,
    /// purchases, ratings, elite_members) from a dump. The file may
    /// contain multiple statements.
    Load {
        /// Path to the SQL file to execute.
        file: PathBuf,
    },

    /// Recompute the snapshot relations from the current base facts.
    ///
    /// Deletes and repopulates `popular_items` and `elite_ratings` in one
    /// transaction. A failed rebuild leaves both unchanged.
    Rebuild,

    /// Generic top-k recommendations.
    ///
    /// Ranks the current popular items by average rating (unrated items
    /// last) and prints at most k item ids. Run `shoprec rebuild` first to
    /// bring the snapshot up to date.
    Top {
        /// Number of items to return. Defaults to `recommend.default_k`.
        #[arg(long)]
        k: Option<usize>,

        /// Emit the result as JSON instead of a numbered list.
        #[arg(long)]
        json: bool,
    },

    /// Personalized top-k recommendations for a customer.
    ///
    /// Matches the customer to the elite reviewer with the closest rating
    /// pattern on popular items and recommends that reviewer's top-rated
    /// items the customer hasn't bought. Falls back to the generic
    /// ranking when no match exists.
    Suggest {
        /// Customer id to recommend for. Must not be an elite member.
        cust: i64,

        /// Number of items to return. Defaults to `recommend.default_k`.
        #[arg(long)]
        k: Option<usize>,

        /// Emit the result as JSON instead of a numbered list.
        #[arg(long)]
        json: bool,
    },

    /// Print row counts and a database overview.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Load { file } => {
            load::run_load(&cfg, &file).await?;
        }
        Commands::Rebuild => {
            recommend::run_rebuild(&cfg).await?;
        }
        Commands::Top { k, json } => {
            recommend::run_top(&cfg, k, json).await?;
        }
        Commands::Suggest { cust, k, json } => {
            recommend::run_suggest(&cfg, cust, k, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
