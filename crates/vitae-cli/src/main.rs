//! `vitae`: command-line entry point for the profile datastore.
//!
//! # Usage
//!
//! ```
//! vitae load                       # full reload from the data directory
//! vitae load --job data/acme.yml   # append one employer's records
//! vitae migrate --yes              # evolve columns, no checkpoint stop
//! vitae backup                     # export tables to portable JSON
//! vitae restore                    # backup JSON -> loader source files
//! ```

mod backup;
mod loader;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vitae_store_sqlite::{SqliteStore, migrate::MigrateOptions};

use settings::Settings;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "vitae", version, about = "Profile datastore loader and migrator")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "vitae.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Reload the store from the structured source files.
  Load {
    /// Load a single professional-experience file, appending to the table
    /// instead of replacing it.
    #[arg(long, value_name = "FILE")]
    job: Option<PathBuf>,
  },

  /// Evolve legacy array columns to their document representation.
  Migrate {
    /// Proceed past the verification checkpoint without confirmation.
    #[arg(long)]
    yes: bool,
  },

  /// Export tables to portable JSON documents in the backup directory.
  Backup,

  /// Reshape backup documents into loader source files.
  Restore,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = Settings::load(&cli.config)?;

  match cli.command {
    Command::Load { job } => {
      let store = open_store(&config).await?;
      match job {
        Some(path) => loader::load_single_job(&store, &path).await?,
        None => loader::full_reload(&store, &config.data_dir).await?,
      }
      tracing::info!("data loading complete");
    }
    Command::Migrate { yes } => {
      let store = open_store(&config).await?;
      run_migration(&store, &config, yes).await?;
    }
    Command::Backup => {
      let store = open_store(&config).await?;
      backup::write_backups(&store, &config.backup_dir).await?;
    }
    Command::Restore => {
      backup::restore_sources(&config.backup_dir, &config.data_dir)?;
    }
  }

  Ok(())
}

async fn open_store(config: &Settings) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(&config.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", config.store_path))
}

// ─── Migration driver ─────────────────────────────────────────────────────────

/// Run the schema migration, honoring the confirmation gate.
///
/// When the engine stops at the verification checkpoint the operator sees
/// the sample conversions and decides; the engine itself never blocks on a
/// prompt, so unattended runs use the same code path with `--yes`.
async fn run_migration(
  store: &SqliteStore,
  config: &Settings,
  yes: bool,
) -> anyhow::Result<()> {
  let require_confirmation = config.require_confirmation && !yes;
  let report = store
    .migrate(MigrateOptions { require_confirmation })
    .await?;

  if report.finalized {
    tracing::info!("migration completed");
    return Ok(());
  }

  println!("Sample conversions:");
  for sample in &report.samples {
    println!(
      "  {}.{}: {} -> {}",
      sample.table,
      sample.column,
      sample.legacy.as_deref().unwrap_or("NULL"),
      sample.document.as_deref().unwrap_or("NULL"),
    );
  }

  if !confirm("Does the data look correct? Type 'yes' to drop the legacy columns: ")? {
    println!("Migration stopped. Staged document columns are still in place;");
    println!("rerun `vitae migrate` to continue from the checkpoint.");
    return Ok(());
  }

  let report = store
    .migrate(MigrateOptions { require_confirmation: false })
    .await?;
  anyhow::ensure!(report.finalized, "migration did not finalize");
  tracing::info!("migration completed");
  Ok(())
}

/// Read a yes/no answer from stdin.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
  use std::io::{self, BufRead, Write};
  print!("{prompt}");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim().eq_ignore_ascii_case("yes"))
}
