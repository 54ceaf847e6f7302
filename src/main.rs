mod campaigns;
mod common;
mod config;
mod geography;
mod questionnaires;
mod recoltes;
mod routes;
mod schools;
mod users;

#[cfg(test)]
mod test_helpers;

use crate::config::Config;
use crate::geography::import::{DivisionImportEntry, import_divisions};
use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "guge-api", version, about = "School census API and management commands")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Load provinces, divisions and sub-divisions from a JSON export
    ImportDivisions {
        #[arg(long)]
        file: PathBuf,
    },
    /// Create an active staff superuser
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
}

async fn connect(config: &Config) -> anyhow::Result<DatabaseConnection> {
    let url = config.db_url.as_deref().context("No database URL configured")?;
    let db = Database::connect(url)
        .await
        .context("Could not connect to the database")?;

    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("DB migrations complete");

    Ok(db)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let db = connect(&config).await?;

    tracing::info!(
        "Starting server {} ({} deployment) ...",
        config.app_name,
        config.deployment.to_uppercase()
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Could not bind {}", config.bind_address))?;
    tracing::info!("Listening on {}", config.bind_address);

    let router = routes::build_router(&db, &config);
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}

async fn run_import(config: &Config, file: PathBuf) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("Could not read {}", file.display()))?;
    let entries: Vec<DivisionImportEntry> =
        serde_json::from_str(&raw).context("Division file is not valid JSON")?;

    println!(
        "{} Importing {} divisions from {}",
        style("[1/1]").bold().dim(),
        entries.len(),
        file.display()
    );

    let db = connect(config).await?;
    let bar = ProgressBar::new(entries.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}")?
            .progress_chars("##-"),
    );

    let summary = match import_divisions(&db, &entries, Some(&bar)).await {
        Ok(summary) => summary,
        Err(e) => {
            bar.abandon_with_message("rolled back");
            println!("{} Import failed: {e:#}", style("✗").red());
            return Err(e);
        }
    };
    bar.finish_with_message("done");

    println!(
        "{} {} provinces, {} divisions, {} sub-divisions created ({} entries skipped)",
        style("✓").green(),
        summary.provinces_created,
        summary.divisions_created,
        summary.sub_divisions_created,
        summary.entries_skipped
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::ImportDivisions { file } => run_import(&config, file).await,
        Command::CreateSuperuser {
            username,
            password,
            email,
        } => {
            let db = connect(&config).await?;
            let user =
                users::services::create_superuser(&db, &username, &password, email.as_deref())
                    .await?;
            println!(
                "{} Superuser {} created (id {})",
                style("✓").green(),
                style(&user.username).bold(),
                user.id
            );
            Ok(())
        }
    }
}
