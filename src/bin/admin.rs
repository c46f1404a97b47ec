use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use agency_api::database::manager::DatabaseManager;
use agency_api::services::user_service::{self, NewUser};
use agency_api::types::Role;

/// Administrative tasks that run against the database directly.
#[derive(Parser)]
#[command(name = "admin", about = "Agency API admin tasks", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the first manager account on a fresh database
    Bootstrap {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
    },
    /// Check database connectivity
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Bootstrap {
            email,
            password,
            name,
        } => bootstrap(email, password, name).await,
        Commands::Health => health().await,
    }
}

async fn bootstrap(email: String, password: String, name: String) -> Result<()> {
    let pool = DatabaseManager::pool()
        .await
        .context("failed to connect to database")?;

    let managers: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE role = 'manager' AND deleted_at IS NULL",
    )
    .fetch_one(&pool)
    .await
    .context("failed to query users")?;

    if managers > 0 {
        bail!("a manager account already exists; bootstrap is only for fresh databases");
    }

    let user = user_service::create_user(
        &pool,
        NewUser {
            email,
            password,
            name,
            role: Role::Manager,
            manager_id: None,
        },
    )
    .await
    .map_err(|e| anyhow::anyhow!("failed to create manager: {}", e))?;

    println!("Created manager {} ({})", user.email, user.id);
    Ok(())
}

async fn health() -> Result<()> {
    DatabaseManager::health_check()
        .await
        .context("database health check failed")?;
    println!("database: ok");
    Ok(())
}
