mod auth;
mod config;
mod http;
mod permission;
mod policies;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_db::{DatabaseSettings, DbPool, connect};
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use products_hr::seed::{self, SeedAdmin};
use tracing::info;

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
    policies::RoutePolicies,
};

#[derive(Parser, Debug)]
#[command(name = "hr-server", version, about = "HR identity suite")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Create the default roles and departments plus an administrator.
    Seed(SeedCommand),
    /// Print the effective route policy table.
    Policies {
        #[arg(long, value_name = "FILE", env = "ROUTE_POLICIES_FILE")]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
    /// Drop every table and re-apply all migrations.
    Fresh,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, help = "Override the BIND address")]
    bind: Option<SocketAddr>,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

#[derive(Args, Debug)]
struct SeedCommand {
    #[arg(long, env = "SEED_ADMIN_EMAIL")]
    admin_email: String,
    #[arg(long, env = "SEED_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,
    #[arg(long, default_value = "Administrator")]
    admin_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig::from_env()?)?;
    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Serve(cmd) => run_server(cmd).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
            MigrateCommand::Fresh => migrate_fresh().await,
        },
        Command::Seed(cmd) => run_seed(cmd).await,
        Command::Policies { file } => print_policies(file),
    };
    shutdown_tracing();
    outcome
}

async fn setup_pool() -> Result<DbPool> {
    let settings = DatabaseSettings::from_env()?;
    connect(&settings).await.map_err(Into::into)
}

async fn run_server(cmd: ServeCommand) -> Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(bind) = cmd.bind {
        config.bind = bind;
    }
    let policies = RoutePolicies::load(config.policies_file.as_deref())?;
    let pool = setup_pool().await?;
    ensure_migrations(&pool, cmd.allow_dirty).await?;

    let serve_config = ServeConfig::new(config.bind);
    let state = AppState {
        pool,
        config: Arc::new(config),
        policies: Arc::new(policies),
    };
    http::serve(serve_config, state).await
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `hr-server migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

async fn migrate_fresh() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::fresh(&pool).await?;
    info!("database rebuilt from scratch");
    Ok(())
}

async fn run_seed(cmd: SeedCommand) -> Result<()> {
    let pool = setup_pool().await?;
    ensure_migrations(&pool, false).await?;
    let admin = seed::seed_admin(
        &pool,
        SeedAdmin {
            email: cmd.admin_email,
            password: cmd.admin_password,
            name: cmd.admin_name,
        },
    )
    .await?;
    info!(user_id = %admin.id, email = %admin.email, "administrator ready");
    Ok(())
}

fn print_policies(file: Option<PathBuf>) -> Result<()> {
    let policies = RoutePolicies::load(file.as_deref())?;
    print!("{}", policies.render());
    Ok(())
}
