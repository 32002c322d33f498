use clap::Parser;

mod addresses;
mod app;
mod auth;
mod carts;
mod catalog;
mod common;
mod config;
mod db;
mod error;
mod orders;
mod payments;
mod reviews;
mod seed;
mod state;
mod users;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront REST API")]
struct Cli {
    /// Migrate, load sample data and exit.
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "storefront=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = config::AppConfig::from_env()?;
    let state = state::AppState::init(config).await?;

    if cli.seed {
        seed::run(&state.db).await?;
        return Ok(());
    }

    app::serve(state).await
}
