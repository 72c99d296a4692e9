use mareero::{AppConfig, app};

/// Main entry point for the dashboard web server
///
/// Loads `.env` when present, sets up logging (`RUST_LOG`, default `info`),
/// resolves the configuration from the environment and serves until Ctrl-C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    app::run(config).await
}
