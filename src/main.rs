use anyhow::Result;
use mausam_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already be populated.
    let dotenv = dotenvy::dotenv();

    mausam_core::init()?;

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let (config, _) = Config::load_validated()?;
    mausam_server::serve(&config).await
}
