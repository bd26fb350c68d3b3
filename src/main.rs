use claim_mirror::app::{self, StartupError};
use claim_mirror::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    app::init_tracing(&config.server);

    if let Err(e) = app::run(config).await {
        tracing::error!(error = %e, "Service stopped with an error");
        return Err(e);
    }
    Ok(())
}
