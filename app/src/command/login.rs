use memvault_config::Config;
use reqwest::Client;

/// Strategy for authorizing Google Drive access.
///
/// Runs the loopback browser flow with the configured client secrets and
/// overwrites any existing token.
#[derive(Debug, Clone, Copy)]
pub struct LoginStrategy;

impl super::CommandStrategy for LoginStrategy {
    type Input = Config;

    async fn execute(&self, config: Self::Input) -> anyhow::Result<()> {
        super::run_login(&config, &Client::new()).await?;
        println!("✅ Authorized. Token saved to {}", config.auth.token_path.display());
        Ok(())
    }
}
