//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use memvault_config::Config;
use memvault_providers::{ClientSecrets, LoginFlow, TokenProvider};
use reqwest::Client;
use tracing::info;

mod backup;
mod info;
mod init;
mod login;
mod version;

pub use backup::{BackupInput, BackupStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use login::LoginStrategy;
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// # Example
/// ```rust
/// struct MyStrategy;
///
/// impl CommandStrategy for MyStrategy {
///     type Input = MyInput;
///
///     async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
///         // Command logic here
///         Ok(())
///     }
/// }
/// ```
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Run the browser authorization flow and save the resulting token.
async fn run_login(config: &Config, client: &Client) -> anyhow::Result<()> {
    let secrets = ClientSecrets::load(&config.auth.credential_path)?;
    let flow = LoginFlow::start(secrets)?;

    println!("Open this URL in your browser to authorize memvault:\n");
    println!("  {}\n", flow.consent_url()?);
    info!("Waiting for authorization redirect");

    let user = flow.complete(client).await?;
    user.save(&config.auth.token_path)?;
    info!("Token saved to {}", config.auth.token_path.display());
    Ok(())
}

/// Load the saved token, authorizing first when none exists.
async fn authenticate(config: &Config, client: &Client) -> anyhow::Result<TokenProvider> {
    if !config.auth.token_path.exists() {
        info!("Initial authentication required. Opening authorization flow...");
        run_login(config, client).await?;
    }
    TokenProvider::load(client.clone(), config.auth.token_path.clone())
}
