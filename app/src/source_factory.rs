// In app/src/source_factory.rs

use std::path::Path;

use anyhow::{Context, Result};
use api_client::{DealSource, SnapshotSource, TerminalClient};
use app_config::Settings;

/// Creates the deal source for a run.
///
/// A snapshot file takes precedence. Otherwise the terminal bridge is used,
/// logged in with the saved credentials before any history is requested.
pub async fn create_deal_source(settings: &Settings, snapshot: Option<&Path>) -> Result<Box<dyn DealSource>> {
    if let Some(path) = snapshot {
        let source = SnapshotSource::load(path)
            .with_context(|| format!("Failed to load history snapshot {}", path.display()))?;
        return Ok(Box::new(source));
    }

    Ok(Box::new(connect_terminal(settings).await?))
}

/// Loads the saved credentials and logs the terminal bridge in.
pub async fn connect_terminal(settings: &Settings) -> Result<TerminalClient> {
    let credentials = app_config::load_credentials(&settings.terminal.credentials_path)
        .context("No usable login information. Run the `login` command first")?;
    let client = api_client::new(&settings.terminal)?;
    client
        .login(&credentials)
        .await
        .context("Failed to connect to the trading terminal")?;
    Ok(client)
}
