mod args;
mod json;

use anyhow::{anyhow, Result};
use orchestrator::configs::{DashboardConfig, Role};

pub use args::Args;

/// Assembles the dashboard configuration.
///
/// Defaults come first, then the JSON file given with `--config`, then the
/// remaining command line flags.
///
/// # Errors
/// Returns an error if the JSON file cannot be loaded.
pub fn load(args: &Args) -> Result<DashboardConfig> {
    let mut config = DashboardConfig::new(Role::Trainer, None);

    if let Some(path) = &args.config {
        let path = path.to_string_lossy();
        config = json::load_dashboard(&path, config).map_err(|e| anyhow!("{path}: {e}"))?;
    }

    if let Some(url) = &args.api {
        config.api_base_url = url.trim().to_string();
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    if let Some(role) = args.role {
        config.role = role;
    }

    Ok(config)
}
