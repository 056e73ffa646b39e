use std::path::PathBuf;

use clap::Parser;
use orchestrator::configs::Role;

#[derive(Debug, Parser)]
#[command(
    name = "decentrify",
    version,
    about = "Terminal dashboard for decentralized training sessions"
)]
pub struct Args {
    /// Backend base url
    #[arg(long, value_name = "URL")]
    pub api: Option<String>,
    /// Bearer token of the logged in user
    #[arg(long, env = "DECENTRIFY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Skip the menu and log in with this role (trainer, peer)
    #[arg(long)]
    pub role: Option<Role>,
    /// JSON file overriding the default endpoints, intervals and palette
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Where logs are written, the terminal belongs to the dashboard
    #[arg(long, value_name = "FILE", default_value = "decentrify.log")]
    pub log_file: PathBuf,
}
