use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Keepsake card studio
#[derive(Debug, Parser)]
#[command(name = "keepsake", about = "Turn reference photos into an illustrated holiday card")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "keepsake.toml", env = "KEEPSAKE_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "KEEPSAKE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directive, e.g. `info` or `keepsake_imagegen=debug,info`
    #[arg(long, default_value = "info", env = "KEEPSAKE_LOG")]
    pub log_level: String,
}
