//! CLI configuration via clap.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "exrate-monitor")]
#[command(about = "Polls exchange APIs for currency pair rates and serves the latest ones over HTTP")]
pub struct Cli {
    /// Config file path; the extension may be omitted
    #[arg(short = 'f', long, env = "CONFIG", default_value = "config/default")]
    pub config: String,

    /// Environment overlay, read from a file of this name next to the config file
    #[arg(short, long, env = "EXMON_ENV")]
    pub env: Option<String>,

    /// Debug logging
    #[arg(short, long, env = "DEBUG")]
    pub debug: bool,
}
