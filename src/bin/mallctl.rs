//! mallctl: 수집, 정리, API 서버

use std::io::{self, IsTerminal};

use clap::Parser;
use local_mall_service::cli::Cli;
use local_mall_service::commands;
use local_mall_service::logging::{init_logging, LogConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose)
        .with_format(cli.log_format)
        .with_ansi(io::stderr().is_terminal());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = commands::run(cli.command, cli.data_dir).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
