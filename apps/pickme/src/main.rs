use anyhow::Result;
use clap::Parser;
use common::{ClientConfig, FileStore, TokenStore};
use pickme::{AppState, Level, Notice, Route};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use crate::cli::Cli;

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.level {
            Level::Success => eprintln!("✓ {}", notice.message),
            Level::Info => eprintln!("  {}", notice.message),
            Level::Error => eprintln!("✗ {}", notice.message),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so page output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config = config.with_api_url(api_url)?;
    }
    info!("Using API at {}", config.api_url);

    let tokens = TokenStore::new(FileStore::open(&config.token_file)?);
    let mut state = AppState::new(config, tokens)?;

    let wanted = cli.command.route();
    let landed = state.init(wanted).await?;
    if landed != wanted {
        if landed == Route::Login {
            state.notices.error("Not signed in, run `pickme login` first");
            print_notices(state.notices.drain());
            std::process::exit(1);
        }
        let name = state.viewer()?.display_name();
        state.notices.info(format!("Already signed in as {}", name));
        print_notices(state.notices.drain());
        return Ok(());
    }

    let result = commands::execute(&mut state, cli.command).await;
    print_notices(state.notices.drain());
    match result {
        Ok(text) => {
            if !text.is_empty() {
                println!("{}", text.trim_end());
            }
            Ok(())
        }
        Err(_) => std::process::exit(1),
    }
}
