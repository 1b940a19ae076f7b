mod attempt;
mod cli;
mod config;
mod env;
mod error;
mod pool;
mod reporter;
mod runner;
mod shutdown;
mod stats;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use config::RunnerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "looprun=debug" } else { "looprun=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = RunnerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => {
            args.apply(&mut config);
            config.validate()?;

            let summary = runner::run(&config, args.json).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("\n{}", ui::RunnerUi::default().summary_block(&summary));
            }
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
