use anyhow::Result;

mod cli;
mod config;
mod student;


use cli::Commands;
use config::Config;

fn main() -> Result<()> {
    let config = Config::try_parse()?;

    env_logger::Builder::new()
        .filter_level(config.log_level_filter())
        .init();

    match config.command() {
        Some(Commands::Student(_)) => student::run(&config),
        None => anyhow::bail!("No command provided"),
    }
}
