mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use itemtable::CatalogOptions;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    let db = config.database(cli.database.as_deref());
    let options = config.catalog_options(cli.layout.layout());
    run(cli.command, &db, options)
}

fn run(command: Commands, db: &Path, options: CatalogOptions) -> Result<()> {
    match command {
        Commands::Stats => commands::catalog::stats(db, options),
        Commands::Get { id } => commands::catalog::get(db, options, id),
        Commands::Find {
            name,
            without_space,
        } => commands::catalog::find(db, options, &name, without_space),
        Commands::Reload { times } => commands::catalog::reload(db, options, times),
        Commands::Configure { default_db, show } => commands::configure::handle(default_db, show),
    }
}
