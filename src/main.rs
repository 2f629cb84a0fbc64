mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Issue(args) => commands::issue::run(args).await?,
        Commands::Check => commands::check::run().await?,
        Commands::Rbac {
            namespace,
            signer_name,
        } => commands::rbac::run(&namespace, &signer_name)?,
        Commands::CaBundle { ca_cert, patch } => commands::ca_bundle::run(&ca_cert, patch)?,
    }

    Ok(())
}
