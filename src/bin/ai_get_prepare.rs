use antinex_client::cli::{self, ConnectionArgs};
use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;

/// Get an AntiNex MLPrepare dataset by database id.
#[derive(Debug, Parser)]
#[command(name = "ai-get-prepare", version)]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Prepare.id to look up (PREPARE_ID)
    #[arg(short = 'i')]
    id: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.connection.config();
    let logger = cli::init_logging(config.verbose, config.debug);

    cli::run(&logger, || {
        cli::require_credentials(&config)?;
        let id = cli::parse_id(args.id.as_deref(), "PREPARE_ID", "prepare_id")?;

        let mut client = cli::connect(config, logger.clone())?;
        let res = cli::call_with_relogin(|| client.get_prepare_by_id(id))?;
        cli::check(&res, "get prepare")?;

        let record = res
            .data
            .as_ref()
            .context("no prepare returned after logging in again")?;
        cli::print_json("prepare", record)?;
        Ok(())
    })
}
