use antinex_client::cli::{self, ConnectionArgs};
use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;

/// Get an AntiNex MLJobResult by database id.
#[derive(Debug, Parser)]
#[command(name = "ai-get-result", version)]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Result.id to look up (RESULT_ID)
    #[arg(short = 'i')]
    id: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.connection.config();
    let logger = cli::init_logging(config.verbose, config.debug);

    cli::run(&logger, || {
        cli::require_credentials(&config)?;
        let id = cli::parse_id(args.id.as_deref(), "RESULT_ID", "result_id")?;

        let mut client = cli::connect(config, logger.clone())?;
        let res = cli::call_with_relogin(|| client.get_result_by_id(id))?;
        cli::check(&res, "get result")?;

        let record = res
            .data
            .as_ref()
            .context("no result returned after logging in again")?;
        cli::print_json("result", record)?;
        Ok(())
    })
}
