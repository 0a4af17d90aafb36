use antinex_client::cli::{self, ConnectionArgs};
use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;

/// Get an AntiNex MLJob by database id.
#[derive(Debug, Parser)]
#[command(name = "ai-get-job", version)]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Job.id to look up (JOB_ID)
    #[arg(short = 'i')]
    id: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.connection.config();
    let logger = cli::init_logging(config.verbose, config.debug);

    cli::run(&logger, || {
        cli::require_credentials(&config)?;
        let id = cli::parse_id(args.id.as_deref(), "JOB_ID", "job_id")?;

        let mut client = cli::connect(config, logger.clone())?;
        let res = cli::call_with_relogin(|| client.get_job_by_id(id))?;
        cli::check(&res, "get job")?;

        let record = res
            .data
            .as_ref()
            .context("no job returned after logging in again")?;
        cli::print_json("job", record)?;
        Ok(())
    })
}
