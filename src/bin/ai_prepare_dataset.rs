use antinex_client::cli::{self, ConnectionArgs};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Prepare a new dataset with the AntiNex REST API and wait for it to finish.
#[derive(Debug, Parser)]
#[command(name = "ai-prepare-dataset", version)]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Prepare request JSON file (DATAFILE)
    #[arg(short = 'f')]
    prepare_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.connection.config();
    let logger = cli::init_logging(config.verbose, config.debug);

    cli::run(&logger, || {
        cli::require_credentials(&config)?;
        let prepare_file =
            cli::require_file(args.prepare_file.as_deref(), "DATAFILE", "prepare_file")?;
        let body = cli::read_json(&prepare_file)?;

        let mut client = cli::connect(config, logger.clone())?;

        info!(prepare_file = %prepare_file.display(), "running prepare");
        let started = cli::call_with_relogin(|| client.run_prepare(&body))?;
        cli::check(&started, "prepare")?;
        let data = started.data.unwrap_or_default();
        let prepare_id = data["id"]
            .as_i64()
            .context("missing prepare dictionary in response data")?;
        info!(prepare_id, status = %data["status"], "started prepare");

        let finished = client.wait_for_prepare_to_finish(prepare_id)?;
        cli::check(&finished, &format!("waiting for prepare.id={}", prepare_id))?;
        if let Some(prepare) = &finished.data {
            cli::print_json("prepare", prepare)?;
        }
        info!(prepare_id, "prepare is done");
        Ok(())
    })
}
