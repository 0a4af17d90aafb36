use antinex_client::cli::{self, ConnectionArgs};
use antinex_client::JobOutcome;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Train a deep neural network with the AntiNex REST API and wait for its
/// predictions.
#[derive(Debug, Parser)]
#[command(name = "ai-train-dnn", version)]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Job request JSON file (DATAFILE)
    #[arg(short = 'f')]
    datafile: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.connection.config();
    let logger = cli::init_logging(config.verbose, config.debug);

    cli::run(&logger, || {
        cli::require_credentials(&config)?;
        let datafile = cli::require_file(args.datafile.as_deref(), "DATAFILE", "datafile")?;
        let body = cli::read_json(&datafile)?;

        let mut client = cli::connect(config, logger.clone())?;

        info!(datafile = %datafile.display(), "running job");
        let started = cli::call_with_relogin(|| client.run_job(&body))?;
        cli::check(&started, "job")?;
        let data = started.data.unwrap_or_default();
        let job_id = data["job"]["id"]
            .as_i64()
            .context("missing job dictionary in response data")?;
        info!(
            job_id,
            job_status = %data["job"]["status"],
            result_id = %data["results"]["id"],
            result_status = %data["results"]["status"],
            "started job"
        );

        let finished = client.wait_for_job_to_finish(job_id)?;
        cli::check(&finished, &format!("waiting for job.id={}", job_id))?;
        let outcome: JobOutcome = serde_json::from_value(finished.data.unwrap_or_default())?;

        cli::print_json("job", &outcome.job)?;
        cli::print_json("result", &outcome.result)?;
        info!(
            job_id,
            predictions = outcome.predictions().len(),
            accuracy = ?outcome.accuracy(),
            "job is done"
        );
        Ok(())
    })
}
