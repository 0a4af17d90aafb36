use antinex_client::cli;
use antinex_client::request::{generate_ai_request, RequestSettings};
use antinex_client::{ClientConfig, JobOutcome};
use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

const DEFAULT_DATAFILE: &str = "./examples/predict-rows-scaler-full-django.json";

/// Make predictions with a pre-trained deep neural network, building the
/// client and the request from the ANTINEX_* environment.
#[derive(Debug, Parser)]
#[command(name = "ai-env-predict", version)]
struct Args {
    /// File holding `predict_rows` (DATAFILE)
    #[arg(short = 'f')]
    datafile: Option<PathBuf>,

    /// Send mock rows instead of a file
    #[arg(short = 'm')]
    use_fake_rows: bool,

    /// Silent
    #[arg(short = 's')]
    silent: bool,

    /// Debug
    #[arg(short = 'd')]
    debug: bool,
}

fn fake_rows() -> Vec<Value> {
    (1..=4).map(|seq| json!({ "tcp_seq": seq })).collect()
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = ClientConfig::from_antinex_env().map(|c| {
        let verbose = c.verbose && !args.silent;
        let debug = c.debug || args.debug;
        c.with_verbose(verbose).with_debug(debug)
    });
    let (verbose, debug) = config
        .as_ref()
        .map(|c| (c.verbose, c.debug))
        .unwrap_or((!args.silent, args.debug));
    let logger = cli::init_logging(verbose, debug);

    cli::run(&logger, || {
        let config = config.context("publish disabled ANTINEX_PUBLISH_ENABLED is not 1")?;
        let settings = RequestSettings::from_env();

        let rows = if args.use_fake_rows {
            fake_rows()
        } else {
            let datafile = args.datafile.clone().unwrap_or_else(|| {
                std::env::var_os("DATAFILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATAFILE))
            });
            info!(datafile = %datafile.display(), "loading request");
            let request = cli::read_json(&datafile)?;
            request["predict_rows"]
                .as_array()
                .cloned()
                .with_context(|| format!("missing predict_rows in {}", datafile.display()))?
        };

        let generated = generate_ai_request(&rows, None, &settings);
        cli::check(&generated, "generate_ai_request")?;
        let body = generated.data.unwrap_or_default();

        info!("creating client");
        let mut client = cli::connect(config, logger.clone())?;

        info!("running job");
        let started = cli::call_with_relogin(|| client.run_job(&body))?;
        cli::check(&started, "job")?;
        let data = started.data.unwrap_or_default();
        let job_id = data["job"]["id"]
            .as_i64()
            .context("missing job dictionary in response data")?;
        info!(job_id, result_id = %data["results"]["id"], "started job");

        let finished = client.wait_for_job_to_finish(job_id)?;
        cli::check(&finished, &format!("waiting for job.id={}", job_id))?;
        let outcome: JobOutcome = serde_json::from_value(finished.data.unwrap_or_default())?;

        info!(job_id, predictions = outcome.predictions().len(), "job is done");
        cli::print_json("predictions", &Value::Array(outcome.predictions().to_vec()))?;
        Ok(())
    })
}
