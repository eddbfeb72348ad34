use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use av_app::client::{ApiKey, ClientConfig, GeminiClient};
use av_app::render::AngleOutcome;
use av_app::worker::{RenderWorker, WorkerResponse};
use av_core::builder::{self, JobDraft};

const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Parser)]
#[command(
    name = "archviz",
    version,
    about = "Generate architectural visualization renders from a job description"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every camera angle of a job description
    Render {
        /// Path to the job description JSON
        job: PathBuf,

        /// Root directory for run outputs
        #[arg(long, default_value = "outputs")]
        out_dir: PathBuf,

        /// Override the job's model id
        #[arg(long)]
        model: Option<String>,

        /// API key; falls back to the GEMINI_API_KEY environment variable
        #[arg(long)]
        api_key: Option<String>,
    },
    /// List the models the provider offers for this key
    ListModels {
        /// API key; falls back to the GEMINI_API_KEY environment variable
        #[arg(long)]
        api_key: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render { job, out_dir, model, api_key } => {
            run_render(&job, out_dir, model, api_key)
        }
        Command::ListModels { api_key } => list_models(api_key),
    }
}

fn run_render(
    job_path: &Path,
    out_dir: PathBuf,
    model: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let mut draft = load_draft(job_path)?;
    if let Some(model) = model {
        draft.model_id = model;
    }

    let job = match builder::build(&draft) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("job validation failed:");
            for issue in &e.issues {
                eprintln!("  - {issue}");
            }
            bail!("fix the listed problems and try again");
        }
    };

    let api_key = resolve_api_key(api_key)?;
    let client = GeminiClient::new(ClientConfig::default())?;
    let mut worker = RenderWorker::spawn(client, out_dir);
    worker.render(job, api_key).map_err(|e| anyhow::anyhow!(e))?;

    let report = loop {
        match worker.recv_response() {
            Some(WorkerResponse::Status(status)) => log::info!("{status}"),
            Some(WorkerResponse::AngleDone(result)) => match &result.outcome {
                AngleOutcome::Succeeded { path } => {
                    println!("ok      {}/{} -> {}", result.section, result.angle, path.display());
                }
                AngleOutcome::Failed { reason } => {
                    println!("FAILED  {}/{}: {reason}", result.section, result.angle);
                }
            },
            Some(WorkerResponse::Finished(report)) => break report,
            Some(WorkerResponse::Error(e)) => bail!("render run failed: {e}"),
            None => bail!("render worker stopped unexpectedly"),
        }
    };
    worker.shutdown();

    println!(
        "{} succeeded, {} failed ({})",
        report.succeeded(),
        report.failed(),
        report.run_dir.display()
    );
    if report.failed() > 0 {
        bail!("{} of {} angle(s) failed", report.failed(), report.results.len());
    }
    Ok(())
}

fn list_models(api_key: Option<String>) -> anyhow::Result<()> {
    let api_key = resolve_api_key(api_key)?;
    let client = GeminiClient::new(ClientConfig::default())?;
    let listing = client.list_models(&api_key)?;
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn load_draft(path: &Path) -> anyhow::Result<JobDraft> {
    let file = File::open(path)
        .with_context(|| format!("cannot open job file `{}`", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("cannot parse job file `{}`", path.display()))
}

fn resolve_api_key(flag: Option<String>) -> anyhow::Result<ApiKey> {
    let key = match flag {
        Some(key) => key,
        None => std::env::var(API_KEY_ENV)
            .with_context(|| format!("no API key: pass --api-key or set {API_KEY_ENV}"))?,
    };
    if key.trim().is_empty() {
        bail!("API key is empty");
    }
    Ok(ApiKey::new(key))
}
