// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod job;
pub mod logging;
pub mod queue;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::job::{GitJob, Output, Preset};
use crate::queue::JobQueue;

/// High-level entry point used by `main.rs`.
///
/// Wires together config loading, job construction and either a single
/// blocking invocation or a batch run through the queue. Returns the exit
/// code the process should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config = config::load_optional(args.config.as_deref().map(Path::new))?;
    let repo = PathBuf::from(&args.repo);

    if args.probe_version {
        let job = GitJob::with_executable(config.git.executable.clone(), &repo);
        return match job.version().await {
            Some(version) => {
                println!("{version}");
                Ok(0)
            }
            None => {
                eprintln!("could not determine the git version");
                Ok(1)
            }
        };
    }

    if let Some(batch) = &args.batch {
        return run_batch(&config, &repo, Path::new(batch)).await;
    }

    if args.args.is_empty() {
        anyhow::bail!("no git arguments given (try `gitqueue -- status --short`)");
    }

    let job = GitJob::with_executable(config.git.executable.clone(), &repo);
    let (stdout, stderr) = job
        .run_blocking(Some(args.args.clone()), args.binary)
        .await?;
    emit(&stdout, &mut io::stdout())?;
    emit(&stderr, &mut io::stderr())?;

    Ok(exit_code_of(&job))
}

/// Run every command in the batch file through a queue, strictly in file
/// order, then print each job's output in that same order.
async fn run_batch(config: &ConfigFile, repo: &Path, batch: &Path) -> Result<i32> {
    let contents = std::fs::read_to_string(batch)
        .with_context(|| format!("reading batch file {}", batch.display()))?;
    let commands = batch_commands(&contents);
    if commands.is_empty() {
        anyhow::bail!("batch file {} contains no commands", batch.display());
    }

    info!(commands = commands.len(), "running batch through the queue");

    let queue = JobQueue::new();
    let mut jobs = Vec::with_capacity(commands.len());
    for command in commands {
        let job = GitJob::with_executable_and_preset(
            config.git.executable.clone(),
            repo,
            Preset::text(command),
        );
        jobs.push(job.clone());
        queue.enqueue(job);
    }

    while !queue.is_empty() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let mut exit_code = 0;
    for job in &jobs {
        match (job.stdout(), job.stderr()) {
            (Some(stdout), Some(stderr)) => {
                emit(&stdout, &mut io::stdout())?;
                emit(&stderr, &mut io::stderr())?;
            }
            // Skipped by the queue (e.g. the executable vanished mid-batch).
            _ => warn!(job_id = job.id(), "job never produced output"),
        }
        let code = exit_code_of(job);
        if exit_code == 0 && code != 0 {
            exit_code = code;
        }
    }
    Ok(exit_code)
}

/// Split batch file contents into one argument list per non-empty,
/// non-comment line.
pub fn batch_commands(contents: &str) -> Vec<Vec<String>> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect()
}

fn emit(output: &Output, sink: &mut impl Write) -> io::Result<()> {
    match output {
        Output::Text(lines) => {
            for line in lines {
                writeln!(sink, "{line}")?;
            }
            Ok(())
        }
        Output::Binary(bytes) => {
            sink.write_all(bytes)?;
            sink.flush()
        }
    }
}

/// Map a job's recorded exit code to a process exit code: signal-terminated
/// or never-ran jobs count as plain failure.
fn exit_code_of(job: &GitJob) -> i32 {
    match job.exit_code() {
        Some(code) if code >= 0 => code,
        _ => 1,
    }
}
