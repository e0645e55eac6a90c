use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

const GH_TIMEOUT: Duration = Duration::from_secs(30);

const RUN_FIELDS: &str = "name,displayTitle,headBranch,status,conclusion,jobs";

/// 50 MB; a full-run log beyond this is almost certainly not worth rendering.
const LOG_SIZE_LIMIT: usize = 50 * 1024 * 1024;

/// Where the viewer's data comes from. The poller only talks to this trait.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn check_available(&self) -> Result<()>;
    async fn detect_repo(&self) -> Result<String>;
    /// Run metadata as `gh run view --json` output.
    async fn fetch_run(&self, run_id: u64) -> Result<String>;
    /// Raw `gh run view --log` text, or `None` while GitHub has not published the log yet.
    async fn fetch_log(&self, run_id: u64, job_id: Option<u64>) -> Result<Option<String>>;
}

pub struct GhExecutor {
    pub repo: String,
}

impl GhExecutor {
    pub fn new(repo: String) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl LogSource for GhExecutor {
    async fn check_available(&self) -> Result<()> {
        run_gh(&["auth", "status"]).await.map(|_| ())
    }

    async fn detect_repo(&self) -> Result<String> {
        let output = run_gh(&[
            "repo",
            "view",
            "--json",
            "nameWithOwner",
            "-q",
            ".nameWithOwner",
        ])
        .await?;
        let repo = output.trim().to_string();
        if repo.is_empty() {
            return Err(eyre!("Could not detect repository. Use --repo flag."));
        }
        Ok(repo)
    }

    async fn fetch_run(&self, run_id: u64) -> Result<String> {
        let run_id_str = run_id.to_string();
        run_gh(&[
            "run",
            "view",
            "--repo",
            &self.repo,
            &run_id_str,
            "--json",
            RUN_FIELDS,
        ])
        .await
    }

    async fn fetch_log(&self, run_id: u64, job_id: Option<u64>) -> Result<Option<String>> {
        let run_id_str = run_id.to_string();
        let job_id_str = job_id.map(|id| id.to_string());
        let mut args: Vec<&str> = vec!["run", "view", "--repo", &self.repo, &run_id_str, "--log"];
        if let Some(job) = job_id_str.as_deref() {
            args.push("--job");
            args.push(job);
        }

        let output = gh_output(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_log_pending(&stderr) {
                tracing::debug!(run_id, "log not published yet");
                return Ok(None);
            }
            return Err(eyre!("{}", classify_gh_error(&stderr)));
        }

        let log = String::from_utf8_lossy(&output.stdout).to_string();
        check_log_size(&log)?;
        Ok(Some(log))
    }
}

async fn gh_output(args: &[&str]) -> Result<Output> {
    let start = std::time::Instant::now();
    let output = tokio::time::timeout(GH_TIMEOUT, Command::new("gh").args(args).output())
        .await
        .map_err(|_| eyre!("gh command timed out after {}s", GH_TIMEOUT.as_secs()))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                eyre!("gh CLI not found. Install it from https://cli.github.com/")
            } else {
                eyre!("Failed to run gh: {}", e)
            }
        })?;

    tracing::debug!(
        args = ?args,
        success = output.status.success(),
        elapsed_ms = start.elapsed().as_millis(),
        "gh command completed"
    );
    Ok(output)
}

async fn run_gh(args: &[&str]) -> Result<String> {
    let output = gh_output(args).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(eyre!("{}", classify_gh_error(&stderr)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn check_log_size(log: &str) -> Result<()> {
    if log.len() > LOG_SIZE_LIMIT {
        return Err(eyre!(
            "Log output too large ({:.1} MB, max {} MB)",
            log.len() as f64 / (1024.0 * 1024.0),
            LOG_SIZE_LIMIT / (1024 * 1024)
        ));
    }
    Ok(())
}

/// `gh run view --log` refuses to print anything until the run (or job) has finished.
pub fn is_log_pending(stderr: &str) -> bool {
    stderr.contains("still in progress") || stderr.contains("logs will be available")
}

pub fn classify_gh_error(stderr: &str) -> String {
    if stderr.contains("not logged") || stderr.contains("auth login") {
        "Not authenticated with gh. Run `gh auth login` first.".to_string()
    } else if stderr.contains("not a git repository") || stderr.contains("could not determine") {
        "Not in a GitHub repository. Use --repo flag or cd into a repo.".to_string()
    } else if stderr.contains("could not find any workflow run") || stderr.contains("HTTP 404") {
        "Run not found. Check the run id and --repo.".to_string()
    } else {
        let trimmed = stderr.trim();
        if trimmed.is_empty() {
            "gh command failed".to_string()
        } else {
            format!("gh command failed: {trimmed}")
        }
    }
}
