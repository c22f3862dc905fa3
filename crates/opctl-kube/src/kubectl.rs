//! `kubectl apply` and `kubectl delete` of generated manifests
//!
//! Applying a fresh platform races with its own CRDs: resources of a kind
//! registered earlier in the same file are rejected until the API server
//! serves the new kind. Those failures are retried a bounded number of times.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::error::{KubeError, Result};

/// stderr fragments of failures worth retrying
const TRANSIENT_MARKERS: &[&str] = &["no matches for kind", "ensure CRDs are installed first"];

/// stderr fragments meaning the resource is already gone
const ABSENT_MARKERS: &[&str] = &[
    "not found",
    "no matches for kind",
    "the server could not find the requested resource",
];

/// Bounded retry of transient apply failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// Output of a successful kubectl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubectlOutput {
    pub stdout: String,
    pub stderr: String,
}

pub fn is_transient(stderr: &str) -> bool {
    TRANSIENT_MARKERS.iter().any(|marker| stderr.contains(marker))
}

/// Lines of a delete's stderr that are real failures
pub fn delete_failures(stderr: &str) -> Vec<&str> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !ABSENT_MARKERS.iter().any(|marker| line.contains(marker)))
        .collect()
}

/// Runs the `kubectl` binary
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: PathBuf,
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl Kubectl {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str], path: &Path) -> Result<(bool, KubectlOutput)> {
        let output = Command::new(&self.program)
            .args(args)
            .arg("-f")
            .arg(path)
            .output()
            .await?;

        Ok((
            output.status.success(),
            KubectlOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
        ))
    }

    /// `kubectl apply -f <path>`, retrying while the failure is transient
    pub async fn apply_with_retry(&self, path: &Path, policy: RetryPolicy) -> Result<KubectlOutput> {
        let attempts = policy.attempts.max(1);
        let mut attempt = 1;

        loop {
            let (success, output) = self.run(&["apply"], path).await?;
            if success {
                return Ok(output);
            }

            if !is_transient(&output.stderr) {
                return Err(KubeError::Kubectl {
                    action: "apply".to_string(),
                    stderr: output.stderr.trim().to_string(),
                });
            }

            if attempt >= attempts {
                return Err(KubeError::RetriesExhausted {
                    action: "apply".to_string(),
                    attempts,
                    stderr: output.stderr.trim().to_string(),
                });
            }

            tracing::warn!(attempt, "resource kinds not registered yet, retrying apply");
            tokio::time::sleep(policy.delay).await;
            attempt += 1;
        }
    }

    /// `kubectl delete -f <path>`; resources that are already gone are not an error
    pub async fn delete(&self, path: &Path) -> Result<KubectlOutput> {
        let (success, output) = self.run(&["delete"], path).await?;
        if success {
            return Ok(output);
        }

        let failures = delete_failures(&output.stderr);
        if failures.is_empty() {
            tracing::debug!("ignored missing resources during delete");
            return Ok(output);
        }

        Err(KubeError::Kubectl {
            action: "delete".to_string(),
            stderr: failures.join("\n"),
        })
    }
}
