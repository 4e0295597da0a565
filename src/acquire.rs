//! Repository acquisition and metadata, both through the `git` binary.

use crate::error::{Error, Result};
use serde::Serialize;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;
use tracing::{debug, info};

const UNKNOWN: &str = "Unknown";

/// A shallow clone living in a temporary directory.
///
/// The directory is removed when this value is dropped.
#[derive(Debug)]
pub struct ClonedRepository {
    url: String,
    dir: TempDir,
}

impl ClonedRepository {
    /// Returns the working directory of the clone.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the URL the clone was made from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Clones `url` with `git clone --depth 1` into a fresh temporary directory.
///
/// # Errors
///
/// Returns [`Error::Acquisition`] if the temporary directory cannot be
/// created, `git` cannot be started, or the clone fails.
pub fn clone_repository(url: &str) -> Result<ClonedRepository> {
    let dir = tempfile::Builder::new()
        .prefix("repo2txt-")
        .tempdir()
        .map_err(|e| Error::acquisition(url, format!("cannot create temporary directory: {e}")))?;

    info!("Cloning {} into {}", url, dir.path().display());

    let output = Command::new("git")
        .args(["clone", "--depth", "1", "--quiet", url])
        .arg(dir.path())
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::acquisition(url, format!("cannot run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::acquisition(url, stderr.trim().to_string()));
    }

    Ok(ClonedRepository {
        url: url.to_string(),
        dir,
    })
}

/// Origin, branch and last commit of a working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryInfo {
    /// Origin remote URL
    pub url: String,
    /// Checked-out branch
    pub branch: String,
    /// Last commit as `<hash> - <author>, <age> : <subject>`
    pub last_commit: String,
}

impl RepositoryInfo {
    /// Reads the information through `git`; fields it cannot determine are
    /// `Unknown`.
    #[must_use]
    pub fn read(repo: &Path) -> Self {
        Self {
            url: git(repo, &["config", "--get", "remote.origin.url"]),
            branch: git(repo, &["rev-parse", "--abbrev-ref", "HEAD"]),
            last_commit: git(repo, &["log", "-1", "--pretty=format:%h - %an, %ar : %s"]),
        }
    }
}

fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .stdin(Stdio::null())
        .output();

    match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        Ok(output) => {
            debug!("git {} failed with {}", args.join(" "), output.status);
            UNKNOWN.to_string()
        }
        Err(e) => {
            debug!("Cannot run git: {e}");
            UNKNOWN.to_string()
        }
    }
}
