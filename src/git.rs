//! Git fallback for the branch and working-tree fields.
//!
//! Only used when the template asks for a git field that the input did not
//! provide. Every failure degrades to an empty field.

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use wait_timeout::ChildExt;

use crate::config::GitConfig;
use crate::context::RenderContext;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git executable not found")]
    NotInstalled,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("`git {0}` timed out after {1:?}")]
    Timeout(String, Duration),
    #[error("`git {0}` failed with status {1}")]
    Failed(String, ExitStatus),
    #[error("`git {0}` produced more than {1} bytes")]
    OutputTooLarge(String, usize),
}

/// Run git in `cwd` with a timeout and an output cap. Returns stdout.
pub fn run_git(args: &[&str], cwd: &Path, settings: &GitConfig) -> Result<String, GitError> {
    let git = which::which("git").map_err(|_| GitError::NotInstalled)?;
    let command = args.join(" ");
    let limit = settings.max_output_bytes;

    let mut child = Command::new(git)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    // Drain stdout while waiting so a chatty git cannot fill the pipe and stall.
    let stdout = child.stdout.take();
    let reader = thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(out) = stdout {
            out.take(limit as u64 + 1).read_to_end(&mut buf)?;
        }
        Ok(buf)
    });

    let timeout = settings.timeout();
    match child.wait_timeout(timeout)? {
        Some(status) if status.success() => {}
        Some(status) => return Err(GitError::Failed(command, status)),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(GitError::Timeout(command, timeout));
        }
    }

    let buf = reader
        .join()
        .map_err(|_| std::io::Error::other("git output reader panicked"))??;
    if buf.len() > limit {
        return Err(GitError::OutputTooLarge(command, limit));
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Counts from `git status --porcelain`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub staged: usize,
    pub modified: usize,
    pub untracked: usize,
    pub deleted: usize,
    pub entries: usize,
}

impl StatusSummary {
    pub fn parse(porcelain: &str) -> Self {
        let mut summary = StatusSummary::default();
        for line in porcelain.lines().filter(|l| !l.trim().is_empty()) {
            summary.entries += 1;
            if line.starts_with(" M") || line.starts_with("M ") {
                summary.modified += 1;
            }
            if line.starts_with("??") {
                summary.untracked += 1;
            }
            if line.starts_with(" D") || line.starts_with("D ") {
                summary.deleted += 1;
            }
            if line.starts_with(['M', 'A', 'D', 'R', 'C']) {
                summary.staged += 1;
            }
        }
        summary
    }

    pub fn is_clean(&self) -> bool {
        self.entries == 0
    }

    /// e.g. `2 staged, 1 modified`; `clean` or `changes` when nothing counts.
    pub fn describe(&self) -> String {
        if self.is_clean() {
            return "clean".to_string();
        }
        let parts: Vec<String> = [
            (self.staged, "staged"),
            (self.modified, "modified"),
            (self.untracked, "untracked"),
            (self.deleted, "deleted"),
        ]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{} {}", n, label))
        .collect();

        if parts.is_empty() {
            "changes".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// One-character indicator, most significant state first.
    pub fn symbol(&self) -> &'static str {
        if self.is_clean() {
            "\u{2713}"
        } else if self.staged > 0 {
            "\u{25CF}"
        } else if self.modified > 0 {
            "\u{2731}"
        } else if self.untracked > 0 {
            "\u{2026}"
        } else {
            "\u{25CB}"
        }
    }
}

pub fn branch(cwd: &Path, settings: &GitConfig) -> Option<String> {
    match run_git(&["rev-parse", "--abbrev-ref", "HEAD"], cwd, settings) {
        Ok(out) => Some(out.trim().to_string()).filter(|b| !b.is_empty()),
        Err(err) => {
            tracing::debug!("git branch unavailable: {}", err);
            None
        }
    }
}

pub fn status(cwd: &Path, settings: &GitConfig) -> Option<StatusSummary> {
    match run_git(&["--no-optional-locks", "status", "--porcelain"], cwd, settings) {
        Ok(out) => Some(StatusSummary::parse(&out)),
        Err(err) => {
            tracing::debug!("git status unavailable: {}", err);
            None
        }
    }
}

fn is_blank(context: &RenderContext, key: &str) -> bool {
    context
        .get(key)
        .and_then(Value::as_str)
        .map_or(true, str::is_empty)
}

/// Fill git fields the template references but the input left empty.
pub fn fill_context(context: &mut RenderContext, template: &str, settings: &GitConfig) {
    let wants_branch = template.contains("gitBranch") && is_blank(context, "gitBranch");
    let wants_status = template.contains("gitStatusShort")
        || (template.contains("gitStatus") && is_blank(context, "gitStatus"));
    if !wants_branch && !wants_status {
        return;
    }

    let cwd = match context.get("processedCwd").and_then(Value::as_str) {
        Some(dir) if Path::new(dir).is_dir() => Path::new(dir).to_path_buf(),
        _ => return,
    };

    if wants_branch {
        if let Some(name) = branch(&cwd, settings) {
            context.insert("gitBranch".to_string(), json!(name));
        }
    }

    if wants_status {
        if let Some(summary) = status(&cwd, settings) {
            if is_blank(context, "gitStatus") {
                context.insert("gitStatus".to_string(), json!(summary.describe()));
            }
            context.insert("gitStatusShort".to_string(), json!(summary.symbol()));
        }
    }
}
