use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transcript::DEFAULT_COMPACTION_THRESHOLD;

/// User settings for the status line.
/// Every field has a default; a missing file is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatuslineConfig {
    /// Template used when `--template` is not given.
    pub template: Option<String>,

    /// Token count at which compaction is reported as 100%.
    /// Default: 160000
    pub compaction_threshold: u64,

    /// How long to wait for the first byte on stdin.
    /// Default: 100
    pub stdin_timeout_ms: u64,

    pub git: GitConfig,
}

impl Default for StatuslineConfig {
    fn default() -> Self {
        Self {
            template: None,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            stdin_timeout_ms: 100,
            git: GitConfig::default(),
        }
    }
}

/// Settings for the `git` fallback used when the input carries no git data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub enabled: bool,

    /// Default: 5000
    pub timeout_ms: u64,

    /// Default: 10 MiB
    pub max_output_bytes: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 5000,
            max_output_bytes: 10 * 1024 * 1024,
        }
    }
}

impl GitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// A validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigMessage {
    Warning(String),
    Error(String),
}

impl StatuslineConfig {
    pub fn stdin_timeout(&self) -> Duration {
        Duration::from_millis(self.stdin_timeout_ms)
    }

    /// Put every field that `validate` reports as an error back to its
    /// default, keeping the rest of the file.
    pub fn reset_invalid(&mut self) {
        let defaults = StatuslineConfig::default();
        if self.compaction_threshold == 0 {
            self.compaction_threshold = defaults.compaction_threshold;
        }
        if self.git.enabled && self.git.timeout_ms == 0 {
            self.git.timeout_ms = defaults.git.timeout_ms;
        }
        if self.git.enabled && self.git.max_output_bytes == 0 {
            self.git.max_output_bytes = defaults.git.max_output_bytes;
        }
    }

    pub fn validate(&self) -> Vec<ConfigMessage> {
        let mut messages = Vec::new();

        if self.compaction_threshold == 0 {
            messages.push(ConfigMessage::Error(
                "compaction_threshold must be greater than zero".to_string(),
            ));
        }
        if self.stdin_timeout_ms > 1000 {
            messages.push(ConfigMessage::Warning(format!(
                "stdin_timeout_ms = {} may delay every prompt",
                self.stdin_timeout_ms
            )));
        }
        if self.git.enabled && self.git.timeout_ms == 0 {
            messages.push(ConfigMessage::Error(
                "git.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.git.enabled && self.git.max_output_bytes == 0 {
            messages.push(ConfigMessage::Error(
                "git.max_output_bytes must be greater than zero".to_string(),
            ));
        }
        if matches!(&self.template, Some(t) if t.trim().is_empty()) {
            messages.push(ConfigMessage::Warning(
                "template is empty; the status line will be blank".to_string(),
            ));
        }

        messages
    }
}
