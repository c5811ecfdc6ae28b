//! Token accounting from a session transcript.
//!
//! A transcript is a JSONL log with one conversation record per line. The
//! most recent assistant record that carries a `usage` block describes the
//! current size of the context window, so only that record is counted.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::context::format::one_decimal;

/// Size of the model context window, in tokens.
pub const CONTEXT_WINDOW_TOKENS: u64 = 200_000;

/// Compaction kicks in at 80% of the context window (160,000 tokens).
pub const DEFAULT_COMPACTION_THRESHOLD: u64 = CONTEXT_WINDOW_TOKENS * 80 / 100;

pub const DANGER_COLOR: &str = "\x1b[31m";
pub const WARNING_COLOR: &str = "\x1b[33m";
pub const OK_COLOR: &str = "\x1b[32m";

/// Anything that can report the token total for a transcript path.
///
/// The renderer only ever talks to this trait, which keeps the file read
/// swappable and countable.
pub trait TokenSource {
    fn token_total(&self, transcript_path: &str) -> u64;
}

/// Reads token totals straight from transcript files on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct TranscriptReader;

impl TokenSource for TranscriptReader {
    fn token_total(&self, transcript_path: &str) -> u64 {
        read_token_total(transcript_path)
    }
}

/// Usage counters attached to an assistant message.
///
/// Counters that are not non-negative numbers read as absent, so an odd value
/// never hides the record that carries it.
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    #[serde(default, deserialize_with = "lenient_count")]
    pub input_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub output_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub cache_read_input_tokens: Option<u64>,
}

/// Whole tokens from any JSON number; fractions truncate, negatives and
/// non-numbers are absent.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f > 0.0)
                .map(|f| f as u64)
        }),
        _ => None,
    };
    Ok(count)
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// A `usage` object; anything else counts as no usage block.
fn lenient_usage<'de, D>(deserializer: D) -> Result<Option<TokenUsage>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => Ok(TokenUsage::deserialize(value).ok()),
        _ => Ok(None),
    }
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        [
            self.input_tokens,
            self.output_tokens,
            self.cache_creation_input_tokens,
            self.cache_read_input_tokens,
        ]
        .iter()
        .map(|n| n.unwrap_or(0))
        .fold(0u64, u64::saturating_add)
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptRecord {
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<TranscriptMessage>,
}

#[derive(Debug, Deserialize)]
struct TranscriptMessage {
    #[serde(default, deserialize_with = "lenient_text")]
    role: Option<String>,
    #[serde(default, deserialize_with = "lenient_usage")]
    usage: Option<TokenUsage>,
}

impl TranscriptRecord {
    /// Usage of this record if it is an assistant turn that reports one.
    fn assistant_usage(self) -> Option<TokenUsage> {
        let message = self.message?;
        let is_assistant = self.kind.as_deref() == Some("assistant")
            || message.role.as_deref() == Some("assistant");
        if is_assistant {
            message.usage
        } else {
            None
        }
    }
}

/// Read the token total of the last assistant turn in a transcript.
///
/// Never fails: an empty path, a missing file, or an unreadable file all
/// count as zero tokens. Read errors are logged.
pub fn read_token_total(transcript_path: &str) -> u64 {
    if transcript_path.is_empty() {
        return 0;
    }

    let path = Path::new(transcript_path);
    if !path.exists() {
        return 0;
    }

    match std::fs::read(path) {
        Ok(bytes) => {
            let contents = String::from_utf8_lossy(&bytes);
            last_assistant_usage(&contents)
                .map(|usage| usage.total())
                .unwrap_or(0)
        }
        Err(err) => {
            tracing::warn!("error reading transcript {}: {}", path.display(), err);
            0
        }
    }
}

/// Scan transcript lines from the end and return the usage block of the
/// first assistant record found. Undecodable lines are skipped.
pub fn last_assistant_usage(contents: &str) -> Option<TokenUsage> {
    contents
        .lines()
        .rev()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<TranscriptRecord>(line).ok())
        .find_map(TranscriptRecord::assistant_usage)
}

/// Format a token count for display (e.g. 125000 -> "125.0K").
///
/// One decimal place, rounded like the duration fields.
pub fn format_token_count(tokens: u64) -> String {
    if tokens >= 1_000_000 {
        format!("{}M", one_decimal(tokens as f64 / 1_000_000.0))
    } else if tokens >= 1_000 {
        format!("{}K", one_decimal(tokens as f64 / 1_000.0))
    } else {
        tokens.to_string()
    }
}

/// Percentage of the compaction threshold used, clamped to 0..=100.
pub fn compaction_percentage(tokens: u64, threshold: u64) -> u64 {
    let threshold = threshold.max(1) as f64;
    let percentage = tokens.saturating_mul(100) as f64 / threshold;
    percentage.min(100.0).round() as u64
}

/// Color for a compaction percentage: red from 90%, yellow from 70%, else green.
pub fn compaction_color(percentage: u64) -> &'static str {
    if percentage >= 90 {
        DANGER_COLOR
    } else if percentage >= 70 {
        WARNING_COLOR
    } else {
        OK_COLOR
    }
}
