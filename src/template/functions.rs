//! Computed placeholders backed by the session transcript.

use crate::transcript::{
    compaction_color, compaction_percentage, format_token_count, TokenSource,
};

use super::color::RESET;

/// The fixed set of computed placeholders, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedFunction {
    TokenCount,
    TokenCountRaw,
    CompactionPercentage,
    CompactionPercentageColored,
    TokenCountColored,
}

impl ComputedFunction {
    pub const ALL: [ComputedFunction; 5] = [
        ComputedFunction::TokenCount,
        ComputedFunction::TokenCountRaw,
        ComputedFunction::CompactionPercentage,
        ComputedFunction::CompactionPercentageColored,
        ComputedFunction::TokenCountColored,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComputedFunction::TokenCount => "tokenCount",
            ComputedFunction::TokenCountRaw => "tokenCountRaw",
            ComputedFunction::CompactionPercentage => "compactionPercentage",
            ComputedFunction::CompactionPercentageColored => "compactionPercentageColored",
            ComputedFunction::TokenCountColored => "tokenCountColored",
        }
    }

    /// The exact placeholder text, e.g. `{{tokenCount}}`.
    pub fn placeholder(self) -> String {
        format!("{{{{{}}}}}", self.name())
    }

    pub fn evaluate<S: TokenSource>(self, tokens: &mut TokenCache<'_, S>) -> String {
        let total = tokens.total();
        match self {
            ComputedFunction::TokenCount => format_token_count(total),
            ComputedFunction::TokenCountRaw => total.to_string(),
            ComputedFunction::CompactionPercentage => tokens.percentage().to_string(),
            ComputedFunction::CompactionPercentageColored => {
                let pct = tokens.percentage();
                format!("{}{}%{}", compaction_color(pct), pct, RESET)
            }
            ComputedFunction::TokenCountColored => {
                let pct = tokens.percentage();
                format!("{}{}{}", compaction_color(pct), format_token_count(total), RESET)
            }
        }
    }
}

/// Token total for a single render call.
///
/// The transcript is consulted at most once, however many computed
/// placeholders the template uses. An empty transcript path yields zero
/// without touching the source.
pub struct TokenCache<'s, S: TokenSource> {
    source: &'s S,
    transcript_path: String,
    threshold: u64,
    cached: Option<u64>,
}

impl<'s, S: TokenSource> TokenCache<'s, S> {
    pub fn new(source: &'s S, transcript_path: &str, threshold: u64) -> Self {
        Self {
            source,
            transcript_path: transcript_path.to_string(),
            threshold,
            cached: None,
        }
    }

    pub fn total(&mut self) -> u64 {
        if let Some(tokens) = self.cached {
            return tokens;
        }
        if self.transcript_path.is_empty() {
            return 0;
        }
        tracing::debug!("reading token usage from {}", self.transcript_path);
        let tokens = self.source.token_total(&self.transcript_path);
        self.cached = Some(tokens);
        tokens
    }

    pub fn percentage(&mut self) -> u64 {
        compaction_percentage(self.total(), self.threshold)
    }
}
