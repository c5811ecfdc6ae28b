pub mod output;
pub mod statusline;

use clap::Parser;

/// Prompt status line with Mustache template support
#[derive(Parser)]
#[command(name = "ccstatusline", version, about, long_about = None)]
pub struct Cli {
    /// Mustache template string
    #[arg(long, short, env = "CCSTATUSLINE_TEMPLATE")]
    pub template: Option<String>,

    /// Disable ANSI colors (also respects NO_COLOR env var)
    #[arg(long)]
    pub no_color: bool,

    /// Debug mode - show input data on stderr
    #[arg(long, short)]
    pub debug: bool,
}
