use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use crate::cli::{output, Cli};
use crate::config::{self, StatuslineConfig};
use crate::context::{self, Ambient};
use crate::git;
use crate::input::{self, stdin};
use crate::template::{self, color, DEFAULT_TEMPLATE};
use crate::transcript::TranscriptReader;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Read the session JSON from stdin, render one status line, print it.
pub fn run(cli: Cli) -> Result<()> {
    // 1. Colors. Directive escapes are stripped after rendering; this only
    //    affects our own stderr messages.
    let no_color = cli.no_color || std::env::var_os("NO_COLOR").is_some();
    if no_color {
        colored::control::set_override(false);
    }

    // 2. Logging to stderr, stdout carries only the line.
    init_tracing(cli.debug);

    // 3. Config (silent fallback to defaults)
    let config = config::load();

    // 4. Stdin
    let raw = stdin::read_stdin(config.stdin_timeout()).context("failed to read stdin")?;
    let input = input::parse_input(&raw)?;

    if cli.debug {
        output::label("Input data:");
        eprintln!("{}", serde_json::to_string_pretty(&Value::Object(input.clone()))?);
    }

    // 5. Render
    let template = select_template(cli.template.as_deref(), &config);
    let line = render_line(template, input, &Ambient::detect(), &config)?;

    // 6. Print exactly one line to stdout
    if no_color {
        println!("{}", color::strip_ansi(&line));
    } else {
        println!("{}", line);
    }

    Ok(())
}

/// Default level `warn`, `debug` with `--debug`. `RUST_LOG` wins over both.
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// `--template` (or its env var), then the config file, then the built-in.
fn select_template<'a>(flag: Option<&'a str>, config: &'a StatuslineConfig) -> &'a str {
    flag.or(config.template.as_deref())
        .unwrap_or(DEFAULT_TEMPLATE)
}

/// Build the context for `input` and render `template` against it.
fn render_line(
    template: &str,
    input: Map<String, Value>,
    ambient: &Ambient,
    config: &StatuslineConfig,
) -> Result<String> {
    let mut ctx = context::build(input, ambient);
    if config.git.enabled {
        git::fill_context(&mut ctx, template, &config.git);
    }

    let line = if template::uses_computed_functions(template) {
        template::render(
            template,
            &ctx,
            &TranscriptReader,
            config.compaction_threshold,
        )
        .context("failed to render template")?
    } else {
        template::render_sync(template, &ctx).context("failed to render template")?
    };

    Ok(line)
}
