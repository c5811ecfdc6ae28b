mod cli;
mod config;
mod context;
mod error;
mod git;
mod input;
mod template;
mod transcript;

use clap::Parser;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli::statusline::run(cli) {
        cli::output::error(&format!("Error: {:#}", err));
        std::process::exit(1);
    }
}
