use colored::Colorize;

/// Print an error message to stderr with a red cross prefix.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg.red());
}

/// Print a dimmed label to stderr, for debug dumps.
pub fn label(msg: &str) {
    eprintln!("{}", msg.dimmed());
}
