//! Inline color directives: `{{color:spec:text}}`.
//!
//! `spec` is a comma-separated list of style names (`red`, `brightBlue`,
//! `bgYellow`, `bold`, ...). Directives are expanded before Mustache
//! substitution and are not nested.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const RESET: &str = "\x1b[0m";

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{color:([^:]+):([^}]+)\}\}").expect("valid color directive pattern")
});

static SGR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid SGR pattern"));

/// Escape code for a single style name, matched case-sensitively.
fn code_for(name: &str) -> Option<&'static str> {
    let code = match name {
        "black" => "\x1b[30m",
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "magenta" => "\x1b[35m",
        "cyan" => "\x1b[36m",
        "white" => "\x1b[37m",

        "brightBlack" => "\x1b[90m",
        "brightRed" => "\x1b[91m",
        "brightGreen" => "\x1b[92m",
        "brightYellow" => "\x1b[93m",
        "brightBlue" => "\x1b[94m",
        "brightMagenta" => "\x1b[95m",
        "brightCyan" => "\x1b[96m",
        "brightWhite" => "\x1b[97m",

        "bgBlack" => "\x1b[40m",
        "bgRed" => "\x1b[41m",
        "bgGreen" => "\x1b[42m",
        "bgYellow" => "\x1b[43m",
        "bgBlue" => "\x1b[44m",
        "bgMagenta" => "\x1b[45m",
        "bgCyan" => "\x1b[46m",
        "bgWhite" => "\x1b[47m",

        "bold" => "\x1b[1m",
        "dim" => "\x1b[2m",
        "italic" => "\x1b[3m",
        "underline" => "\x1b[4m",
        "blink" => "\x1b[5m",
        "reverse" => "\x1b[7m",
        "hidden" => "\x1b[8m",
        "strikethrough" => "\x1b[9m",

        _ => return None,
    };
    Some(code)
}

/// Resolve a color spec into the concatenated escape prefix.
///
/// Each token is tried as written, then lowercased. Unknown tokens add
/// nothing; an empty result means the spec named no known style.
pub fn resolve(spec: &str) -> String {
    spec.split(',')
        .map(str::trim)
        .filter_map(|token| code_for(token).or_else(|| code_for(&token.to_lowercase())))
        .collect()
}

/// Expand every color directive in `template`.
pub fn apply_directives(template: &str) -> String {
    DIRECTIVE
        .replace_all(template, |caps: &Captures| {
            let prefix = resolve(&caps[1]);
            if prefix.is_empty() {
                caps[2].to_string()
            } else {
                format!("{}{}{}", prefix, &caps[2], RESET)
            }
        })
        .into_owned()
}

/// Remove ANSI SGR sequences, for `--no-color` output.
pub fn strip_ansi(s: &str) -> String {
    SGR.replace_all(s, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_single() {
        assert_eq!(resolve("red"), "\x1b[31m");
    }

    #[test]
    fn test_resolve_list_keeps_order_and_trims() {
        assert_eq!(resolve("red, bold"), "\x1b[31m\x1b[1m");
        assert_eq!(resolve(" bold ,red"), "\x1b[1m\x1b[31m");
    }

    #[test]
    fn test_resolve_camel_case_names() {
        assert_eq!(resolve("brightCyan"), "\x1b[96m");
        assert_eq!(resolve("bgRed"), "\x1b[41m");
    }

    #[test]
    fn test_resolve_lowercase_retry() {
        assert_eq!(resolve("RED"), "\x1b[31m");
        assert_eq!(resolve("Bold"), "\x1b[1m");
        // "brightred" is not in the table; only the exact camelCase name is.
        assert_eq!(resolve("BRIGHTRED"), "");
    }

    #[test]
    fn test_resolve_skips_unknown_tokens() {
        assert_eq!(resolve("invalidcolor"), "");
        assert_eq!(resolve("nope,green,"), "\x1b[32m");
    }

    #[test]
    fn test_apply_single_color() {
        assert_eq!(apply_directives("{{color:red:Error}}"), "\x1b[31mError\x1b[0m");
    }

    #[test]
    fn test_apply_multiple_styles() {
        assert_eq!(
            apply_directives("{{color:red,bold:Important}}"),
            "\x1b[31m\x1b[1mImportant\x1b[0m"
        );
        assert_eq!(
            apply_directives("{{color:white,bgRed:Alert}}"),
            "\x1b[37m\x1b[41mAlert\x1b[0m"
        );
    }

    #[test]
    fn test_apply_unknown_color_leaves_text_unstyled() {
        assert_eq!(apply_directives("{{color:invalidcolor:Text}}"), "Text");
    }

    #[test]
    fn test_text_may_contain_colons() {
        assert_eq!(
            apply_directives("{{color:cyan:Model:}} {{modelName}}"),
            "\x1b[36mModel:\x1b[0m {{modelName}}"
        );
    }

    #[test]
    fn test_text_is_not_reprocessed() {
        // The text span stops at the first closing brace, so a nested
        // placeholder is copied as literal text and its braces are split.
        let out = apply_directives("{{color:red:{{x}}}}");
        assert_eq!(out, "\x1b[31m{{x\x1b[0m}}");
    }

    #[test]
    fn test_adjacent_directives() {
        let out = apply_directives("{{color:red:a}}{{color:blue:b}}");
        assert_eq!(out, "\x1b[31ma\x1b[0m\x1b[34mb\x1b[0m");
    }

    #[test]
    fn test_non_directives_untouched() {
        assert_eq!(apply_directives("{{modelName}} | {{color}}"), "{{modelName}} | {{color}}");
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31m\x1b[1mhi\x1b[0m there"), "hi there");
        assert_eq!(strip_ansi("plain"), "plain");
    }
}
