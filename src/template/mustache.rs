//! Mustache substitution over a JSON render context.
//!
//! Supports variables (`{{name}}`, `{{{name}}}`, `{{&name}}`, dotted names and
//! `{{.}}`), sections, inverted sections and comments. Values are never
//! escaped. Partials and delimiter changes are accepted but render nothing.

use std::borrow::Cow;

use serde_json::{Number, Value};

use super::TemplateError;
use crate::context::RenderContext;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const CLOSE_TRIPLE: &str = "}}}";

#[derive(Debug, PartialEq)]
enum Token<'t> {
    Text(&'t str),
    Variable(&'t str),
    Section {
        name: &'t str,
        inverted: bool,
        children: Vec<Token<'t>>,
    },
}

/// An open section while parsing.
struct Open<'t> {
    name: &'t str,
    inverted: bool,
    position: usize,
    tokens: Vec<Token<'t>>,
}

fn parse(template: &str) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut root: Vec<Token<'_>> = Vec::new();
    let mut open: Vec<Open<'_>> = Vec::new();
    let mut pos = 0;

    while let Some(offset) = template[pos..].find(OPEN) {
        let tag_start = pos + offset;
        if tag_start > pos {
            push(&mut open, &mut root, Token::Text(&template[pos..tag_start]));
        }

        let body_start = tag_start + OPEN.len();
        let sigil = template[body_start..].chars().next();
        let (body, next) = if sigil == Some('{') {
            let start = body_start + 1;
            let end = template[start..]
                .find(CLOSE_TRIPLE)
                .ok_or(TemplateError::UnclosedTag(tag_start))?;
            (&template[body_start..start + end], start + end + CLOSE_TRIPLE.len())
        } else {
            let end = template[body_start..]
                .find(CLOSE)
                .ok_or(TemplateError::UnclosedTag(tag_start))?;
            (&template[body_start..body_start + end], body_start + end + CLOSE.len())
        };
        pos = next;

        let (kind, name) = match body.chars().next() {
            Some(c @ ('#' | '^' | '/' | '!' | '>' | '=' | '&' | '{')) => (c, body[1..].trim()),
            _ => (' ', body.trim()),
        };

        match kind {
            '#' | '^' => open.push(Open {
                name,
                inverted: kind == '^',
                position: tag_start,
                tokens: Vec::new(),
            }),
            '/' => {
                let section = open.pop().ok_or_else(|| TemplateError::UnopenedSection {
                    name: name.to_string(),
                    position: tag_start,
                })?;
                if section.name != name {
                    return Err(TemplateError::UnclosedSection {
                        name: section.name.to_string(),
                        position: tag_start,
                    });
                }
                let token = Token::Section {
                    name: section.name,
                    inverted: section.inverted,
                    children: section.tokens,
                };
                push(&mut open, &mut root, token);
            }
            '!' | '>' | '=' => {}
            _ => push(&mut open, &mut root, Token::Variable(name)),
        }
    }

    if pos < template.len() {
        push(&mut open, &mut root, Token::Text(&template[pos..]));
    }

    if let Some(section) = open.pop() {
        return Err(TemplateError::UnclosedSection {
            name: section.name.to_string(),
            position: section.position,
        });
    }

    Ok(root)
}

fn push<'t>(open: &mut [Open<'t>], root: &mut Vec<Token<'t>>, token: Token<'t>) {
    match open.last_mut() {
        Some(section) => section.tokens.push(token),
        None => root.push(token),
    }
}

fn child<'a>(value: &'a Value, key: &str) -> Option<Cow<'a, Value>> {
    match value {
        Value::Object(map) => map.get(key).map(Cow::Borrowed),
        Value::Array(items) if key == "length" => Some(Cow::Owned(Value::from(items.len()))),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .map(Cow::Borrowed),
        // JavaScript string length counts UTF-16 units.
        Value::String(s) if key == "length" => {
            Some(Cow::Owned(Value::from(s.encode_utf16().count())))
        }
        _ => None,
    }
}

/// Resolve a tag name against the scope stack, innermost scope first.
///
/// `.` is the innermost scope itself, which at the top level is the whole
/// context. A dotted name only matches in a scope where every segment exists.
fn lookup<'a>(stack: &[&'a Value], name: &str) -> Option<Cow<'a, Value>> {
    if name == "." {
        return stack.last().map(|value| Cow::Borrowed(*value));
    }

    let mut segments = name.split('.');
    let first = segments.next()?;
    let rest: Vec<&str> = segments.collect();

    stack.iter().rev().find_map(|&scope| {
        let head = child(scope, first)?;
        rest.iter().try_fold(head, |value, key| match value {
            Cow::Borrowed(value) => child(value, key),
            Cow::Owned(_) => None,
        })
    })
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

/// Render a number the way a JavaScript template would print it.
fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Text for a variable tag.
///
/// Absent, null and `false` render as empty. Numbers always render, `0`
/// included, even though a `0` section is falsy.
fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Bool(true)) => "true".to_string(),
        Some(Value::Number(n)) => format_number(n),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Bool(false) => "false".to_string(),
                other => stringify(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(object @ Value::Object(_)) => object.to_string(),
    }
}

fn render_tokens<'a>(tokens: &[Token<'_>], stack: &mut Vec<&'a Value>, out: &mut String) {
    for token in tokens {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Variable(name) => out.push_str(&stringify(lookup(stack, name).as_deref())),
            Token::Section {
                name,
                inverted,
                children,
            } => {
                let value = lookup(stack, name);
                let truthy = is_truthy(value.as_deref());
                if *inverted {
                    if !truthy {
                        render_tokens(children, stack, out);
                    }
                    continue;
                }
                if !truthy {
                    continue;
                }
                match value {
                    Some(Cow::Borrowed(Value::Array(items))) => {
                        for item in items {
                            stack.push(item);
                            render_tokens(children, stack, out);
                            stack.pop();
                        }
                    }
                    Some(Cow::Borrowed(Value::Bool(true))) | None => {
                        render_tokens(children, stack, out)
                    }
                    Some(Cow::Borrowed(item)) => {
                        stack.push(item);
                        render_tokens(children, stack, out);
                        stack.pop();
                    }
                    Some(Cow::Owned(item)) => {
                        let mut inner: Vec<&Value> = stack.clone();
                        inner.push(&item);
                        render_tokens(children, &mut inner, out);
                    }
                }
            }
        }
    }
}

/// Render `template` against `context` with Mustache semantics.
pub fn render(template: &str, context: &RenderContext) -> Result<String, TemplateError> {
    let tokens = parse(template)?;
    let root = Value::Object(context.clone());
    let mut stack = vec![&root];
    let mut out = String::with_capacity(template.len());
    render_tokens(&tokens, &mut stack, &mut out);
    Ok(out)
}
