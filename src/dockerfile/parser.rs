//! Dockerfile prelude and base-image parsing
//!
//! Only the part of a Dockerfile that determines the base layer is parsed:
//! the global `ARG` statements and the first `FROM` instruction. Everything
//! after that first `FROM` belongs to the user and is never inspected.

use crate::error::{PrebakeError, PrebakeResult};
use std::collections::HashMap;
use std::ops::Range;

/// A global `ARG` statement preceding the first `FROM`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDeclaration {
    /// Variable name
    pub name: String,
    /// Default value (`ARG NAME=default`)
    pub default: Option<String>,
    /// Exact source text, continuation lines joined with `\n`
    pub text: String,
}

/// Base image reference split into name, tag and digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Repository including registry host and path (e.g., `ghcr.io/acme/base`)
    pub name: String,
    /// Tag (e.g., `1.0`)
    pub tag: Option<String>,
    /// Digest (e.g., `sha256:abc...`)
    pub digest: Option<String>,
}

impl ImageReference {
    /// Split a reference of the form `name[:tag][@digest]`.
    ///
    /// A colon only separates a tag when it appears after the last `/`,
    /// so registry ports (`localhost:5000/base`) stay part of the name.
    pub fn parse(reference: &str) -> Self {
        let (rest, digest) = match reference.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (reference, None),
        };

        let last_segment = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match rest[last_segment..].rfind(':') {
            Some(i) => {
                let split = last_segment + i;
                (rest[..split].to_string(), Some(rest[split + 1..].to_string()))
            }
            None => (rest.to_string(), None),
        };

        Self {
            name,
            tag: tag.filter(|t| !t.is_empty()),
            digest: digest.filter(|d| !d.is_empty()),
        }
    }
}

/// Parsed view of a Dockerfile's base-image declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFileImage {
    /// Global ARG statements, in source order
    pub args: Vec<ArgDeclaration>,
    /// The reference as written (variables unexpanded)
    pub reference: String,
    /// The reference after ARG default substitution, split into parts
    pub image: ImageReference,
    /// Build stage alias (`FROM ... AS <alias>`)
    pub stage: Option<String>,
    /// Platform qualifier (`FROM --platform=<platform> ...`)
    pub platform: Option<String>,
    /// Zero-based line index of the first FROM
    pub line_index: usize,
    /// Exact text of the FROM line, without its line ending
    pub line_text: String,
    /// Byte span of `reference` within `line_text`
    pub(crate) reference_span: Range<usize>,
}

/// Parse the prelude and first `FROM` of a Dockerfile.
///
/// Blank lines, comments and parser directives may appear before the first
/// `FROM`; any other instruction there is rejected with its line number.
pub fn parse(content: &str) -> PrebakeResult<BuildFileImage> {
    let lines: Vec<&str> = split_lines(content).map(|(body, _)| body).collect();
    let mut args = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let trimmed = lines[index].trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            index += 1;
            continue;
        }

        let keyword = trimmed.split_whitespace().next().unwrap_or_default();

        if keyword.eq_ignore_ascii_case("ARG") {
            let start = index;
            while lines[index].trim_end().ends_with('\\') && index + 1 < lines.len() {
                index += 1;
            }
            args.push(parse_arg(start, &lines[start..=index])?);
            index += 1;
        } else if keyword.eq_ignore_ascii_case("FROM") {
            if lines[index].trim_end().ends_with('\\') {
                return Err(PrebakeError::parse_at(
                    index,
                    "FROM instructions spanning multiple lines are not supported",
                ));
            }
            return parse_from(index, lines[index], args);
        } else {
            return Err(PrebakeError::parse_at(
                index,
                format!("Expected ARG or FROM, found {}", keyword),
            ));
        }
    }

    Err(PrebakeError::Parse {
        line: 1,
        message: "Dockerfile must contain at least one FROM instruction".to_string(),
    })
}

/// Split content into `(body, line_ending)` pairs, preserving `\r\n`, `\n`
/// and a missing final newline exactly.
pub(crate) fn split_lines(content: &str) -> impl Iterator<Item = (&str, &str)> {
    content.split_inclusive('\n').map(|piece| {
        let body = piece
            .strip_suffix('\n')
            .map(|b| b.strip_suffix('\r').unwrap_or(b))
            .unwrap_or(piece);
        (body, &piece[body.len()..])
    })
}

fn parse_arg(start: usize, physical: &[&str]) -> PrebakeResult<ArgDeclaration> {
    let joined: String = physical
        .iter()
        .map(|l| l.trim().trim_end_matches('\\').trim())
        .collect::<Vec<_>>()
        .join(" ");

    // Drop the ARG keyword itself
    let declaration = joined
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .unwrap_or_default();

    if declaration.is_empty() {
        return Err(PrebakeError::parse_at(start, "ARG requires a name"));
    }

    let (name, default) = match declaration.split_once('=') {
        Some((name, value)) => (name.trim(), Some(unquote(value.trim()).to_string())),
        None => (declaration, None),
    };

    Ok(ArgDeclaration {
        name: name.to_string(),
        default,
        text: physical.join("\n"),
    })
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn parse_from(
    index: usize,
    line: &str,
    args: Vec<ArgDeclaration>,
) -> PrebakeResult<BuildFileImage> {
    // FROM [--platform=<platform>] <image> [AS <name>]
    let mut tokens = tokenize(line).into_iter().skip(1).peekable();
    let mut platform = None;

    while let Some((_, token)) = tokens.peek() {
        if !token.starts_with("--") {
            break;
        }
        if let Some(value) = token.strip_prefix("--platform=") {
            platform = Some(value.to_string());
        }
        tokens.next();
    }

    let (start, reference) = tokens.next().ok_or_else(|| {
        PrebakeError::parse_at(index, "FROM instruction requires an image reference")
    })?;

    let stage = match tokens.next() {
        Some((_, keyword)) if keyword.eq_ignore_ascii_case("AS") => {
            let (_, alias) = tokens
                .next()
                .ok_or_else(|| PrebakeError::parse_at(index, "FROM ... AS requires a stage name"))?;
            Some(alias.to_string())
        }
        _ => None,
    };

    let defaults: HashMap<&str, &str> = args
        .iter()
        .filter_map(|a| a.default.as_deref().map(|d| (a.name.as_str(), d)))
        .collect();
    let image = ImageReference::parse(&expand_variables(reference, &defaults));

    Ok(BuildFileImage {
        args,
        reference: reference.to_string(),
        image,
        stage,
        platform,
        line_index: index,
        line_text: line.to_string(),
        reference_span: start..start + reference.len(),
    })
}

/// Whitespace-separated tokens with their byte offsets
fn tokenize(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &line[s..]));
    }

    tokens
}

/// Expand `$VAR`, `${VAR}` and `${VAR:-default}` from ARG defaults.
/// Unknown variables expand to the empty string, as in `docker build`.
pub(crate) fn expand_variables(input: &str, vars: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(body) = after.strip_prefix('{') {
            let Some(close) = body.find('}') else {
                out.push_str(&rest[pos..]);
                return out;
            };
            let expr = &body[..close];
            let value = match expr.split_once(":-") {
                Some((name, fallback)) => vars
                    .get(name)
                    .copied()
                    .filter(|v| !v.is_empty())
                    .unwrap_or(fallback),
                None => vars.get(expr).copied().unwrap_or_default(),
            };
            out.push_str(value);
            rest = &body[close + 1..];
        } else {
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            if len == 0 {
                out.push('$');
            } else {
                out.push_str(vars.get(&after[..len]).copied().unwrap_or_default());
            }
            rest = &after[len..];
        }
    }

    out.push_str(rest);
    out
}
