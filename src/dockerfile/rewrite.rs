//! Base-image rewriting
//!
//! Rewriting swaps the byte span of the first FROM's image reference and
//! nothing else. Flags, alias, spacing, casing and line endings survive,
//! so restoring with the original reference reproduces the input exactly.

use crate::dockerfile::parser::{parse, split_lines, BuildFileImage};
use crate::error::PrebakeResult;

/// Replace the first FROM's image reference with `new_ref`
pub fn rewrite(content: &str, new_ref: &str) -> PrebakeResult<String> {
    let parsed = parse(content)?;
    Ok(rewrite_parsed(content, &parsed, new_ref))
}

/// Put the original reference back. The exact left inverse of [`rewrite`].
pub fn restore(content: &str, original_ref: &str) -> PrebakeResult<String> {
    rewrite(content, original_ref)
}

/// Rewrite using an already-parsed view of `content`
pub fn rewrite_parsed(content: &str, parsed: &BuildFileImage, new_ref: &str) -> String {
    let mut out = String::with_capacity(content.len() + new_ref.len());

    for (index, (body, ending)) in split_lines(content).enumerate() {
        if index == parsed.line_index {
            let span = &parsed.reference_span;
            out.push_str(&body[..span.start]);
            out.push_str(new_ref);
            out.push_str(&body[span.end..]);
        } else {
            out.push_str(body);
        }
        out.push_str(ending);
    }

    out
}

/// Minimal Dockerfile for the prebuild context: the ARG prelude plus the
/// original FROM line, newline-terminated.
pub fn reduced_build_file(parsed: &BuildFileImage) -> String {
    let mut out = String::new();
    for arg in &parsed.args {
        out.push_str(&arg.text);
        out.push('\n');
    }
    out.push_str(&parsed.line_text);
    out.push('\n');
    out
}
