//! User source preparation.
//!
//! Model and service sources copied into the output tree lose their
//! discovery markers: `#[grpc_model]` / `#[grpc_service(..)]` attributes
//! and `use` items importing the marker crate, wrapped or not. Text is
//! normalized the same way for every platform so copies are byte-stable.

use crate::defaults;
use crate::errors::{ProtowizError, ProtowizResult};

/// Normalize text content deterministically.
///
/// Rules:
/// - convert CRLF and CR to LF
/// - remove a leading UTF-8 BOM
/// - trim trailing whitespace on each line
/// - keep the final newline if one was present
pub fn normalize_text(input: &str) -> String {
    let s = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    let had_trailing_newline = s.ends_with('\n');

    let mut out = s
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    if had_trailing_newline && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Marker {
    Attribute,
    Import,
}

fn marker_kind(line: &str) -> Option<Marker> {
    let t = line.trim_start();
    if defaults::MARKER_ATTRIBUTES.iter().any(|m| t.starts_with(m)) {
        Some(Marker::Attribute)
    } else if defaults::MARKER_IMPORTS.iter().any(|m| t.starts_with(m)) {
        Some(Marker::Import)
    } else {
        None
    }
}

/// Net bracket depth change of one line.
fn depth_delta(line: &str) -> isize {
    line.chars().fold(0, |d, c| match c {
        '(' | '[' | '{' => d + 1,
        ')' | ']' | '}' => d - 1,
        _ => d,
    })
}

/// Drop marker items from normalized text.
///
/// A marker spans lines until its brackets balance; an import also runs to
/// its closing `;`. This covers rustfmt-wrapped attributes and grouped
/// imports.
pub fn strip_markers(input: &str) -> String {
    let text = normalize_text(input);
    let had_trailing_newline = text.ends_with('\n');

    let mut kept = Vec::new();
    let mut open: Option<(Marker, isize)> = None;
    for line in text.lines() {
        let (kind, depth) = match open.take() {
            Some(state) => state,
            None => match marker_kind(line) {
                Some(kind) => (kind, 0),
                None => {
                    kept.push(line);
                    continue;
                }
            },
        };
        let depth = depth + depth_delta(line);
        let closed = depth <= 0
            && (kind == Marker::Attribute || line.contains(';'));
        if !closed {
            open = Some((kind, depth));
        }
    }

    let mut out = kept.join("\n");
    if had_trailing_newline {
        out.push('\n');
    }
    out
}

/// Prepare one source file for copying, enforcing a size limit.
pub fn prepare_source(input: &str, max_bytes: usize) -> ProtowizResult<String> {
    if input.len() > max_bytes {
        return Err(ProtowizError::invalid_argument(format!(
            "source file too large ({} bytes > limit {max_bytes})",
            input.len()
        )));
    }
    Ok(strip_markers(input))
}
