//! Positional placeholder substitution.
//!
//! A marker is `$` followed by zero or more ASCII digits; `$N` refers to the
//! N-th value (1-based). A bare `$`, `$0`, or an index with no corresponding
//! value substitutes the empty string rather than failing — callers should
//! treat that as a silent degradation worth testing for. Values are inlined as
//! escaped literals via [`crate::escape::escape`].
//!
//! Markers inside single/double-quoted strings and SQL comments are left
//! untouched; a lightweight state machine scans past them.

use std::borrow::Cow;

use crate::escape::escape;
use crate::types::SqlValue;

enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
}

fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes[idx] == b'-' && bytes.get(idx + 1) == Some(&b'-')
}

fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes[idx] == b'/' && bytes.get(idx + 1) == Some(&b'*')
}

fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes[idx] == b'*' && bytes.get(idx + 1) == Some(&b'/')
}

fn scan_digits(bytes: &[u8], start: usize) -> (usize, &str) {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    // Markers are ASCII, so the slice is always valid UTF-8.
    let digits = std::str::from_utf8(&bytes[start..idx]).unwrap_or("");
    (idx, digits)
}

fn render_marker(digits: &str, values: &[SqlValue]) -> String {
    match digits.parse::<usize>() {
        Ok(n) if n >= 1 => values.get(n - 1).map(escape).unwrap_or_default(),
        // bare `$`, `$0`, or a digit run too large to parse
        _ => String::new(),
    }
}

/// Substitute `$N` markers in `sql` with escaped literals from `values`.
///
/// Returns a borrowed `Cow` when the input contains no markers.
#[must_use]
pub fn substitute_placeholders<'a>(sql: &'a str, values: &[SqlValue]) -> Cow<'a, str> {
    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    // Start of the span not yet copied into `out`.
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                b'$' => {
                    let (marker_end, digits) = scan_digits(bytes, idx + 1);
                    let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
                    buf.push_str(&sql[copied..idx]);
                    buf.push_str(&render_marker(digits, values));
                    copied = marker_end;
                    idx = marker_end;
                    continue;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
        }

        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}
