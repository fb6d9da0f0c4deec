//! Rendering of [`SqlValue`]s as T-SQL literals.
//!
//! Substituted values never travel as bound parameters; they are inlined into
//! the SQL text, so every rendering here must be injection-safe. In T-SQL the
//! only character that can terminate a string literal is the single quote, and
//! it is escaped by doubling; backslashes and control characters carry no
//! meta-meaning inside a literal.

use crate::types::SqlValue;

/// Render a value as an injection-safe T-SQL literal.
///
/// Arrays render as a parenthesized, comma-joined list of individually escaped
/// literals so they can stand in for the right-hand side of `IN (...)`. An
/// empty array renders `(NULL)`, which is syntactically valid and matches no
/// rows.
#[must_use]
pub fn escape(value: &SqlValue) -> String {
    match value {
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => {
            if f.is_finite() {
                f.to_string()
            } else {
                // NaN/infinity have no SQL literal form
                "NULL".to_string()
            }
        }
        SqlValue::Text(s) => escape_str(s),
        SqlValue::Bool(b) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        SqlValue::Timestamp(dt) => format!("'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.3f")),
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Json(jsval) => escape_str(&jsval.to_string()),
        SqlValue::Blob(bytes) => {
            let mut out = String::with_capacity(2 + bytes.len() * 2);
            out.push_str("0x");
            for b in bytes {
                out.push_str(&format!("{b:02X}"));
            }
            out
        }
        SqlValue::Array(values) => {
            if values.is_empty() {
                return "(NULL)".to_string();
            }
            let rendered: Vec<String> = values.iter().map(escape).collect();
            format!("({})", rendered.join(","))
        }
    }
}

/// Quote a string as a unicode T-SQL literal, doubling embedded quotes.
fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 3);
    out.push_str("N'");
    for c in s.chars() {
        if c == '\'' {
            out.push_str("''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}
