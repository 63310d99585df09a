//! Keeps player-supplied text (warp names, descriptions, player names) on a
//! single log line.

use std::fmt::Write;

/// Longest preview of a player string that reaches the log.
const MAX_PREVIEW_CHARS: usize = 120;

/// Escape backslashes and control characters, then cap the length with `…`.
/// Newlines, carriage returns and tabs get their usual escapes; any other
/// control character becomes `\xNN`.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW_CHARS) + 4);
    let mut chars = s.chars();
    for ch in chars.by_ref().take(MAX_PREVIEW_CHARS) {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}
