//! Text helpers for terminal output.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// ANSI escape sequences: CSI (`\x1b[...X`), OSC (`\x1b]...` terminated by
/// BEL or ST), and charset selection (`\x1b(B`).
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[()][A-B0-2]")
        .expect("ANSI regex must compile")
});

/// Remove escape sequences and control characters from server-supplied text
/// so it cannot move the cursor or recolor the terminal. Newlines and tabs
/// survive.
pub fn strip_control(text: &str) -> Cow<'_, str> {
    let needs_work = text
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t');
    if !needs_work {
        return Cow::Borrowed(text);
    }
    let without_ansi = ANSI_RE.replace_all(text, "");
    Cow::Owned(
        without_ansi
            .chars()
            .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
            .collect(),
    )
}

/// Collapse all whitespace runs (including newlines) into single spaces.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> Cow<'_, str> {
    if text.chars().count() <= width {
        return Cow::Borrowed(text);
    }
    if width == 0 {
        return Cow::Borrowed("");
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    Cow::Owned(out)
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
