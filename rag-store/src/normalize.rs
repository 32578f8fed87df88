//! Text normalization applied to uploaded documents before chunking.
//!
//! Extracted PDF text and pasted FAQ content carry CRLF line endings, stray
//! control characters and ragged whitespace. Embeddings do better on a
//! compact, stable layout.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Control characters other than newline and tab.
static CONTROL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Cc}&&[^\n\t]]").expect("valid control-char regex"));

/// Runs of non-newline whitespace (spaces, tabs, NBSP, ...).
static HSPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid whitespace regex"));

/// Normalizes document text for ingestion.
///
/// - `\r\n` and lone `\r` become `\n`.
/// - Control characters become spaces.
/// - Whitespace runs inside a line collapse to one space; lines are trimmed.
/// - At most one blank line is kept between paragraphs.
/// - The result is trimmed.
///
/// Idempotent: `normalize_text(&normalize_text(s)) == normalize_text(s)`.
pub fn normalize_text(s: &str) -> String {
    let unified = s.replace("\r\n", "\n").replace('\r', "\n");
    let cleaned = CONTROL.replace_all(&unified, " ");

    let mut out = String::with_capacity(cleaned.len());
    let mut blank_run = 0usize;

    for line in cleaned.split('\n') {
        let line = HSPACE.replace_all(line, " ");
        let line = line.trim();

        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue; // keep one separator line, drop leading blanks
            }
            out.push('\n');
            continue;
        }
        blank_run = 0;

        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(line);
    }

    let trimmed = out.trim_end().to_string();
    debug!(
        input_len = s.len(),
        output_len = trimmed.len(),
        "normalize_text"
    );
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_blank_lines() {
        let raw = "  Opening  hours:\t9 to 5 \r\n\r\n\r\n\r\nWe accept\u{00a0}cards.\r\nNo cash.  ";
        assert_eq!(
            normalize_text(raw),
            "Opening hours: 9 to 5\n\nWe accept cards.\nNo cash."
        );
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(normalize_text("a\u{0000}b\u{000c}c"), "a b c");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "plain",
            "\n\n  lead\n\n\n\ntrail  \n",
            "x\r\ny\rz",
            "tabs\t\tand  spaces\n \n \nend",
        ];
        for s in samples {
            let once = normalize_text(s);
            assert_eq!(normalize_text(&once), once, "sample: {s:?}");
        }
    }
}
