//! Post-processing: deterministic cleanup of completion text.
//!
//! Models occasionally wrap a reply in a code fence, answer with `\r\n`
//! line endings, or leave zero-width characters behind. These passes fix
//! the layout without touching content, so fragments join cleanly and the
//! final summary prints the same on every platform.
//!
//! Rule order matters: fences are stripped before line endings are
//! normalised so the fence regex sees the raw reply, invisible characters go
//! before the whitespace passes so a line holding only a zero-width space
//! counts as blank, and the final trim runs last so earlier passes may leave
//! stray blank lines behind.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to a raw completion.
///
/// 1. Strip one outer code fence (```` ```markdown ````, ```` ```text ````, bare ```` ``` ````)
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Trim trailing whitespace per line
/// 5. Collapse runs of blank lines down to one
/// 6. Trim the whole text
///
/// The result may be empty; callers treat that as an empty response.
pub fn clean_completion(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer code fence ──────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md|text|plaintext)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap()
});

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ──────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Trim trailing whitespace per line ───────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse blank-line runs ────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fence() {
        let input = "```markdown\n- point one\n- point two\n```";
        assert_eq!(clean_completion(input), "- point one\n- point two");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(clean_completion("```\nplain summary\n```\n"), "plain summary");
    }

    #[test]
    fn leaves_inner_fences_alone() {
        let input = "Intro\n```\ncode\n```\nOutro";
        assert_eq!(clean_completion(input), input);
    }

    #[test]
    fn normalises_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn trims_each_line() {
        assert_eq!(trim_trailing_whitespace("  one   \ntwo\t"), "  one\ntwo");
    }

    #[test]
    fn collapses_blank_runs_to_one() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn removes_invisible_chars() {
        let input = "zero\u{200B}width\u{FEFF}bom\u{00AD}shy";
        assert_eq!(remove_invisible_chars(input), "zerowidthbomshy");
    }

    #[test]
    fn whitespace_only_cleans_to_empty() {
        assert_eq!(clean_completion(" \r\n\t\u{200B}\n "), "");
    }

    #[test]
    fn full_pipeline() {
        let input = "```text\r\n## Introduction   \r\n\r\n\r\n\r\nBody text.\r\n```";
        assert_eq!(clean_completion(input), "## Introduction\n\nBody text.");
    }

    #[test]
    fn zero_width_only_lines_count_as_blank() {
        assert_eq!(clean_completion("one\n\u{200B}\n\n\ntwo"), "one\n\ntwo");
        assert_eq!(clean_completion("one \u{200B}\ntwo"), "one\ntwo");
    }
}
