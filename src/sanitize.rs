//! Normalisation of model output before it reaches the PDF renderer.
//!
//! Completion endpoints answer in loose Markdown sprinkled with typographic
//! punctuation.  The renderer writes single-byte text, so the answer is
//! flattened here: emphasis and rule markers are dropped, the punctuation in
//! [`SYMBOL_SUBSTITUTIONS`] is mapped onto ASCII, blank-line runs are collapsed
//! and the result is trimmed.  Characters outside the substitution table are
//! left untouched; [`crate::builder`] rejects the ones it cannot encode.

use once_cell::sync::Lazy;
use regex::Regex;

/// Literal Markdown markers removed wherever they occur, including mid-word.
pub const MARKDOWN_MARKERS: &[&str] = &["**", "##", "---"];

/// Typographic characters and the single-byte text that replaces them.
pub const SYMBOL_SUBSTITUTIONS: &[(char, &str)] = &[
    ('\u{2026}', "..."),
    ('\u{2014}', "-"),
    ('\u{2013}', "-"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "-"),
    ('\u{2192}', "->"),
];

/// Cleans raw model output for the PDF renderer.
///
/// The passes run in a fixed order:
///
/// 1. remove every [`MARKDOWN_MARKERS`] entry
/// 2. apply [`SYMBOL_SUBSTITUTIONS`]
/// 3. collapse runs of blank lines into a single blank line
/// 4. trim surrounding whitespace
///
/// Marker removal repeats until nothing is left to remove and runs once more
/// after the substitutions, since both `*##*` and `—-—` turn into markers
/// halfway through.  The function is total and idempotent.
pub fn sanitize(text: &str) -> String {
    let s = strip_markers(text);
    let s = substitute_symbols(&s);
    let s = strip_markers(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

fn strip_markers(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = MARKDOWN_MARKERS
            .iter()
            .fold(current.clone(), |acc, marker| acc.replace(marker, ""));
        if next == current {
            return next;
        }
        current = next;
    }
}

fn substitute_symbols(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match SYMBOL_SUBSTITUTIONS.iter().find(|(source, _)| *source == ch) {
            Some((_, replacement)) => output.push_str(replacement),
            None => output.push(ch),
        }
    }
    output
}

// Leading `\r*` takes the CR of a CRLF ending into the run; single line
// endings are left as they are.
static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r*\n\s*\n+").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUNS.replace_all(input, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRICKY_INPUTS: &[&str] = &[
        "",
        "plain text",
        "Hello **world** — test…",
        "A\n\n\n\nB",
        "*##*",
        "#---#",
        "*---*",
        "a—-—b",
        "--→ next",
        "***bold italic***",
        "## Heading\n\n---\n\n**Step 1:** do it",
        "\r\n\r\n\r\nline\r\n \r\n\r\nother\r\n",
        "  \n\n  padded  \n\n  ",
        "“Quoted” ‘single’ • bullet → arrow",
        "-•-",
        "a\r\r\n\nb",
        "x \r\n\t\r\ny",
    ];

    #[test]
    fn matches_reference_examples() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("Hello **world** — test…"), "Hello world - test...");
        assert_eq!(sanitize("A\n\n\n\nB"), "A\n\nB");
    }

    #[test]
    fn strips_markers_mid_word() {
        assert_eq!(sanitize("foo**bar##baz---qux"), "foobarbazqux");
        assert_eq!(sanitize("## Title"), "Title");
    }

    #[test]
    fn applies_every_substitution() {
        let input: String = SYMBOL_SUBSTITUTIONS
            .iter()
            .map(|(source, _)| format!("[{source}]"))
            .collect();
        let expected: String = SYMBOL_SUBSTITUTIONS
            .iter()
            .map(|(_, replacement)| format!("[{replacement}]"))
            .collect();
        assert_eq!(sanitize(&input), expected);
    }

    #[test]
    fn leaves_unlisted_characters_alone() {
        assert_eq!(sanitize("café 100°C ≈ hot"), "café 100°C ≈ hot");
    }

    #[test]
    fn collapses_whitespace_only_lines() {
        assert_eq!(sanitize("one\n  \n\t\n two"), "one\n\n two");
        assert_eq!(sanitize("one\ntwo"), "one\ntwo");
    }

    #[test]
    fn collapses_crlf_blank_runs() {
        assert_eq!(sanitize("one\r\n\r\n\r\ntwo\r\nthree"), "one\n\ntwo\r\nthree");
        assert_eq!(sanitize("one\r\r\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn keeps_single_line_endings() {
        assert_eq!(sanitize("a\r\nb"), "a\r\nb");
        assert_eq!(sanitize("a\rb"), "a\rb");
    }

    #[test]
    fn markers_only_input_becomes_empty() {
        assert_eq!(sanitize("**##---\n\n---**"), "");
    }

    #[test]
    fn substitutions_cannot_form_markers() {
        assert_eq!(sanitize("a—-—b"), "ab");
        assert_eq!(sanitize("*##*"), "");
    }

    #[test]
    fn output_invariants_hold() {
        for input in TRICKY_INPUTS {
            let output = sanitize(input);
            for marker in MARKDOWN_MARKERS {
                assert!(!output.contains(marker), "{input:?} -> {output:?}");
            }
            for (source, _) in SYMBOL_SUBSTITUTIONS {
                assert!(!output.contains(*source), "{input:?} -> {output:?}");
            }
            assert!(!output.contains("\n\n\n"), "{input:?} -> {output:?}");
            assert_eq!(output.trim(), output, "{input:?} -> {output:?}");
        }
    }

    #[test]
    fn is_idempotent() {
        for input in TRICKY_INPUTS {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input {input:?}");
        }
    }
}
