//! Incremental markdown normalisation for streamed responses
//!
//! [`format_response`] runs over the whole accumulated buffer on every chunk.
//! It is built from independent passes, each a pure `&str -> String`
//! rewrite, applied in the order of [`PASSES`].
//!
//! Two properties hold for the composition:
//!
//! - applying it to its own output changes nothing;
//! - a line that is terminated by a newline in `format_response(s)` is still
//!   present, in the same order, in `format_response(s + more)`. Passes only
//!   rewrite a line based on that line itself, or insert/remove blank lines
//!   based on what precedes them, so text appended later cannot reach back
//!   into settled lines.
//!
//! An unterminated last line (a half-written heading, an open `**`) is left
//! alone until its newline arrives.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// A named normalisation pass
pub struct Pass {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Passes in application order
pub const PASSES: &[Pass] = &[
    Pass {
        name: "blank_whitespace_lines",
        apply: blank_whitespace_lines,
    },
    Pass {
        name: "strip_bare_bullets",
        apply: strip_bare_bullets,
    },
    Pass {
        name: "collapse_blank_runs",
        apply: collapse_blank_runs,
    },
    Pass {
        name: "separate_inline_headings",
        apply: separate_inline_headings,
    },
    Pass {
        name: "pad_headings",
        apply: pad_headings,
    },
    Pass {
        name: "bold_section_titles",
        apply: bold_section_titles,
    },
    Pass {
        name: "join_after_colon",
        apply: join_after_colon,
    },
    Pass {
        name: "normalize_list_markers",
        apply: normalize_list_markers,
    },
];

/// Section titles rendered in bold when they stand on a line of their own
const SECTION_TITLES: &[&str] = &[
    "Summary",
    "Overview",
    "Background",
    "Introduction",
    "Key Findings",
    "Findings",
    "Methodology",
    "Methods",
    "Results",
    "Discussion",
    "Limitations",
    "Conclusion",
    "Conclusions",
    "Recommendations",
    "Future Directions",
    "Search Results",
    "References",
];

/// Normalise an accumulated (possibly partial) response for display
pub fn format_response(text: &str) -> String {
    PASSES
        .iter()
        .fold(text.to_string(), |acc, pass| (pass.apply)(&acc))
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("formatter pattern is valid"))
}

/// Lines holding only spaces or tabs become empty
///
/// Post: no line consists solely of horizontal whitespace.
pub fn blank_whitespace_lines(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?m)^[ \t]+$").replace_all(text, "").into_owned()
}

/// Terminated lines holding only a bullet character are dropped
///
/// Pre: whitespace-only lines are empty. Post: no settled line is a bare bullet.
pub fn strip_bare_bullets(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?m)^[ \t]*[-*+•▪][ \t]*\n")
        .replace_all(text, "")
        .into_owned()
}

/// Three or more consecutive newlines collapse to exactly two
pub fn collapse_blank_runs(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\n{3,}").replace_all(text, "\n\n").into_owned()
}

/// A `##`-style heading glued to the end of a sentence moves to its own paragraph
///
/// A list marker directly in front of a heading is dropped rather than left
/// behind as a bare bullet. Single `#` is left alone so `C# ` and similar survive.
pub fn separate_inline_headings(text: &str) -> String {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    static RE: OnceLock<Regex> = OnceLock::new();

    let text = regex(&MARKER, r"(?m)^[ \t]*[-*+•▪][ \t]*(#{2,6} )").replace_all(text, "$1");
    regex(&RE, r"([^\s#])[ \t]*(#{2,6} )")
        .replace_all(&text, "$1\n\n$2")
        .into_owned()
}

/// Headings get a blank line before and after them
///
/// Post: every heading line not at the start of the text is preceded by an
/// empty line, and every terminated heading line followed by text is
/// followed by an empty line.
pub fn pad_headings(text: &str) -> String {
    static BEFORE: OnceLock<Regex> = OnceLock::new();
    static AFTER: OnceLock<Regex> = OnceLock::new();

    let text = regex(&BEFORE, r"([^\n])\n(#{1,6} )").replace_all(text, "$1\n\n$2");
    regex(&AFTER, r"(?m)^(#{1,6} [^\n]*)\n([^\n])")
        .replace_all(&text, "$1\n\n$2")
        .into_owned()
}

/// A label ending in a colon keeps its content on the next line
///
/// The blank line after `Label:` is removed unless a heading follows it.
/// Heading lines themselves are exempt.
pub fn join_after_colon(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?m)^([^#\n][^\n]*:\*{0,2})\n\n")
        .replace_all(text, |caps: &Captures| {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            if text[whole.end..].starts_with('#') {
                text[whole].to_string()
            } else {
                format!("{}\n", &caps[1])
            }
        })
        .into_owned()
}

/// List markers: `•` becomes `-`, tab indentation becomes two spaces, and
/// runs of spaces after a marker collapse to one
pub fn normalize_list_markers(text: &str) -> String {
    static GLYPH: OnceLock<Regex> = OnceLock::new();
    static INDENT: OnceLock<Regex> = OnceLock::new();
    static SPACING: OnceLock<Regex> = OnceLock::new();

    let text = regex(&GLYPH, r"(?m)^([ \t]*)[•▪][ \t]*").replace_all(text, "$1- ");
    let text = regex(&INDENT, r"(?m)^(\t+)([-*+] |\d{1,3}[.)] )").replace_all(
        &text,
        |caps: &Captures| format!("{}{}", "  ".repeat(caps[1].len()), &caps[2]),
    );
    regex(&SPACING, r"(?m)^([ ]*)([-*+]|\d{1,3}[.)])[ \t]{2,}")
        .replace_all(&text, "$1$2 ")
        .into_owned()
}

/// Known section titles on a terminated line of their own are bolded
pub fn bold_section_titles(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        let titles = SECTION_TITLES.join("|");
        Regex::new(&format!(r"(?mi)^[ \t]*({})[ \t]*(:?)[ \t]*\n", titles))
            .expect("section title pattern is valid")
    });
    re.replace_all(text, "**${1}${2}**\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Summary:\n\nLong COVID affects   multiple systems.### Neurological Effects\nPatients report brain fog:\n\n•  memory lapses\n\t-   fatigue\n-\n\n\n\n1.   Headache\n2. Dizziness\n   \nKey Findings\nStudies agree.## References\nAnderson, L. M. (2023). Future directions in long COVID research. Journal of Medical Research, 45(3), 123-135.\n**Note** on C# tooling\n";

    fn settled_lines(text: &str) -> Vec<&str> {
        match text.rfind('\n') {
            Some(end) => text[..end].split('\n').collect(),
            None => Vec::new(),
        }
    }

    fn is_subsequence(needle: &[&str], haystack: &[&str]) -> bool {
        let mut rest = haystack.iter();
        needle.iter().all(|line| rest.any(|candidate| candidate == line))
    }

    #[test]
    fn test_collapses_blank_runs() {
        assert_eq!(format_response("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(format_response("a\n \n\t\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_pads_headings() {
        assert_eq!(format_response("Intro\n## Methods\nWe did"), "Intro\n\n## Methods\n\nWe did");
        assert_eq!(format_response("# A\n## B\n"), "# A\n\n## B\n");
    }

    #[test]
    fn test_separates_inline_headings() {
        assert_eq!(
            format_response("end of sentence.### Next"),
            "end of sentence.\n\n### Next"
        );
        assert_eq!(format_response("Use C# daily"), "Use C# daily");
    }

    #[test]
    fn test_join_after_colon() {
        assert_eq!(format_response("Causes:\n\nviral persistence"), "Causes:\nviral persistence");
        assert_eq!(format_response("Causes:\n\n## Heading"), "Causes:\n\n## Heading");
    }

    #[test]
    fn test_list_markers() {
        assert_eq!(format_response("•  one\n-   two\n3.    three"), "- one\n- two\n3. three");
        assert_eq!(format_response("\t- nested"), "  - nested");
    }

    #[test]
    fn test_strips_bare_bullets() {
        assert_eq!(format_response("- a\n-\n- b"), "- a\n- b");
        assert_eq!(format_response("text\n•\n"), "text\n");
    }

    #[test]
    fn test_bolds_section_titles() {
        assert_eq!(format_response("Summary\nText"), "**Summary**\nText");
        assert_eq!(format_response("key findings:\nText"), "**key findings:**\nText");
        // only once the line is complete
        assert_eq!(format_response("Summary"), "Summary");
        assert_eq!(format_response("Summary of results\n"), "Summary of results\n");
    }

    #[test]
    fn test_partial_tokens_are_tolerated() {
        assert_eq!(format_response("Some **bold"), "Some **bold");
        assert_eq!(format_response("Text\n##"), "Text\n##");
        assert_eq!(format_response(""), "");
    }

    /// Fragments that exercise every pass, alone and glued together
    const ATOMS: &[&str] = &[
        "Overview of findings",
        "- ## Results",
        "- ",
        "• ",
        "-",
        "## Heading",
        "Label:",
        "\n",
        "\n\n\n",
        " \t",
        "text.",
        "### Sub",
        "1.   item",
        "Summary",
        "**bold",
        "C# x",
        "\t- nested",
        "key findings:",
    ];

    /// Every concatenation of up to three atoms
    fn generated_inputs() -> Vec<String> {
        let mut inputs: Vec<String> = vec![String::new()];
        let mut frontier = inputs.clone();
        for _ in 0..3 {
            frontier = frontier
                .iter()
                .flat_map(|prefix| ATOMS.iter().map(move |atom| format!("{}{}", prefix, atom)))
                .collect();
            inputs.extend(frontier.iter().cloned());
        }
        inputs
    }

    fn is_bare_bullet(line: &str) -> bool {
        let trimmed = line.trim_matches(|c| c == ' ' || c == '\t');
        trimmed.chars().count() == 1 && "-*+•▪".contains(trimmed)
    }

    #[test]
    fn test_idempotent() {
        for (end, _) in SAMPLE.char_indices() {
            let once = format_response(&SAMPLE[..end]);
            assert_eq!(format_response(&once), once, "prefix length {}", end);
        }

        for input in generated_inputs() {
            let once = format_response(&input);
            assert_eq!(format_response(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_no_settled_bare_bullets() {
        for input in generated_inputs() {
            let once = format_response(&input);
            assert!(
                !settled_lines(&once).into_iter().any(is_bare_bullet),
                "input {:?} gave {:?}",
                input,
                once
            );
        }
    }

    #[test]
    fn test_marker_before_heading() {
        let once = format_response("Overview of findings\n- ## Results\nMost studies agree.\n");
        assert_eq!(once, "Overview of findings\n\n## Results\n\nMost studies agree.\n");
        assert_eq!(format_response(&once), once);
    }

    #[test]
    fn test_section_title_with_trailing_space_joins() {
        let once = format_response("key findings: \t\n\n\n1.   item");
        assert_eq!(once, "**key findings:**\n1. item");
        assert_eq!(format_response(&once), once);
    }

    #[test]
    fn test_settled_lines_survive_growth() {
        let boundaries: Vec<usize> = SAMPLE
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(SAMPLE.len()))
            .collect();

        for (i, &shorter) in boundaries.iter().enumerate() {
            let before = format_response(&SAMPLE[..shorter]);
            let settled = settled_lines(&before);
            for &longer in &boundaries[i..] {
                let after = format_response(&SAMPLE[..longer]);
                let lines: Vec<&str> = after.split('\n').collect();
                assert!(
                    is_subsequence(&settled, &lines),
                    "settled lines of prefix {} lost at prefix {}:\n{:?}\n{:?}",
                    shorter,
                    longer,
                    before,
                    after
                );
            }
        }
    }

    #[test]
    fn test_streamed_chunks() {
        let mut buffer = String::new();
        let mut shown = Vec::new();
        for chunk in ["Hel", "lo wor", "ld"] {
            buffer.push_str(chunk);
            shown.push(format_response(&buffer));
        }
        assert_eq!(shown, vec!["Hel", "Hello wor", "Hello world"]);
    }

    #[test]
    fn test_passes_are_named() {
        let names: Vec<&str> = PASSES.iter().map(|p| p.name).collect();
        assert_eq!(names.first(), Some(&"blank_whitespace_lines"));
        assert_eq!(names.last(), Some(&"normalize_list_markers"));
    }
}
