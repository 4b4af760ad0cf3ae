//! Reference extraction from finished assistant messages
//!
//! Looks for the last "References" heading and turns every non-empty line
//! under it into a [`Paper`]. Lines in the usual
//! `Authors (Year). Title. Venue, Volume(Issue), Pages.` shape are parsed;
//! anything else is kept verbatim as the title so no reference is lost.

use regex::Regex;
use std::sync::OnceLock;

use crate::conversation::{Author, Paper};

fn heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t#*]*references[ \t*:]*$").expect("heading pattern is valid")
    })
}

fn citation_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+?)\s+\((\d{4})\)\.\s+(.+?)\.\s+(.+?),\s+(\d+\(\d+\)),\s+([\d\-–, ]+)\.?$")
            .expect("citation pattern is valid")
    })
}

fn list_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\d{1,3}[.)]|\[\d{1,3}\]|[-*+•])\s+").expect("marker pattern is valid")
    })
}

fn initials() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[A-Z]\.[ -]?)+$").expect("initials pattern is valid")
    })
}

/// Extract the papers cited in a message's trailing References section
pub fn extract(content: &str) -> Vec<Paper> {
    candidate_lines(content)
        .into_iter()
        .map(parse_reference)
        .collect()
}

/// Non-empty lines of the last References section, list markers removed
pub fn candidate_lines(content: &str) -> Vec<&str> {
    let Some(section) = heading().find_iter(content).last() else {
        return Vec::new();
    };

    content[section.end()..]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match list_marker().find(line) {
            Some(marker) => line[marker.end()..].trim(),
            None => line,
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parse one reference line, falling back to a title-only record
pub fn parse_reference(line: &str) -> Paper {
    let Some(caps) = citation_line().captures(line) else {
        return Paper::unparsed(line);
    };

    Paper {
        title: Some(caps[3].trim().to_string()),
        year: caps[2].parse().ok(),
        authors: split_authors(&caps[1]),
        venue: Some(caps[4].trim().to_string()),
        ..Paper::default()
    }
}

/// Split an APA-style author list, keeping initials attached to their surname
fn split_authors(raw: &str) -> Vec<Author> {
    let cleaned = raw.replace("et al.", "");
    let mut names: Vec<String> = Vec::new();

    for token in cleaned.split(',') {
        let token = token.trim();
        let token = token
            .strip_prefix('&')
            .or_else(|| token.strip_prefix("and "))
            .unwrap_or(token)
            .trim();
        if token.is_empty() {
            continue;
        }

        match names.last_mut() {
            Some(previous) if initials().is_match(token) && !previous.contains(", ") => {
                previous.push_str(", ");
                previous.push_str(token);
            }
            _ => names.push(token.to_string()),
        }
    }

    names.into_iter().map(|name| Author { name }).collect()
}
