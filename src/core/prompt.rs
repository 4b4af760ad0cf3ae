//! Augmented prompt construction

use std::fmt::Write;

use crate::config::prompts_builtin::{ABSTRACT_PREVIEW_CHARS, MAX_PROMPT_PAPERS, PAPERS_PREAMBLE};
use crate::conversation::Paper;

/// Append a summary of up to three papers to the user's question.
///
/// With no papers the question is returned unchanged.
pub fn build_augmented_prompt(user_text: &str, papers: &[Paper]) -> String {
    if papers.is_empty() {
        return user_text.to_string();
    }

    let mut prompt = format!("{}\n\n{}\n\n", user_text, PAPERS_PREAMBLE);

    for (i, paper) in papers.iter().take(MAX_PROMPT_PAPERS).enumerate() {
        let _ = writeln!(prompt, "Paper {}: '{}'", i + 1, paper.display_title());

        if let Some(abstract_text) = paper.abstract_text.as_deref().filter(|a| !a.is_empty()) {
            let preview: String = abstract_text.chars().take(ABSTRACT_PREVIEW_CHARS).collect();
            let _ = writeln!(prompt, "Abstract: {}...", preview);
        }

        if let Some(link) = paper.link() {
            let _ = writeln!(prompt, "URL: {}", link);
        }

        prompt.push('\n');
    }

    prompt
}
