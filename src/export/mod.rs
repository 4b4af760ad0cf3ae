//! Conversation and citation export
//!
//! Renders a finished conversation, or the references of its latest answer,
//! as a downloadable Markdown, plain-text or PDF document.

mod pdf;

use serde::Deserialize;

use crate::conversation::{Message, Paper};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Md,
    Txt,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Md => "md",
            ExportFormat::Txt => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Md => "text/markdown; charset=utf-8",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }
}

/// A rendered document ready for download
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    fn new(stem: &str, format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            filename: format!("{}.{}", stem, format.extension()),
            content_type: format.content_type(),
            bytes,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No messages to export")]
    EmptyConversation,

    #[error("No references to export")]
    NoReferences,

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Render the whole conversation
pub fn export_transcript(
    messages: &[Message],
    format: ExportFormat,
) -> Result<ExportFile, ExportError> {
    let messages: Vec<&Message> = messages.iter().filter(|m| !m.is_placeholder()).collect();
    if messages.is_empty() {
        return Err(ExportError::EmptyConversation);
    }

    let bytes = match format {
        ExportFormat::Md => messages
            .iter()
            .map(|m| format!("## {}\n\n{}\n\n", m.role.label(), m.content))
            .collect::<String>()
            .into_bytes(),
        ExportFormat::Txt => messages
            .iter()
            .map(|m| format!("{}: {}\n\n", m.role.label(), m.content))
            .collect::<String>()
            .into_bytes(),
        ExportFormat::Pdf => {
            let entries: Vec<(String, String)> = messages
                .iter()
                .map(|m| (format!("{}:", m.role.label()), m.content.clone()))
                .collect();
            pdf::render("Research Conversation", &entries)?
        }
    };

    Ok(ExportFile::new("conversation", format, bytes))
}

/// References attached to the most recent answer that has any
pub fn latest_references(messages: &[Message]) -> Option<&[Paper]> {
    messages
        .iter()
        .rev()
        .filter_map(|m| m.references.as_deref())
        .find(|refs| !refs.is_empty())
}

/// Render a numbered citation list
pub fn export_citations(papers: &[Paper], format: ExportFormat) -> Result<ExportFile, ExportError> {
    if papers.is_empty() {
        return Err(ExportError::NoReferences);
    }

    let numbered = papers
        .iter()
        .enumerate()
        .map(|(i, paper)| format!("{}. {}\n", i + 1, paper.citation()));

    let bytes = match format {
        ExportFormat::Md => format!("# References\n\n{}", numbered.collect::<String>()).into_bytes(),
        ExportFormat::Txt => format!("References\n\n{}", numbered.collect::<String>()).into_bytes(),
        ExportFormat::Pdf => {
            let entries: Vec<(String, String)> = papers
                .iter()
                .enumerate()
                .map(|(i, paper)| (format!("{}.", i + 1), paper.citation()))
                .collect();
            pdf::render("References", &entries)?
        }
    };

    Ok(ExportFile::new("citations", format, bytes))
}
