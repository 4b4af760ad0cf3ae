//! Conversation types and state management

pub mod store;

use serde::{Deserialize, Deserializer, Serialize};

pub use store::{ConversationSnapshot, ConversationStore, StoreError};

/// Content shown in the assistant slot while a turn is waiting for its first chunk
pub const PLACEHOLDER: &str = "...";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Paper>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            references: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            references: None,
        }
    }

    pub fn placeholder() -> Self {
        Self::assistant(PLACEHOLDER)
    }

    pub fn with_references(mut self, references: Vec<Paper>) -> Self {
        self.references = Some(references);
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.role == Role::Assistant && self.content == PLACEHOLDER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Capitalised label used by transcripts
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "assistant" => Role::Assistant,
            _ => Role::User,
        }
    }
}

/// A candidate academic reference.
///
/// Every field is optional: paper-search results are loosely shaped, and
/// references parsed out of prose rarely carry more than a title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    #[serde(default, alias = "paperId", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<i32>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<Author>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_venue: Option<Venue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, alias = "openAccessPDF", skip_serializing_if = "Option::is_none")]
    pub open_access_pdf: Option<OpenAccessPdf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAccessPdf {
    #[serde(default)]
    pub url: Option<String>,
}

impl Paper {
    /// A reference line that could not be parsed; the raw line becomes the title
    pub fn unparsed(line: impl Into<String>) -> Self {
        Self {
            title: Some(line.into()),
            ..Self::default()
        }
    }

    pub fn display_title(&self) -> &str {
        non_empty(self.title.as_deref()).unwrap_or("Untitled")
    }

    /// Landing page URL, falling back to the open-access document
    pub fn link(&self) -> Option<&str> {
        non_empty(self.url.as_deref()).or_else(|| {
            self.open_access_pdf
                .as_ref()
                .and_then(|pdf| non_empty(pdf.url.as_deref()))
        })
    }

    pub fn venue_name(&self) -> Option<&str> {
        non_empty(self.venue.as_deref()).or_else(|| {
            self.publication_venue
                .as_ref()
                .and_then(|venue| non_empty(venue.name.as_deref()))
        })
    }

    /// `Authors (Year). Title. Venue.`
    pub fn citation(&self) -> String {
        let names: Vec<&str> = self
            .authors
            .iter()
            .map(|a| a.name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        let authors = if names.is_empty() {
            "Unknown authors".to_string()
        } else {
            names.join(", ")
        };
        let year = self
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "n.d.".to_string());
        let venue = self.venue_name().unwrap_or("Unknown journal");

        format!("{} ({}). {}. {}.", authors, year, self.display_title(), venue)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearValue {
    Number(i64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Years arrive as numbers, numeric strings, or junk; junk becomes `None`
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<YearValue>::deserialize(deserializer)? {
        Some(YearValue::Number(year)) => i32::try_from(year).ok(),
        Some(YearValue::Text(year)) => year.trim().parse().ok(),
        Some(YearValue::Other(_)) | None => None,
    })
}
