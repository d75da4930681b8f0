//! Core data types for document models, sections, and extraction results.

use serde::{Deserialize, Serialize};

/// Page-level metadata pulled from the document head.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub language: String,
    pub canonical_url: Option<String>,
}

/// Coarse role of a section within the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Nav,
    Footer,
    Hero,
    Faq,
    Pricing,
    Section,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Nav => "nav",
            SectionType::Footer => "footer",
            SectionType::Hero => "hero",
            SectionType::Faq => "faq",
            SectionType::Pricing => "pricing",
            SectionType::Section => "section",
        }
    }
}

/// A hyperlink found inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// An image found inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
}

/// A contiguous, classified region of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub label: String,
    pub source_url: String,
    pub headings: Vec<String>,
    pub text: String,
    pub links: Vec<Link>,
    pub lists: Vec<Vec<String>>,
    pub tables: Vec<Vec<Vec<String>>>,
    pub images: Vec<Image>,
    pub raw_html: String,
    pub truncated: bool,
}

/// Metadata plus ordered sections produced by one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentModel {
    pub meta: PageMeta,
    pub sections: Vec<Section>,
}

impl DocumentModel {
    /// Total characters of section text across the model.
    pub fn text_len(&self) -> usize {
        self.sections.iter().map(|s| s.text.chars().count()).sum()
    }
}

/// Record of the simulated interactions performed during a dynamic pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionLog {
    pub clicks: Vec<String>,
    pub scrolls: u32,
    pub pages: Vec<String>,
}

impl InteractionLog {
    pub fn record_click(&mut self, tag: impl Into<String>) {
        self.clicks.push(tag.into());
    }

    pub fn record_scroll(&mut self) {
        self.scrolls += 1;
    }

    /// Append a visited page unless it is already recorded.
    pub fn record_page(&mut self, url: &str) -> bool {
        if self.pages.iter().any(|p| p == url) {
            return false;
        }
        self.pages.push(url.to_string());
        true
    }

    pub fn pagination_hops(&self) -> usize {
        self.clicks.iter().filter(|c| *c == "pagination:next").count()
    }
}

/// Pipeline phase a recovered failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Fetch,
    Render,
}

/// A failure the pipeline recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseError {
    pub phase: Phase,
    pub message: String,
}

impl PhaseError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Fetch,
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Render,
            message: message.into(),
        }
    }
}

/// The externally visible artifact of one extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub url: String,
    pub scraped_at: String,
    pub meta: PageMeta,
    pub sections: Vec<Section>,
    pub interactions: InteractionLog,
    pub errors: Vec<PhaseError>,
}

/// Errors surfaced to callers of the extraction pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type ExtractResult<T> = Result<T, ExtractError>;
