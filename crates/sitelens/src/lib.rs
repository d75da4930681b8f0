//! sitelens: section-aware extraction of web pages into structured documents.
//!
//! A cheap static parse is tried first; pages that yield too little text are
//! rendered in a browser and nudged through tabs, "load more" buttons,
//! scrolling and pagination before being sectioned again.

pub mod acquisition;
pub mod assembler;
pub mod classify;
pub mod config;
pub mod document;
pub mod dom;
pub mod interaction;
pub mod meta;
pub mod noise;
pub mod pipeline;
pub mod renderer;
pub mod sectionizer;
pub mod sufficiency;
pub mod types;

pub use config::{ConfigError, ExtractConfig, InteractionBudget};
pub use document::build_document_model;
pub use noise::NoiseRules;
pub use pipeline::{validate_url, Extractor};
pub use renderer::{NoopRenderer, RenderContext, Renderer};
pub use types::*;
