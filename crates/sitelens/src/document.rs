//! Markup to [`DocumentModel`]: metadata, noise removal, sectioning.

use scraper::Html;

use crate::dom;
use crate::meta::extract_meta;
use crate::noise::NoiseRules;
use crate::sectionizer::sectionize;
use crate::types::DocumentModel;

/// Build a document model from raw markup fetched from `page_url`.
///
/// The parsed `Html` is not `Send` and never outlives this call.
pub fn build_document_model(html: &str, page_url: &str, rules: &NoiseRules) -> DocumentModel {
    let (meta, root) = {
        let document = Html::parse_document(html);
        (extract_meta(&document, page_url), dom::from_html(&document))
    };
    let cleaned = rules.filter(&root);
    DocumentModel {
        meta,
        sections: sectionize(&cleaned, page_url),
    }
}
