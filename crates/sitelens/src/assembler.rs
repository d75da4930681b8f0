//! Final result assembly. Pure: no I/O, no clock.

use crate::types::{DocumentModel, ExtractionResult, InteractionLog, PhaseError};

/// Everything the pipeline gathered for one request.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub url: String,
    /// RFC 3339 UTC timestamp of the request.
    pub scraped_at: String,
    pub static_model: Option<DocumentModel>,
    /// Present whenever a dynamic pass ran, even a poor one.
    pub dynamic_model: Option<DocumentModel>,
    pub interactions: InteractionLog,
    pub errors: Vec<PhaseError>,
}

/// Pick the dynamic model when one exists, else the static one, else an empty
/// model, and wrap it into the output contract.
pub fn assemble(input: Assembly) -> ExtractionResult {
    let model = input
        .dynamic_model
        .or(input.static_model)
        .unwrap_or_default();
    ExtractionResult {
        url: input.url,
        scraped_at: input.scraped_at,
        meta: model.meta,
        sections: model.sections,
        interactions: input.interactions,
        errors: input.errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageMeta;

    fn titled(title: &str) -> DocumentModel {
        DocumentModel {
            meta: PageMeta {
                title: title.to_string(),
                ..Default::default()
            },
            sections: vec![],
        }
    }

    #[test]
    fn test_dynamic_model_wins() {
        let result = assemble(Assembly {
            static_model: Some(titled("static")),
            dynamic_model: Some(titled("dynamic")),
            ..Default::default()
        });
        assert_eq!(result.meta.title, "dynamic");
    }

    #[test]
    fn test_static_model_used_without_dynamic_pass() {
        let result = assemble(Assembly {
            url: "https://a.test/".into(),
            static_model: Some(titled("static")),
            errors: vec![PhaseError::render("no browser")],
            ..Default::default()
        });
        assert_eq!(result.meta.title, "static");
        assert_eq!(result.url, "https://a.test/");
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_total_failure_is_well_formed() {
        let result = assemble(Assembly::default());
        assert!(result.sections.is_empty());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["interactions"]["scrolls"], 0);
        assert!(json["sections"].as_array().unwrap().is_empty());
    }
}
