//! Page-level metadata from the document head.

use scraper::{Html, Selector};

use crate::types::PageMeta;

/// Language reported when the root element carries no `lang`.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Extract title, description, language and canonical URL.
///
/// Title prefers `og:title` over `<title>`; description prefers
/// `meta[name=description]` over `og:description`. The canonical href is
/// resolved against `page_url`.
pub fn extract_meta(document: &Html, page_url: &str) -> PageMeta {
    let title = meta_content(document, r#"meta[property="og:title"]"#)
        .or_else(|| first_text(document, "title"))
        .unwrap_or_default();

    let description = meta_content(document, r#"meta[name="description"]"#)
        .or_else(|| meta_content(document, r#"meta[property="og:description"]"#))
        .unwrap_or_default();

    let language = document
        .root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string();

    let canonical_url = Selector::parse(r#"link[rel="canonical"]"#)
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("href").map(|s| s.trim().to_string()))
        })
        .filter(|href| !href.is_empty())
        .map(|href| resolve(page_url, &href));

    PageMeta {
        title,
        description,
        language,
        canonical_url,
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = document.select(&sel).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Resolve `href` against `base`; unresolvable input is returned as given.
pub(crate) fn resolve(base: &str, href: &str) -> String {
    url::Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
