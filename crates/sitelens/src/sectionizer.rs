//! Segment a cleaned DOM tree into ordered, classified sections.
//!
//! Semantic containers (`header`, `nav`, `main`, `section`, `footer`,
//! `article`) are preferred; only the outermost ones count. Pages without any
//! fall back to one section per `h1`-`h3` heading, each running until the next
//! heading of the same or a higher level. Pages with no headings either become
//! a single body section.

use std::borrow::Cow;

use crate::classify::classify;
use crate::dom::{Element, Node};
use crate::meta::resolve;
use crate::types::{Image, Link, Section};

/// Serialized markup beyond this many characters is cut off.
pub const RAW_HTML_LIMIT: usize = 3000;

/// Words taken from the text when a section has no heading.
pub const LABEL_WORDS: usize = 7;

pub const DEFAULT_LABEL: &str = "Section";

const SEMANTIC_CONTAINERS: &[&str] = &["header", "nav", "main", "section", "footer", "article"];

const HEADINGS: &[&str] = &["h1", "h2", "h3"];

/// A subtree that will become one section.
struct Region<'a> {
    root: Cow<'a, Element>,
    /// Tag used for classification.
    tag: &'a str,
}

/// Split `root` into sections. `page_url` resolves links and images and is
/// stamped on every section as its source.
pub fn sectionize(root: &Element, page_url: &str) -> Vec<Section> {
    let body = if root.is("body") {
        root
    } else {
        root.find_first("body").unwrap_or(root)
    };

    let mut regions = Vec::new();
    collect_semantic(body, &mut regions);
    if regions.is_empty() {
        regions = heading_regions(body);
    }

    let mut sections = Vec::with_capacity(regions.len());
    for region in regions {
        let content = Content::extract(&region.root, page_url);
        if content.is_empty() {
            continue;
        }
        let index = sections.len();
        sections.push(content.into_section(&region, index, page_url));
    }
    tracing::debug!("sectionized {page_url} into {} section(s)", sections.len());
    sections
}

fn collect_semantic<'a>(el: &'a Element, out: &mut Vec<Region<'a>>) {
    for child in el.child_elements() {
        if SEMANTIC_CONTAINERS.contains(&child.tag.as_str()) {
            out.push(Region {
                root: Cow::Borrowed(child),
                tag: child.tag.as_str(),
            });
        } else {
            collect_semantic(child, out);
        }
    }
}

fn heading_level(el: &Element) -> Option<u8> {
    match el.tag.as_str() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        _ => None,
    }
}

/// Flatten `el` into top-level nodes paired with their heading level, walking
/// through wrappers that contain headings.
fn flatten<'a>(el: &'a Element, out: &mut Vec<(Option<u8>, &'a Node)>) {
    for child in &el.children {
        match child {
            Node::Element(e) => {
                if let Some(level) = heading_level(e) {
                    out.push((Some(level), child));
                } else if e.contains_any(HEADINGS) {
                    flatten(e, out);
                } else {
                    out.push((None, child));
                }
            }
            Node::Text(_) => out.push((None, child)),
        }
    }
}

/// One region per heading, running to the next heading of the same or a
/// higher level, plus any content before the first heading.
fn heading_regions(body: &Element) -> Vec<Region<'static>> {
    let mut items = Vec::new();
    flatten(body, &mut items);

    let wrap = |slice: &[(Option<u8>, &Node)]| Region {
        root: Cow::Owned(Element::with_children(
            "div",
            slice.iter().map(|(_, node)| (*node).clone()).collect(),
        )),
        tag: "section",
    };

    let first = items
        .iter()
        .position(|(level, _)| level.is_some())
        .unwrap_or(items.len());
    let mut regions = Vec::new();
    let leading = wrap(&items[..first]);
    if leading.root.has_content() {
        regions.push(leading);
    }
    for (i, (level, _)) in items.iter().enumerate() {
        let Some(level) = *level else {
            continue;
        };
        let end = items[i + 1..]
            .iter()
            .position(|(next, _)| matches!(next, Some(n) if *n <= level))
            .map_or(items.len(), |offset| i + 1 + offset);
        regions.push(wrap(&items[i..end]));
    }
    regions
}

/// Everything pulled out of one region.
struct Content {
    headings: Vec<String>,
    text: String,
    links: Vec<Link>,
    lists: Vec<Vec<String>>,
    tables: Vec<Vec<Vec<String>>>,
    images: Vec<Image>,
}

impl Content {
    fn extract(root: &Element, page_url: &str) -> Self {
        let headings = root
            .find_all(HEADINGS)
            .into_iter()
            .map(Element::text)
            .filter(|t| !t.is_empty())
            .collect();

        let mut links: Vec<Link> = Vec::new();
        for a in root.find_all(&["a"]) {
            let Some(href) = a.attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
                continue;
            };
            let link = Link {
                href: resolve(page_url, href),
                text: a.text(),
            };
            if !links.contains(&link) {
                links.push(link);
            }
        }

        let mut images: Vec<Image> = Vec::new();
        for img in root.find_all(&["img"]) {
            let Some(src) = img.attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            let image = Image {
                src: resolve(page_url, src),
                alt: img.attr("alt").unwrap_or("").trim().to_string(),
            };
            if !images.contains(&image) {
                images.push(image);
            }
        }

        let lists = root
            .find_all(&["ul", "ol"])
            .into_iter()
            .map(|list| list.find_all(&["li"]).into_iter().map(Element::text).collect::<Vec<_>>())
            .filter(|items| !items.is_empty())
            .collect();

        let tables = root
            .find_all(&["table"])
            .into_iter()
            .map(|table| {
                table
                    .find_all(&["tr"])
                    .into_iter()
                    .map(|row| {
                        row.find_all(&["td", "th"])
                            .into_iter()
                            .map(Element::text)
                            .collect::<Vec<_>>()
                    })
                    .filter(|cells| !cells.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|rows| !rows.is_empty())
            .collect();

        Self {
            headings,
            text: root.text(),
            links,
            lists,
            tables,
            images,
        }
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty() && self.headings.is_empty() && self.links.is_empty()
    }

    fn into_section(self, region: &Region<'_>, index: usize, page_url: &str) -> Section {
        let section_type = classify(region.tag, index, &self.text);
        let label = derive_label(&self.headings, &self.text);
        let (raw_html, truncated) = truncate_markup(region.root.serialize());
        Section {
            id: format!("{}-{index}", section_type.as_str()),
            section_type,
            label,
            source_url: page_url.to_string(),
            headings: self.headings,
            text: self.text,
            links: self.links,
            lists: self.lists,
            tables: self.tables,
            images: self.images,
            raw_html,
            truncated,
        }
    }
}

/// First heading, else the first few words of text, else a fixed label.
pub fn derive_label(headings: &[String], text: &str) -> String {
    if let Some(first) = headings.first() {
        return first.clone();
    }
    let words: Vec<&str> = text.split_whitespace().take(LABEL_WORDS).collect();
    if words.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        words.join(" ")
    }
}

/// Cut markup to `RAW_HTML_LIMIT` characters, reporting whether it was cut.
pub fn truncate_markup(markup: String) -> (String, bool) {
    match markup.char_indices().nth(RAW_HTML_LIMIT) {
        Some((byte_idx, _)) => (markup[..byte_idx].to_string(), true),
        None => (markup, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;
    use crate::types::SectionType;

    const URL: &str = "https://example.com/page";

    #[test]
    fn test_semantic_containers_in_order_without_nesting() {
        let root = dom::parse(
            r#"<body><header><h1>Welcome to Acme</h1></header>
            <nav><a href="/a">A</a></nav>
            <main><section><h2>Inner</h2><p>Nested</p></section></main>
            <footer>Contact us</footer></body>"#,
        );
        let sections = sectionize(&root, URL);
        let types: Vec<_> = sections.iter().map(|s| s.section_type).collect();
        assert_eq!(
            types,
            vec![SectionType::Hero, SectionType::Nav, SectionType::Section, SectionType::Footer]
        );
        assert_eq!(sections[2].headings, vec!["Inner"]);
        assert_eq!(sections[0].id, "hero-0");
        assert_eq!(sections[3].id, "footer-3");
        assert!(sections.iter().all(|s| s.source_url == URL));
    }

    #[test]
    fn test_heading_fallback_one_section_per_heading() {
        let root = dom::parse(
            r#"<body><p>Intro text</p><h2>Features</h2><p>Fast</p><h3>Detail</h3><p>More</p>
            <h2>Pricing</h2><p>$5 per month</p></body>"#,
        );
        let sections = sectionize(&root, URL);
        let labels: Vec<_> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Intro text", "Features", "Detail", "Pricing"]);
        assert!(sections[0].headings.is_empty());
        assert_eq!(sections[1].headings, vec!["Features", "Detail"]);
        assert_eq!(sections[1].text, "Features Fast Detail More");
        assert_eq!(sections[2].headings, vec!["Detail"]);
        assert_eq!(sections[2].text, "Detail More");
        assert_eq!(sections[3].section_type, SectionType::Pricing);
        assert_eq!(sections[3].id, "pricing-3");
        assert!(sections[1].raw_html.starts_with("<div><h2>Features</h2><p>Fast</p><h3>"));
        assert!(sections[2].raw_html.starts_with("<div><h3>Detail</h3><p>More</p>"));
    }

    #[test]
    fn test_lower_level_heading_starts_its_own_section() {
        let root = dom::parse("<body><h2>Features</h2><p>Fast</p><h3>Detail</h3><p>More</p></body>");
        let sections = sectionize(&root, URL);
        let labels: Vec<_> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Features", "Detail"]);
        assert_eq!(sections[1].text, "Detail More");
    }

    #[test]
    fn test_heading_fallback_walks_through_wrappers() {
        let root = dom::parse(
            r#"<body><div class="wrap"><h1>One</h1><p>a</p></div><div><h1>Two</h1><p>b</p></div></body>"#,
        );
        let sections = sectionize(&root, URL);
        let labels: Vec<_> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["One", "Two"]);
        assert_eq!(sections[1].text, "Two b");
    }

    #[test]
    fn test_no_containers_or_headings_yields_body_section() {
        let root = dom::parse(
            "<body><table><tr><td>1.</td><td>Story one words here now and more</td></tr></table></body>",
        );
        let sections = sectionize(&root, URL);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].label, "1. Story one words here now and");
        assert_eq!(
            sections[0].tables,
            vec![vec![vec!["1.".to_string(), "Story one words here now and more".to_string()]]]
        );
    }

    #[test]
    fn test_empty_body_has_no_sections() {
        assert!(sectionize(&dom::parse(""), URL).is_empty());
        assert!(sectionize(&dom::parse("<body>   </body>"), URL).is_empty());
    }

    #[test]
    fn test_links_images_lists_are_resolved_and_deduped() {
        let root = dom::parse(
            r#"<body><section><a href="/x">X</a><a href="/x">X</a><a href="">skip</a><a>none</a>
            <img src="logo.png" alt=" Logo "><img src="logo.png" alt=" Logo ">
            <ul><li>one</li><li>two</li></ul><ol></ol></section></body>"#,
        );
        let s = &sectionize(&root, URL)[0];
        assert_eq!(
            s.links,
            vec![Link { href: "https://example.com/x".into(), text: "X".into() }]
        );
        assert_eq!(
            s.images,
            vec![Image { src: "https://example.com/logo.png".into(), alt: "Logo".into() }]
        );
        assert_eq!(s.lists, vec![vec!["one".to_string(), "two".to_string()]]);
    }

    #[test]
    fn test_truncation_invariant() {
        let long = "x".repeat(RAW_HTML_LIMIT * 2);
        let root = dom::parse(&format!("<body><section><p>{long}</p></section><section><p>short</p></section></body>"));
        let sections = sectionize(&root, URL);
        assert!(sections[0].truncated);
        assert_eq!(sections[0].raw_html.chars().count(), RAW_HTML_LIMIT);
        assert!(!sections[1].truncated);
        assert_eq!(sections[1].raw_html, "<section><p>short</p></section>");
    }

    #[test]
    fn test_truncate_markup_respects_char_boundaries() {
        let markup = "é".repeat(RAW_HTML_LIMIT + 1);
        let (cut, truncated) = truncate_markup(markup);
        assert!(truncated);
        assert_eq!(cut.chars().count(), RAW_HTML_LIMIT);
        let exact = "a".repeat(RAW_HTML_LIMIT);
        assert_eq!(truncate_markup(exact.clone()), (exact, false));
    }

    #[test]
    fn test_label_fallbacks() {
        assert_eq!(derive_label(&["Head".into()], "body"), "Head");
        assert_eq!(derive_label(&[], "a b c d e f g h i"), "a b c d e f g");
        assert_eq!(derive_label(&[], ""), DEFAULT_LABEL);
    }

    #[test]
    fn test_sections_keep_document_order_after_noise_removal() {
        let root = dom::parse(
            r#"<body><section>First</section><div class="cookie-banner"><section>Noise</section></div><section>Second</section></body>"#,
        );
        let cleaned = crate::noise::NoiseRules::builtin().filter(&root);
        let texts: Vec<_> = sectionize(&cleaned, URL).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["First", "Second"]);
    }
}
