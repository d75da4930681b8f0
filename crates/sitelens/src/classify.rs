//! Section classification: an ordered rule list where the first match wins.

use crate::types::SectionType;

/// What a rule gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Tag of the region root (`section` for heading-based regions).
    pub tag: &'a str,
    /// Position of the section in document order.
    pub index: usize,
    /// Lowercased section text.
    pub text: &'a str,
}

type Rule = (fn(&Candidate<'_>) -> bool, SectionType);

const RULES: &[Rule] = &[
    (is_nav, SectionType::Nav),
    (is_footer, SectionType::Footer),
    (is_hero, SectionType::Hero),
    (is_faq, SectionType::Faq),
    (is_pricing, SectionType::Pricing),
];

fn is_nav(c: &Candidate<'_>) -> bool {
    c.tag == "nav"
}

fn is_footer(c: &Candidate<'_>) -> bool {
    c.tag == "footer"
}

fn is_hero(c: &Candidate<'_>) -> bool {
    c.index == 0 && mentions(c.text, &["hero", "welcome", "home"])
}

fn is_faq(c: &Candidate<'_>) -> bool {
    mentions(c.text, &["faq", "frequently asked questions"])
}

fn is_pricing(c: &Candidate<'_>) -> bool {
    mentions(c.text, &["pricing", "per month", "plan"])
}

fn mentions(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Classify a region by tag, position and text.
pub fn classify(tag: &str, index: usize, text: &str) -> SectionType {
    let lowered = text.to_lowercase();
    let candidate = Candidate {
        tag,
        index,
        text: &lowered,
    };
    RULES
        .iter()
        .find(|(applies, _)| applies(&candidate))
        .map(|(_, kind)| *kind)
        .unwrap_or(SectionType::Section)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_rules_take_priority() {
        assert_eq!(classify("nav", 0, "Welcome home"), SectionType::Nav);
        assert_eq!(classify("footer", 3, "Pricing FAQ"), SectionType::Footer);
    }

    #[test]
    fn test_hero_only_for_first_section() {
        assert_eq!(classify("header", 0, "Welcome to Acme"), SectionType::Hero);
        assert_eq!(classify("section", 1, "Welcome back"), SectionType::Section);
    }

    #[test]
    fn test_faq_before_pricing() {
        assert_eq!(
            classify("section", 2, "Frequently Asked Questions about our plan"),
            SectionType::Faq
        );
        assert_eq!(classify("section", 2, "$10 PER MONTH"), SectionType::Pricing);
    }

    #[test]
    fn test_plan_substring_matches() {
        // "planet" contains "plan"
        assert_eq!(classify("article", 4, "Planet news"), SectionType::Pricing);
        assert_eq!(classify("article", 4, "Company news"), SectionType::Section);
    }
}
