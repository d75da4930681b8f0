//! Noise removal: cookie banners, modals, newsletter overlays.
//!
//! Signatures live in a versioned JSON table. The default table is embedded
//! at compile time; callers may load a replacement from disk. Matching nodes
//! are cut out with their whole subtree before any text is measured.

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::dom::{Element, Node, NodePath};
use crate::types::{ExtractError, ExtractResult};

/// Embedded default noise table.
const DEFAULT_NOISE_RULES_JSON: &str = include_str!("noise_rules.json");

/// Table versions this build understands.
pub const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Substring of the attribute value.
    Contains,
    /// One of the whitespace-separated tokens of the attribute value.
    Token,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseRule {
    pub attribute: String,
    #[serde(rename = "match")]
    pub kind: MatchKind,
    pub value: String,
}

impl NoiseRule {
    fn matches(&self, el: &Element) -> bool {
        let Some(raw) = el.attr(&self.attribute) else {
            return false;
        };
        let haystack = raw.to_ascii_lowercase();
        let needle = self.value.to_ascii_lowercase();
        match self.kind {
            MatchKind::Contains => haystack.contains(&needle),
            MatchKind::Token => haystack.split_whitespace().any(|t| t == needle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseRules {
    pub version: u32,
    pub rules: Vec<NoiseRule>,
}

impl NoiseRules {
    /// The embedded default table.
    pub fn builtin() -> &'static NoiseRules {
        static BUILTIN: OnceLock<NoiseRules> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            serde_json::from_str(DEFAULT_NOISE_RULES_JSON).unwrap_or(NoiseRules {
                version: SUPPORTED_VERSION,
                rules: Vec::new(),
            })
        })
    }

    pub fn from_json(json: &str) -> ExtractResult<Self> {
        let rules: NoiseRules = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ExtractResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    fn validate(&self) -> ExtractResult<()> {
        if self.version != SUPPORTED_VERSION {
            return Err(ExtractError::Config(format!(
                "unsupported noise rule version {} (expected {SUPPORTED_VERSION})",
                self.version
            )));
        }
        if let Some(rule) = self
            .rules
            .iter()
            .find(|r| r.attribute.trim().is_empty() || r.value.trim().is_empty())
        {
            return Err(ExtractError::Config(format!(
                "noise rule has an empty attribute or value: {rule:?}"
            )));
        }
        Ok(())
    }

    pub fn is_noise(&self, el: &Element) -> bool {
        self.rules.iter().any(|r| r.matches(el))
    }

    /// Paths of the outermost noise nodes under `root`.
    pub fn find(&self, root: &Element) -> Vec<NodePath> {
        let mut found = Vec::new();
        let mut prefix = Vec::new();
        self.find_at(root, &mut prefix, &mut found);
        found
    }

    fn find_at(&self, el: &Element, prefix: &mut Vec<usize>, found: &mut Vec<NodePath>) {
        for (i, child) in el.children.iter().enumerate() {
            let Node::Element(child_el) = child else {
                continue;
            };
            prefix.push(i);
            if self.is_noise(child_el) {
                found.push(prefix.clone());
            } else {
                self.find_at(child_el, prefix, found);
            }
            prefix.pop();
        }
    }

    /// Filtered copy of `root` with every noise subtree removed.
    pub fn filter(&self, root: &Element) -> Element {
        let paths = self.find(root);
        if paths.is_empty() {
            return root.clone();
        }
        tracing::debug!("removing {} noise node(s)", paths.len());
        root.without(&paths)
    }
}
