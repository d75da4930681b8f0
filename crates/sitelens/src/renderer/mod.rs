//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). The interaction
//! orchestrator only talks to these traits.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// How to locate interactive elements in the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementQuery {
    /// Every element matching a CSS selector.
    Css(String),
    /// Elements matching `selector` whose visible text contains `text`,
    /// compared case-insensitively.
    CssWithText { selector: String, text: String },
}

impl ElementQuery {
    pub fn css(selector: &str) -> Self {
        Self::Css(selector.to_string())
    }

    pub fn with_text(selector: &str, text: &str) -> Self {
        Self::CssWithText {
            selector: selector.to_string(),
            text: text.to_string(),
        }
    }

    pub fn selector(&self) -> &str {
        match self {
            Self::Css(selector) | Self::CssWithText { selector, .. } => selector,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Css(_) => None,
            Self::CssWithText { text, .. } => Some(text),
        }
    }
}

/// An element found in the current page, valid until the next navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementHandle {
    /// Context-scoped reference used to act on the element.
    pub id: u64,
    /// Visible text, trimmed.
    pub text: String,
    pub aria_label: Option<String>,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
    /// Whether contexts can be created at all.
    fn is_available(&self) -> bool {
        true
    }
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Wait for a navigation away from the document at `from_url`, started by
    /// an earlier click, to commit and finish loading. Returns `false` if no
    /// new document loaded within `timeout_ms`.
    async fn wait_for_navigation(&mut self, from_url: &str, timeout_ms: u64) -> Result<bool>;
    /// Wait until no new network requests start for `quiet_ms` and the
    /// document is complete. Returns `false` if `timeout_ms` elapsed first.
    async fn wait_for_idle(&self, quiet_ms: u64, timeout_ms: u64) -> Result<bool>;
    /// Elements matching `query`, in document order.
    async fn find_elements(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>>;
    /// Click a previously found element.
    async fn click(&mut self, element: &ElementHandle) -> Result<()>;
    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<()>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A no-op renderer used when Chromium is unavailable.
///
/// Static extraction works without a browser; the dynamic pass is skipped
/// and the pipeline records a render error instead.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("browser not available, static-only mode"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_renderer_refuses_contexts() {
        let renderer = NoopRenderer;
        assert!(renderer.new_context().await.is_err());
        assert!(!renderer.is_available());
        assert_eq!(renderer.active_contexts(), 0);
        renderer.shutdown().await.unwrap();
    }

    #[test]
    fn test_element_query_accessors() {
        let q = ElementQuery::with_text("button", "Load more");
        assert_eq!(q.selector(), "button");
        assert_eq!(q.text(), Some("Load more"));
        assert_eq!(ElementQuery::css("[role='tab']").text(), None);
    }
}
