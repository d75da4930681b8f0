//! Dynamic pass: drive a rendered page through tabs, "load more" buttons,
//! scrolling and pagination, then section whatever the DOM holds.
//!
//! The pass is an explicit state machine:
//!
//! ```text
//! Load -> TabExploration -> LoadMore -> ScrollLoop -> PaginationLoop -> Finalize -> Done
//!   \______________________ navigation failure ______________________/
//! ```
//!
//! Interaction failures are logged at debug level and never abort the pass.
//! Only a failed navigation or a failed final serialization is reported back,
//! as a render error.

use tracing::{debug, info};

use crate::config::ExtractConfig;
use crate::document::build_document_model;
use crate::noise::NoiseRules;
use crate::renderer::{ElementHandle, ElementQuery, RenderContext};
use crate::types::{DocumentModel, InteractionLog, PhaseError};

pub const TAB_SELECTOR: &str = "[role='tab']";

/// Button phrases tried in order during the load-more step.
pub const LOAD_MORE_PHRASES: &[&str] = &["Load more", "Show more", "More"];

/// Tab labels in the interaction log are cut to this many characters.
pub const TAB_LABEL_CHARS: usize = 40;

pub const CLICK_LOAD_MORE: &str = "loadmore";
pub const CLICK_PAGINATION: &str = "pagination:next";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Load,
    TabExploration,
    LoadMore,
    ScrollLoop,
    PaginationLoop,
    Finalize,
    Done,
}

/// Outcome of one dynamic pass.
#[derive(Debug, Clone, Default)]
pub struct DynamicPass {
    pub model: DocumentModel,
    pub log: InteractionLog,
    /// Render failures recovered during the pass.
    pub errors: Vec<PhaseError>,
}

pub struct Orchestrator<'a> {
    config: &'a ExtractConfig,
    rules: &'a NoiseRules,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a ExtractConfig, rules: &'a NoiseRules) -> Self {
        Self { config, rules }
    }

    /// Run the full state machine against `ctx`, which the caller owns
    /// exclusively for the duration of the pass.
    pub async fn run(&self, ctx: &mut dyn RenderContext, url: &str) -> DynamicPass {
        let mut pass = DynamicPass::default();
        let mut state = State::Load;
        while state != State::Done {
            debug!("interaction state {state:?} for {url}");
            state = match state {
                State::Load => self.load(ctx, url, &mut pass).await,
                State::TabExploration => self.explore_tabs(ctx, &mut pass.log).await,
                State::LoadMore => self.load_more(ctx, &mut pass.log).await,
                State::ScrollLoop => self.scroll(ctx, &mut pass.log).await,
                State::PaginationLoop => self.paginate(ctx, &mut pass.log).await,
                State::Finalize => self.finalize(ctx, url, &mut pass).await,
                State::Done => State::Done,
            };
        }
        info!(
            "dynamic pass for {url}: {} click(s), {} pagination hop(s), {} scroll(s), {} page(s), {} section(s)",
            pass.log.clicks.len(),
            pass.log.pagination_hops(),
            pass.log.scrolls,
            pass.log.pages.len(),
            pass.model.sections.len()
        );
        pass
    }

    fn navigation_timeout_ms(&self) -> u64 {
        self.config.navigation_timeout.as_millis() as u64
    }

    async fn wait_for_idle(&self, ctx: &dyn RenderContext) {
        let quiet = self.config.idle_quiet.as_millis() as u64;
        match ctx.wait_for_idle(quiet, self.navigation_timeout_ms()).await {
            Ok(true) => {}
            Ok(false) => debug!("network idle wait timed out; continuing"),
            Err(e) => debug!("network idle wait failed: {e}"),
        }
    }

    async fn load(&self, ctx: &mut dyn RenderContext, url: &str, pass: &mut DynamicPass) -> State {
        pass.log.record_page(url);
        match ctx.navigate(url, self.navigation_timeout_ms()).await {
            Ok(nav) => {
                debug!("loaded {} in {}ms", nav.final_url, nav.load_time_ms);
                self.wait_for_idle(ctx).await;
                State::TabExploration
            }
            Err(e) => {
                pass.errors.push(PhaseError::render(format!("navigation failed: {e}")));
                State::Finalize
            }
        }
    }

    async fn explore_tabs(&self, ctx: &mut dyn RenderContext, log: &mut InteractionLog) -> State {
        let tabs = match ctx.find_elements(&ElementQuery::css(TAB_SELECTOR)).await {
            Ok(tabs) => tabs,
            Err(e) => {
                debug!("tab lookup failed: {e}");
                Vec::new()
            }
        };
        for tab in tabs.iter().take(self.config.budget.max_tabs) {
            match ctx.click(tab).await {
                Ok(()) => {
                    log.record_click(format!("tab:{}", tab_label(tab)));
                    tokio::time::sleep(self.config.tab_settle).await;
                }
                Err(e) => debug!("tab click failed: {e}"),
            }
        }
        State::LoadMore
    }

    async fn load_more(&self, ctx: &mut dyn RenderContext, log: &mut InteractionLog) -> State {
        let mut clicked = 0;
        for phrase in LOAD_MORE_PHRASES {
            if clicked >= self.config.budget.max_load_more {
                break;
            }
            let buttons = match ctx.find_elements(&ElementQuery::with_text("button", phrase)).await {
                Ok(buttons) => buttons,
                Err(e) => {
                    debug!("load-more lookup for {phrase:?} failed: {e}");
                    continue;
                }
            };
            let Some(button) = buttons.first() else {
                continue;
            };
            match ctx.click(button).await {
                Ok(()) => {
                    log.record_click(CLICK_LOAD_MORE);
                    clicked += 1;
                    tokio::time::sleep(self.config.settle).await;
                }
                Err(e) => debug!("load-more click failed: {e}"),
            }
        }
        State::ScrollLoop
    }

    async fn scroll(&self, ctx: &mut dyn RenderContext, log: &mut InteractionLog) -> State {
        for _ in 0..self.config.budget.scrolls {
            if let Err(e) = ctx.scroll_to_bottom().await {
                debug!("scroll failed: {e}");
            }
            log.record_scroll();
            tokio::time::sleep(self.config.settle).await;
        }
        State::PaginationLoop
    }

    async fn paginate(&self, ctx: &mut dyn RenderContext, log: &mut InteractionLog) -> State {
        for hop in 0..self.config.budget.max_pagination_hops {
            let Some(next) = find_next_control(ctx).await else {
                debug!("no pagination control after {hop} hop(s)");
                break;
            };
            let before = ctx.get_url().await.unwrap_or_default();
            if let Err(e) = ctx.click(&next).await {
                debug!("pagination click failed: {e}");
                break;
            }
            match ctx.wait_for_navigation(&before, self.navigation_timeout_ms()).await {
                Ok(true) => {}
                Ok(false) => debug!("no new document after pagination click from {before}"),
                Err(e) => debug!("pagination navigation failed: {e}"),
            }
            self.wait_for_idle(ctx).await;
            log.record_click(CLICK_PAGINATION);
            match ctx.get_url().await {
                Ok(current) => {
                    if !log.record_page(&current) {
                        debug!("pagination revisited {current}");
                    }
                }
                Err(e) => debug!("could not read URL after pagination: {e}"),
            }
        }
        State::Finalize
    }

    async fn finalize(&self, ctx: &mut dyn RenderContext, url: &str, pass: &mut DynamicPass) -> State {
        let page_url = match ctx.get_url().await {
            Ok(current) if current.starts_with("http://") || current.starts_with("https://") => {
                current
            }
            _ => url.to_string(),
        };
        match ctx.get_html().await {
            Ok(html) => {
                pass.model = build_document_model(&html, &page_url, self.rules);
            }
            Err(e) => {
                pass.model = DocumentModel::default();
                pass.errors.push(PhaseError::render(format!("serialization failed: {e}")));
            }
        }
        State::Done
    }
}

/// Pagination candidates in priority order; the first query with a match wins.
fn next_queries() -> [ElementQuery; 3] {
    [
        ElementQuery::css("a[rel~='next']"),
        ElementQuery::with_text("a", "Next"),
        ElementQuery::with_text("a", "›"),
    ]
}

async fn find_next_control(ctx: &dyn RenderContext) -> Option<ElementHandle> {
    for query in next_queries() {
        match ctx.find_elements(&query).await {
            Ok(found) => {
                if let Some(first) = found.into_iter().next() {
                    return Some(first);
                }
            }
            Err(e) => debug!("pagination lookup {query:?} failed: {e}"),
        }
    }
    None
}

/// Visible text, else `aria-label`, cut to [`TAB_LABEL_CHARS`].
pub fn tab_label(tab: &ElementHandle) -> String {
    let text = tab.text.split_whitespace().collect::<Vec<_>>().join(" ");
    let label = if text.is_empty() {
        tab.aria_label.as_deref().unwrap_or("").trim().to_string()
    } else {
        text
    };
    label.chars().take(TAB_LABEL_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(text: &str, aria: Option<&str>) -> ElementHandle {
        ElementHandle {
            id: 0,
            text: text.to_string(),
            aria_label: aria.map(str::to_string),
        }
    }

    #[test]
    fn test_tab_label_prefers_visible_text() {
        assert_eq!(tab_label(&handle("  Specs \n sheet ", Some("ignored"))), "Specs sheet");
        assert_eq!(tab_label(&handle("", Some(" Reviews "))), "Reviews");
        assert_eq!(tab_label(&handle("", None)), "");
    }

    #[test]
    fn test_tab_label_is_cut() {
        let long = "x".repeat(100);
        assert_eq!(tab_label(&handle(&long, None)).chars().count(), TAB_LABEL_CHARS);
    }

    #[test]
    fn test_next_queries_order() {
        let q = next_queries();
        assert_eq!(q[0], ElementQuery::css("a[rel~='next']"));
        assert_eq!(q[1].text(), Some("Next"));
        assert_eq!(q[2].text(), Some("›"));
    }
}
