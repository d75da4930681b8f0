//! Chromium-based renderer using chromiumoxide.

use super::{ElementHandle, ElementQuery, NavigationResult, RenderContext, Renderer};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Interval between checks for a committed navigation.
const NAVIGATION_POLL: Duration = Duration::from_millis(100);

/// Environment variable naming an explicit Chromium binary.
pub const ENV_CHROMIUM_PATH: &str = "SITELENS_CHROMIUM_PATH";

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. SITELENS_CHROMIUM_PATH env
    if let Ok(p) = std::env::var(ENV_CHROMIUM_PATH) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.sitelens/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".sitelens/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".sitelens/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".sitelens/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".sitelens/chromium/chrome-linux64/chrome"),
                home.join(".sitelens/chromium/chrome"),
            ]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch headless Chromium from `executable`, or from [`find_chromium`]
    /// when none is given.
    pub async fn launch(executable: Option<PathBuf>, user_agent: &str) -> Result<Self> {
        let chrome_path = match executable {
            Some(path) => path,
            None => find_chromium()
                .with_context(|| format!("Chromium not found; set {ENV_CHROMIUM_PATH}"))?,
        };

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg(format!("--user-agent={user_agent}"))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        // Browser is dropped when ChromiumRenderer is dropped
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

/// Collects matching elements into `window.__sitelensRefs` and describes them.
fn find_script(query: &ElementQuery) -> Result<String> {
    let selector = serde_json::to_string(query.selector())?;
    let needle = serde_json::to_string(&query.text().map(str::to_lowercase))?;
    Ok(format!(
        r#"(() => {{
  const refs = (window.__sitelensRefs = window.__sitelensRefs || []);
  const needle = {needle};
  const out = [];
  for (const el of document.querySelectorAll({selector})) {{
    const text = (el.innerText || el.textContent || "").trim();
    if (needle !== null && !text.toLowerCase().includes(needle)) continue;
    let id = refs.indexOf(el);
    if (id < 0) id = refs.push(el) - 1;
    out.push({{ id, text, ariaLabel: el.getAttribute("aria-label") }});
  }}
  return out;
}})()"#
    ))
}

const NEW_DOCUMENT_SCRIPT: &str = "typeof window.__sitelensRefs === 'undefined'";

fn click_script(id: u64) -> String {
    format!(
        r#"(() => {{
  const el = (window.__sitelensRefs || [])[{id}];
  if (!el || !el.isConnected) return false;
  el.scrollIntoView({{ block: "center" }});
  el.click();
  return true;
}})()"#
    )
}

fn idle_script(quiet_ms: u64, timeout_ms: u64) -> String {
    format!(
        r#"new Promise((resolve) => {{
  const deadline = Date.now() + {timeout_ms};
  let seen = performance.getEntriesByType("resource").length;
  let quietSince = Date.now();
  const tick = () => {{
    const now = Date.now();
    const count = performance.getEntriesByType("resource").length;
    if (count !== seen) {{ seen = count; quietSince = now; }}
    if (document.readyState === "complete" && now - quietSince >= {quiet_ms}) return resolve(true);
    if (now >= deadline) return resolve(false);
    setTimeout(tick, 100);
  }};
  tick();
}})"#
    )
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_)) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn wait_for_navigation(&mut self, from_url: &str, timeout_ms: u64) -> Result<bool> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            // A fresh document has no element refs.
            let committed = match self.page.url().await {
                Ok(Some(current)) if current != from_url => true,
                _ => matches!(
                    self.execute_js(NEW_DOCUMENT_SCRIPT).await,
                    Ok(serde_json::Value::Bool(true))
                ),
            };
            if committed {
                let remaining = deadline.saturating_duration_since(Instant::now());
                return match tokio::time::timeout(remaining, self.page.wait_for_navigation()).await {
                    Ok(Ok(_)) => Ok(true),
                    Ok(Err(e)) => bail!("navigation did not complete: {e}"),
                    Err(_) => Ok(false),
                };
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(NAVIGATION_POLL).await;
        }
    }

    async fn wait_for_idle(&self, quiet_ms: u64, timeout_ms: u64) -> Result<bool> {
        // Small grace on top of the in-page deadline for the CDP round trip.
        let outer = Duration::from_millis(timeout_ms + 1000);
        match tokio::time::timeout(outer, self.execute_js(&idle_script(quiet_ms, timeout_ms))).await
        {
            Ok(value) => Ok(value?.as_bool().unwrap_or(false)),
            Err(_) => Ok(false),
        }
    }

    async fn find_elements(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>> {
        let value = self.execute_js(&find_script(query)?).await?;
        serde_json::from_value(value).context("unexpected element listing from page")
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        let clicked = self.execute_js(&click_script(element.id)).await?;
        if clicked.as_bool() != Some(true) {
            bail!("element {} is no longer attached", element.id);
        }
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.execute_js(
            "window.scrollTo(0, Math.max(document.body ? document.body.scrollHeight : 0, \
             document.documentElement.scrollHeight)); true",
        )
        .await?;
        Ok(())
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn get_html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;

        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert HTML result: {e:?}"))?;

        Ok(html)
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}
