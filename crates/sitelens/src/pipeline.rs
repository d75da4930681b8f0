//! The extraction pipeline: static pass, sufficiency check, optional dynamic
//! pass, assembly.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};
use url::Url;

use crate::acquisition::{fetch_document, HttpClient};
use crate::assembler::{assemble, Assembly};
use crate::config::ExtractConfig;
use crate::interaction::{DynamicPass, Orchestrator};
use crate::noise::NoiseRules;
use crate::renderer::{NoopRenderer, RenderContext, Renderer};
use crate::sufficiency::is_sufficient;
use crate::types::{ExtractError, ExtractResult, ExtractionResult, InteractionLog, PhaseError};

/// Check that `raw` is an absolute http(s) URL with a host.
pub fn validate_url(raw: &str) -> ExtractResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::MalformedInput("url is empty".into()));
    }
    let url = Url::parse(trimmed)
        .map_err(|e| ExtractError::MalformedInput(format!("{trimmed:?} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractError::MalformedInput(format!(
            "unsupported scheme {:?}",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ExtractError::MalformedInput(format!("{trimmed:?} has no host")));
    }
    Ok(url)
}

/// Shared extraction engine: one HTTP client and one renderer serve every
/// request; each dynamic pass gets its own render context.
#[derive(Clone)]
pub struct Extractor {
    http: HttpClient,
    renderer: Arc<dyn Renderer>,
    config: Arc<ExtractConfig>,
    rules: Arc<NoiseRules>,
}

impl Extractor {
    pub fn new(config: ExtractConfig, rules: NoiseRules, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            http: HttpClient::new(&config),
            renderer,
            config: Arc::new(config),
            rules: Arc::new(rules),
        }
    }

    /// An extractor that never opens a browser.
    pub fn static_only(config: ExtractConfig, rules: NoiseRules) -> Self {
        Self::new(config, rules, Arc::new(NoopRenderer))
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// Extract a structured, sectioned view of the page at `raw_url`.
    ///
    /// Only malformed input is an error. Fetch and render failures are
    /// recovered and listed in the result's `errors`.
    pub async fn extract(&self, raw_url: &str) -> ExtractResult<ExtractionResult> {
        let url = validate_url(raw_url)?.to_string();
        let scraped_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut errors = Vec::new();

        let static_model = match fetch_document(&self.http, &url, &self.rules).await {
            Ok(model) => Some(model),
            Err(e) => {
                warn!("static fetch of {url} failed: {e}");
                errors.push(PhaseError::fetch(e.to_string()));
                None
            }
        };

        if static_model.as_ref().is_some_and(is_sufficient) {
            info!("static pass sufficient for {url}");
            return Ok(assemble(Assembly {
                url,
                scraped_at,
                static_model,
                dynamic_model: None,
                interactions: InteractionLog::default(),
                errors,
            }));
        }
        info!("static pass insufficient for {url}; trying dynamic pass");

        let (dynamic_model, interactions) = match self.renderer.new_context().await {
            Ok(ctx) => {
                let mut guard = ContextGuard(Some(ctx));
                let pass = match guard.0.as_deref_mut() {
                    Some(ctx) => Orchestrator::new(&self.config, &self.rules).run(ctx, &url).await,
                    None => DynamicPass::default(),
                };
                guard.close().await;
                errors.extend(pass.errors);
                (Some(pass.model), pass.log)
            }
            Err(e) => {
                warn!("no render context for {url}: {e}");
                errors.push(PhaseError::render(format!("browser unavailable: {e}")));
                (None, InteractionLog::default())
            }
        };

        let result = assemble(Assembly {
            url,
            scraped_at,
            static_model,
            dynamic_model,
            interactions,
            errors,
        });
        info!(
            "extracted {} section(s) from {}",
            result.sections.len(),
            result.url
        );
        Ok(result)
    }
}

/// Owns a render context for one dynamic pass. A context still held when the
/// guard drops (the pass was cancelled) is closed on a background task.
struct ContextGuard(Option<Box<dyn RenderContext>>);

impl ContextGuard {
    async fn close(mut self) {
        if let Some(ctx) = self.0.take() {
            if let Err(e) = ctx.close().await {
                warn!("failed to close render context: {e}");
            }
        }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let Some(ctx) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = ctx.close().await {
                        warn!("failed to close abandoned render context: {e}");
                    }
                });
            }
            Err(_) => warn!("render context dropped outside a runtime; tab left open"),
        }
    }
}
