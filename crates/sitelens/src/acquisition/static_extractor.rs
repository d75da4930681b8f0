//! Static pass: fetch markup over HTTP and build a document model from it.

use tracing::{debug, info};

use super::http_client::{FetchError, HttpClient};
use crate::document::build_document_model;
use crate::noise::NoiseRules;
use crate::types::DocumentModel;

/// Fetch `url` and build its document model without a browser.
pub async fn fetch_document(
    http: &HttpClient,
    url: &str,
    rules: &NoiseRules,
) -> Result<DocumentModel, FetchError> {
    let page = http.get(url).await?;
    if page.final_url != page.url {
        debug!("{} redirected to {}", page.url, page.final_url);
    }
    debug!(
        "fetched {} (HTTP {}, {} bytes, {:?})",
        page.final_url,
        page.status,
        page.body.len(),
        page.content_type
    );
    let model = build_document_model(&page.body, &page.final_url, rules);
    info!(
        "static pass for {url}: {} section(s), {} text chars",
        model.sections.len(),
        model.text_len()
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_document_sections_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<body><main><h1>Hello</h1><img src=\"a.png\"></main></body>"),
            )
            .mount(&server)
            .await;

        let http = HttpClient::new(&ExtractConfig::default());
        let url = format!("{}/", server.uri());
        let model = fetch_document(&http, &url, NoiseRules::builtin())
            .await
            .unwrap();
        assert_eq!(model.sections.len(), 1);
        assert_eq!(model.sections[0].source_url, url);
        assert_eq!(model.sections[0].images[0].src, format!("{url}a.png"));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let http = HttpClient::new(&ExtractConfig::default());
        let err = fetch_document(&http, &server.uri(), NoiseRules::builtin())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(404));
    }
}
