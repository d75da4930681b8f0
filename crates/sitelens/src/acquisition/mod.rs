//! Static acquisition: plain HTTP fetch and browser-free document building.

pub mod http_client;
pub mod static_extractor;

pub use http_client::{FetchError, FetchedPage, HttpClient};
pub use static_extractor::fetch_document;
