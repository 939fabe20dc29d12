//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Build the listing URL for a label, e.g. `.../companies?batch=Summer+2024`.
pub fn listing_url(listing: &str, param: &str, label: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(listing, &[(param, label)])
}
