// src/services/payload.rs

//! Embedded page-state parsing for company detail pages.
//!
//! Company pages are server-rendered React components. The component's
//! props travel as JSON in an attribute of its mount element; the company
//! record lives at `props.company` inside that JSON.

use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;

use crate::error::Result;
use crate::models::{DetailRecord, ExtractConfig, MISSING, parse_selector};
use crate::utils::http::FetchError;

/// Why a single company page produced no record.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("page state container not found")]
    MissingContainer,

    #[error("page state attribute '{0}' not found")]
    MissingAttribute(String),

    #[error("page state is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("page state has no props.company object")]
    MissingCompany,
}

/// Locates and decodes the embedded state of a company page.
#[derive(Debug, Clone)]
pub struct PayloadParser {
    container: Selector,
    attribute: String,
}

impl PayloadParser {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            container: parse_selector(&config.container_selector())?,
            attribute: config.state_attribute.clone(),
        })
    }

    /// Parse a fetched page body into a record for `label`/`link`.
    pub fn parse(
        &self,
        label: &str,
        link: &str,
        body: &str,
    ) -> std::result::Result<DetailRecord, ExtractionError> {
        let state = self.embedded_state(body)?;
        let state: Value = serde_json::from_str(&state)?;
        let company = state
            .pointer("/props/company")
            .filter(|c| c.is_object())
            .ok_or(ExtractionError::MissingCompany)?;
        Ok(company_record(label, link, company))
    }

    fn embedded_state(&self, body: &str) -> std::result::Result<String, ExtractionError> {
        let document = Html::parse_document(body);
        let container = document
            .select(&self.container)
            .next()
            .ok_or(ExtractionError::MissingContainer)?;

        container
            .value()
            .attr(&self.attribute)
            .filter(|raw| !raw.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| ExtractionError::MissingAttribute(self.attribute.clone()))
    }
}

/// Map a `props.company` object onto a record. Never fails; absent values
/// become [`MISSING`].
pub fn company_record(label: &str, link: &str, company: &Value) -> DetailRecord {
    DetailRecord {
        label: label.to_string(),
        link: link.to_string(),
        name: text_field(company, "name"),
        tagline: text_field(company, "one_liner"),
        description: text_field(company, "long_description"),
        founders: founder_names(company),
        logo_url: text_field(company, "logo_url"),
        location: text_field(company, "location"),
        founded_year: text_field(company, "year_founded"),
        team_size: text_field(company, "team_size"),
    }
}

fn text_field(object: &Value, key: &str) -> String {
    object
        .get(key)
        .and_then(scalar_text)
        .unwrap_or_else(|| MISSING.to_string())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn founder_names(company: &Value) -> Vec<String> {
    company
        .get("founders")
        .and_then(Value::as_array)
        .map(|founders| {
            founders
                .iter()
                .map(|founder| text_field(founder, "full_name"))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;

    /// Wrap page state the way the site embeds it: HTML-escaped JSON in `data-page`.
    pub(crate) fn company_page(state: &Value) -> String {
        let escaped = state
            .to_string()
            .replace('&', "&amp;")
            .replace('"', "&quot;");
        format!(
            r#"<html><body><div id="ycdc_new/pages/Companies/ShowPage-react-component-1f2e" data-page="{escaped}"></div></body></html>"#
        )
    }

    fn parser() -> PayloadParser {
        PayloadParser::new(&ExtractConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_full_company() {
        let page = company_page(&json!({
            "component": "ShowPage",
            "props": {
                "company": {
                    "name": "Acme & Co",
                    "one_liner": "Rockets, delivered",
                    "long_description": "We \"ship\" rockets.\nFast.",
                    "founders": [
                        {"full_name": "Wile E. Coyote"},
                        {"full_name": "Road Runner"}
                    ],
                    "logo_url": "https://example.com/logo.png",
                    "location": "Mojave, CA",
                    "year_founded": 2019,
                    "team_size": 12
                }
            }
        }));

        let record = parser()
            .parse("Summer 2019", "https://www.ycombinator.com/companies/acme", &page)
            .unwrap();
        assert_eq!(record.name, "Acme & Co");
        assert_eq!(record.tagline, "Rockets, delivered");
        assert_eq!(record.description, "We \"ship\" rockets.\nFast.");
        assert_eq!(record.founders, vec!["Wile E. Coyote", "Road Runner"]);
        assert_eq!(record.location, "Mojave, CA");
        assert_eq!(record.founded_year, "2019");
        assert_eq!(record.team_size, "12");
        assert_eq!(record.label, "Summer 2019");
    }

    #[test]
    fn test_missing_fields_use_sentinel() {
        let page = company_page(&json!({
            "props": {
                "company": {
                    "name": "Sparse",
                    "one_liner": null,
                    "long_description": "   ",
                    "founders": [{"title": "CEO"}],
                    "team_size": null
                }
            }
        }));

        let record = parser().parse("W12", "https://x/companies/sparse", &page).unwrap();
        assert_eq!(record.name, "Sparse");
        assert_eq!(record.tagline, MISSING);
        assert_eq!(record.description, MISSING);
        assert_eq!(record.founders, vec![MISSING.to_string()]);
        assert_eq!(record.logo_url, MISSING);
        assert_eq!(record.location, MISSING);
        assert_eq!(record.founded_year, MISSING);
        assert_eq!(record.team_size, MISSING);

        for field in [
            &record.label,
            &record.link,
            &record.name,
            &record.tagline,
            &record.description,
            &record.logo_url,
            &record.location,
            &record.founded_year,
            &record.team_size,
        ] {
            assert!(!field.is_empty());
        }
        assert!(!record.founders_display().is_empty());
    }

    #[test]
    fn test_missing_container() {
        let err = parser()
            .parse("W12", "https://x", "<html><div id=\"app\"></div></html>")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MissingContainer));
    }

    #[test]
    fn test_missing_attribute() {
        let page = r#"<div id="ycdc_new/pages/Companies/ShowPage-react-component-9"></div>"#;
        let err = parser().parse("W12", "https://x", page).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingAttribute(attr) if attr == "data-page"));
    }

    #[test]
    fn test_malformed_json() {
        let page = r#"<div id="ycdc_new/pages/Companies/ShowPage-react-component-9" data-page="{not json"></div>"#;
        let err = parser().parse("W12", "https://x", page).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));
    }

    #[test]
    fn test_missing_company_path() {
        let page = company_page(&json!({"props": {"user": {}}}));
        let err = parser().parse("W12", "https://x", &page).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingCompany));

        let page = company_page(&json!({"props": {"company": null}}));
        let err = parser().parse("W12", "https://x", &page).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingCompany));
    }
}
