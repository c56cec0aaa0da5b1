//! Metadata providers
//!
//! A PX-Web table answers GET with its metadata and POST with data, both on
//! the same API URL.

use crate::error::ExtractError;
use crate::model::DatasetMetadata;

/// Statistics Finland housing prices by postal code, yearly
pub const DEFAULT_DATASET_URL: &str =
    "https://pxdata.stat.fi/PXWeb/api/v1/en/StatFin/statfin_ashi_pxt_13mu.px";

/// Source of table metadata plus the endpoint to query for data
pub trait MetadataProvider {
    /// Fetch and parse the metadata document
    fn fetch_metadata(&self) -> Result<DatasetMetadata, ExtractError>;

    /// Data endpoint for queries against this table
    fn api_url(&self) -> String;
}

/// PX-Web table addressed by its UI or API URL
#[derive(Debug, Clone)]
pub struct PxWebSource {
    dataset_url: String,
}

impl PxWebSource {
    pub fn new(dataset_url: impl Into<String>) -> Self {
        Self {
            dataset_url: dataset_url.into(),
        }
    }

    /// URL as given by the caller
    pub fn dataset_url(&self) -> &str {
        &self.dataset_url
    }
}

impl Default for PxWebSource {
    fn default() -> Self {
        Self::new(DEFAULT_DATASET_URL)
    }
}

impl MetadataProvider for PxWebSource {
    fn fetch_metadata(&self) -> Result<DatasetMetadata, ExtractError> {
        let url = self.api_url();
        log::info!("Fetching metadata from {url}");
        let body = pxline_core::get_json(&url)?;
        let metadata = parse_metadata(&body)?;
        log::info!(
            "{}: {} variables",
            metadata.title,
            metadata.variables.len()
        );
        Ok(metadata)
    }

    fn api_url(&self) -> String {
        to_api_url(&self.dataset_url)
    }
}

/// Convert a PX-Web UI URL to its API URL.
///
/// `.../PXWeb/pxweb/fi/StatFin/.../table.px/` becomes
/// `.../PXWeb/api/v1/fi/StatFin/.../table.px`. API URLs pass through
/// minus any trailing slash.
pub fn to_api_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if url.contains("/api/v1/") {
        return url.to_string();
    }
    url.replace("/PXWeb/pxweb/", "/PXWeb/api/v1/")
}

/// Parse a metadata document, tolerating unknown and missing fields, then
/// check its shape.
pub fn parse_metadata(json: &str) -> Result<DatasetMetadata, ExtractError> {
    let metadata: DatasetMetadata = serde_json::from_str(json)
        .map_err(|e| ExtractError::Metadata(format!("invalid JSON: {e}")))?;
    metadata.check()?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_url_converted() {
        assert_eq!(
            to_api_url("https://pxdata.stat.fi/PXWeb/pxweb/fi/StatFin/statfin_ashi_pxt_13mu.px/"),
            "https://pxdata.stat.fi/PXWeb/api/v1/fi/StatFin/statfin_ashi_pxt_13mu.px"
        );
    }

    #[test]
    fn api_url_passthrough() {
        assert_eq!(to_api_url(DEFAULT_DATASET_URL), DEFAULT_DATASET_URL);
        assert_eq!(
            to_api_url(&format!("{DEFAULT_DATASET_URL}/")),
            DEFAULT_DATASET_URL
        );
    }

    #[test]
    fn unrelated_url_only_trimmed() {
        assert_eq!(
            to_api_url("https://example.com/tables/t1/"),
            "https://example.com/tables/t1"
        );
    }

    #[test]
    fn source_api_url_uses_conversion() {
        let source = PxWebSource::new("https://pxdata.stat.fi/PXWeb/pxweb/en/StatFin/t.px");
        assert_eq!(
            source.api_url(),
            "https://pxdata.stat.fi/PXWeb/api/v1/en/StatFin/t.px"
        );
        assert_eq!(PxWebSource::default().api_url(), DEFAULT_DATASET_URL);
    }

    #[test]
    fn parse_lenient_document() {
        let json = r#"{
            "title": "Prices",
            "somethingNew": 42,
            "variables": [
                {"code": "Vuosi", "text": "Year", "values": ["2024"], "valueTexts": ["2024"],
                 "time": true, "map": "ignored"},
                {"values": [], "valueTexts": []}
            ]
        }"#;
        let meta = parse_metadata(json).unwrap();
        assert_eq!(meta.title, "Prices");
        assert_eq!(meta.variables.len(), 2);
        assert!(meta.variables[0].is_time());
        assert_eq!(meta.variables[1].code, "");
        assert_eq!(meta.variables[1].text, "");
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_metadata("<html>not json</html>").unwrap_err();
        assert!(matches!(err, ExtractError::Metadata(_)));
    }

    #[test]
    fn parse_rejects_inconsistent_variable() {
        let json = r#"{"title": "t", "variables": [
            {"code": "Vuosi", "text": "Year", "values": ["2023", "2024"], "valueTexts": ["2023"]}
        ]}"#;
        assert!(parse_metadata(json).is_err());
    }
}
