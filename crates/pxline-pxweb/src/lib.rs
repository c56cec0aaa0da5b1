//! pxline PX-Web - extraction pipeline for PX-Web statistical tables
//!
//! Turns a caller's selection (postal codes, years, building types,
//! metrics) into API-legal, size-bounded queries and runs them one batch at
//! a time, keeping whatever succeeds.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pxline_pxweb::{Extractor, MetadataProvider, PxWebSource, QueryConfig, regions};
//!
//! let source = PxWebSource::default();
//! let metadata = Arc::new(source.fetch_metadata()?);
//! let config = QueryConfig::new(regions::capital_region_postal_codes(), regions::default_years());
//!
//! let report = Extractor::new().extract_batched(&metadata, &source.api_url(), &config, 30, "json-stat2")?;
//! println!("{}/{} batches", report.succeeded(), report.planned());
//! ```

pub mod batch;
pub mod error;
pub mod extract;
pub mod model;
pub mod profile;
pub mod query;
pub mod regions;
pub mod source;
pub mod validate;

// Re-exports
pub use batch::{DEFAULT_BATCH_SIZE, chunk};
pub use error::ExtractError;
pub use extract::{
    BatchOutcome, BatchReport, DEFAULT_DELAY, DEFAULT_FORMAT, Extractor, HttpTransport, Transport,
};
pub use model::{
    DatasetMetadata, Filter, PxWebQuery, QueryConfig, RawDataset, ResponseFormat, Selection,
    Variable, VariableSelection,
};
pub use profile::TableProfile;
pub use query::{build_default, build_from_config, build_latest};
pub use source::{DEFAULT_DATASET_URL, MetadataProvider, PxWebSource, parse_metadata, to_api_url};
pub use validate::{ValidatedConfig, validate};
