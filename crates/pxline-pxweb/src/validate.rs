//! Request validation against table metadata
//!
//! Codes the table does not declare are dropped, never substituted. Drops
//! are reported as counts; an empty result is a valid outcome.

use crate::model::{DatasetMetadata, QueryConfig};
use crate::profile::TableProfile;

/// Filtered request plus what was dropped per axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    /// Building types are always `Some` after validation
    pub config: QueryConfig,
    pub dropped_postal_codes: usize,
    pub dropped_years: usize,
    pub dropped_building_types: usize,
}

impl ValidatedConfig {
    /// Nothing left to query on the postal-code or year axis
    pub fn is_empty(&self) -> bool {
        self.config.postal_codes.is_empty() || self.config.years.is_empty()
    }
}

/// Keep requested codes the metadata declares for `code`, in request order.
///
/// An axis without a metadata variable passes through unfiltered.
fn retain_declared(metadata: &DatasetMetadata, code: &str, requested: &[String]) -> Vec<String> {
    match metadata.variable(code) {
        Some(var) => requested
            .iter()
            .filter(|c| var.contains(c))
            .cloned()
            .collect(),
        None => {
            log::debug!("No {code} variable in metadata, passing codes through");
            requested.to_vec()
        }
    }
}

/// Intersect postal codes, years and building types with the legal values
/// of their metadata variables. Metrics pass through untouched.
pub fn validate(
    metadata: &DatasetMetadata,
    config: &QueryConfig,
    profile: &TableProfile,
) -> ValidatedConfig {
    let postal_codes = retain_declared(metadata, &profile.postal_code_code, &config.postal_codes);
    let years = retain_declared(metadata, &profile.year_code, &config.years);

    let requested_types = config
        .building_types
        .as_deref()
        .unwrap_or(&profile.default_building_types);
    let building_types = retain_declared(metadata, &profile.building_type_code, requested_types);

    let validated = ValidatedConfig {
        dropped_postal_codes: config.postal_codes.len() - postal_codes.len(),
        dropped_years: config.years.len() - years.len(),
        dropped_building_types: requested_types.len() - building_types.len(),
        config: QueryConfig {
            postal_codes,
            years,
            building_types: Some(building_types),
            metrics: config.metrics.clone(),
        },
    };

    if validated.dropped_postal_codes > 0 {
        log::info!(
            "Filtered out {} postal codes not found in API",
            validated.dropped_postal_codes
        );
    }
    if validated.dropped_years > 0 {
        log::info!(
            "Filtered out {} years not found in API",
            validated.dropped_years
        );
    }
    if validated.dropped_building_types > 0 {
        log::info!(
            "Filtered out {} building types not found in API",
            validated.dropped_building_types
        );
    }

    validated
}
