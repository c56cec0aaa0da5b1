//! Query builders: selections in, wire query out
//!
//! None of these check codes against the server; unknown codes surface as
//! a rejected request. Run requests through [`crate::validate`] first.

use crate::error::ExtractError;
use crate::model::{DatasetMetadata, PxWebQuery, QueryConfig, Selection, VariableSelection};
use crate::profile::TableProfile;

fn select_all(metadata: &DatasetMetadata) -> impl Iterator<Item = VariableSelection> + '_ {
    metadata
        .variables
        .iter()
        .map(|v| VariableSelection::new(&v.code, Selection::item(v.values.clone())))
}

/// Every variable, every value.
///
/// Unbounded: on large tables this can exceed the server's cell limit.
pub fn build_default(metadata: &DatasetMetadata, format: &str) -> PxWebQuery {
    PxWebQuery::new(select_all(metadata).collect(), format)
}

/// Four item selections (year, postal code, building type, metric) from a
/// request; absent building types / metrics fall back to the profile defaults.
pub fn build_from_config(config: &QueryConfig, format: &str, profile: &TableProfile) -> PxWebQuery {
    let building_types = config
        .building_types
        .clone()
        .unwrap_or_else(|| profile.default_building_types.clone());
    let metrics = config
        .metrics
        .clone()
        .unwrap_or_else(|| profile.default_metrics.clone());

    PxWebQuery::new(
        vec![
            VariableSelection::new(&profile.year_code, Selection::item(config.years.clone())),
            VariableSelection::new(
                &profile.postal_code_code,
                Selection::item(config.postal_codes.clone()),
            ),
            VariableSelection::new(&profile.building_type_code, Selection::item(building_types)),
            VariableSelection::new(&profile.metric_code, Selection::item(metrics)),
        ],
        format,
    )
}

/// Latest `top_n` values on time variables, all values elsewhere.
pub fn build_latest(
    metadata: &DatasetMetadata,
    top_n: u32,
    format: &str,
) -> Result<PxWebQuery, ExtractError> {
    if top_n == 0 {
        return Err(ExtractError::InvalidTopN(top_n));
    }
    let query = metadata
        .variables
        .iter()
        .map(|var| {
            let selection = if var.is_time() {
                Selection::top(top_n)
            } else {
                Selection::item(var.values.clone())
            };
            VariableSelection::new(&var.code, selection)
        })
        .collect();
    Ok(PxWebQuery::new(query, format))
}
