//! Table profile: which variable codes carry each axis, plus default selections

use serde::{Deserialize, Serialize};

/// Building types selected when a request names none
/// (block of flats one-room, two-room, three-room+, terraced house).
pub const DEFAULT_BUILDING_TYPES: &[&str] = &["1", "2", "3", "5"];

/// Metrics selected when a request names none
/// (mean price per square meter, number of sales).
pub const DEFAULT_METRICS: &[&str] = &["keskihinta_aritm_nw", "lkm_julk20"];

/// Binds the pipeline to one table family.
///
/// The default is the Statistics Finland housing-price table by postal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableProfile {
    pub year_code: String,
    pub postal_code_code: String,
    pub building_type_code: String,
    pub metric_code: String,
    pub default_building_types: Vec<String>,
    pub default_metrics: Vec<String>,
}

impl Default for TableProfile {
    fn default() -> Self {
        Self {
            year_code: "Vuosi".to_string(),
            postal_code_code: "Postinumero".to_string(),
            building_type_code: "Talotyyppi".to_string(),
            metric_code: "Tiedot".to_string(),
            default_building_types: to_owned(DEFAULT_BUILDING_TYPES),
            default_metrics: to_owned(DEFAULT_METRICS),
        }
    }
}

fn to_owned(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_codes() {
        let profile = TableProfile::default();
        assert_eq!(profile.year_code, "Vuosi");
        assert_eq!(profile.postal_code_code, "Postinumero");
        assert_eq!(profile.building_type_code, "Talotyyppi");
        assert_eq!(profile.metric_code, "Tiedot");
        assert_eq!(profile.default_building_types, ["1", "2", "3", "5"]);
        assert_eq!(profile.default_metrics.len(), 2);
    }

    #[test]
    fn partial_profile_keeps_defaults() {
        let profile: TableProfile =
            serde_json::from_str(r#"{"year_code": "Year", "default_metrics": ["m1"]}"#).unwrap();
        assert_eq!(profile.year_code, "Year");
        assert_eq!(profile.postal_code_code, "Postinumero");
        assert_eq!(profile.default_metrics, ["m1"]);
        assert_eq!(profile.default_building_types, ["1", "2", "3", "5"]);
    }
}
