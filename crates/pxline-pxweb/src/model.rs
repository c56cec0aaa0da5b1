//! PX-Web data shapes: table metadata, wire query, caller request, raw result
//!
//! Field names follow the PX-Web JSON exactly (`valueTexts`, `query`,
//! `response`, ...). Do not rename without checking the API.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// One dimension of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub text: String,
    /// Legal value codes, in API order
    #[serde(default)]
    pub values: Vec<String>,
    /// Display labels, parallel to `values`
    #[serde(default)]
    pub value_texts: Vec<String>,
    /// Variable may be left out of a query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elimination: Option<bool>,
    /// Variable is the time axis ("top" selections allowed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<bool>,
}

impl Variable {
    pub fn is_time(&self) -> bool {
        self.time == Some(true)
    }

    pub fn is_eliminable(&self) -> bool {
        self.elimination == Some(true)
    }

    /// Whether `code` is a legal value of this variable
    pub fn contains(&self, code: &str) -> bool {
        self.values.iter().any(|v| v == code)
    }

    /// Display label for a value code
    pub fn value_text(&self, code: &str) -> Option<&str> {
        let idx = self.values.iter().position(|v| v == code)?;
        self.value_texts.get(idx).map(String::as_str)
    }
}

fn unknown_title() -> String {
    "Unknown".to_string()
}

/// Table description returned by the metadata endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default = "unknown_title")]
    pub title: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DatasetMetadata {
    /// Look up a variable by code
    pub fn variable(&self, code: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.code == code)
    }

    /// First variable flagged as the time axis
    pub fn time_variable(&self) -> Option<&Variable> {
        self.variables.iter().find(|v| v.is_time())
    }

    /// Verify `values`/`valueTexts` are parallel and codes are unique.
    pub fn check(&self) -> Result<(), ExtractError> {
        let mut seen = HashSet::with_capacity(self.variables.len());
        for var in &self.variables {
            if var.values.len() != var.value_texts.len() {
                return Err(ExtractError::Metadata(format!(
                    "variable {:?} has {} values but {} value texts",
                    var.code,
                    var.values.len(),
                    var.value_texts.len()
                )));
            }
            if !seen.insert(var.code.as_str()) {
                return Err(ExtractError::Metadata(format!(
                    "duplicate variable code {:?}",
                    var.code
                )));
            }
        }
        Ok(())
    }
}

/// Selection mode for one variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Explicit list of value codes
    Item,
    /// Most recent N values of a time variable
    Top,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub filter: Filter,
    pub values: Vec<String>,
}

impl Selection {
    pub fn item(values: Vec<String>) -> Self {
        Self {
            filter: Filter::Item,
            values,
        }
    }

    /// `top` selection; the count travels as text.
    pub fn top(n: u32) -> Self {
        Self {
            filter: Filter::Top,
            values: vec![n.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSelection {
    pub code: String,
    pub selection: Selection,
}

impl VariableSelection {
    pub fn new(code: impl Into<String>, selection: Selection) -> Self {
        Self {
            code: code.into(),
            selection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    pub format: String,
}

/// Request body for the data endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PxWebQuery {
    pub query: Vec<VariableSelection>,
    pub response: ResponseFormat,
}

impl PxWebQuery {
    pub fn new(query: Vec<VariableSelection>, format: &str) -> Self {
        Self {
            query,
            response: ResponseFormat {
                format: format.to_string(),
            },
        }
    }

    /// Selection for a variable code, if present
    pub fn selection(&self, code: &str) -> Option<&Selection> {
        self.query
            .iter()
            .find(|s| s.code == code)
            .map(|s| &s.selection)
    }

    /// Number of cells requested for item selections (top counts as N).
    pub fn cell_count(&self) -> usize {
        self.query
            .iter()
            .map(|s| match s.selection.filter {
                Filter::Item => s.selection.values.len(),
                Filter::Top => s
                    .selection
                    .values
                    .first()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(1),
            })
            .product()
    }
}

/// Caller-facing selection request, not yet checked against metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    pub postal_codes: Vec<String>,
    pub years: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<String>>,
}

impl QueryConfig {
    pub fn new(postal_codes: Vec<String>, years: Vec<String>) -> Self {
        Self {
            postal_codes,
            years,
            building_types: None,
            metrics: None,
        }
    }

    pub fn with_building_types(mut self, building_types: Vec<String>) -> Self {
        self.building_types = Some(building_types);
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<String>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Unparsed response body of one successful query
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub format: String,
    pub data: String,
    pub metadata: Arc<DatasetMetadata>,
}

impl RawDataset {
    /// Body size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
