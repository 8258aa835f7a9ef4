#![deny(missing_docs)]

//! # Spec Document Loading
//!
//! Owns the decoded OpenAPI document and the boundary checks that must pass
//! before the engine runs: the 3.x version gate and the rejection of
//! non-local `$ref` targets. The document is read-only for the whole run.

use crate::error::{AppError, AppResult};
use crate::oas::resolver::{parse_reference, ReferenceKind};
use serde_json::{Map, Value};

/// The decoded OpenAPI 3.x document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    root: Value,
}

impl SpecDocument {
    /// Wraps an already-decoded document after running the boundary checks.
    pub fn from_value(root: Value) -> AppResult<Self> {
        validate_version(&root)?;
        reject_external_refs(&root)?;
        Ok(Self { root })
    }

    /// Parses and validates a YAML spec document.
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        let root: Value = serde_yaml::from_str(yaml)
            .map_err(|e| AppError::General(format!("Failed to parse OpenAPI YAML: {}", e)))?;
        Self::from_value(root)
    }

    /// Parses and validates a JSON spec document.
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let root: Value = serde_json::from_str(json)
            .map_err(|e| AppError::General(format!("Failed to parse OpenAPI JSON: {}", e)))?;
        Self::from_value(root)
    }

    /// The document root.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The `components.schemas` map.
    pub fn schemas(&self) -> AppResult<&Map<String, Value>> {
        self.root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
            .ok_or_else(|| {
                AppError::General("No components.schemas found in OpenAPI spec".into())
            })
    }
}

/// Validates that the document declares an OpenAPI 3.x version.
pub fn validate_version(root: &Value) -> AppResult<()> {
    match root.get("openapi").and_then(|v| v.as_str()) {
        Some(version) if version.starts_with("3.") => Ok(()),
        _ => Err(AppError::Unsupported("only OpenAPI 3.x supported".into())),
    }
}

/// Scans the document for `$ref` values pointing outside it.
///
/// External references (other files, URLs) are rejected up front so the
/// resolver only ever sees same-document fragments mid-run.
fn reject_external_refs(value: &Value) -> AppResult<()> {
    match value {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(|r| r.as_str()) {
                if parse_reference(reference).kind != ReferenceKind::Local {
                    return Err(AppError::Unsupported(format!(
                        "external $ref '{}' is not supported",
                        reference
                    )));
                }
            }
            for nested in map.values() {
                reject_external_refs(nested)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for nested in items {
                reject_external_refs(nested)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
