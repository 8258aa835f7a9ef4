#![deny(missing_docs)]

//! # Type Mapping
//!
//! Converts fully-resolved schema nodes into the canonical type-descriptor
//! algebra consumed by code emission. Shape classification happens once per
//! node and feeds a single dispatch, so the priority between `oneOf`,
//! objects, string formats and fallbacks lives in exactly one place.

use crate::error::AppResult;
use crate::oas::document::SpecDocument;
use crate::oas::extract::Promotion;
use crate::oas::merge::merge_all_of;
use crate::oas::naming::derive_name;
use crate::oas::resolver::ref_tail;
use serde::Serialize;
use serde_json::Value;

/// The scalar kinds of the target type algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// Plain text.
    String,
    /// Whole numbers.
    Integer,
    /// Fractional numbers (`type: number`).
    Decimal,
    /// True / false.
    Boolean,
    /// Calendar date (`format: date`).
    Date,
    /// Time of day (`format: time`).
    Time,
    /// Instant (`format: date-time`).
    DateTime,
}

/// Canonical descriptor of one mapped type. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeDescriptor {
    /// A scalar leaf.
    Scalar(ScalarKind),
    /// A named enumeration of string values.
    Enum {
        /// Synthetic name of the enum type.
        name: String,
        /// The allowed values, in declaration order.
        values: Vec<String>,
    },
    /// An array of a single element type.
    Array(Box<TypeDescriptor>),
    /// A union of variant types: first-seen order, duplicates removed by
    /// structural equality.
    Union(Vec<TypeDescriptor>),
    /// A reference to a named type in the graph.
    Reference(String),
}

/// Structural classification of a schema node, computed once per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SchemaShape {
    /// A `$ref` pointer.
    Ref,
    /// An `allOf` composition (merged before dispatch).
    AllOf,
    /// A `oneOf` union.
    OneOf,
    /// An object carrying `properties`.
    Object,
    /// An array carrying `items`.
    Array,
    /// A string schema carrying an `enum` list.
    EnumString,
    /// A plain scalar `type`.
    Scalar,
    /// Anything else; maps to the string-scalar fallback.
    Unrecognized,
}

/// Classifies a schema node by shape.
pub(crate) fn classify(schema: &Value) -> SchemaShape {
    let Some(obj) = schema.as_object() else {
        return SchemaShape::Unrecognized;
    };
    if obj.contains_key("$ref") {
        return SchemaShape::Ref;
    }
    if obj.contains_key("allOf") {
        return SchemaShape::AllOf;
    }
    if obj.contains_key("oneOf") {
        return SchemaShape::OneOf;
    }

    let type_name = obj.get("type").and_then(|t| t.as_str());
    if obj.contains_key("properties") && matches!(type_name, Some("object") | None) {
        return SchemaShape::Object;
    }
    match type_name {
        Some("string") if obj.contains_key("enum") => SchemaShape::EnumString,
        Some("array") if obj.contains_key("items") => SchemaShape::Array,
        Some("string") | Some("integer") | Some("number") | Some("boolean") => SchemaShape::Scalar,
        _ => SchemaShape::Unrecognized,
    }
}

/// Maps one schema node to a type descriptor.
///
/// `scope` is the naming scope of the enclosing type and `field` the property
/// name being mapped; together they seed the naming policy for any synthetic
/// types this node introduces. Newly required named definitions (enum bodies,
/// promoted object bodies) are returned for the caller to register; nothing
/// is registered through shared state.
pub fn map_type(
    schema: &Value,
    scope: Option<&str>,
    field: &str,
    doc: &SpecDocument,
) -> AppResult<(TypeDescriptor, Vec<Promotion>)> {
    let mut defs = Vec::new();
    let descriptor = map_node(schema, scope, field, doc, &mut defs)?;
    Ok((descriptor, defs))
}

fn map_node(
    schema: &Value,
    scope: Option<&str>,
    field: &str,
    doc: &SpecDocument,
    defs: &mut Vec<Promotion>,
) -> AppResult<TypeDescriptor> {
    match classify(schema) {
        SchemaShape::Ref => {
            let reference = schema
                .get("$ref")
                .and_then(|r| r.as_str())
                .unwrap_or_default();
            Ok(TypeDescriptor::Reference(ref_tail(reference).to_string()))
        }
        SchemaShape::AllOf => {
            let merged = merge_all_of(schema, doc)?;
            map_node(&merged, scope, field, doc, defs)
        }
        SchemaShape::OneOf => {
            let mut variants: Vec<TypeDescriptor> = Vec::new();
            if let Some(branches) = schema.get("oneOf").and_then(|b| b.as_array()) {
                for branch in branches {
                    let mapped = map_node(branch, scope, field, doc, defs)?;
                    if !variants.contains(&mapped) {
                        variants.push(mapped);
                    }
                }
            }
            Ok(TypeDescriptor::Union(variants))
        }
        SchemaShape::Object => {
            let name = derive_name(scope, field);
            defs.push(Promotion {
                name: name.clone(),
                scope: derive_name(None, field),
                schema: schema.clone(),
            });
            Ok(TypeDescriptor::Reference(name))
        }
        SchemaShape::EnumString => {
            let name = derive_name(scope, field);
            let values = enum_values(schema);
            defs.push(Promotion {
                name: name.clone(),
                scope: derive_name(None, field),
                schema: schema.clone(),
            });
            Ok(TypeDescriptor::Enum { name, values })
        }
        SchemaShape::Array => {
            let element = match schema.get("items") {
                Some(items) => map_node(items, scope, field, doc, defs)?,
                None => TypeDescriptor::Scalar(ScalarKind::String),
            };
            Ok(TypeDescriptor::Array(Box::new(element)))
        }
        SchemaShape::Scalar => Ok(TypeDescriptor::Scalar(scalar_kind(schema))),
        SchemaShape::Unrecognized => Ok(TypeDescriptor::Scalar(ScalarKind::String)),
    }
}

fn scalar_kind(schema: &Value) -> ScalarKind {
    let type_name = schema
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or_default();
    let format = schema.get("format").and_then(|f| f.as_str());

    match type_name {
        "string" => match format {
            Some("date-time") => ScalarKind::DateTime,
            Some("date") => ScalarKind::Date,
            Some("time") => ScalarKind::Time,
            _ => ScalarKind::String,
        },
        "integer" => ScalarKind::Integer,
        "number" => ScalarKind::Decimal,
        "boolean" => ScalarKind::Boolean,
        _ => ScalarKind::String,
    }
}

/// Extracts the `enum` value list as strings.
pub(crate) fn enum_values(schema: &Value) -> Vec<String> {
    schema
        .get("enum")
        .and_then(|e| e.as_array())
        .map(|items| {
            items
                .iter()
                .map(|v| match v.as_str() {
                    Some(s) => s.to_string(),
                    None => v.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
