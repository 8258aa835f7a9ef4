#![deny(missing_docs)]

//! # Composition Merging
//!
//! Flattens `allOf` composition into single schemas. The fold starts from the
//! parent schema (minus its `allOf` key) and deep-merges each branch into it,
//! left to right. The merge policy is last-writer-wins for every key except
//! `properties` (union-merged, recursing into overlapping object values) and
//! `required` (set-unioned).
//!
//! Dangling `$ref` branches resolve to the empty schema and merging
//! continues; a dangling reference never aborts the run.

use crate::error::{AppError, AppResult};
use crate::oas::document::SpecDocument;
use crate::oas::resolver::{self, ref_tail};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Upper bound on repeated `allOf` expansion of a single schema node.
const MAX_MERGE_PASSES: usize = 32;

/// Resolves and flattens all `allOf` composition reachable from `schema`.
///
/// The result carries no `allOf` at its own top level. `allOf` nodes nested
/// inside `properties` values, array `items` and `oneOf` branches are merged
/// in the same pass; bare `$ref` property values are left intact for the
/// mapper to turn into named references.
pub fn merge_all_of(schema: &Value, doc: &SpecDocument) -> AppResult<Value> {
    let mut visited = HashSet::new();
    merge_node(schema, doc, &mut visited)
}

/// Merges one schema node, expanding `allOf` until a fixed point.
///
/// `visited` holds the `$ref` tails expanded in the current chain; revisiting
/// one means the composition is circular, which is unsupported input.
fn merge_node(
    schema: &Value,
    doc: &SpecDocument,
    visited: &mut HashSet<String>,
) -> AppResult<Value> {
    let Some(obj) = schema.as_object() else {
        return Ok(schema.clone());
    };

    let mut current = Value::Object(obj.clone());
    let mut passes = 0;

    while current.get("allOf").is_some() {
        if passes >= MAX_MERGE_PASSES {
            return Err(AppError::Unsupported(
                "allOf composition did not reach a fixed point".into(),
            ));
        }
        passes += 1;
        current = merge_one_level(&current, doc, visited)?;
    }

    descend_into_children(&mut current, doc, visited)?;
    Ok(current)
}

/// Folds the branches of a single `allOf` into the parent schema.
fn merge_one_level(
    schema: &Value,
    doc: &SpecDocument,
    visited: &mut HashSet<String>,
) -> AppResult<Value> {
    let Some(obj) = schema.as_object() else {
        return Ok(schema.clone());
    };

    let mut parent = obj.clone();
    let Some(branches) = parent.remove("allOf") else {
        return Ok(Value::Object(parent));
    };

    // The parent schema is the initial accumulator.
    let mut acc = Value::Object(parent);
    let Value::Array(branches) = branches else {
        return Ok(acc);
    };

    for branch in &branches {
        let Some(resolved) = resolve_branch(branch, doc, visited)? else {
            continue;
        };
        if resolved.as_object().map_or(true, |m| m.is_empty()) {
            // Empty results (including dangling refs) are dropped.
            continue;
        }
        acc = deep_merge(&acc, &resolved);
    }

    Ok(acc)
}

/// Resolves one `allOf` branch: `$ref` through the resolver, nested `allOf`
/// recursively, plain schemas as-is.
fn resolve_branch(
    branch: &Value,
    doc: &SpecDocument,
    visited: &mut HashSet<String>,
) -> AppResult<Option<Value>> {
    if let Some(reference) = branch.get("$ref").and_then(|r| r.as_str()) {
        let target = ref_tail(reference).to_string();
        if !visited.insert(target.clone()) {
            return Err(AppError::Unsupported(format!(
                "circular $ref composition through '{}'",
                reference
            )));
        }
        let resolved = match resolver::resolve(doc, reference)? {
            Some(node) => merge_node(node, doc, visited)?,
            // Dangling reference: substitute an empty schema and continue.
            None => Value::Object(Map::new()),
        };
        visited.remove(&target);
        return Ok(Some(resolved));
    }

    if branch.get("allOf").is_some() {
        return Ok(Some(merge_node(branch, doc, visited)?));
    }

    Ok(Some(branch.clone()))
}

/// Merges composition found inside `properties`, `items` and `oneOf`.
fn descend_into_children(
    schema: &mut Value,
    doc: &SpecDocument,
    visited: &mut HashSet<String>,
) -> AppResult<()> {
    let Some(obj) = schema.as_object_mut() else {
        return Ok(());
    };

    if let Some(props) = obj.get_mut("properties").and_then(|p| p.as_object_mut()) {
        for value in props.values_mut() {
            merge_child_in_place(value, doc, visited)?;
        }
    }
    if let Some(items) = obj.get_mut("items") {
        merge_child_in_place(items, doc, visited)?;
    }
    if let Some(branches) = obj.get_mut("oneOf").and_then(|b| b.as_array_mut()) {
        for branch in branches.iter_mut() {
            merge_child_in_place(branch, doc, visited)?;
        }
    }
    Ok(())
}

/// Merges a child node in place when it contains composition. `$ref`-only
/// children stay untouched: the mapper consumes them as named references.
fn merge_child_in_place(
    child: &mut Value,
    doc: &SpecDocument,
    visited: &mut HashSet<String>,
) -> AppResult<()> {
    if child.get("$ref").is_some() {
        return Ok(());
    }
    if child.get("allOf").is_some() {
        *child = merge_node(child, doc, visited)?;
        return Ok(());
    }
    descend_into_children(child, doc, visited)
}

/// Deep-merges `incoming` into `base` per the composition policy.
///
/// `properties` merge as maps (recursing when both sides hold maps for the
/// same name), `required` accumulates as a set, and any other key, `type`
/// included, is taken from `incoming`.
pub fn deep_merge(base: &Value, incoming: &Value) -> Value {
    let (Some(base_map), Some(in_map)) = (base.as_object(), incoming.as_object()) else {
        return incoming.clone();
    };

    let mut out = base_map.clone();
    for (key, in_val) in in_map {
        match key.as_str() {
            "properties" => {
                out.insert(key.clone(), merge_properties(base_map.get("properties"), in_val));
            }
            "required" => {
                out.insert(key.clone(), union_required(base_map.get("required"), in_val));
            }
            _ => {
                out.insert(key.clone(), in_val.clone());
            }
        }
    }
    Value::Object(out)
}

fn merge_properties(base: Option<&Value>, incoming: &Value) -> Value {
    let Some(base_map) = base.and_then(|b| b.as_object()) else {
        return incoming.clone();
    };
    let Some(in_map) = incoming.as_object() else {
        return incoming.clone();
    };

    let mut out = base_map.clone();
    for (name, in_val) in in_map {
        match out.get(name) {
            Some(existing) if existing.is_object() && in_val.is_object() => {
                let merged = deep_merge(existing, in_val);
                out.insert(name.clone(), merged);
            }
            _ => {
                out.insert(name.clone(), in_val.clone());
            }
        }
    }
    Value::Object(out)
}

fn union_required(base: Option<&Value>, incoming: &Value) -> Value {
    let mut seen: Vec<Value> = Vec::new();
    for source in [base, Some(incoming)].into_iter().flatten() {
        if let Some(items) = source.as_array() {
            for item in items {
                if !seen.contains(item) {
                    seen.push(item.clone());
                }
            }
        }
    }
    Value::Array(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashSet as StdHashSet;

    fn doc(schemas: Value) -> SpecDocument {
        SpecDocument::from_value(json!({
            "openapi": "3.1.0",
            "components": { "schemas": schemas }
        }))
        .unwrap()
    }

    fn required_set(schema: &Value) -> StdHashSet<String> {
        schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_merge_disjoint_properties_union() {
        let doc = doc(json!({
            "Base": { "type": "object", "properties": { "id": { "type": "string" } } },
            "Extra": { "type": "object", "properties": { "note": { "type": "string" } } }
        }));
        let schema = json!({
            "allOf": [
                { "$ref": "#/components/schemas/Base" },
                { "$ref": "#/components/schemas/Extra" }
            ]
        });

        let merged = merge_all_of(&schema, &doc).unwrap();
        let props = merged.get("properties").unwrap().as_object().unwrap();
        assert!(props.contains_key("id"));
        assert!(props.contains_key("note"));
        assert!(merged.get("allOf").is_none());
    }

    #[test]
    fn test_merge_overlapping_object_property_recurses() {
        let doc = doc(json!({}));
        let schema = json!({
            "allOf": [
                { "type": "object", "properties": { "meta": { "type": "object", "properties": { "a": { "type": "string" } } } } },
                { "type": "object", "properties": { "meta": { "type": "object", "properties": { "b": { "type": "integer" } } } } }
            ]
        });

        let merged = merge_all_of(&schema, &doc).unwrap();
        let meta = merged
            .get("properties")
            .and_then(|p| p.get("meta"))
            .and_then(|m| m.get("properties"))
            .and_then(|p| p.as_object())
            .unwrap();
        assert!(meta.contains_key("a"));
        assert!(meta.contains_key("b"));
    }

    #[test]
    fn test_merge_required_union_regardless_of_grouping() {
        let doc = doc(json!({}));
        let a = json!({ "type": "object", "required": ["x"] });
        let b = json!({ "type": "object", "required": ["y", "x"] });
        let c = json!({ "type": "object", "required": ["z"] });

        let flat = json!({ "allOf": [a, b, c] });
        let grouped = json!({ "allOf": [
            { "allOf": [
                { "type": "object", "required": ["x"] },
                { "type": "object", "required": ["y", "x"] }
            ] },
            { "type": "object", "required": ["z"] }
        ] });

        let flat_merged = merge_all_of(&flat, &doc).unwrap();
        let grouped_merged = merge_all_of(&grouped, &doc).unwrap();

        let expected: StdHashSet<String> =
            ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(required_set(&flat_merged), expected);
        assert_eq!(required_set(&grouped_merged), expected);
    }

    #[test]
    fn test_merge_type_last_writer_wins() {
        let doc = doc(json!({}));
        let schema = json!({
            "type": "object",
            "allOf": [ { "type": "string" } ]
        });
        let merged = merge_all_of(&schema, &doc).unwrap();
        assert_eq!(merged.get("type").and_then(|t| t.as_str()), Some("string"));
    }

    #[test]
    fn test_merge_dangling_ref_proceeds_with_empty_schema() {
        let doc = doc(json!({
            "Known": { "type": "object", "properties": { "id": { "type": "string" } } }
        }));
        let schema = json!({
            "allOf": [
                { "$ref": "#/components/schemas/Missing" },
                { "$ref": "#/components/schemas/Known" }
            ]
        });

        let merged = merge_all_of(&schema, &doc).unwrap();
        let props = merged.get("properties").unwrap().as_object().unwrap();
        assert!(props.contains_key("id"));
    }

    #[test]
    fn test_merge_nested_all_of_in_property() {
        let doc = doc(json!({
            "Base": { "type": "object", "properties": { "id": { "type": "string" } } }
        }));
        let schema = json!({
            "type": "object",
            "properties": {
                "detail": { "allOf": [ { "$ref": "#/components/schemas/Base" } ] }
            }
        });

        let merged = merge_all_of(&schema, &doc).unwrap();
        let detail = merged.get("properties").and_then(|p| p.get("detail")).unwrap();
        assert!(detail.get("allOf").is_none());
        assert!(detail
            .get("properties")
            .and_then(|p| p.get("id"))
            .is_some());
    }

    #[test]
    fn test_merge_leaves_bare_ref_property_alone() {
        let doc = doc(json!({
            "Other": { "type": "object", "properties": {} }
        }));
        let schema = json!({
            "type": "object",
            "properties": {
                "other": { "$ref": "#/components/schemas/Other" }
            }
        });

        let merged = merge_all_of(&schema, &doc).unwrap();
        let other = merged.get("properties").and_then(|p| p.get("other")).unwrap();
        assert_eq!(
            other.get("$ref").and_then(|r| r.as_str()),
            Some("#/components/schemas/Other")
        );
    }

    #[test]
    fn test_merge_circular_composition_rejected() {
        let doc = doc(json!({
            "A": { "allOf": [ { "$ref": "#/components/schemas/B" } ] },
            "B": { "allOf": [ { "$ref": "#/components/schemas/A" } ] }
        }));
        let schema = json!({ "allOf": [ { "$ref": "#/components/schemas/A" } ] });
        let err = merge_all_of(&schema, &doc).unwrap_err();
        assert!(matches!(err, AppError::Unsupported(_)));
    }
}
