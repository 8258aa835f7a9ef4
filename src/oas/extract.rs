#![deny(missing_docs)]

//! # Nested Schema Extraction
//!
//! Walks a resolved schema's properties and promotes inline object schemas
//! into named top-level types, so every object the mapper will reference by
//! name already exists in the table when mapping begins.

use crate::error::AppResult;
use crate::oas::document::SpecDocument;
use crate::oas::merge::merge_all_of;
use crate::oas::naming::derive_name;
use serde_json::Value;

/// A named type definition discovered during extraction or mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    /// Table name of the promoted type.
    pub name: String,
    /// Naming scope for this type's own children. This is the bare
    /// field-derived name, so grandchildren end up prefixed by their
    /// immediate parent only, never by the whole ancestor chain.
    pub scope: String,
    /// The promoted schema body.
    pub schema: Value,
}

/// Discovers inline object schemas under `schema`'s properties.
///
/// `scope` is the naming scope of the enclosing type (a declared schema's
/// own name at the top level). Array wrappers and `oneOf` branches are
/// traversed without contributing a naming level. Scalars, enums and `$ref`
/// properties produce no promotion.
pub fn extract_nested(
    schema: &Value,
    scope: &str,
    doc: &SpecDocument,
) -> AppResult<Vec<Promotion>> {
    let mut found = Vec::new();
    let Some(props) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(found);
    };

    for (field, node) in props {
        walk_property(node, scope, field, doc, &mut found)?;
    }
    Ok(found)
}

fn walk_property(
    node: &Value,
    scope: &str,
    field: &str,
    doc: &SpecDocument,
    found: &mut Vec<Promotion>,
) -> AppResult<()> {
    if node.get("$ref").is_some() {
        return Ok(());
    }

    let resolved = if node.get("allOf").is_some() {
        merge_all_of(node, doc)?
    } else {
        node.clone()
    };

    if is_inline_object(&resolved) {
        let name = derive_name(Some(scope), field);
        let child_scope = derive_name(None, field);
        found.push(Promotion {
            name,
            scope: child_scope.clone(),
            schema: resolved.clone(),
        });
        let grandchildren = extract_nested(&resolved, &child_scope, doc)?;
        found.extend(grandchildren);
        return Ok(());
    }

    if resolved.get("type").and_then(|t| t.as_str()) == Some("array") {
        if let Some(items) = resolved.get("items") {
            // The array wrapper contributes no name component.
            walk_property(items, scope, field, doc, found)?;
        }
        return Ok(());
    }

    if let Some(branches) = resolved.get("oneOf").and_then(|b| b.as_array()) {
        for branch in branches {
            walk_property(branch, scope, field, doc, found)?;
        }
    }

    Ok(())
}

fn is_inline_object(schema: &Value) -> bool {
    let has_props = schema
        .get("properties")
        .map_or(false, |p| p.is_object());
    let type_ok = matches!(
        schema.get("type").and_then(|t| t.as_str()),
        Some("object") | None
    );
    has_props && type_ok
}
