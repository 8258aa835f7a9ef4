#![deny(missing_docs)]

//! # Type Graph Construction
//!
//! The full resolution pipeline. Every declared schema is dereferenced and
//! `allOf`-merged into the named type table; extraction then promotes every
//! reachable inline schema so all names exist before mapping; finally mapping
//! converts each table entry into an emission-ready type entry. Re-running
//! over the same document is deterministic and idempotent.

use crate::error::{AppError, AppResult};
use crate::oas::document::SpecDocument;
use crate::oas::extract::{extract_nested, Promotion};
use crate::oas::mapper::{classify, enum_values, map_type, SchemaShape, TypeDescriptor};
use crate::oas::merge::merge_all_of;
use crate::oas::resolver;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One attribute of a resource type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Property name as declared in the schema.
    pub name: String,
    /// Mapped type of the property.
    pub descriptor: TypeDescriptor,
    /// Whether the property appears in the schema's `required` set.
    pub required: bool,
    /// Schema `description`, when present.
    pub description: Option<String>,
}

/// The emission-ready classification of a named type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResolvedType {
    /// An object type with named attributes.
    Resource {
        /// The mapped attributes, in property order.
        attributes: Vec<Attribute>,
    },
    /// A closed set of string values.
    Enum {
        /// The allowed values, in declaration order.
        values: Vec<String>,
    },
    /// A declared scalar / array / union type with no body of its own.
    Alias(TypeDescriptor),
}

/// One entry of the output graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeEntry {
    /// The resolved schema body backing this type.
    pub schema: Value,
    /// The mapped type.
    pub ty: ResolvedType,
}

/// The engine's output catalog of all types to be emitted, keyed by declared
/// or synthetic name. Declared schemas come first, discoveries after, in a
/// stable order.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct TypeGraph {
    /// All named types.
    pub types: IndexMap<String, TypeEntry>,
}

/// A table entry awaiting mapping: the resolved schema body plus the naming
/// scope used when deriving its children's names.
#[derive(Debug, Clone)]
struct PendingType {
    schema: Value,
    scope: String,
}

/// Builds the full type graph for a validated spec document.
pub fn build_type_graph(doc: &SpecDocument) -> AppResult<TypeGraph> {
    let mut table: IndexMap<String, PendingType> = IndexMap::new();

    // 1. Declared schemas, dereferenced and allOf-merged.
    for (name, node) in doc.schemas()? {
        let resolved = resolve_declared(node, doc)?;
        register(
            &mut table,
            Promotion {
                name: name.clone(),
                scope: name.clone(),
                schema: resolved,
            },
        )?;
    }

    // 2. Promote every reachable inline schema so all names exist before
    // mapping begins. Extraction already recurses through grandchildren, so
    // only declared entries need walking.
    let declared_count = table.len();
    for idx in 0..declared_count {
        let Some((_, pending)) = table.get_index(idx) else {
            break;
        };
        let pending = pending.clone();
        for promotion in extract_nested(&pending.schema, &pending.scope, doc)? {
            register(&mut table, promotion)?;
        }
    }

    // 3. Map every table entry. Mapping side effects (enum bodies, object
    // bodies reached only through aliases) append to the table and are
    // processed in the same loop.
    let mut graph = TypeGraph::default();
    let mut idx = 0;
    while idx < table.len() {
        let Some((name, pending)) = table.get_index(idx) else {
            break;
        };
        let name = name.clone();
        let pending = pending.clone();

        let (ty, defs) = map_entry(&pending, doc)?;
        for def in defs {
            register(&mut table, def)?;
        }
        graph.types.insert(name, TypeEntry { schema: pending.schema, ty });
        idx += 1;
    }

    Ok(graph)
}

/// Dereferences a declared schema (chained `$ref`s included) and merges its
/// composition. A dangling declaration resolves to the empty schema.
fn resolve_declared(node: &Value, doc: &SpecDocument) -> AppResult<Value> {
    let mut current = node.clone();
    let mut visited: HashSet<String> = HashSet::new();

    while let Some(reference) = current
        .get("$ref")
        .and_then(|r| r.as_str())
        .map(str::to_string)
    {
        if !visited.insert(reference.clone()) {
            return Err(AppError::Unsupported(format!(
                "circular $ref chain through '{}'",
                reference
            )));
        }
        current = match resolver::resolve(doc, &reference)? {
            Some(target) => target.clone(),
            None => Value::Object(Map::new()),
        };
    }

    merge_all_of(&current, doc)
}

/// Converts one table entry into its emission-ready type.
fn map_entry(
    pending: &PendingType,
    doc: &SpecDocument,
) -> AppResult<(ResolvedType, Vec<Promotion>)> {
    match classify(&pending.schema) {
        SchemaShape::Object => {
            let mut attributes = Vec::new();
            let mut defs = Vec::new();
            let required = required_names(&pending.schema);

            if let Some(props) = pending.schema.get("properties").and_then(|p| p.as_object()) {
                for (prop, node) in props {
                    let (descriptor, mut promoted) =
                        map_type(node, Some(&pending.scope), prop, doc)?;
                    defs.append(&mut promoted);
                    attributes.push(Attribute {
                        name: prop.clone(),
                        descriptor,
                        required: required.contains(prop.as_str()),
                        description: node
                            .get("description")
                            .and_then(|d| d.as_str())
                            .map(str::to_string),
                    });
                }
            }

            Ok((ResolvedType::Resource { attributes }, defs))
        }
        SchemaShape::EnumString => Ok((
            ResolvedType::Enum {
                values: enum_values(&pending.schema),
            },
            Vec::new(),
        )),
        _ => {
            // Declared scalars, arrays and unions keep their declared name
            // and alias the mapped descriptor. The entry's scope seeds
            // naming for any synthetic types the body introduces.
            let (descriptor, defs) = map_type(&pending.schema, None, &pending.scope, doc)?;
            Ok((ResolvedType::Alias(descriptor), defs))
        }
    }
}

fn required_names(schema: &Value) -> HashSet<&str> {
    schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default()
}

/// Registers a named type, enforcing name uniqueness.
///
/// Structurally identical re-registrations are accepted (extraction and
/// mapper side effects legitimately meet on the same definition); two
/// different bodies under one name is a naming-policy collision and is
/// reported, never silently overwritten.
fn register(table: &mut IndexMap<String, PendingType>, def: Promotion) -> AppResult<()> {
    if let Some(existing) = table.get(&def.name) {
        if existing.schema == def.schema {
            return Ok(());
        }
        return Err(AppError::Collision(format!(
            "type name '{}' derived for two different schemas",
            def.name
        )));
    }

    table.insert(
        def.name,
        PendingType {
            schema: def.schema,
            scope: def.scope,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::mapper::ScalarKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(schemas: Value) -> SpecDocument {
        SpecDocument::from_value(json!({
            "openapi": "3.0.3",
            "components": { "schemas": schemas }
        }))
        .unwrap()
    }

    #[test]
    fn test_declared_lone_ref_dereferenced() {
        let doc = doc(json!({
            "User": { "type": "object", "properties": { "id": { "type": "string" } } },
            "Account": { "$ref": "#/components/schemas/User" }
        }));

        let graph = build_type_graph(&doc).unwrap();
        let account = &graph.types["Account"];
        assert!(matches!(account.ty, ResolvedType::Resource { .. }));
    }

    #[test]
    fn test_declared_self_ref_cycle_rejected() {
        let doc = doc(json!({
            "Loop": { "$ref": "#/components/schemas/Loop" }
        }));
        let err = build_type_graph(&doc).unwrap_err();
        assert!(matches!(err, AppError::Unsupported(_)));
    }

    #[test]
    fn test_declared_enum_entry() {
        let doc = doc(json!({
            "Color": { "type": "string", "enum": ["red", "green"] }
        }));
        let graph = build_type_graph(&doc).unwrap();
        assert_eq!(
            graph.types["Color"].ty,
            ResolvedType::Enum {
                values: vec!["red".into(), "green".into()]
            }
        );
    }

    #[test]
    fn test_declared_array_alias_promotes_items() {
        let doc = doc(json!({
            "Tags": {
                "type": "array",
                "items": { "type": "object", "properties": { "label": { "type": "string" } } }
            }
        }));
        let graph = build_type_graph(&doc).unwrap();
        assert_eq!(
            graph.types["Tags"].ty,
            ResolvedType::Alias(TypeDescriptor::Array(Box::new(TypeDescriptor::Reference(
                "Tag".into()
            ))))
        );
        assert!(graph.types.contains_key("Tag"));
    }

    #[test]
    fn test_collision_reported_not_overwritten() {
        // Two different inline objects both derive `StationLocation`.
        let doc = doc(json!({
            "Station": {
                "type": "object",
                "properties": {
                    "location": {
                        "type": "object",
                        "properties": { "latitude": { "type": "number" } }
                    },
                    "locations": {
                        "type": "object",
                        "properties": { "city": { "type": "string" } }
                    }
                }
            }
        }));
        let err = build_type_graph(&doc).unwrap_err();
        assert!(matches!(err, AppError::Collision(_)));
    }

    #[test]
    fn test_identical_bodies_do_not_collide() {
        let doc = doc(json!({
            "Station": {
                "type": "object",
                "properties": {
                    "kind": { "type": "string", "enum": ["a"] }
                }
            }
        }));
        // `StationKind` is registered by the mapper side effect only; running
        // the pipeline must not trip the collision check on its own output.
        let graph = build_type_graph(&doc).unwrap();
        assert_eq!(
            graph.types["StationKind"].ty,
            ResolvedType::Enum {
                values: vec!["a".into()]
            }
        );
    }

    #[test]
    fn test_unrecognized_declared_shape_falls_back() {
        let doc = doc(json!({
            "Mystery": { "minLength": 3 }
        }));
        let graph = build_type_graph(&doc).unwrap();
        assert_eq!(
            graph.types["Mystery"].ty,
            ResolvedType::Alias(TypeDescriptor::Scalar(ScalarKind::String))
        );
    }
}
