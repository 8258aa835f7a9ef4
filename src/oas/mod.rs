#![deny(missing_docs)]

//! # OpenAPI Schema Engine
//!
//! - **document**: spec loading and boundary validation.
//! - **resolver**: `$ref` pointer resolution.
//! - **merge**: `allOf` composition merging.
//! - **extract**: promotion of inline schemas into named types.
//! - **naming**: deterministic synthetic-name derivation.
//! - **mapper**: schema to type-descriptor conversion.
//! - **graph**: the full pipeline producing the named type graph.

pub mod document;
pub mod extract;
pub mod graph;
pub mod mapper;
pub mod merge;
pub mod naming;
pub mod resolver;

// Re-export the public API surface.
pub use document::{validate_version, SpecDocument};
pub use extract::{extract_nested, Promotion};
pub use graph::{build_type_graph, Attribute, ResolvedType, TypeEntry, TypeGraph};
pub use mapper::{map_type, ScalarKind, TypeDescriptor};
pub use merge::merge_all_of;
pub use naming::derive_name;
pub use resolver::{parse_reference, resolve, ReferenceKind};
