#![deny(missing_docs)]

//! # OAS Typegraph
//!
//! Core library for resolving OpenAPI `components.schemas` into a canonical,
//! fully-named type graph.
//!
//! The pipeline is a single synchronous pass over an immutable document:
//! `$ref` dereferencing and `allOf` flattening first, then promotion of
//! anonymous nested schemas into named types, then mapping of every named
//! schema into the target type algebra. The output is consumed by a
//! downstream code-emission layer; no I/O or formatting happens here.

/// Shared error types.
pub mod error;

/// OpenAPI schema resolution and type mapping.
pub mod oas;

pub use error::{AppError, AppResult};
pub use oas::{
    build_type_graph, derive_name, map_type, Attribute, Promotion, ResolvedType, ScalarKind,
    SpecDocument, TypeDescriptor, TypeEntry, TypeGraph,
};
