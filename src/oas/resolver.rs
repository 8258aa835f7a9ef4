#![deny(missing_docs)]

//! # Reference Resolution
//!
//! Resolves local `$ref` pointers (`#/components/schemas/...`) against the
//! spec document. External documents are never fetched; references are
//! classified so non-local targets can be rejected at the boundary.

use crate::error::{AppError, AppResult};
use crate::oas::document::SpecDocument;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use url::Url;

/// Classification of a `$ref` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A same-document fragment reference (`#/...`).
    Local,
    /// A relative path to another document.
    Relative,
    /// An absolute URL to another document.
    Remote,
}

/// A `$ref` string split into document part and fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference<'a> {
    /// Where the target lives.
    pub kind: ReferenceKind,
    /// The document part (empty for local references).
    pub document: &'a str,
    /// The fragment, without the leading `#`.
    pub fragment: Option<&'a str>,
}

/// Splits a `$ref` into document part and fragment and classifies it.
pub fn parse_reference(ref_str: &str) -> ParsedReference<'_> {
    let (document, fragment) = match ref_str.split_once('#') {
        Some((doc, frag)) => (doc, Some(frag)),
        None => (ref_str, None),
    };

    let kind = if document.is_empty() {
        ReferenceKind::Local
    } else if Url::parse(document).is_ok() {
        ReferenceKind::Remote
    } else {
        ReferenceKind::Relative
    };

    ParsedReference {
        kind,
        document,
        fragment,
    }
}

/// Resolves a local `$ref` pointer against the document.
///
/// Walks the fragment key-by-key from the root. Returns `Ok(None)` when any
/// intermediate key is absent or the node walked into is not a mapping;
/// callers substitute an empty schema rather than failing the run. Non-local
/// references are an error.
pub fn resolve<'a>(doc: &'a SpecDocument, reference: &str) -> AppResult<Option<&'a Value>> {
    let parsed = parse_reference(reference);
    if parsed.kind != ReferenceKind::Local {
        return Err(AppError::Unsupported(format!(
            "external $ref '{}' is not supported",
            reference
        )));
    }

    let Some(fragment) = parsed.fragment else {
        return Ok(None);
    };

    let mut node = doc.root();
    for segment in fragment.split('/').filter(|s| !s.is_empty()) {
        let key = decode_pointer_segment(segment);
        match node.get(key.as_str()) {
            Some(next) => node = next,
            None => return Ok(None),
        }
    }

    Ok(Some(node))
}

/// Extracts the simple name from a reference string.
/// e.g. `#/components/schemas/User` -> `User`
pub fn ref_tail(ref_str: &str) -> &str {
    ref_str.rsplit('/').next().unwrap_or(ref_str)
}

/// Decodes a JSON Pointer segment (handles `~1` and `~0`).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}
