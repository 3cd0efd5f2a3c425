// Shared traversal contract: every codec, the reader and the tree encoder
// decide what a template node is through `Shape`, so they agree on which
// nodes carry values, which recurse, and where alignment applies.
use std::sync::Arc;

use serde_json::Value as J;

use crate::template::{TemplateNode, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Fixed-width numeric or boolean leaf.
    Primitive(ValueKind),
    /// Length-prefixed, always aligned.
    String,
    /// Fields follow in template order.
    Struct,
    /// Size field, then one element per entry.
    Array,
    /// Size field, then a flat byte run.
    ByteArray,
    /// Polymorphic managed-reference list.
    Registry,
}

pub fn shape(template: &TemplateNode) -> Shape {
    match template.value_kind {
        ValueKind::ByteArray => Shape::ByteArray,
        _ if template.is_array => Shape::Array,
        ValueKind::ManagedReferencesRegistry => Shape::Registry,
        ValueKind::String => Shape::String,
        k if k.is_primitive() => Shape::Primitive(k),
        _ => Shape::Struct,
    }
}

/// Schemas sometimes double-wrap arrays (`vector m_List` > `Array Array`).
/// When the JSON side already holds a plain array, the wrapper is skipped
/// and the wrapped array template is returned.
pub fn unwrap_array<'t>(template: &'t TemplateNode, token: &J) -> Option<&'t Arc<TemplateNode>> {
    match template.children.as_slice() {
        [only] if only.is_array && token.is_array() => Some(only),
        _ => None,
    }
}
