// Schema side of the tree: immutable field templates shared by every value
// bound to them. Templates are built once per asset type and handed around
// behind `Arc`, so the same tree can back many exports/imports at once.
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueKind {
    #[default]
    None,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    String,
    ByteArray,
    Array,
    ManagedReferencesRegistry,
    Struct,
}

impl ValueKind {
    /// Fixed-width numeric or boolean kinds.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            ValueKind::Bool
                | ValueKind::Int8
                | ValueKind::Int16
                | ValueKind::Int32
                | ValueKind::Int64
                | ValueKind::UInt8
                | ValueKind::UInt16
                | ValueKind::UInt32
                | ValueKind::UInt64
                | ValueKind::Float
                | ValueKind::Double
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateNode {
    pub type_name: String,
    pub field_name: String,
    #[serde(default)]
    pub value_kind: ValueKind,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub is_aligned: bool,
    #[serde(default)]
    pub children: Vec<Arc<TemplateNode>>,
}

impl TemplateNode {
    pub fn new(type_name: &str, field_name: &str, value_kind: ValueKind) -> Self {
        Self {
            type_name: type_name.to_string(),
            field_name: field_name.to_string(),
            value_kind,
            ..Self::default()
        }
    }

    /// Struct node with the given ordered fields.
    pub fn structure(type_name: &str, field_name: &str, children: Vec<TemplateNode>) -> Self {
        Self {
            children: children.into_iter().map(Arc::new).collect(),
            ..Self::new(type_name, field_name, ValueKind::None)
        }
    }

    /// `Array Array` node with an `int size` field and the given element template.
    pub fn array(element: TemplateNode) -> Self {
        Self {
            is_array: true,
            children: vec![
                Arc::new(Self::new("int", "size", ValueKind::Int32)),
                Arc::new(element),
            ],
            ..Self::new("Array", "Array", ValueKind::Array)
        }
    }

    /// Flat byte run: `Array Array` over `UInt8 data`.
    pub fn byte_array() -> Self {
        Self {
            is_array: true,
            children: vec![
                Arc::new(Self::new("int", "size", ValueKind::Int32)),
                Arc::new(Self::new("UInt8", "data", ValueKind::UInt8)),
            ],
            ..Self::new("Array", "Array", ValueKind::ByteArray)
        }
    }

    pub fn aligned(mut self) -> Self {
        self.is_aligned = true;
        self
    }

    /// Alignment that actually applies after this node; strings always align.
    pub fn aligns(&self) -> bool {
        self.is_aligned || self.value_kind == ValueKind::String
    }

    /// Size field of an array node.
    pub fn size_template(&self) -> Option<&Arc<TemplateNode>> {
        if self.is_array { self.children.first() } else { None }
    }

    /// Element template of an array node.
    pub fn element_template(&self) -> Option<&Arc<TemplateNode>> {
        if self.is_array { self.children.get(1) } else { None }
    }

    pub fn child(&self, field_name: &str) -> Option<&Arc<TemplateNode>> {
        self.children.iter().find(|c| c.field_name == field_name)
    }
}
