use std::fmt;
use std::sync::Arc;

use crate::error::{DumpError, Result};
use crate::primitive;
use crate::registry::ManagedReferencesRegistry;
use crate::template::TemplateNode;

/// A single primitive value bound to a scalar template.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
}

impl Scalar {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::I8(x) => Some(x as i64),
            Scalar::I16(x) => Some(x as i64),
            Scalar::I32(x) => Some(x as i64),
            Scalar::I64(x) => Some(x),
            Scalar::U8(x) => Some(x as i64),
            Scalar::U16(x) => Some(x as i64),
            Scalar::U32(x) => Some(x as i64),
            Scalar::U64(x) => i64::try_from(x).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

// Invariant-culture rendering: no grouping, `.` decimal point, shortest
// representation that parses back to the same float.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Scalar::I8(x) => write!(f, "{x}"),
            Scalar::I16(x) => write!(f, "{x}"),
            Scalar::I32(x) => write!(f, "{x}"),
            Scalar::I64(x) => write!(f, "{x}"),
            Scalar::U8(x) => write!(f, "{x}"),
            Scalar::U16(x) => write!(f, "{x}"),
            Scalar::U32(x) => write!(f, "{x}"),
            Scalar::U64(x) => write!(f, "{x}"),
            Scalar::F32(x) => write!(f, "{x}"),
            Scalar::F64(x) => write!(f, "{x}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scalar(Scalar),
    /// Struct fields in template order, or array elements.
    Children(Vec<ValueNode>),
    Bytes(Vec<u8>),
    Registry(ManagedReferencesRegistry),
}

/// A value bound to its template. Owns its children exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    pub template: Arc<TemplateNode>,
    pub payload: Payload,
}

impl ValueNode {
    pub fn scalar(template: &Arc<TemplateNode>, value: Scalar) -> Self {
        Self {
            template: Arc::clone(template),
            payload: Payload::Scalar(value),
        }
    }

    pub fn with_children(template: &Arc<TemplateNode>, children: Vec<ValueNode>) -> Self {
        Self {
            template: Arc::clone(template),
            payload: Payload::Children(children),
        }
    }

    pub fn bytes(template: &Arc<TemplateNode>, data: Vec<u8>) -> Self {
        Self {
            template: Arc::clone(template),
            payload: Payload::Bytes(data),
        }
    }

    pub fn registry(template: &Arc<TemplateNode>, registry: ManagedReferencesRegistry) -> Self {
        Self {
            template: Arc::clone(template),
            payload: Payload::Registry(registry),
        }
    }

    /// Struct fields or array elements; any other payload is a mismatch.
    pub fn children(&self) -> Result<&[ValueNode]> {
        match &self.payload {
            Payload::Children(c) => Ok(c),
            _ => Err(DumpError::mismatch(&self.template)),
        }
    }

    /// Scalar payload whose variant matches the template's value kind.
    pub fn scalar_value(&self) -> Result<&Scalar> {
        match &self.payload {
            Payload::Scalar(s) if primitive::fits_kind(self.template.value_kind, s) => Ok(s),
            _ => Err(DumpError::mismatch(&self.template)),
        }
    }
}
