// Template-driven decoder for packed binary: the inverse of `writer`.
// Alignment is relative to the start of `data`.
use std::sync::Arc;

use crate::error::{DumpError, Result};
use crate::registry::{
    ManagedReferencesRegistry, ReferencedObject, RegistryVersion, TypeReference, TypeResolver,
    resolve_template,
};
use crate::template::{TemplateNode, ValueKind};
use crate::value::{Scalar, ValueNode};
use crate::walker::{Shape, shape};

/// Decodes `data` as one value of `template`.
pub fn read_value(
    template: &Arc<TemplateNode>,
    data: &[u8],
    resolver: &dyn TypeResolver,
) -> Result<ValueNode> {
    Reader::new(data, resolver).read(template)
}

pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    resolver: &'a dyn TypeResolver,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8], resolver: &'a dyn TypeResolver) -> Self {
        Self {
            data,
            pos: 0,
            resolver,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn read(&mut self, t: &Arc<TemplateNode>) -> Result<ValueNode> {
        let node = match shape(t) {
            Shape::Struct => {
                let mut children = Vec::with_capacity(t.children.len());
                for child in &t.children {
                    children.push(self.read(child)?);
                }
                ValueNode::with_children(t, children)
            }
            Shape::Array => {
                let count = self.read_count()?;
                let element = t.element_template().ok_or_else(|| DumpError::mismatch(t))?;
                let mut items = Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    items.push(self.read(element)?);
                }
                ValueNode::with_children(t, items)
            }
            Shape::ByteArray => {
                let count = self.read_count()?;
                let bytes = self.read_slice(count)?.to_vec();
                ValueNode::bytes(t, bytes)
            }
            Shape::Registry => {
                let registry = self.read_registry()?;
                ValueNode::registry(t, registry)
            }
            Shape::String => {
                let s = self.read_string()?;
                ValueNode::scalar(t, Scalar::String(s))
            }
            Shape::Primitive(kind) => {
                let v = self.read_primitive(kind)?;
                ValueNode::scalar(t, v)
            }
        };
        if t.aligns() {
            self.align();
        }
        Ok(node)
    }

    fn read_registry(&mut self) -> Result<ManagedReferencesRegistry> {
        let raw = self.read_i32()?;
        let version = RegistryVersion::from_raw(raw as i64)?;
        let mut references = Vec::new();
        match version {
            RegistryVersion::V1 => loop {
                let type_ref = self.read_type_ref()?;
                if type_ref.is_null() {
                    break;
                }
                let rid = references.len() as i64;
                let data = self.read_referenced_data(&type_ref)?;
                references.push(ReferencedObject {
                    rid,
                    type_ref,
                    data,
                });
            },
            RegistryVersion::V2 => {
                let count = self.read_count()?;
                for _ in 0..count {
                    let rid = self.read_i64()?;
                    let type_ref = self.read_type_ref()?;
                    let data = self.read_referenced_data(&type_ref)?;
                    references.push(ReferencedObject {
                        rid,
                        type_ref,
                        data,
                    });
                }
                self.align();
            }
        }
        Ok(ManagedReferencesRegistry {
            version: raw,
            references,
        })
    }

    fn read_referenced_data(&mut self, type_ref: &TypeReference) -> Result<Option<ValueNode>> {
        if type_ref.is_null() {
            return Ok(None);
        }
        let template = resolve_template(self.resolver, type_ref)?;
        Ok(Some(self.read(&template)?))
    }

    fn read_type_ref(&mut self) -> Result<TypeReference> {
        let mut parts = [String::new(), String::new(), String::new()];
        for part in &mut parts {
            *part = self.read_string()?;
            self.align();
        }
        let [class_name, namespace, assembly_name] = parts;
        Ok(TypeReference {
            class_name,
            namespace,
            assembly_name,
        })
    }

    fn read_primitive(&mut self, kind: ValueKind) -> Result<Scalar> {
        let v = match kind {
            ValueKind::Bool => Scalar::Bool(self.read_u8()? != 0),
            ValueKind::Int8 => Scalar::I8(self.read_u8()? as i8),
            ValueKind::UInt8 => Scalar::U8(self.read_u8()?),
            ValueKind::Int16 => Scalar::I16(i16::from_le_bytes(self.read_array()?)),
            ValueKind::UInt16 => Scalar::U16(u16::from_le_bytes(self.read_array()?)),
            ValueKind::Int32 => Scalar::I32(self.read_i32()?),
            ValueKind::UInt32 => Scalar::U32(u32::from_le_bytes(self.read_array()?)),
            ValueKind::Int64 => Scalar::I64(self.read_i64()?),
            ValueKind::UInt64 => Scalar::U64(u64::from_le_bytes(self.read_array()?)),
            ValueKind::Float => Scalar::F32(f32::from_le_bytes(self.read_array()?)),
            ValueKind::Double => Scalar::F64(f64::from_le_bytes(self.read_array()?)),
            other => return Err(DumpError::UnsupportedType(format!("{other:?}"))),
        };
        Ok(v)
    }

    // Low-level utilities
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
    fn align(&mut self) {
        self.pos = (self.pos + 3) & !3;
    }
    fn read_u8(&mut self) -> Result<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(DumpError::UnexpectedEof(self.pos))?;
        self.pos += 1;
        Ok(b)
    }
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let s = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(s);
        Ok(out)
    }
    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }
    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }
    fn read_count(&mut self) -> Result<usize> {
        let at = self.pos;
        let n = self.read_i32()?;
        usize::try_from(n).map_err(|_| DumpError::NegativeCount { at, count: n })
    }
    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(DumpError::UnexpectedEof(self.pos));
        }
        let s = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(s)
    }
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_count()?;
        let at = self.pos;
        let s = self.read_slice(len)?;
        std::str::from_utf8(s)
            .map(str::to_string)
            .map_err(|_| DumpError::InvalidUtf8(at))
    }
}
