//! Managed reference registries: polymorphic object lists whose element
//! schemas are looked up by a `(class, namespace, assembly)` triple.
//!
//! Two on-disk layouts exist:
//! - version 1: entries back to back, ids implied by position, list ended by
//!   an all-empty type triple (the terminus);
//! - version 2: explicit `i32` count, each entry carries an `i64` rid, no
//!   terminus, one trailing alignment.
//!
//! The helpers here are shared by the text and JSON codecs, the binary
//! reader and the tree encoder.
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DumpError, Result};
use crate::sink::BinarySink;
use crate::template::TemplateNode;
use crate::value::ValueNode;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TypeReference {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "ns")]
    pub namespace: String,
    #[serde(rename = "asm")]
    pub assembly_name: String,
}

impl TypeReference {
    /// The reserved null/terminus triple.
    pub const TERMINUS: TypeReference = TypeReference {
        class_name: String::new(),
        namespace: String::new(),
        assembly_name: String::new(),
    };

    pub fn new(class_name: &str, namespace: &str, assembly_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            namespace: namespace.to_string(),
            assembly_name: assembly_name.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.class_name.is_empty() && self.namespace.is_empty() && self.assembly_name.is_empty()
    }

    /// Three aligned length-prefixed strings.
    pub fn write(&self, sink: &mut dyn BinarySink) {
        for s in [&self.class_name, &self.namespace, &self.assembly_name] {
            sink.write_string(s);
            sink.align();
        }
    }
}

static NULL_TYPE: TypeReference = TypeReference::TERMINUS;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferencedObject {
    pub rid: i64,
    pub type_ref: TypeReference,
    /// Absent for null-typed entries.
    pub data: Option<ValueNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManagedReferencesRegistry {
    pub version: i32,
    pub references: Vec<ReferencedObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryVersion {
    V1,
    V2,
}

impl RegistryVersion {
    pub fn from_raw(version: i64) -> Result<Self> {
        match version {
            1 => Ok(RegistryVersion::V1),
            2 => Ok(RegistryVersion::V2),
            other => Err(DumpError::UnsupportedRegistryVersion(other)),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            RegistryVersion::V1 => 1,
            RegistryVersion::V2 => 2,
        }
    }

    /// Version 1 ids are positional; anything else is rejected.
    pub fn check_rid(self, index: usize, rid: i64) -> Result<()> {
        if self == RegistryVersion::V1 && rid != index as i64 {
            return Err(DumpError::NonSequentialRid {
                expected: index as i64,
                found: rid,
            });
        }
        Ok(())
    }

    /// Writes the version header (and the v2 entry count).
    pub fn write_header(self, sink: &mut dyn BinarySink, count: usize) {
        sink.write_i32(self.as_i32());
        if self == RegistryVersion::V2 {
            sink.write_i32(count as i32);
        }
    }

    /// Per-entry prefix: v2 writes the rid, v1 keeps it implicit.
    pub fn write_entry_prefix(self, sink: &mut dyn BinarySink, rid: i64) {
        if self == RegistryVersion::V2 {
            sink.write_i64(rid);
        }
    }

    /// v1 closes the list with the terminus, v2 with one alignment.
    pub fn write_trailer(self, sink: &mut dyn BinarySink) {
        match self {
            RegistryVersion::V1 => TypeReference::TERMINUS.write(sink),
            RegistryVersion::V2 => sink.align(),
        }
    }
}

impl ManagedReferencesRegistry {
    pub fn registry_version(&self) -> Result<RegistryVersion> {
        RegistryVersion::from_raw(self.version as i64)
    }

    /// Entries as they appear in a text dump: v1 gains a trailing terminus.
    pub fn text_dump_entries(&self) -> Result<Vec<(i64, &TypeReference, Option<&ValueNode>)>> {
        let version = self.registry_version()?;
        let mut entries: Vec<_> = self
            .references
            .iter()
            .map(|r| (r.rid, &r.type_ref, r.data.as_ref()))
            .collect();
        if version == RegistryVersion::V1 {
            entries.push((0, &NULL_TYPE, None));
        }
        Ok(entries)
    }
}

/// Supplies templates for managed types. Shared read-only across codec calls.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, type_ref: &TypeReference) -> Option<Arc<TemplateNode>>;
}

/// Resolves through the external resolver or fails with the triple.
pub fn resolve_template(
    resolver: &dyn TypeResolver,
    type_ref: &TypeReference,
) -> Result<Arc<TemplateNode>> {
    let found = resolver.resolve(type_ref);
    debug!(
        class = %type_ref.class_name,
        ns = %type_ref.namespace,
        asm = %type_ref.assembly_name,
        found = found.is_some(),
        "resolve managed type"
    );
    found.ok_or_else(|| DumpError::UnresolvedManagedType {
        class_name: type_ref.class_name.clone(),
        namespace: type_ref.namespace.clone(),
        assembly_name: type_ref.assembly_name.clone(),
    })
}

/// In-memory resolver keyed by the structural type triple.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<TypeReference, Arc<TemplateNode>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_ref: TypeReference, template: TemplateNode) {
        self.types.insert(type_ref, Arc::new(template));
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, type_ref: &TypeReference) -> Option<Arc<TemplateNode>> {
        self.types.get(type_ref).cloned()
    }
}
