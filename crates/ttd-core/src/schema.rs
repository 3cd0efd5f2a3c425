// On-disk schema files: the root template plus the managed types a registry
// may reference, and optionally the document's external file table.
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::files::ExternalFiles;
use crate::registry::{TypeReference, TypeRegistry};
use crate::template::TemplateNode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedTypeEntry {
    #[serde(rename = "type")]
    pub type_ref: TypeReference,
    pub template: TemplateNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    pub root: Arc<TemplateNode>,
    #[serde(default)]
    pub managed_types: Vec<ManagedTypeEntry>,
    #[serde(default)]
    pub files: Option<ExternalFiles>,
}

impl SchemaFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_slice(&data)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Resolver over `managed_types`.
    pub fn type_registry(&self) -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        for entry in &self.managed_types {
            reg.insert(entry.type_ref.clone(), entry.template.clone());
        }
        reg
    }
}
