//! ttd-core: schema-driven value trees and their dump codecs
//!
//! This crate converts a typed value tree losslessly between three forms:
//! - indented text dump (`text`), with deferred alignment on import
//! - JSON dump (`json`), template-driven on import
//! - packed little-endian binary (`writer` / `reader` over a `BinarySink`)
//!
//! Managed reference registries (polymorphic object lists, versions 1 and 2)
//! are handled by `registry` and shared by every codec.
//!
pub mod error;
pub mod files;
pub mod json;
pub mod primitive;
pub mod reader;
pub mod registry;
pub mod schema;
pub mod sink;
pub mod template;
pub mod text;
pub mod value;
pub mod walker;
pub mod writer;

pub use error::{DumpError, Result};
pub use files::{ExternalFile, ExternalFiles, FileTable};
pub use json::{export_json, export_json_string, import_json, import_json_str, json_to_bytes};
pub use reader::{Reader, read_value};
pub use registry::{
    ManagedReferencesRegistry, ReferencedObject, RegistryVersion, TypeReference, TypeRegistry,
    TypeResolver,
};
pub use schema::SchemaFile;
pub use sink::{BinarySink, ByteWriter};
pub use template::{TemplateNode, ValueKind};
pub use text::{TextImportOptions, export_text, import_text, text_to_bytes};
pub use value::{Payload, Scalar, ValueNode};
pub use writer::{to_bytes, write_value};
