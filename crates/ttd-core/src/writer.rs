// Tree encoder: writes a bound value tree straight to packed binary. Both
// dump importers must reproduce exactly these bytes.
use crate::error::{DumpError, Result};
use crate::primitive;
use crate::registry::ManagedReferencesRegistry;
use crate::sink::{BinarySink, ByteWriter};
use crate::value::{Payload, ValueNode};
use crate::walker::{Shape, shape};

pub fn write_value(v: &ValueNode, sink: &mut dyn BinarySink) -> Result<()> {
    let t = &v.template;
    match (shape(t), &v.payload) {
        (Shape::Struct, Payload::Children(children)) => {
            for child in children {
                write_value(child, sink)?;
            }
        }
        (Shape::Array, Payload::Children(items)) => {
            sink.write_i32(items.len() as i32);
            for item in items {
                write_value(item, sink)?;
            }
        }
        (Shape::ByteArray, Payload::Bytes(data)) => {
            sink.write_i32(data.len() as i32);
            sink.write_bytes(data);
        }
        (Shape::Registry, Payload::Registry(registry)) => write_registry(registry, sink)?,
        (Shape::String | Shape::Primitive(_), Payload::Scalar(_)) => {
            primitive::write_scalar(sink, v.scalar_value()?);
        }
        _ => return Err(DumpError::mismatch(t)),
    }
    if t.aligns() {
        sink.align();
    }
    Ok(())
}

pub fn to_bytes(v: &ValueNode) -> Result<Vec<u8>> {
    let mut w = ByteWriter::new();
    write_value(v, &mut w)?;
    Ok(w.into_bytes())
}

fn write_registry(registry: &ManagedReferencesRegistry, sink: &mut dyn BinarySink) -> Result<()> {
    let version = registry.registry_version()?;
    version.write_header(sink, registry.references.len());
    for r in &registry.references {
        version.write_entry_prefix(sink, r.rid);
        r.type_ref.write(sink);
        if let Some(data) = &r.data {
            write_value(data, sink)?;
        }
    }
    version.write_trailer(sink);
    Ok(())
}
