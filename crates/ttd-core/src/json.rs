// JSON dump: structs become objects keyed by field name (template order),
// arrays become JSON arrays, byte arrays arrays of 0..=255 integers.
// Import is driven by the template, not by the shape of the JSON, and writes
// packed binary straight into the sink.
use serde_json::{Map, Value as J, json};

use crate::error::{DumpError, Result};
use crate::primitive;
use crate::registry::{
    ManagedReferencesRegistry, RegistryVersion, TypeReference, TypeResolver, resolve_template,
};
use crate::sink::{BinarySink, ByteWriter};
use crate::template::{TemplateNode, ValueKind};
use crate::value::{Payload, Scalar, ValueNode};
use crate::walker::{Shape, shape, unwrap_array};

pub fn export_json(root: &ValueNode) -> Result<J> {
    value_json(root)
}

pub fn export_json_string(root: &ValueNode) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_json(root)?)?)
}

fn value_json(v: &ValueNode) -> Result<J> {
    let t = &v.template;
    let out = match shape(t) {
        Shape::Array => J::Array(
            v.children()?
                .iter()
                .map(value_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Shape::ByteArray => {
            let Payload::Bytes(data) = &v.payload else {
                return Err(DumpError::mismatch(t));
            };
            J::Array(data.iter().map(|b| J::from(*b)).collect())
        }
        Shape::Registry => {
            let Payload::Registry(registry) = &v.payload else {
                return Err(DumpError::mismatch(t));
            };
            registry_json(registry)?
        }
        Shape::String | Shape::Primitive(_) => scalar_json(v.scalar_value()?, t)?,
        Shape::Struct => fields_json(v.children()?)?,
    };
    Ok(out)
}

fn fields_json(children: &[ValueNode]) -> Result<J> {
    let mut map = Map::with_capacity(children.len());
    for child in children {
        map.insert(child.template.field_name.clone(), value_json(child)?);
    }
    Ok(J::Object(map))
}

fn scalar_json(value: &Scalar, t: &TemplateNode) -> Result<J> {
    let non_finite = || DumpError::NonFiniteFloat {
        field: t.field_name.clone(),
    };
    let out = match value {
        Scalar::Bool(b) => J::Bool(*b),
        Scalar::I8(x) => J::from(*x),
        Scalar::I16(x) => J::from(*x),
        Scalar::I32(x) => J::from(*x),
        Scalar::I64(x) => J::from(*x),
        Scalar::U8(x) => J::from(*x),
        Scalar::U16(x) => J::from(*x),
        Scalar::U32(x) => J::from(*x),
        Scalar::U64(x) => J::from(*x),
        // Widen through the shortest decimal so 0.1f32 dumps as 0.1.
        Scalar::F32(x) => {
            let wide: f64 = x.to_string().parse().map_err(|_| non_finite())?;
            serde_json::Number::from_f64(wide)
                .map(J::Number)
                .ok_or_else(non_finite)?
        }
        Scalar::F64(x) => serde_json::Number::from_f64(*x)
            .map(J::Number)
            .ok_or_else(non_finite)?,
        Scalar::String(s) => J::String(s.clone()),
    };
    Ok(out)
}

fn registry_json(registry: &ManagedReferencesRegistry) -> Result<J> {
    let version = registry.registry_version()?;
    let mut refs = Vec::with_capacity(registry.references.len());
    for r in &registry.references {
        let mut entry = Map::new();
        if version == RegistryVersion::V2 {
            entry.insert("rid".to_string(), J::from(r.rid));
        }
        entry.insert(
            "type".to_string(),
            json!({
                "class": r.type_ref.class_name,
                "ns": r.type_ref.namespace,
                "asm": r.type_ref.assembly_name,
            }),
        );
        let data = match &r.data {
            Some(d) => fields_json(d.children()?)?,
            None => J::Object(Map::new()),
        };
        entry.insert("data".to_string(), data);
        refs.push(J::Object(entry));
    }
    Ok(json!({
        "version": registry.version,
        "RefIds": refs,
    }))
}

/// Imports a JSON dump bound to `template` into `sink`. On error the sink
/// holds a partial, unusable buffer.
pub fn import_json(
    template: &TemplateNode,
    token: &J,
    resolver: &dyn TypeResolver,
    sink: &mut dyn BinarySink,
) -> Result<()> {
    JsonImporter { resolver, sink }.node(template, token)
}

pub fn import_json_str(
    template: &TemplateNode,
    text: &str,
    resolver: &dyn TypeResolver,
    sink: &mut dyn BinarySink,
) -> Result<()> {
    let token: J = serde_json::from_str(text)?;
    import_json(template, &token, resolver, sink)
}

/// Convenience wrapper returning the packed bytes.
pub fn json_to_bytes(
    template: &TemplateNode,
    token: &J,
    resolver: &dyn TypeResolver,
) -> Result<Vec<u8>> {
    let mut w = ByteWriter::new();
    import_json(template, token, resolver, &mut w)?;
    Ok(w.into_bytes())
}

struct JsonImporter<'a> {
    resolver: &'a dyn TypeResolver,
    sink: &'a mut dyn BinarySink,
}

impl JsonImporter<'_> {
    fn node(&mut self, t: &TemplateNode, token: &J) -> Result<()> {
        if let Some(inner) = unwrap_array(t, token) {
            self.node(inner, token)?;
            if t.aligns() {
                self.sink.align();
            }
            return Ok(());
        }

        match shape(t) {
            Shape::Struct => {
                let obj = token
                    .as_object()
                    .ok_or_else(|| invalid(t, "an object"))?;
                for child in &t.children {
                    let child_token = expect_field(obj, &child.field_name, t)?;
                    self.node(child, child_token)?;
                }
            }
            Shape::Registry => self.registry(t, token)?,
            Shape::String => {
                let s = match token {
                    J::String(s) => s.as_str(),
                    J::Null => "",
                    _ => return Err(invalid(t, "a string")),
                };
                self.sink.write_string(s);
            }
            Shape::ByteArray => {
                let items = token
                    .as_array()
                    .ok_or_else(|| invalid(t, "an array of bytes"))?;
                let bytes = items
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| invalid(t, "an array of bytes"))?;
                self.sink.write_i32(bytes.len() as i32);
                self.sink.write_bytes(&bytes);
            }
            Shape::Array => {
                let items = token.as_array().ok_or_else(|| invalid(t, "an array"))?;
                let element = t.element_template().ok_or_else(|| DumpError::mismatch(t))?;
                // The JSON length wins over anything the schema implies.
                self.sink.write_i32(items.len() as i32);
                for item in items {
                    self.node(element, item)?;
                }
            }
            Shape::Primitive(kind) => {
                let v = scalar_from_json(kind, token, t)?;
                primitive::write_scalar(self.sink, &v);
            }
        }

        if t.aligns() {
            self.sink.align();
        }
        Ok(())
    }

    fn registry(&mut self, t: &TemplateNode, token: &J) -> Result<()> {
        let obj = token
            .as_object()
            .ok_or_else(|| invalid(t, "a registry object"))?;
        let raw = expect_field(obj, "version", t)?
            .as_i64()
            .ok_or_else(|| invalid(t, "an integer version"))?;
        let version = RegistryVersion::from_raw(raw)?;
        let refs = expect_field(obj, "RefIds", t)?
            .as_array()
            .ok_or_else(|| invalid(t, "a RefIds array"))?;

        version.write_header(self.sink, refs.len());
        for (i, entry) in refs.iter().enumerate() {
            let entry = entry
                .as_object()
                .ok_or_else(|| invalid(t, "a referenced object"))?;
            let rid = match (entry.get("rid"), version) {
                (Some(rid), _) => rid.as_i64().ok_or_else(|| invalid(t, "an integer rid"))?,
                // v1 dumps carry no rid: it is the position.
                (None, RegistryVersion::V1) => i as i64,
                (None, RegistryVersion::V2) => return Err(missing("rid", t)),
            };
            version.check_rid(i, rid)?;
            version.write_entry_prefix(self.sink, rid);

            let type_obj = expect_field(entry, "type", t)?
                .as_object()
                .ok_or_else(|| invalid(t, "a type object"))?;
            let type_ref = TypeReference::new(
                string_field(type_obj, "class", t)?,
                string_field(type_obj, "ns", t)?,
                string_field(type_obj, "asm", t)?,
            );
            type_ref.write(self.sink);
            if type_ref.is_null() {
                continue;
            }

            let data_template = resolve_template(self.resolver, &type_ref)?;
            let data = expect_field(entry, "data", t)?;
            self.node(&data_template, data)?;
        }
        version.write_trailer(self.sink);
        Ok(())
    }
}

fn scalar_from_json(kind: ValueKind, token: &J, t: &TemplateNode) -> Result<Scalar> {
    fn int<T: TryFrom<i64>>(token: &J, t: &TemplateNode) -> Result<T> {
        token
            .as_i64()
            .and_then(|x| T::try_from(x).ok())
            .ok_or_else(|| invalid(t, "an in-range integer"))
    }
    let v = match kind {
        ValueKind::Bool => Scalar::Bool(token.as_bool().ok_or_else(|| invalid(t, "a boolean"))?),
        ValueKind::Int8 => Scalar::I8(int(token, t)?),
        ValueKind::Int16 => Scalar::I16(int(token, t)?),
        ValueKind::Int32 => Scalar::I32(int(token, t)?),
        ValueKind::Int64 => Scalar::I64(int(token, t)?),
        ValueKind::UInt8 => Scalar::U8(int(token, t)?),
        ValueKind::UInt16 => Scalar::U16(int(token, t)?),
        ValueKind::UInt32 => Scalar::U32(int(token, t)?),
        ValueKind::UInt64 => Scalar::U64(
            token
                .as_u64()
                .ok_or_else(|| invalid(t, "an in-range integer"))?,
        ),
        ValueKind::Float => {
            Scalar::F32(token.as_f64().ok_or_else(|| invalid(t, "a number"))? as f32)
        }
        ValueKind::Double => Scalar::F64(token.as_f64().ok_or_else(|| invalid(t, "a number"))?),
        _ => return Err(DumpError::UnsupportedType(t.type_name.clone())),
    };
    Ok(v)
}

fn expect_field<'j>(obj: &'j Map<String, J>, name: &str, parent: &TemplateNode) -> Result<&'j J> {
    obj.get(name).ok_or_else(|| missing(name, parent))
}

fn string_field<'j>(obj: &'j Map<String, J>, name: &str, parent: &TemplateNode) -> Result<&'j str> {
    match expect_field(obj, name, parent)? {
        J::String(s) => Ok(s),
        J::Null => Ok(""),
        _ => Err(invalid(parent, "a string")),
    }
}

fn missing(name: &str, parent: &TemplateNode) -> DumpError {
    DumpError::MissingField {
        field: name.to_string(),
        parent_type: parent.type_name.clone(),
        parent_field: parent.field_name.clone(),
    }
}

fn invalid(t: &TemplateNode, expected: &'static str) -> DumpError {
    DumpError::InvalidJsonValue {
        field: t.field_name.clone(),
        expected,
    }
}
