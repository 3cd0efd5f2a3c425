//! Indented text dump.
//!
//! Every node is one line, `{indent}{align} {type} {name}[ = value][ (comment)]`,
//! indent being the tree depth in spaces. Arrays print their size field right
//! after their own line; struct and array elements sit under an `[i]` index
//! line, byte-array elements are printed directly as `0 UInt8 data = N`.
//!
//! Import is a single forward scan that writes packed binary. Leaves align
//! right after their value; containers align when their scope closes, since
//! the padding trails the whole substructure.
use std::fmt::{self, Write as _};

use tracing::{trace, warn};

use crate::error::{DumpError, Result};
use crate::files::{FileTable, file_id_comment};
use crate::primitive::{self, PrimitiveType, TYPE_NAMES};
use crate::registry::{ManagedReferencesRegistry, RegistryVersion};
use crate::sink::{BinarySink, ByteWriter};
use crate::template::TemplateNode;
use crate::value::{Payload, ValueNode};
use crate::walker::{Shape, shape};

/// Renders `root` as a text dump. `files` backs the `m_FileID` comments.
pub fn export_text(root: &ValueNode, files: Option<&dyn FileTable>) -> Result<String> {
    let mut exporter = TextExporter {
        out: String::new(),
        files,
    };
    exporter.node(root, 0)?;
    Ok(exporter.out)
}

struct TextExporter<'a> {
    out: String,
    files: Option<&'a dyn FileTable>,
}

fn flag(aligned: bool) -> char {
    if aligned { '1' } else { '0' }
}

impl TextExporter<'_> {
    fn line(&mut self, depth: usize, content: fmt::Arguments<'_>) {
        self.out.extend(std::iter::repeat_n(' ', depth));
        self.out.write_fmt(content).ok();
        self.out.push('\n');
    }

    fn node(&mut self, v: &ValueNode, depth: usize) -> Result<()> {
        let t = &v.template;
        let align = flag(t.aligns());
        match shape(t) {
            Shape::Array => {
                let items = v.children()?;
                self.array_header(t, items.len(), depth);
                for (i, item) in items.iter().enumerate() {
                    self.line(depth + 1, format_args!("[{i}]"));
                    self.node(item, depth + 2)?;
                }
            }
            Shape::ByteArray => {
                let Payload::Bytes(data) = &v.payload else {
                    return Err(DumpError::mismatch(t));
                };
                self.array_header(t, data.len(), depth);
                for b in data {
                    self.line(depth + 1, format_args!("0 UInt8 data = {b}"));
                }
            }
            Shape::Registry => {
                let Payload::Registry(registry) = &v.payload else {
                    return Err(DumpError::mismatch(t));
                };
                self.line(
                    depth,
                    format_args!("{align} {} {}", t.type_name, t.field_name),
                );
                self.registry(registry, depth)?;
            }
            Shape::String => {
                let s = v.scalar_value()?.as_str().ok_or_else(|| DumpError::mismatch(t))?;
                self.line(
                    depth,
                    format_args!(
                        "{align} {} {} = \"{}\"",
                        t.type_name,
                        t.field_name,
                        primitive::escape_text(s)
                    ),
                );
            }
            Shape::Primitive(_) => {
                let value = v.scalar_value()?;
                let comment = self.file_id_comment(t, value.as_i64());
                self.line(
                    depth,
                    format_args!("{align} {} {} = {value}{comment}", t.type_name, t.field_name),
                );
            }
            Shape::Struct => {
                self.line(
                    depth,
                    format_args!("{align} {} {}", t.type_name, t.field_name),
                );
                for child in v.children()? {
                    self.node(child, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn array_header(&mut self, t: &TemplateNode, size: usize, depth: usize) {
        let align = flag(t.aligns());
        self.line(
            depth,
            format_args!("{align} {} {} ({size} items)", t.type_name, t.field_name),
        );
        match t.size_template() {
            Some(st) => self.line(
                depth + 1,
                format_args!(
                    "{} {} {} = {size}",
                    flag(st.is_aligned),
                    st.type_name,
                    st.field_name
                ),
            ),
            None => self.line(depth + 1, format_args!("0 int size = {size}")),
        }
    }

    fn file_id_comment(&self, t: &TemplateNode, value: Option<i64>) -> String {
        if t.type_name != "int" || t.field_name != "m_FileID" {
            return String::new();
        }
        let (Some(files), Some(id)) = (self.files, value) else {
            return String::new();
        };
        i32::try_from(id)
            .ok()
            .and_then(|id| file_id_comment(files, id))
            .map(|c| format!(" ({c})"))
            .unwrap_or_default()
    }

    fn registry(&mut self, registry: &ManagedReferencesRegistry, depth: usize) -> Result<()> {
        let version = registry.registry_version()?;
        let entries = registry.text_dump_entries()?;
        self.line(
            depth + 1,
            format_args!("0 int version = {}", registry.version),
        );
        // v1 entries sit directly under the registry; v2 nests them in RefIds.
        let base = match version {
            RegistryVersion::V1 => depth + 1,
            RegistryVersion::V2 => {
                self.line(depth + 1, format_args!("0 vector RefIds"));
                self.line(depth + 2, format_args!("1 Array Array"));
                self.line(depth + 3, format_args!("0 int size = {}", entries.len()));
                depth + 3
            }
        };
        for (i, (rid, type_ref, data)) in entries.into_iter().enumerate() {
            match version {
                RegistryVersion::V1 => {
                    self.line(base, format_args!("0 ReferencedObject {i:08}"));
                }
                RegistryVersion::V2 => {
                    self.line(base, format_args!("0 ReferencedObject data"));
                    self.line(base + 1, format_args!("0 SInt64 rid = {rid}"));
                }
            }
            self.line(base + 1, format_args!("0 ReferencedManagedType type"));
            for (name, s) in [
                ("class", &type_ref.class_name),
                ("ns", &type_ref.namespace),
                ("asm", &type_ref.assembly_name),
            ] {
                self.line(
                    base + 2,
                    format_args!("1 string {name} = \"{}\"", primitive::escape_text(s)),
                );
            }
            let data_align = data.is_some_and(|d| d.template.aligns());
            self.line(
                base + 1,
                format_args!("{} ReferencedObjectData data", flag(data_align)),
            );
            if let Some(data) = data {
                for child in data.children()? {
                    self.node(child, base + 2)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextImportOptions {
    /// Fail on unrecognized type names instead of skipping the line.
    pub strict: bool,
}

/// Imports a text dump into `sink`. On error the sink holds a partial,
/// unusable buffer.
pub fn import_text(text: &str, sink: &mut dyn BinarySink, opts: TextImportOptions) -> Result<()> {
    // (depth of the opening line, whether it aligns when closed)
    let mut open: Vec<(usize, bool)> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let rest = line.trim_start_matches(' ');
        let depth = line.len() - rest.len();
        if rest.trim().is_empty() || rest.starts_with('[') {
            continue;
        }

        while let Some(&(open_depth, aligned)) = open.last()
            && open_depth >= depth
        {
            open.pop();
            if aligned {
                sink.align();
            }
        }

        let align = match rest.as_bytes() {
            [b'0', b' ', ..] => false,
            [b'1', b' ', ..] => true,
            _ => {
                return Err(DumpError::MalformedLine {
                    line: line_no,
                    reason: "expected `0 ` or `1 ` alignment flag",
                });
            }
        };
        let body = &rest[2..];

        let Some(eq) = body.find('=') else {
            trace!(line = line_no, depth, align, "open container");
            open.push((depth, align));
            continue;
        };
        let value = body[eq + 1..].trim();

        if body.starts_with("string ") {
            let s = quoted(value).ok_or(DumpError::MalformedLine {
                line: line_no,
                reason: "string value is not quoted",
            })?;
            sink.write_string(&primitive::unescape_text(s));
        } else if let Some((name, p)) = primitive_prefix(body) {
            let token = value.split_whitespace().next().unwrap_or_default();
            let v = p.parse(name, token)?;
            primitive::write_scalar(sink, &v);
        } else {
            let type_name = body.split_whitespace().next().unwrap_or_default();
            if opts.strict {
                return Err(DumpError::UnsupportedType(type_name.to_string()));
            }
            warn!(line = line_no, type_name, "unsupported type in text import, line skipped");
        }

        if align {
            sink.align();
        }
    }

    while let Some((_, aligned)) = open.pop() {
        if aligned {
            sink.align();
        }
    }
    Ok(())
}

/// Convenience wrapper returning the packed bytes.
pub fn text_to_bytes(text: &str, opts: TextImportOptions) -> Result<Vec<u8>> {
    let mut w = ByteWriter::new();
    import_text(text, &mut w, opts)?;
    Ok(w.into_bytes())
}

fn quoted(value: &str) -> Option<&str> {
    let first = value.find('"')?;
    let last = value.rfind('"')?;
    (last > first).then(|| &value[first + 1..last])
}

fn primitive_prefix(body: &str) -> Option<(&'static str, PrimitiveType)> {
    TYPE_NAMES
        .iter()
        .find(|(name, _)| {
            body.strip_prefix(name)
                .is_some_and(|after| after.starts_with(' '))
        })
        .copied()
}
