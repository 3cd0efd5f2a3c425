// Primitive codec: the fixed table of dump type names, their text parsing,
// and their fixed-width binary writes. `string` is not in the table; the
// dump codecs handle it as a length-prefixed, aligned field.
use crate::error::{DumpError, Result};
use crate::sink::BinarySink;
use crate::template::ValueKind;
use crate::value::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

/// Recognized aliases, exact and case-sensitive.
pub const TYPE_NAMES: &[(&str, PrimitiveType)] = &[
    ("int", PrimitiveType::I32),
    ("SInt32", PrimitiveType::I32),
    ("float", PrimitiveType::F32),
    ("bool", PrimitiveType::Bool),
    ("SInt64", PrimitiveType::I64),
    ("long", PrimitiveType::I64),
    ("UInt8", PrimitiveType::U8),
    ("unsigned char", PrimitiveType::U8),
    ("unsigned int", PrimitiveType::U32),
    ("UInt32", PrimitiveType::U32),
    ("UInt16", PrimitiveType::U16),
    ("unsigned short", PrimitiveType::U16),
    ("SInt8", PrimitiveType::I8),
    ("char", PrimitiveType::I8),
    ("SInt16", PrimitiveType::I16),
    ("short", PrimitiveType::I16),
    ("UInt64", PrimitiveType::U64),
    ("unsigned long long", PrimitiveType::U64),
    ("FileSize", PrimitiveType::U64),
    ("double", PrimitiveType::F64),
];

impl PrimitiveType {
    pub fn from_type_name(name: &str) -> Option<Self> {
        TYPE_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
    }

    pub fn from_kind(kind: ValueKind) -> Option<Self> {
        let p = match kind {
            ValueKind::Bool => PrimitiveType::Bool,
            ValueKind::Int8 => PrimitiveType::I8,
            ValueKind::Int16 => PrimitiveType::I16,
            ValueKind::Int32 => PrimitiveType::I32,
            ValueKind::Int64 => PrimitiveType::I64,
            ValueKind::UInt8 => PrimitiveType::U8,
            ValueKind::UInt16 => PrimitiveType::U16,
            ValueKind::UInt32 => PrimitiveType::U32,
            ValueKind::UInt64 => PrimitiveType::U64,
            ValueKind::Float => PrimitiveType::F32,
            ValueKind::Double => PrimitiveType::F64,
            _ => return None,
        };
        Some(p)
    }

    pub fn of(value: &Scalar) -> Option<Self> {
        let p = match value {
            Scalar::Bool(_) => PrimitiveType::Bool,
            Scalar::I8(_) => PrimitiveType::I8,
            Scalar::I16(_) => PrimitiveType::I16,
            Scalar::I32(_) => PrimitiveType::I32,
            Scalar::I64(_) => PrimitiveType::I64,
            Scalar::U8(_) => PrimitiveType::U8,
            Scalar::U16(_) => PrimitiveType::U16,
            Scalar::U32(_) => PrimitiveType::U32,
            Scalar::U64(_) => PrimitiveType::U64,
            Scalar::F32(_) => PrimitiveType::F32,
            Scalar::F64(_) => PrimitiveType::F64,
            Scalar::String(_) => return None,
        };
        Some(p)
    }

    /// Parses `text` under invariant numeric rules. `type_name` is only used
    /// for error context.
    pub fn parse(self, type_name: &str, text: &str) -> Result<Scalar> {
        let bad = || DumpError::malformed(type_name, text);
        let v = match self {
            PrimitiveType::Bool => {
                if text.eq_ignore_ascii_case("true") {
                    Scalar::Bool(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Scalar::Bool(false)
                } else {
                    return Err(bad());
                }
            }
            PrimitiveType::I8 => Scalar::I8(text.parse().map_err(|_| bad())?),
            PrimitiveType::I16 => Scalar::I16(text.parse().map_err(|_| bad())?),
            PrimitiveType::I32 => Scalar::I32(text.parse().map_err(|_| bad())?),
            PrimitiveType::I64 => Scalar::I64(text.parse().map_err(|_| bad())?),
            PrimitiveType::U8 => Scalar::U8(text.parse().map_err(|_| bad())?),
            PrimitiveType::U16 => Scalar::U16(text.parse().map_err(|_| bad())?),
            PrimitiveType::U32 => Scalar::U32(text.parse().map_err(|_| bad())?),
            PrimitiveType::U64 => Scalar::U64(text.parse().map_err(|_| bad())?),
            PrimitiveType::F32 => Scalar::F32(text.parse().map_err(|_| bad())?),
            PrimitiveType::F64 => Scalar::F64(text.parse().map_err(|_| bad())?),
        };
        Ok(v)
    }
}

/// Whether `value` has the variant a template of `kind` stores.
pub fn fits_kind(kind: ValueKind, value: &Scalar) -> bool {
    match value {
        Scalar::String(_) => kind == ValueKind::String,
        _ => PrimitiveType::from_kind(kind).is_some_and(|p| PrimitiveType::of(value) == Some(p)),
    }
}

/// Parses a dump token for the named primitive type.
pub fn parse(type_name: &str, text: &str) -> Result<Scalar> {
    let p = PrimitiveType::from_type_name(type_name)
        .ok_or_else(|| DumpError::UnsupportedType(type_name.to_string()))?;
    p.parse(type_name, text)
}

/// Writes `value` with the width of the named primitive type.
pub fn write(sink: &mut dyn BinarySink, type_name: &str, value: &Scalar) -> Result<()> {
    let p = PrimitiveType::from_type_name(type_name)
        .ok_or_else(|| DumpError::UnsupportedType(type_name.to_string()))?;
    if PrimitiveType::of(value) != Some(p) {
        return Err(DumpError::ValueMismatch {
            type_name: type_name.to_string(),
            field: value.to_string(),
        });
    }
    write_scalar(sink, value);
    Ok(())
}

/// Writes any scalar with its own width; strings are length-prefixed.
pub fn write_scalar(sink: &mut dyn BinarySink, value: &Scalar) {
    match value {
        Scalar::Bool(v) => sink.write_bool(*v),
        Scalar::I8(v) => sink.write_i8(*v),
        Scalar::I16(v) => sink.write_i16(*v),
        Scalar::I32(v) => sink.write_i32(*v),
        Scalar::I64(v) => sink.write_i64(*v),
        Scalar::U8(v) => sink.write_u8(*v),
        Scalar::U16(v) => sink.write_u16(*v),
        Scalar::U32(v) => sink.write_u32(*v),
        Scalar::U64(v) => sink.write_u64(*v),
        Scalar::F32(v) => sink.write_f32(*v),
        Scalar::F64(v) => sink.write_f64(*v),
        Scalar::String(s) => sink.write_string(s),
    }
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_text`]. Unknown escapes keep the escaped character.
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaping = false;
    for ch in s.chars() {
        if escaping {
            out.push(match ch {
                'r' => '\r',
                'n' => '\n',
                c => c,
            });
            escaping = false;
        } else if ch == '\\' {
            escaping = true;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ByteWriter;

    #[test]
    fn aliases_map_to_widths() {
        assert_eq!(parse("unsigned short", "65535").unwrap(), Scalar::U16(65535));
        assert_eq!(parse("char", "-3").unwrap(), Scalar::I8(-3));
        assert_eq!(parse("FileSize", "42").unwrap(), Scalar::U64(42));
        assert_eq!(parse("float", "0.5").unwrap(), Scalar::F32(0.5));
        assert_eq!(parse("bool", "True").unwrap(), Scalar::Bool(true));
    }

    #[test]
    fn scalars_must_fit_their_kind() {
        assert!(fits_kind(ValueKind::Int32, &Scalar::I32(1)));
        assert!(fits_kind(ValueKind::String, &Scalar::String("a".into())));
        assert!(!fits_kind(ValueKind::Int32, &Scalar::I64(1)));
        assert!(!fits_kind(ValueKind::Float, &Scalar::F64(1.0)));
        assert!(!fits_kind(ValueKind::String, &Scalar::U8(1)));
        assert!(!fits_kind(ValueKind::None, &Scalar::Bool(true)));
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert!(matches!(
            parse("Vector3f", "1"),
            Err(DumpError::UnsupportedType(_))
        ));
        assert!(matches!(
            parse("int", "1,000"),
            Err(DumpError::MalformedNumber { .. })
        ));
        assert!(matches!(
            parse("UInt8", "256"),
            Err(DumpError::MalformedNumber { .. })
        ));
        assert!(matches!(
            parse("double", "1,5"),
            Err(DumpError::MalformedNumber { .. })
        ));
    }

    #[test]
    fn write_uses_type_width() {
        let mut w = ByteWriter::new();
        write(&mut w, "SInt16", &Scalar::I16(-2)).unwrap();
        write(&mut w, "double", &Scalar::F64(1.0)).unwrap();
        assert_eq!(w.as_bytes().len(), 10);
        assert!(matches!(
            write(&mut w, "Quaternionf", &Scalar::I32(0)),
            Err(DumpError::UnsupportedType(_))
        ));
    }

    #[test]
    fn escape_roundtrip() {
        let raw = "a\\b\r\nc";
        let esc = escape_text(raw);
        assert_eq!(esc, "a\\\\b\\r\\nc");
        assert_eq!(unescape_text(&esc), raw);
    }
}
