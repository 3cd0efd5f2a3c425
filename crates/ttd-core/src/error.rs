use thiserror::Error;

use crate::template::TemplateNode;

pub type Result<T> = std::result::Result<T, DumpError>;

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("malformed {type_name} value: {text:?}")]
    MalformedNumber { type_name: String, text: String },

    #[error("missing field {field} in JSON. Parent field is {parent_type} {parent_field}")]
    MissingField {
        field: String,
        parent_type: String,
        parent_field: String,
    },

    #[error("failed to resolve managed reference type {class_name}.{namespace} in {assembly_name}")]
    UnresolvedManagedType {
        class_name: String,
        namespace: String,
        assembly_name: String,
    },

    #[error("managed references registry version {0} is not supported")]
    UnsupportedRegistryVersion(i64),

    #[error("rid must be consecutive: expected {expected}, found {found}")]
    NonSequentialRid { expected: i64, found: i64 },

    #[error("field {field} expects {expected} in JSON")]
    InvalidJsonValue {
        field: String,
        expected: &'static str,
    },

    #[error("field {field} holds a non-finite float that JSON cannot represent")]
    NonFiniteFloat { field: String },

    #[error("value for {type_name} {field} does not match its template")]
    ValueMismatch { type_name: String, field: String },

    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: &'static str },

    #[error("negative element count {count} at {at:#x}")]
    NegativeCount { at: usize, count: i32 },

    #[error("unexpected end of data at {0:#x}")]
    UnexpectedEof(usize),

    #[error("invalid utf8 in string at {0:#x}")]
    InvalidUtf8(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DumpError {
    pub(crate) fn malformed(type_name: &str, text: &str) -> Self {
        Self::MalformedNumber {
            type_name: type_name.to_string(),
            text: text.to_string(),
        }
    }

    pub(crate) fn mismatch(t: &TemplateNode) -> Self {
        Self::ValueMismatch {
            type_name: t.type_name.clone(),
            field: t.field_name.clone(),
        }
    }
}
