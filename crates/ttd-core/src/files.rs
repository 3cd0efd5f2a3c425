// External file table consulted for `m_FileID` comments in text dumps.
use serde::{Deserialize, Serialize};

/// Read-only view of the containing document's file references.
pub trait FileTable: Send + Sync {
    /// Display name of the document itself (file id 0).
    fn file_name(&self) -> &str;
    /// Comment text for a non-zero file id, without the parentheses.
    fn resolve_file_id(&self, file_id: i32) -> Option<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFile {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub guid: String,
}

impl ExternalFile {
    fn display(&self) -> String {
        if self.path.is_empty() {
            format!("guid: {}", self.guid)
        } else {
            base_name(&self.path).to_string()
        }
    }
}

/// File id `n >= 1` maps to `externals[n - 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFiles {
    pub file_name: String,
    #[serde(default)]
    pub externals: Vec<ExternalFile>,
}

impl FileTable for ExternalFiles {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn resolve_file_id(&self, file_id: i32) -> Option<String> {
        let idx = usize::try_from(file_id).ok()?.checked_sub(1)?;
        self.externals.get(idx).map(ExternalFile::display)
    }
}

/// Comment for an `m_FileID` value, or `None` when it cannot be resolved.
pub fn file_id_comment(table: &dyn FileTable, file_id: i32) -> Option<String> {
    if file_id == 0 {
        Some(table.file_name().to_string())
    } else {
        table.resolve_file_id(file_id)
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
