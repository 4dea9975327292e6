use lib::storage::StoredFile;
use poem_openapi::Object;

use crate::services::extraction;

#[derive(Debug, Clone, Object)]
pub struct SourceFile {
    /// The file name. Identity within the lesson; re-uploading the same name
    /// overwrites.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Whether the file format can be used for text extraction and
    /// generation. Unsupported files are stored but skipped by the
    /// generation steps.
    pub supported: bool,
}

#[derive(Debug, Clone, Object)]
pub struct FileContent {
    /// The extracted plain text.
    pub text: String,
}

#[derive(Debug, Clone, Object)]
pub struct FileAnalysis {
    /// Structured summary of the file's key points.
    pub analysis: String,
}

impl From<StoredFile> for SourceFile {
    fn from(file: StoredFile) -> Self {
        Self {
            supported: extraction::is_supported(&file.name),
            name: file.name,
            size: file.size,
        }
    }
}
