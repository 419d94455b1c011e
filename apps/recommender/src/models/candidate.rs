use std::path::Path;

use bytes::Bytes;

use crate::errors::TransportError;

/// Accepted CV document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Doc,
    Docx,
}

impl DocumentKind {
    pub fn mime(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Doc => "application/msword",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "doc" => Some(DocumentKind::Doc),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    fn from_declared(declared: &str) -> Option<Self> {
        let declared = declared.trim().to_lowercase();
        [DocumentKind::Pdf, DocumentKind::Doc, DocumentKind::Docx]
            .into_iter()
            .find(|kind| kind.mime() == declared)
            .or_else(|| Self::from_extension(&declared))
    }
}

/// A CV selected for upload.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    /// Advisory only; displayed, never enforced.
    pub byte_size: u64,
    /// Declared MIME type or bare extension, if the source supplied one.
    pub mime_or_extension: Option<String>,
    pub content: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            byte_size: content.len() as u64,
            mime_or_extension: None,
            content,
        }
    }

    pub fn with_declared_type(mut self, declared: impl Into<String>) -> Self {
        self.mime_or_extension = Some(declared.into());
        self
    }

    /// Reads a CV from disk; the declared type is taken from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, TransportError> {
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("cv")
            .to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let mut file = CandidateFile::new(name, content);
        file.mime_or_extension = extension;
        Ok(file)
    }

    /// Format by file name extension first, then by the declared type.
    pub fn document_kind(&self) -> Option<DocumentKind> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentKind::from_extension)
            .or_else(|| {
                self.mime_or_extension
                    .as_deref()
                    .and_then(DocumentKind::from_declared)
            })
    }

    pub fn is_accepted(&self) -> bool {
        self.document_kind().is_some()
    }

    /// Size in megabytes with two decimals, e.g. `"1.50 MB"`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.byte_size as f64 / 1024.0 / 1024.0)
    }
}
