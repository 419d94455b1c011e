//! Upload Packager: filters candidate files down to the accepted formats and
//! wraps them into one transport-ready payload.

use tracing::{info, warn};

use crate::errors::RecommendError;
use crate::models::CandidateFile;

/// Multipart field for a single CV.
pub const SINGLE_FILE_FIELD: &str = "cvFile";
/// Repeated multipart field for several CVs.
pub const MULTI_FILE_FIELD: &str = "cvFiles";

/// Files that survived format filtering, plus what was dropped.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub files: Vec<CandidateFile>,
    pub rejected: Vec<String>,
}

impl UploadPayload {
    /// True when some, but not all, supplied files were dropped.
    pub fn partial_rejection(&self) -> bool {
        !self.rejected.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.rejected.len()
    }

    pub fn field_name(&self) -> &'static str {
        if self.files.len() == 1 {
            SINGLE_FILE_FIELD
        } else {
            MULTI_FILE_FIELD
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.byte_size).sum()
    }
}

/// Packages one or more CVs. Unsupported files are dropped, not fatal; the
/// call only fails when nothing was supplied or nothing is left.
pub fn package(files: Vec<CandidateFile>) -> Result<UploadPayload, RecommendError> {
    if files.is_empty() {
        return Err(RecommendError::Validation(
            "Select at least one CV file (PDF, DOC or DOCX)".to_string(),
        ));
    }

    let (accepted, rejected): (Vec<CandidateFile>, Vec<CandidateFile>) =
        files.into_iter().partition(CandidateFile::is_accepted);
    let rejected: Vec<String> = rejected.into_iter().map(|f| f.name).collect();

    if accepted.is_empty() {
        warn!("All {} selected files have unsupported formats", rejected.len());
        return Err(RecommendError::Validation(format!(
            "No valid CV files. Supported formats: PDF, DOC, DOCX. Rejected: {}",
            rejected.join(", ")
        )));
    }

    if !rejected.is_empty() {
        warn!(
            "Dropping {} unsupported file(s) from upload: {}",
            rejected.len(),
            rejected.join(", ")
        );
    }

    let payload = UploadPayload {
        files: accepted,
        rejected,
    };
    info!(
        "Packaged {} CV file(s), {} bytes",
        payload.files.len(),
        payload.total_bytes()
    );
    Ok(payload)
}
