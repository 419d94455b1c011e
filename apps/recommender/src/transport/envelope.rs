use serde::{Deserialize, Serialize};

use crate::errors::TransportError;
use crate::models::recommendation::deserialize_raw_list;
use crate::models::{Job, RecommendationRaw};

/// The `{ success, data?, error?, message? }` wrapper every backend call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: Option<bool>,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: Some(true),
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            data: None,
            error: Some(message.into()),
            message: None,
        }
    }

    /// Server-reported reason, preferring `error` over `message`.
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "request failed".to_string())
    }

    /// Requires `success: true`. An HTTP 200 with `success: false` (or no
    /// flag at all) is a functional failure. The data may still be absent.
    pub fn into_success(self) -> Result<Option<T>, TransportError> {
        if self.success == Some(true) {
            Ok(self.data)
        } else {
            Err(TransportError::Rejected(self.failure_message()))
        }
    }

    /// For endpoints that report no `success` flag: only an explicit
    /// `success: false` is a failure, and the data must be present.
    pub fn into_data(self) -> Result<T, TransportError> {
        if self.success == Some(false) {
            return Err(TransportError::Rejected(self.failure_message()));
        }
        self.data.ok_or(TransportError::MissingData)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatusData {
    #[serde(default)]
    pub is_model_built: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCvData {
    #[serde(default, deserialize_with = "deserialize_raw_list")]
    pub job_recommendations: Option<Vec<RecommendationRaw>>,
    pub total_recommendations: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvMatchData {
    #[serde(default, deserialize_with = "deserialize_raw_list")]
    pub recommendations: Option<Vec<RecommendationRaw>>,
    #[serde(rename = "totalCVsAnalyzed")]
    pub total_cvs_analyzed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsData {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobData {
    pub job: Job,
}
