use serde::{Deserialize, Serialize};

/// Average salary for one job category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBucket {
    pub category: String,
    pub average_salary: f64,
}

/// Body of `GET /report/analyze-jobs`. Not wrapped in the usual envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryReport {
    #[serde(default)]
    pub average_salaries: Vec<SalaryBucket>,
}
