pub mod candidate;
pub mod job;
pub mod recommendation;
pub mod report;

pub use candidate::{CandidateFile, DocumentKind};
pub use job::{Job, JobDescriptor, JobDescriptorForm, JobType};
pub use recommendation::{Recommendation, RecommendationRaw};
pub use report::{SalaryBucket, SalaryReport};

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// Backend ids arrive as either numbers or strings.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).ok_or_else(|| de::Error::custom(format!("invalid id: {value}")))
}

pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}

/// Free-text fields: strings pass through, numbers and booleans are
/// stringified, anything else is treated as absent.
pub(crate) fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
