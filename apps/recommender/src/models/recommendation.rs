use serde::{Deserialize, Serialize};
use serde_json::Value;

use serde::Deserializer;
use tracing::warn;

use crate::models::{deserialize_opt_id, deserialize_opt_text};

/// A recommendation as the backend returns it.
///
/// Job recommendations carry `jobId`/`jobTitle`, CV recommendations carry
/// `cvId`/`cvOwner`. Either `score` (0..1) or a precomputed `matchPercentage`
/// may be present, not necessarily both; both are kept as raw JSON so that a
/// malformed value degrades one item instead of failing the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRaw {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub job_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub cv_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub job_title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub cv_owner: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub file_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub job_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub url: Option<String>,
    pub score: Option<Value>,
    pub match_percentage: Option<Value>,
}

/// Deserializes a recommendation list item by item. An entry that is not an
/// object (e.g. `null`) becomes an empty record, which normalizes to score 0,
/// so one bad entry never rejects the whole response.
pub(crate) fn deserialize_raw_list<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<RecommendationRaw>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(items) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let raw = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).unwrap_or_else(|err| {
                warn!("Unusable recommendation at position {}: {}", index, err);
                RecommendationRaw::default()
            })
        })
        .collect();
    Ok(Some(raw))
}

/// Backend-shape-independent match result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub subject_id: String,
    pub display_name: String,
    /// Always within [0, 1].
    pub score_fraction: f64,
    /// Percentage without a `%` sign: one decimal place when derived from
    /// `score` (`"87.3"`), as sent when the backend precomputed it.
    pub percentage_label: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}
