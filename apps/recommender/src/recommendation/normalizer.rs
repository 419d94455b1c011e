//! Response Normalizer: maps heterogeneous backend recommendations onto the
//! canonical `Recommendation` record.
//!
//! Pure: no I/O, no reordering. The input order is the server's ranking.

use serde_json::Value;
use tracing::warn;

use crate::models::{Recommendation, RecommendationRaw};

const UNTITLED: &str = "Untitled";

/// Normalizes a batch. A malformed item is scored 0 instead of failing the
/// batch, so the output always has the same length as the input.
pub fn normalize(raw: &[RecommendationRaw]) -> Vec<Recommendation> {
    raw.iter().map(normalize_one).collect()
}

pub fn normalize_one(raw: &RecommendationRaw) -> Recommendation {
    let subject_id = raw
        .job_id
        .clone()
        .or_else(|| raw.cv_id.clone())
        .or_else(|| raw.id.clone())
        .unwrap_or_default();

    let (score_fraction, percentage_label) = match resolve_score(raw) {
        Some(resolved) => resolved,
        None => {
            warn!(
                "Recommendation '{}' has no usable score or matchPercentage; scoring as 0",
                subject_id
            );
            (0.0, to_fixed_1(0.0))
        }
    };

    let display_name = [&raw.job_title, &raw.cv_owner, &raw.title, &raw.file_name]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| UNTITLED.to_string());

    Recommendation {
        subject_id,
        display_name,
        score_fraction,
        percentage_label,
        company: raw.company.clone(),
        location: raw.location.clone(),
        description: raw.description.clone(),
        url: raw.job_url.clone().or_else(|| raw.url.clone()),
    }
}

/// A precomputed `matchPercentage` wins and its label is kept as sent;
/// otherwise `score` must be a finite fraction in [0, 1].
fn resolve_score(raw: &RecommendationRaw) -> Option<(f64, String)> {
    if let Some((percent, label)) = raw
        .match_percentage
        .as_ref()
        .and_then(parse_percentage)
    {
        return Some(((percent / 100.0).clamp(0.0, 1.0), label));
    }

    let score = raw.score.as_ref().and_then(parse_number)?;
    if !(0.0..=1.0).contains(&score) {
        return None;
    }
    Some((score, to_fixed_1(score * 100.0)))
}

/// Accepts `73.2`, `"73.2"` and `"73.2%"`, returning the value and its label
/// without the `%`. Values outside [0, 100] are rejected.
fn parse_percentage(value: &Value) -> Option<(f64, String)> {
    let label = match value {
        Value::String(s) => s.trim().trim_end_matches('%').trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let percent = label.parse::<f64>().ok()?;
    (percent.is_finite() && (0.0..=100.0).contains(&percent)).then_some((percent, label))
}

fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// One decimal place, rounding the exact binary value like JavaScript's
/// `toFixed(1)`: `0.15000000000000002` -> `"0.2"`, `0.14999999999999999` -> `"0.1"`.
///
/// `{:.1}` already rounds the exact value; it only differs on exact midpoints,
/// where it picks the even digit and `toFixed` picks the larger magnitude. A
/// double is an exact midpoint of tenths only when it is an odd multiple of 0.25.
pub fn to_fixed_1(value: f64) -> String {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return format!("{:.1}", (value * 10.0).round() / 10.0);
    }
    format!("{:.1}", value)
}
