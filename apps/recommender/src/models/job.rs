use serde::{Deserialize, Serialize};

use crate::errors::RecommendError;
use crate::models::deserialize_id;

/// Employment type of a posting. Serialized with the labels the backend stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    #[serde(rename = "Contract")]
    Contract,
    #[serde(rename = "Internship")]
    Internship,
}

impl JobType {
    pub fn label(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
        }
    }

    /// Lenient parse for user input: accepts the labels case-insensitively
    /// with or without the hyphen.
    pub fn parse(input: &str) -> Option<Self> {
        let normalized: String = input
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "fulltime" => Some(JobType::FullTime),
            "parttime" => Some(JobType::PartTime),
            "contract" => Some(JobType::Contract),
            "internship" | "intern" => Some(JobType::Internship),
            _ => None,
        }
    }
}

/// A free-form job description used to look up matching CVs.
///
/// Optional fields are serialized as `null` when absent, never omitted, so
/// the backend always receives the full shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: JobType,
    pub salary_range: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub description: Option<String>,
    pub requirements: String,
    pub benefits: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub industry: Option<String>,
}

/// Raw form input, as typed by a user. Skills arrive as one comma-separated string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobDescriptorForm {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary_range: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub description: Option<String>,
    pub requirements: String,
    pub benefits: Option<String>,
    pub skills: Option<String>,
    pub industry: Option<String>,
}

impl JobDescriptor {
    /// Converts form input into a descriptor. Blank optional fields become
    /// `None`; skills are split on commas, trimmed, and empties dropped.
    pub fn from_form(form: JobDescriptorForm) -> Result<Self, RecommendError> {
        let job_type = match form.job_type.as_deref().map(str::trim) {
            None | Some("") => JobType::default(),
            Some(raw) => JobType::parse(raw).ok_or_else(|| {
                RecommendError::Validation(format!(
                    "Unknown job type '{raw}'. Use Full-time, Part-time, Contract or Internship"
                ))
            })?,
        };

        Ok(JobDescriptor {
            title: form.title.trim().to_string(),
            company: non_blank(form.company),
            location: non_blank(form.location),
            job_type,
            salary_range: non_blank(form.salary_range),
            experience: non_blank(form.experience),
            education: non_blank(form.education),
            description: non_blank(form.description),
            requirements: form.requirements.trim().to_string(),
            benefits: non_blank(form.benefits),
            skills: form.skills.as_deref().map(split_skills).unwrap_or_default(),
            industry: non_blank(form.industry),
        })
    }

    /// Trims the required text and every skill, dropping blank skills, so
    /// the submitted list only holds trimmed non-empty entries in order.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.requirements = self.requirements.trim().to_string();
        self.skills = self
            .skills
            .iter()
            .map(|skill| skill.trim())
            .filter(|skill| !skill.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Checks the required fields: title, requirements and at least one skill.
    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.title.trim().is_empty() {
            return Err(RecommendError::Validation(
                "Job title cannot be empty".to_string(),
            ));
        }
        if !self.skills.iter().any(|s| !s.trim().is_empty()) {
            return Err(RecommendError::Validation(
                "At least one required skill must be provided".to_string(),
            ));
        }
        if self.requirements.trim().is_empty() {
            return Err(RecommendError::Validation(
                "Candidate requirements cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Splits a comma-separated skill list, trimming each entry and dropping blanks.
pub fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A posting from the backend catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary_range: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub industry: Option<String>,
    pub working_hours: Option<String>,
    pub deadline: Option<String>,
    pub posted_date: Option<String>,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> JobDescriptorForm {
        JobDescriptorForm {
            title: "  Backend Engineer ".to_string(),
            requirements: "3+ years building services".to_string(),
            skills: Some("Rust, , Postgres ,Kafka,".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_form_trims_and_splits_skills() {
        let jd = JobDescriptor::from_form(form()).unwrap();
        assert_eq!(jd.title, "Backend Engineer");
        assert_eq!(jd.skills, vec!["Rust", "Postgres", "Kafka"]);
        assert_eq!(jd.job_type, JobType::FullTime);
        assert!(jd.validate().is_ok());
    }

    #[test]
    fn test_from_form_blank_optionals_become_none() {
        let mut f = form();
        f.company = Some("   ".to_string());
        f.location = Some("Hanoi".to_string());
        let jd = JobDescriptor::from_form(f).unwrap();
        assert_eq!(jd.company, None);
        assert_eq!(jd.location.as_deref(), Some("Hanoi"));
    }

    #[test]
    fn test_from_form_rejects_unknown_job_type() {
        let mut f = form();
        f.job_type = Some("gig".to_string());
        assert!(matches!(
            JobDescriptor::from_form(f),
            Err(RecommendError::Validation(_))
        ));
    }

    #[test]
    fn test_job_type_parse_is_lenient() {
        assert_eq!(JobType::parse("part time"), Some(JobType::PartTime));
        assert_eq!(JobType::parse("FULL-TIME"), Some(JobType::FullTime));
        assert_eq!(JobType::parse("Internship"), Some(JobType::Internship));
        assert_eq!(JobType::parse("freelance"), None);
    }

    #[test]
    fn test_validate_requires_title() {
        let mut jd = JobDescriptor::from_form(form()).unwrap();
        jd.title = " ".to_string();
        let err = jd.validate().unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_validate_requires_skills() {
        let mut f = form();
        f.skills = Some(" , ,".to_string());
        let jd = JobDescriptor::from_form(f).unwrap();
        assert!(jd.skills.is_empty());
        let err = jd.validate().unwrap_err();
        assert!(err.to_string().contains("skill"));
    }

    #[test]
    fn test_validate_requires_requirements() {
        let mut jd = JobDescriptor::from_form(form()).unwrap();
        jd.requirements.clear();
        let err = jd.validate().unwrap_err();
        assert!(err.to_string().contains("requirements"));
    }

    #[test]
    fn test_normalized_trims_and_drops_blank_skills() {
        let job = JobDescriptor {
            title: "  Frontend Developer ".to_string(),
            requirements: " React ".to_string(),
            skills: vec![" react ".to_string(), "".to_string(), "  ".to_string(), "css".to_string()],
            ..Default::default()
        }
        .normalized();

        assert_eq!(job.title, "Frontend Developer");
        assert_eq!(job.requirements, "React");
        assert_eq!(job.skills, vec!["react", "css"]);
        assert_eq!(
            serde_json::to_value(&job).unwrap()["skills"],
            serde_json::json!(["react", "css"])
        );
    }

    #[test]
    fn test_only_blank_skills_fail_after_normalizing() {
        let job = JobDescriptor {
            title: "QA".to_string(),
            requirements: "Testing".to_string(),
            skills: vec![" ".to_string(), "".to_string()],
            ..Default::default()
        }
        .normalized();
        assert!(job.skills.is_empty());
        assert!(matches!(job.validate(), Err(RecommendError::Validation(_))));
    }

    #[test]
    fn test_descriptor_serializes_absent_fields_as_null() {
        let jd = JobDescriptor::from_form(form()).unwrap();
        let value = serde_json::to_value(&jd).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 12);
        assert_eq!(obj["company"], json!(null));
        assert_eq!(obj["jobType"], json!("Full-time"));
        assert_eq!(obj["salaryRange"], json!(null));
        assert_eq!(obj["skills"], json!(["Rust", "Postgres", "Kafka"]));
    }

    #[test]
    fn test_job_accepts_numeric_id() {
        let job: Job = serde_json::from_value(json!({
            "id": 42,
            "title": "Data Analyst",
            "url": "https://example.com/jobs/42"
        }))
        .unwrap();
        assert_eq!(job.id, "42");
        assert_eq!(job.url.as_deref(), Some("https://example.com/jobs/42"));
        assert_eq!(job.company, None);
    }
}
