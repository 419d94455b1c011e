use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use recommender::models::{Job, JobDescriptor, JobDescriptorForm, SalaryReport};
use recommender::RecommendationSet;

#[derive(Parser, Debug)]
#[command(name = "recommender", version)]
#[command(about = "Match CVs and jobs through the recommendation backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend base URL (overrides RECOMMENDER_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload one or more CVs (PDF, DOC, DOCX) and list matching jobs
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Describe a job and list matching CVs
    CustomJob(CustomJobArgs),
    /// List CVs matching a job from the catalog
    CvsForJob { job_id: String },
    /// List catalog jobs
    Jobs {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show a single catalog job
    Job { job_id: String },
    /// Average salary per job category
    SalaryReport,
    /// Show whether the scoring model is built
    ModelStatus {
        /// Build the model if it is not built yet
        #[arg(long)]
        build: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct CustomJobArgs {
    /// Read the job description from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["title", "requirements", "skills"])]
    pub from_json: Option<PathBuf>,
    #[arg(long)]
    pub title: Option<String>,
    /// Comma-separated, e.g. "react, typescript"
    #[arg(long)]
    pub skills: Option<String>,
    #[arg(long)]
    pub requirements: Option<String>,
    /// Full-time, Part-time, Contract or Internship
    #[arg(long)]
    pub job_type: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub salary_range: Option<String>,
    #[arg(long)]
    pub experience: Option<String>,
    #[arg(long)]
    pub education: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub benefits: Option<String>,
    #[arg(long)]
    pub industry: Option<String>,
}

impl CustomJobArgs {
    pub async fn load(self) -> Result<JobDescriptor> {
        let form = match &self.from_json {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str::<JobDescriptorForm>(&raw)
                    .with_context(|| format!("{} is not a valid job description", path.display()))?
            }
            None => self.into_form(),
        };
        Ok(JobDescriptor::from_form(form)?)
    }

    fn into_form(self) -> JobDescriptorForm {
        JobDescriptorForm {
            title: self.title.unwrap_or_default(),
            company: self.company,
            location: self.location,
            job_type: self.job_type,
            salary_range: self.salary_range,
            experience: self.experience,
            education: self.education,
            description: self.description,
            requirements: self.requirements.unwrap_or_default(),
            benefits: self.benefits,
            skills: self.skills,
            industry: self.industry,
        }
    }
}

/// Ranked lines, `#<rank> <name> <label>%`, plus summary and warnings.
pub fn render_recommendations(set: &RecommendationSet) -> Vec<String> {
    let mut lines = Vec::with_capacity(set.items.len() + 2);

    if set.partial_rejection() {
        lines.push(format!(
            "Skipped unsupported files: {}",
            set.rejected_files.join(", ")
        ));
    }

    for (rank, item) in set.items.iter().enumerate() {
        let mut line = format!("#{} {} {}%", rank + 1, item.display_name, item.percentage_label);
        match (&item.company, &item.location) {
            (Some(company), Some(location)) => line.push_str(&format!(" ({company}, {location})")),
            (Some(company), None) => line.push_str(&format!(" ({company})")),
            (None, Some(location)) => line.push_str(&format!(" ({location})")),
            (None, None) => {}
        }
        lines.push(line);
    }

    lines.push(match set.total_analyzed {
        Some(total) => format!("Found {} recommendations out of {}", set.items.len(), total),
        None => format!("Found {} recommendations", set.items.len()),
    });
    lines
}

pub fn render_jobs(jobs: &[Job]) -> Vec<String> {
    jobs.iter()
        .map(|job| {
            format!(
                "{}\t{}\t{}",
                job.id,
                job.title.as_deref().unwrap_or("Untitled"),
                job.company.as_deref().unwrap_or("-")
            )
        })
        .collect()
}

pub fn render_job(job: &Job) -> Vec<String> {
    let fields = [
        ("Company", &job.company),
        ("Location", &job.location),
        ("Type", &job.job_type),
        ("Salary", &job.salary_range),
        ("Experience", &job.experience),
        ("Education", &job.education),
        ("Industry", &job.industry),
        ("Working hours", &job.working_hours),
        ("Deadline", &job.deadline),
        ("Posted", &job.posted_date),
        ("Requirements", &job.requirements),
        ("Benefits", &job.benefits),
        ("Description", &job.description),
        ("URL", &job.url),
    ];

    let mut lines = vec![format!(
        "{} (id {})",
        job.title.as_deref().unwrap_or("Untitled"),
        job.id
    )];
    lines.extend(
        fields
            .iter()
            .filter_map(|(label, value)| value.as_deref().map(|v| format!("  {label}: {v}"))),
    );
    lines
}

pub fn render_salary_report(report: &SalaryReport) -> Vec<String> {
    if report.average_salaries.is_empty() {
        return vec!["No salary data".to_string()];
    }
    report
        .average_salaries
        .iter()
        .map(|bucket| format!("{}\t{:.0}", bucket.category, bucket.average_salary))
        .collect()
}
