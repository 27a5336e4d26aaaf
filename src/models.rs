use chrono::Local;
use serde::{Deserialize, Serialize};

/// One job posting parsed from an Avature listing page.
///
/// A job is only constructed when both `job_id` and `application_url` are
/// known; the parser skips cards that cannot produce both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub title: String,
    pub company: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub application_url: String,
    pub date_posted: Option<String>,
    // Reserved: the listing pages do not expose these, detail pages might.
    pub category: Option<String>,
    pub employment_type: Option<String>,
    #[serde(default)]
    pub source_url: String,
    pub scraped_at: String,
}

fn default_location() -> String {
    "Unknown".to_string()
}

impl Job {
    pub fn is_valid(&self) -> bool {
        !self.job_id.is_empty() && !self.application_url.is_empty()
    }
}

/// Timestamp recorded on every job at parse time.
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job {
            job_id: "15738".to_string(),
            title: "Site Reliability Engineer".to_string(),
            company: "Ally".to_string(),
            location: "Charlotte, NC, USA".to_string(),
            description: String::new(),
            application_url: "https://ally.avature.net/careers/ApplicationMethods?jobId=15738"
                .to_string(),
            date_posted: Some("Jan-30-2026".to_string()),
            category: None,
            employment_type: None,
            source_url: "https://ally.avature.net/careers/JobDetail/Sre/15738".to_string(),
            scraped_at: now_timestamp(),
        }
    }

    #[test]
    fn valid_requires_id_and_apply_url() {
        let job = sample_job();
        assert!(job.is_valid());

        let mut no_id = job.clone();
        no_id.job_id.clear();
        assert!(!no_id.is_valid());

        let mut no_apply = job;
        no_apply.application_url.clear();
        assert!(!no_apply.is_valid());
    }

    #[test]
    fn roundtrips_through_json() {
        let job = sample_job();
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back.job_id, job.job_id);
        assert_eq!(back.location, job.location);
        assert_eq!(back.date_posted, job.date_posted);
    }
}
