//! Post-run collaborator: global dedup and the stats report.
//!
//! Runs once every pending site has been processed. The orchestrator treats
//! it as best-effort; any error here is logged and never fails the run.

use std::collections::HashMap;

use chrono::Local;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::models::Job;
use crate::orchestrator::{OutputDocument, RunError};

const TOP_N: usize = 10;

#[derive(Debug, Serialize, Deserialize)]
pub struct FinalStats {
    pub total_jobs: usize,
    pub total_companies: usize,
    pub duplicates_removed: usize,
    pub top_companies: Vec<CompanyCount>,
    pub top_locations: Vec<LocationCount>,
    pub generated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompanyCount {
    pub company: String,
    pub jobs: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationCount {
    pub location: String,
    pub jobs: usize,
}

/// Deduplicate the output document by job id (first occurrence wins), write
/// the stats document, and rewrite the output with the deduped list.
pub fn run(config: &RunConfig) -> Result<FinalStats, RunError> {
    let output = OutputDocument::load(&config.output_file)?.unwrap_or(OutputDocument {
        total_jobs: 0,
        stats: serde_json::Value::Null,
        jobs: Vec::new(),
    });

    let before = output.jobs.len();
    let unique_jobs = dedup_by_job_id(output.jobs);
    let removed = before - unique_jobs.len();
    info!("Dedup: {} jobs -> {} unique ({} removed)", before, unique_jobs.len(), removed);

    let companies = count_by(&unique_jobs, |j| j.company.as_str());
    let top_companies = top_n(&companies, TOP_N)
        .into_iter()
        .map(|(company, jobs)| CompanyCount { company, jobs })
        .collect();
    let locations = count_by(&unique_jobs, |j| j.location.as_str());
    let top_locations = top_n(&locations, TOP_N)
        .into_iter()
        .map(|(location, jobs)| LocationCount { location, jobs })
        .collect();

    let stats = FinalStats {
        total_jobs: unique_jobs.len(),
        total_companies: companies.len(),
        duplicates_removed: removed,
        top_companies,
        top_locations,
        generated_at: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
    };

    let json = serde_json::to_string_pretty(&stats)?;
    std::fs::write(&config.stats_file, json)?;

    OutputDocument {
        total_jobs: unique_jobs.len(),
        stats: serde_json::to_value(&stats)?,
        jobs: unique_jobs,
    }
    .save(&config.output_file)?;

    for entry in &stats.top_companies {
        info!("  {}: {} jobs", entry.company, entry.jobs);
    }

    Ok(stats)
}

fn dedup_by_job_id(jobs: Vec<Job>) -> Vec<Job> {
    let mut seen = std::collections::HashSet::new();
    jobs.into_iter()
        .filter(|job| !job.job_id.is_empty() && seen.insert(job.job_id.clone()))
        .collect()
}

fn count_by<'a, F>(jobs: &'a [Job], key: F) -> HashMap<String, usize>
where
    F: Fn(&'a Job) -> &'a str,
{
    let mut counts = HashMap::new();
    for job in jobs {
        *counts.entry(key(job).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Highest counts first; ties broken by name so the report is stable.
fn top_n(counts: &HashMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> =
        counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpConfig, RunConfig};
    use crate::models::now_timestamp;

    fn job(id: &str, company: &str, location: &str) -> Job {
        Job {
            job_id: id.to_string(),
            title: format!("Role {id}"),
            company: company.to_string(),
            location: location.to_string(),
            description: String::new(),
            application_url: format!("https://x.avature.net/careers/ApplicationMethods?jobId={id}"),
            date_posted: None,
            category: None,
            employment_type: None,
            source_url: String::new(),
            scraped_at: now_timestamp(),
        }
    }

    fn config_in(dir: &std::path::Path) -> RunConfig {
        RunConfig {
            sites_file: dir.join("sites.txt"),
            proxies_file: None,
            output_file: dir.join("jobs.json"),
            progress_file: dir.join("progress.json"),
            stats_file: dir.join("stats.json"),
            batch_size: 20,
            save_every: 5,
            per_page: 50,
            max_pages: 500,
            finalize: true,
            http: HttpConfig::instant(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let jobs = vec![job("1", "A", "X"), job("2", "B", "Y"), job("1", "C", "Z")];
        let unique = dedup_by_job_id(jobs);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].company, "A");
    }

    #[test]
    fn writes_stats_and_rewrites_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let jobs = vec![
            job("1", "Ally", "Charlotte, NC, USA"),
            job("2", "Ally", "Detroit, MI, USA"),
            job("2", "Ally", "Detroit, MI, USA"),
            job("3", "Astellas", "Tokyo, Japan"),
        ];
        OutputDocument {
            total_jobs: jobs.len(),
            stats: serde_json::Value::Null,
            jobs,
        }
        .save(&config.output_file)
        .unwrap();

        let stats = run(&config).unwrap();
        assert_eq!(stats.total_jobs, 3);
        assert_eq!(stats.duplicates_removed, 1);
        assert_eq!(stats.total_companies, 2);
        assert_eq!(stats.top_companies[0].company, "Ally");
        assert_eq!(stats.top_companies[0].jobs, 2);

        let output = OutputDocument::load(&config.output_file).unwrap().unwrap();
        assert_eq!(output.total_jobs, 3);
        assert_eq!(output.jobs.len(), 3);
        assert!(config.stats_file.exists());
    }

    #[test]
    fn missing_output_document_yields_empty_stats() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let stats = run(&config).unwrap();
        assert_eq!(stats.total_jobs, 0);
        assert_eq!(stats.duplicates_removed, 0);
    }
}
