use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RunConfig;
use crate::finalize;
use crate::http_client::{HttpClient, Transport};
use crate::input;
use crate::models::Job;
use crate::proxy_pool::ProxyPool;
use crate::site_scraper::SiteScraper;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crash-safe progress checkpoint. Written as a whole-document replacement,
/// never appended, so a crash between writes cannot corrupt flushed state.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProgressState {
    pub completed: Vec<String>,
    pub jobs: Vec<Job>,
    pub failed: Vec<SiteFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteFailure {
    pub site: String,
    pub error: String,
}

/// Aggregate output: all jobs accumulated so far plus run metrics.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutputDocument {
    pub total_jobs: usize,
    pub stats: serde_json::Value,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunStats {
    pub total_sites: usize,
    pub sites_completed: usize,
    pub sites_remaining: usize,
    pub total_jobs: usize,
    pub time_seconds: f64,
    pub date: String,
}

impl ProgressState {
    /// Missing file means a fresh run; an unreadable or malformed file is
    /// surfaced, since guessing at a half-trusted checkpoint is worse than
    /// stopping.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RunError> {
        if !path.as_ref().exists() {
            info!("No progress file found. Starting fresh.");
            return Ok(ProgressState::default());
        }
        let content = fs::read_to_string(path)?;
        let state: ProgressState = serde_json::from_str(&content)?;
        info!("Resuming: {} sites done", state.completed.len());
        Ok(state)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RunError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl OutputDocument {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>, RunError> {
        if !path.as_ref().exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RunError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Drives the whole batch run: resume, per-site extraction, checkpointing,
/// output writing, and the best-effort finalize step.
pub struct Orchestrator {
    config: RunConfig,
    pool: Option<Arc<ProxyPool>>,
}

impl Orchestrator {
    pub fn new(config: RunConfig) -> Self {
        let pool = match &config.proxies_file {
            Some(path) if path.exists() => {
                let pool = ProxyPool::load(path);
                info!("Proxies: {} loaded", pool.total());
                Some(Arc::new(pool))
            }
            _ => {
                info!("Proxies: none (direct connection)");
                None
            }
        };
        Orchestrator { config, pool }
    }

    pub fn run(&self) -> Result<(), RunError> {
        let client = HttpClient::new(self.config.http.clone(), self.pool.clone());
        self.run_with_client(&client)
    }

    /// Same run loop over any transport; tests drive it with canned pages.
    pub fn run_with_client<T: Transport>(&self, client: &HttpClient<T>) -> Result<(), RunError> {
        let config = &self.config;
        if let Some(dir) = config.output_file.parent() {
            fs::create_dir_all(dir)?;
        }

        let sites = input::load_sites(&config.sites_file)?;
        let total_sites = sites.len();
        info!("Sites: {}", total_sites);

        let progress = ProgressState::load(&config.progress_file)?;
        let mut completed: HashSet<String> = progress.completed.into_iter().collect();
        let mut failed = progress.failed;

        // Jobs live in the output document after each batch boundary and in
        // the checkpoint between boundaries; resuming needs both.
        let mut all_jobs: Vec<Job> = match OutputDocument::load(&config.output_file)? {
            Some(output) => output.jobs,
            None => Vec::new(),
        };
        // Jobs below this mark are already in the output document.
        // Checkpoints carry only the suffix above it, so the two stores
        // never hold the same job and a resume merge cannot double-count.
        let mut flushed = all_jobs.len();
        all_jobs.extend(progress.jobs);
        if !all_jobs.is_empty() {
            info!("Existing jobs: {}", all_jobs.len());
        }

        let pending_count = sites.iter().filter(|s| !completed.contains(*s)).count();
        info!("Pending: {}", pending_count);

        let run_start = Instant::now();
        let mut processed_this_run = 0usize;

        loop {
            let pending: Vec<String> =
                sites.iter().filter(|s| !completed.contains(*s)).cloned().collect();
            if pending.is_empty() {
                break;
            }

            let batch: Vec<String> = pending.into_iter().take(config.batch_size).collect();
            let starting_completed = completed.len();
            info!(
                "New batch: {} sites | Remaining before batch: {}",
                batch.len(),
                total_sites.saturating_sub(starting_completed)
            );

            for (i, site_url) in batch.iter().enumerate() {
                let site_num = starting_completed + i + 1;
                let pct = if total_sites > 0 {
                    site_num as f64 * 100.0 / total_sites as f64
                } else {
                    0.0
                };
                info!("[{}/{} | {:5.1}%] {}", site_num, total_sites, pct, input::subdomain_of(site_url));

                let site_start = Instant::now();
                let scraper = SiteScraper::new(site_url, config.per_page, client);
                match scraper.extract_all(config.max_pages) {
                    Ok(jobs) => {
                        info!(
                            "  OK   jobs={}  time={:.1}s",
                            jobs.len(),
                            site_start.elapsed().as_secs_f64()
                        );
                        all_jobs.extend(jobs);
                    }
                    Err(e) => {
                        let message = e.to_string();
                        info!(
                            "  FAIL error={}  time={:.1}s",
                            truncate(&message, 50),
                            site_start.elapsed().as_secs_f64()
                        );
                        failed.push(SiteFailure { site: site_url.clone(), error: message });
                    }
                }
                // Success or failure, the site is done for this run; a
                // retry requires a curated site list.
                completed.insert(site_url.clone());

                processed_this_run += 1;
                if processed_this_run % config.save_every == 0 {
                    info!("  Checkpoint saved (jobs={})", all_jobs.len());
                    self.save_checkpoint(&completed, all_jobs[flushed..].to_vec(), &failed)?;
                }
            }

            // Batch boundary: the output document becomes the canonical job
            // store, then the checkpoint drops its copy. Output goes first
            // so a crash between the two writes loses nothing.
            let stats = self.stats(total_sites, &completed, all_jobs.len(), run_start);
            self.save_output(&all_jobs, stats)?;
            flushed = all_jobs.len();
            self.save_checkpoint(&completed, Vec::new(), &failed)?;
            info!(
                "Batch checkpoint saved ({:?}, {:?})",
                config.progress_file, config.output_file
            );
        }

        let remaining = sites.iter().filter(|s| !completed.contains(*s)).count();
        info!("BATCH DONE");
        info!("Total jobs: {}", all_jobs.len());
        info!("Remaining sites: {}", remaining);
        info!("Failed sites: {}", failed.len());
        info!("Elapsed: {:.0}s", run_start.elapsed().as_secs_f64());

        let stats = self.stats(total_sites, &completed, all_jobs.len(), run_start);
        self.save_output(&all_jobs, stats)?;
        self.save_checkpoint(&completed, Vec::new(), &failed)?;
        info!("Saved: {:?}", config.output_file);

        if config.finalize {
            info!("Running global dedup");
            match finalize::run(config) {
                Ok(stats) => info!("Global dedup completed ({} unique jobs)", stats.total_jobs),
                Err(e) => warn!("Global dedup failed: {}", e),
            }
        }

        Ok(())
    }

    fn save_checkpoint(
        &self,
        completed: &HashSet<String>,
        jobs: Vec<Job>,
        failed: &[SiteFailure],
    ) -> Result<(), RunError> {
        let mut completed: Vec<String> = completed.iter().cloned().collect();
        completed.sort();
        ProgressState { completed, jobs, failed: failed.to_vec() }
            .save(&self.config.progress_file)
    }

    fn save_output(&self, jobs: &[Job], stats: RunStats) -> Result<(), RunError> {
        OutputDocument {
            total_jobs: jobs.len(),
            stats: serde_json::to_value(stats)?,
            jobs: jobs.to_vec(),
        }
        .save(&self.config.output_file)
    }

    fn stats(
        &self,
        total_sites: usize,
        completed: &HashSet<String>,
        total_jobs: usize,
        run_start: Instant,
    ) -> RunStats {
        RunStats {
            total_sites,
            sites_completed: completed.len(),
            // The checkpoint may know sites the current list dropped.
            sites_remaining: total_sites.saturating_sub(completed.len()),
            total_jobs,
            time_seconds: (run_start.elapsed().as_secs_f64() * 10.0).round() / 10.0,
            date: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// Convenience entry point used by the binary: build everything from config
/// and run with the real transport.
pub fn run(config: RunConfig) -> Result<(), RunError> {
    Orchestrator::new(config).run()
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
