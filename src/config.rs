use std::path::PathBuf;
use std::time::Duration;

/// Everything a batch run needs, passed explicitly instead of living in
/// module-level constants. Defaults mirror a polite production run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Newline-delimited list of career-site base URLs.
    pub sites_file: PathBuf,
    /// Optional newline-delimited proxy list; direct connection when absent.
    pub proxies_file: Option<PathBuf>,
    /// Aggregate output document (jobs + stats).
    pub output_file: PathBuf,
    /// Resumable progress checkpoint.
    pub progress_file: PathBuf,
    /// Stats document written by the finalize step.
    pub stats_file: PathBuf,

    /// Sites per batch; output + cleared checkpoint written at each boundary.
    pub batch_size: usize,
    /// Checkpoint after this many site completions.
    pub save_every: usize,
    /// Requested jobs per listing page.
    pub per_page: usize,
    /// Hard stop on pagination per site.
    pub max_pages: usize,
    /// Run the global dedup/stats step once nothing is pending.
    pub finalize: bool,

    pub http: HttpConfig,
}

/// Retry and throttling knobs for the HTTP layer. Tests zero the delays.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub max_retries: usize,
    /// Base of the exponential backoff between retries.
    pub base_delay: Duration,
    /// Politeness delay range, slept before every attempt.
    pub polite_min: Duration,
    pub polite_max: Duration,
    pub timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            sites_file: PathBuf::from("input/retry_sites.txt"),
            proxies_file: Some(PathBuf::from("input/proxies.txt")),
            output_file: PathBuf::from("output/jobs.json"),
            progress_file: PathBuf::from("output/progress.json"),
            stats_file: PathBuf::from("output/stats.json"),
            batch_size: 20,
            save_every: 5,
            per_page: 50,
            max_pages: 500,
            finalize: true,
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            polite_min: Duration::from_millis(300),
            polite_max: Duration::from_millis(800),
            timeout: Duration::from_secs(15),
        }
    }
}

impl HttpConfig {
    /// No sleeping at all; used by unit tests.
    pub fn instant() -> Self {
        HttpConfig {
            max_retries: 3,
            base_delay: Duration::ZERO,
            polite_min: Duration::ZERO,
            polite_max: Duration::ZERO,
            timeout: Duration::from_secs(15),
        }
    }
}
