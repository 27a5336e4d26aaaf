//! Avature URL patterns, discovered from live sites
//! (ally.avature.net, broadinstitute.avature.net, astellas.avature.net).
//!
//! Listing pages are plain HTML behind one of two endpoints:
//!   /careers/SearchJobs/?jobRecordsPerPage=N&jobOffset=M
//!   /careers/SearchResults/?jobRecordsPerPage=N&jobOffset=M
//! Some sites carry a locale prefix (/en_US/careers); the base URL supplied
//! by the site list already includes it.

/// Primary listing endpoint; most sites use this one.
pub const SEARCH_JOBS: &str = "SearchJobs";
/// Fallback listing endpoint seen on a minority of sites.
pub const SEARCH_RESULTS: &str = "SearchResults";

/// Both known listing-endpoint variants, probe order.
pub const LISTING_ENDPOINTS: [&str; 2] = [SEARCH_JOBS, SEARCH_RESULTS];

/// Build the paginated listing URL for one page.
pub fn build_search_url(base_url: &str, offset: usize, per_page: usize, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let endpoint = endpoint.trim_matches('/');
    format!("{base}/{endpoint}/?jobRecordsPerPage={per_page}&jobOffset={offset}")
}

/// Build a job detail URL. With a slug: /JobDetail/{slug}/{id},
/// otherwise /JobDetail?jobId={id}.
pub fn build_job_url(base_url: &str, job_id: &str, slug: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if slug.is_empty() {
        format!("{base}/JobDetail?jobId={job_id}")
    } else {
        format!("{base}/JobDetail/{slug}/{job_id}")
    }
}

/// Canonical apply URL for a job id.
pub fn build_application_url(base_url: &str, job_id: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/ApplicationMethods?jobId={job_id}")
}

/// Extract a job id from a detail URL: the `jobId` query parameter if
/// present, else the last purely-numeric path segment. Empty when neither
/// exists.
pub fn extract_job_id_from_url(url: &str) -> String {
    if let Some(rest) = url.split("jobId=").nth(1) {
        return rest.split('&').next().unwrap_or("").to_string();
    }

    url.trim_end_matches('/')
        .split('/')
        .rev()
        .find(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or("")
        .to_string()
}
