use std::collections::HashSet;

use log::{debug, info};
use url::Url;

use crate::endpoints::{self, LISTING_ENDPOINTS, SEARCH_JOBS};
use crate::http_client::{FetchError, HttpClient, Transport};
use crate::models::Job;
use crate::parser;

/// Pagination engine for one career site.
///
/// The server never tells us where the listing ends, so the loop leans on
/// several stop signals: an empty page, a page of already-seen ids (some
/// sites clamp the offset instead of returning nothing), a total-count hint
/// from the first page, and a hard page cap.
pub struct SiteScraper<'a, T: Transport> {
    base_url: String,
    per_page: usize,
    company: String,
    client: &'a HttpClient<T>,
}

impl<'a, T: Transport> SiteScraper<'a, T> {
    pub fn new(base_url: &str, per_page: usize, client: &'a HttpClient<T>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let company = company_from_url(&base_url);
        SiteScraper { base_url, per_page, company, client }
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    /// Fetch every job on the site. A fetch failure mid-pagination aborts
    /// the whole site; retries already happened inside the HTTP client.
    pub fn extract_all(&self, max_pages: usize) -> Result<Vec<Job>, FetchError> {
        let endpoint = self.detect_listing_endpoint();
        if endpoint != SEARCH_JOBS {
            info!("  Using listing endpoint: {}", endpoint);
        }

        let mut all_jobs: Vec<Job> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut offset = 0;
        // Fixed after the first successful page; the final page may be
        // shorter but the server strides uniformly.
        let mut page_size: Option<usize> = None;
        let mut total_jobs: Option<usize> = None;
        let mut page_num = 1;

        while page_num <= max_pages {
            let url =
                endpoints::build_search_url(&self.base_url, offset, self.per_page, endpoint);
            let html = self.client.get(&url)?;

            if total_jobs.is_none() {
                total_jobs = Some(parser::parse_total_jobs(&html));
            }

            let jobs = parser::parse_job_listing(&html, &self.company, &self.base_url);
            if jobs.is_empty() {
                break;
            }

            let fetched = jobs.len();
            let new_jobs: Vec<Job> =
                jobs.into_iter().filter(|j| !seen_ids.contains(&j.job_id)).collect();
            if new_jobs.is_empty() {
                debug!("  p{}: duplicate page, stopping", page_num);
                break;
            }

            for job in &new_jobs {
                seen_ids.insert(job.job_id.clone());
            }
            if page_size.is_none() {
                page_size = Some(fetched);
            }

            debug!("  p{}: {} new jobs", page_num, new_jobs.len());
            all_jobs.extend(new_jobs);

            offset += page_size.unwrap_or(fetched);
            page_num += 1;

            // Early stop once we have everything the first page promised.
            // A hint of 0 means "unknown", never "stop".
            if let Some(total) = total_jobs {
                if total > 0 && all_jobs.len() >= total {
                    break;
                }
            }
        }

        Ok(all_jobs)
    }

    /// Probe the known listing-endpoint variants at offset 0; the first one
    /// that parses to at least one job wins. Probe errors are swallowed —
    /// a site where nothing answers falls back to the primary variant and
    /// ends pagination on page one.
    fn detect_listing_endpoint(&self) -> &'static str {
        for endpoint in LISTING_ENDPOINTS {
            let url = endpoints::build_search_url(&self.base_url, 0, self.per_page, endpoint);
            let html = match self.client.get(&url) {
                Ok(html) => html,
                Err(_) => continue,
            };
            if !parser::parse_job_listing(&html, &self.company, &self.base_url).is_empty() {
                return endpoint;
            }
        }
        SEARCH_JOBS
    }
}

/// Company name derived from the first host label: "ally.avature.net" → "Ally".
pub fn company_from_url(base_url: &str) -> String {
    let host = Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    let subdomain = host.split('.').next().unwrap_or("");
    let mut chars = subdomain.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
