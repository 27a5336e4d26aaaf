//! HTML parsing for Avature job-listing pages.
//!
//! The listing markup is loose and varies between sites, so every field
//! beyond the title link is best-effort: each heuristic is its own function
//! returning an optional/defaulted value, and a card that blows a required
//! field is skipped without failing the page.

use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::endpoints;
use crate::models::{now_timestamp, Job};

/// Parse one listing page into job records. Cards missing a title link or a
/// job id are skipped.
pub fn parse_job_listing(html: &str, company: &str, base_url: &str) -> Vec<Job> {
    let document = Html::parse_document(html);
    let card_selector = Selector::parse("article").unwrap();

    let mut jobs = Vec::new();
    for article in document.select(&card_selector) {
        match parse_job_card(article, company, base_url) {
            Some(job) => jobs.push(job),
            None => debug!("Skipped a job card on {}", base_url),
        }
    }
    jobs
}

fn parse_job_card(article: ElementRef, company: &str, base_url: &str) -> Option<Job> {
    let title_selector = Selector::parse("h3 a").unwrap();
    let title_link = article.select(&title_selector).next()?;

    let title = element_text(title_link);
    let href = title_link.value().attr("href").unwrap_or("");
    let job_url = resolve_url(base_url, href);

    let job_id = endpoints::extract_job_id_from_url(&job_url);
    if job_id.is_empty() {
        return None;
    }

    let (location, date_posted) = parse_job_info(article, &title);
    let description = parse_description(article);
    let application_url = parse_apply_url(article, base_url, &job_id);

    Some(Job {
        job_id,
        title,
        company: company.to_string(),
        location,
        description,
        application_url,
        date_posted,
        category: None,
        employment_type: None,
        source_url: job_url,
        scraped_at: now_timestamp(),
    })
}

/// Find the info div carrying both "Ref" and "Posted" and split it into
/// location and posted date. Some sites prepend the job title to this text.
fn parse_job_info(article: ElementRef, title: &str) -> (String, Option<String>) {
    let div_selector = Selector::parse("div").unwrap();

    for div in article.select(&div_selector) {
        let text = element_text(div);
        if text.contains("Posted") && text.contains("Ref") {
            let text = if !title.is_empty() && text.starts_with(title) {
                text[title.len()..].to_string()
            } else {
                text
            };
            return extract_location_and_date(&text);
        }
    }

    ("Unknown".to_string(), None)
}

/// Split info text like `"Charlotte , NC , USA , Ref #21505 . Posted
/// Jan-30-2026"`: the date comes from the Posted pattern, the location is
/// the comma-joined prefix before any Ref/Posted segment.
fn extract_location_and_date(text: &str) -> (String, Option<String>) {
    let date_re = Regex::new(r"Posted\s+([A-Za-z]+-\d{1,2}-\d{4})").unwrap();
    let date_posted = date_re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let mut location = "Unknown".to_string();
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() >= 2 {
        let mut location_parts = Vec::new();
        for part in &parts {
            let part = part.trim();
            if part.contains("Ref") || part.contains("Posted") {
                break;
            }
            location_parts.push(part);
        }
        if !location_parts.is_empty() {
            let joined = clean_text(&location_parts.join(", "));
            location = joined.trim_end_matches([' ', ',', '.']).to_string();
        }
    }

    (location, date_posted)
}

/// Description preview: the last top-level div with a substantial text block
/// that is not the posted-date line or an apply notice.
fn parse_description(article: ElementRef) -> String {
    let divs: Vec<ElementRef> = article
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "div")
        .collect();

    for div in divs.iter().rev() {
        let text = element_text(*div);
        if text.len() > 50 && !text.contains("Posted") && !text.contains("Apply") {
            return clean_text(&text);
        }
    }

    String::new()
}

/// Explicit apply link when the card has one, constructed URL otherwise.
fn parse_apply_url(article: ElementRef, base_url: &str, job_id: &str) -> String {
    let apply_selector = Selector::parse(r#"a[href*="ApplicationMethods"]"#).unwrap();
    if let Some(link) = article.select(&apply_selector).next() {
        let href = link.value().attr("href").unwrap_or("");
        if !href.is_empty() {
            return resolve_url(base_url, href);
        }
    }

    endpoints::build_application_url(base_url, job_id)
}

/// Total job count from the "N results" phrase anywhere on the page.
/// Returns 0 when no such phrase exists, which callers treat as "unknown".
pub fn parse_total_jobs(html: &str) -> usize {
    let document = Html::parse_document(html);
    let phrase_re = Regex::new(r"\d+\s*results?").unwrap();
    let of_re = Regex::new(r"of\s+(\d+)").unwrap();
    let count_re = Regex::new(r"(\d+)\s*results?").unwrap();

    for node in document.root_element().text() {
        if phrase_re.is_match(node) {
            if let Some(caps) = of_re.captures(node) {
                if let Ok(n) = caps[1].parse() {
                    return n;
                }
            }
            if let Some(caps) = count_re.captures(node) {
                if let Ok(n) = caps[1].parse() {
                    return n;
                }
            }
        }
    }
    0
}

/// Collapse runs of whitespace into single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn resolve_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    if let Ok(base) = Url::parse(base_url) {
        if let Ok(joined) = base.join(href) {
            return joined.to_string();
        }
    }
    format!("{}{}", base_url.trim_end_matches('/'), href)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://ally.avature.net/careers";

    fn card(inner: &str) -> String {
        format!("<html><body><article>{inner}</article></body></html>")
    }

    #[test]
    fn parses_a_full_card() {
        let html = card(
            r#"
            <h3><a href="/careers/JobDetail/Senior-Engineer/15738">Senior Engineer</a></h3>
            <div>Senior EngineerCharlotte , NC , USA , Ref #21505 . Posted Jan-30-2026</div>
            <div>We are looking for an engineer to own our settlement pipeline end to end.</div>
            "#,
        );

        let jobs = parse_job_listing(&html, "Ally", BASE);
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.job_id, "15738");
        assert_eq!(job.title, "Senior Engineer");
        assert_eq!(job.company, "Ally");
        assert_eq!(job.location, "Charlotte, NC, USA");
        assert_eq!(job.date_posted.as_deref(), Some("Jan-30-2026"));
        assert_eq!(
            job.application_url,
            "https://ally.avature.net/careers/ApplicationMethods?jobId=15738"
        );
        assert_eq!(
            job.source_url,
            "https://ally.avature.net/careers/JobDetail/Senior-Engineer/15738"
        );
        assert!(job.description.contains("settlement pipeline"));
        assert!(job.is_valid());
    }

    #[test]
    fn card_without_title_link_is_skipped() {
        let html = card("<div>Charlotte , NC , USA , Ref #1 . Posted Jan-1-2026</div>");
        assert!(parse_job_listing(&html, "Ally", BASE).is_empty());
    }

    #[test]
    fn card_without_job_id_is_skipped() {
        let html = card(r#"<h3><a href="/careers/JobDetail/No-Numeric-Id">Engineer</a></h3>"#);
        assert!(parse_job_listing(&html, "Ally", BASE).is_empty());
    }

    #[test]
    fn job_id_from_query_parameter() {
        let html = card(r#"<h3><a href="/careers/JobDetail?jobId=42">Engineer</a></h3>"#);
        let jobs = parse_job_listing(&html, "Ally", BASE);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, "42");
    }

    #[test]
    fn splits_location_and_date() {
        let (location, date) =
            extract_location_and_date("Austin, TX, USA, Ref #9, Posted Jan-5-2026");
        assert_eq!(location, "Austin, TX, USA");
        assert_eq!(date.as_deref(), Some("Jan-5-2026"));
    }

    #[test]
    fn info_without_location_defaults_to_unknown() {
        let (location, date) = extract_location_and_date("Ref #9. Posted Feb-14-2026");
        assert_eq!(location, "Unknown");
        assert_eq!(date.as_deref(), Some("Feb-14-2026"));
    }

    #[test]
    fn explicit_apply_link_wins_over_constructed_url() {
        let html = card(
            r#"
            <h3><a href="/careers/JobDetail/Engineer/7">Engineer</a></h3>
            <div><a href="/careers/ApplicationMethods?jobId=7&src=card">Apply now</a></div>
            "#,
        );
        let jobs = parse_job_listing(&html, "Ally", BASE);
        assert_eq!(
            jobs[0].application_url,
            "https://ally.avature.net/careers/ApplicationMethods?jobId=7&src=card"
        );
    }

    #[test]
    fn total_jobs_prefers_of_count() {
        let html = "<html><body><div>Showing 1 - 6 of 66 results</div></body></html>";
        assert_eq!(parse_total_jobs(html), 66);
    }

    #[test]
    fn total_jobs_falls_back_to_leading_count() {
        let html = "<html><body><span>133 results</span></body></html>";
        assert_eq!(parse_total_jobs(html), 133);
    }

    #[test]
    fn total_jobs_absent_is_zero() {
        assert_eq!(parse_total_jobs("<html><body><p>Welcome</p></body></html>"), 0);
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a\n  b\t c  "), "a b c");
    }
}
