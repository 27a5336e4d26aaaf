use std::fs;
use std::io;
use std::path::Path;

use url::Url;

/// Load the site list: one career-site base URL per line, blanks skipped.
pub fn load_sites<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// First host label of a site URL, used for compact log lines.
pub fn subdomain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
        .split('.')
        .next()
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_trimmed_nonempty_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://a.avature.net/careers").unwrap();
        writeln!(file, "  ").unwrap();
        writeln!(file, " https://b.avature.net/careers ").unwrap();

        let sites = load_sites(file.path()).unwrap();
        assert_eq!(
            sites,
            vec!["https://a.avature.net/careers", "https://b.avature.net/careers"]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_sites("does/not/exist.txt").is_err());
    }

    #[test]
    fn subdomain_is_first_host_label() {
        assert_eq!(subdomain_of("https://ally.avature.net/careers"), "ally");
    }
}
