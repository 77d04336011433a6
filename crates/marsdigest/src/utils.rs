use reqwest::Url;

use crate::types::MarsDigest;

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves `href` as found on a page against that page's own URL.
pub fn absolute_url(page_url: &Url, href: &str) -> Option<String> {
    page_url
        .join(href.trim())
        .inspect_err(|e| log::warn!("Cannot resolve '{}' against {}: {}", href, page_url, e))
        .ok()
        .map(String::from)
}

pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug)]
pub struct DigestStats {
    pub facts: usize,
    pub hemispheres: usize,
    pub weather: bool,
}

impl DigestStats {
    pub fn from_digest(digest: &MarsDigest) -> DigestStats {
        DigestStats {
            facts: digest.facts.len(),
            hemispheres: digest.hemispheres.len(),
            weather: digest.weather.is_some(),
        }
    }
}

impl std::fmt::Display for DigestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Facts:            {}", self.facts)?;
        writeln!(f, "  Hemispheres:      {}", self.hemispheres)?;
        writeln!(
            f,
            "  Weather captured: {}",
            if self.weather { "yes" } else { "no" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        let page = Url::parse("https://astrogeology.usgs.gov/search/results?q=hemisphere")
            .expect("Failed to parse URL");

        assert_eq!(
            absolute_url(&page, "/search/map/Mars/Viking/cerberus_enhanced").as_deref(),
            Some("https://astrogeology.usgs.gov/search/map/Mars/Viking/cerberus_enhanced")
        );
        assert_eq!(
            absolute_url(&page, "map/full.jpg").as_deref(),
            Some("https://astrogeology.usgs.gov/search/map/full.jpg"),
            "Path-relative links resolve against the page's directory"
        );
        assert_eq!(
            absolute_url(&page, "?page=2").as_deref(),
            Some("https://astrogeology.usgs.gov/search/results?page=2"),
            "Query-only links keep the page path"
        );
        assert_eq!(
            absolute_url(&page, "https://example.com/a.jpg").as_deref(),
            Some("https://example.com/a.jpg")
        );
        assert_eq!(
            absolute_url(&page, "//cdn.example.com/a.jpg").as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
        assert_eq!(absolute_url(&page, "http://[::1"), None);
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<b>Tom & \"Jerry\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
        );
        assert_eq!(html_escape("-87 to -5 °C"), "-87 to -5 °C");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  NASA's   Mars\n\t Rover  "),
            "NASA's Mars Rover"
        );
    }
}
