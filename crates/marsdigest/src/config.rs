use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Every page the digest is assembled from. Links found on a page are
/// resolved against that page's final URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub news: String,
    pub featured_image: String,
    pub weather: String,
    pub facts: String,
    pub hemispheres: String,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            news: "https://mars.nasa.gov/news/?page=0&per_page=40&order=publish_date+desc%2Ccreated_at+desc&category=19%2C165%2C184%2C204&blank_scope=Latest".to_string(),
            featured_image: "https://www.jpl.nasa.gov/spaceimages/?search=&category=Mars"
                .to_string(),
            weather: "https://twitter.com/marswxreport?lang=en".to_string(),
            facts: "https://space-facts.com/mars/".to_string(),
            hemispheres: "https://astrogeology.usgs.gov/search/results?q=hemisphere+enhanced&k1=target&v1=Mars".to_string(),
        }
    }
}

/// Launch settings for the headless browser used by the weather scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Chrome/Chromium executable. `None` lets headless_chrome locate one.
    pub chrome_path: Option<PathBuf>,
    pub sandbox: bool,
    pub window_size: (u32, u32),
    pub user_agent: String,
    /// How long to wait for the post markup to appear after navigation.
    pub render_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            sandbox: true,
            window_size: (1920, 1080),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            render_timeout: DEFAULT_TIMEOUT,
        }
    }
}
