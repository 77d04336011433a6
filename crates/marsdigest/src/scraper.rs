use super::browser::{BrowserError, BrowserSession};
use super::config::{BrowserOptions, DEFAULT_TIMEOUT, Sources};
use super::parser::{
    ParseError, parse_featured_image, parse_hemisphere_detail, parse_hemisphere_links,
    parse_latest_news, parse_mars_facts, parse_weather,
};
use super::types::{FeaturedImage, Hemisphere, MarsDigest, MarsFacts, NewsArticle, WeatherReport};

use chrono::Utc;
use reqwest::{Client, Url};
use std::time::Duration;

/// Matches once the profile timeline has rendered, in either markup generation.
const WEATHER_READY_SELECTOR: &str = "article div[lang], p.TweetTextSize";

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    sources: Sources,
    browser_options: BrowserOptions,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_sources(Sources::default(), DEFAULT_TIMEOUT)
    }

    pub fn with_sources(sources: Sources, timeout: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            sources,
            browser_options: BrowserOptions::default(),
        })
    }

    pub fn with_browser_options(mut self, browser_options: BrowserOptions) -> Self {
        self.browser_options = browser_options;
        self
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    pub async fn fetch_latest_news(&self) -> Result<NewsArticle, ScraperError> {
        log::info!("Fetching latest news: {}", self.sources.news);
        let (page_url, html) = self.get_html(&self.sources.news).await?;
        Ok(parse_latest_news(&html, &page_url)?)
    }

    pub async fn fetch_featured_image(&self) -> Result<FeaturedImage, ScraperError> {
        log::info!("Fetching featured image: {}", self.sources.featured_image);
        let (page_url, html) = self.get_html(&self.sources.featured_image).await?;
        Ok(parse_featured_image(&html, &page_url)?)
    }

    /// The profile page only contains posts after its scripts run, so this
    /// one goes through a headless browser on a blocking thread.
    pub async fn fetch_weather(&self) -> Result<WeatherReport, ScraperError> {
        let url = self.sources.weather.clone();
        let options = self.browser_options.clone();
        log::info!("Fetching weather report: {}", url);

        let html = tokio::task::spawn_blocking(move || {
            let session = BrowserSession::launch(&options)?;
            session.render(&url, WEATHER_READY_SELECTOR, options.render_timeout)
        })
        .await
        .map_err(|e| BrowserError::Task(e.to_string()))??;

        Ok(parse_weather(&html)?)
    }

    pub async fn fetch_mars_facts(&self) -> Result<MarsFacts, ScraperError> {
        log::info!("Fetching Mars facts: {}", self.sources.facts);
        let (_, html) = self.get_html(&self.sources.facts).await?;
        Ok(parse_mars_facts(&html)?)
    }

    /// Fetches the search page, then each hemisphere's detail page in order.
    pub async fn fetch_hemispheres(&self) -> Result<Vec<Hemisphere>, ScraperError> {
        log::info!("Fetching hemisphere index: {}", self.sources.hemispheres);
        let (index_url, html) = self.get_html(&self.sources.hemispheres).await?;
        let links = parse_hemisphere_links(&html, &index_url);
        if links.is_empty() {
            return Err(ParseError::MissingField("hemisphere links".into()).into());
        }

        let mut hemispheres = Vec::with_capacity(links.len());
        for (i, link) in links.iter().enumerate() {
            log::info!(
                "Fetching hemisphere {}/{}: {}",
                i + 1,
                links.len(),
                link.url
            );
            let (page_url, html) = self.get_html(&link.url).await?;
            hemispheres.push(parse_hemisphere_detail(&html, &page_url, &link.title)?);
        }

        Ok(hemispheres)
    }

    /// Runs every scrape in turn; the first failure is returned as is.
    pub async fn scrape_all(&self, include_weather: bool) -> Result<MarsDigest, ScraperError> {
        let news = self.fetch_latest_news().await?;
        let featured_image = self.fetch_featured_image().await?;
        let weather = if include_weather {
            Some(self.fetch_weather().await?)
        } else {
            log::warn!("Weather scrape skipped");
            None
        };
        let facts = self.fetch_mars_facts().await?;
        let hemispheres = self.fetch_hemispheres().await?;

        Ok(MarsDigest {
            news,
            featured_image,
            weather,
            facts,
            hemispheres,
            scraped_at: Utc::now(),
        })
    }

    /// Returns the body together with the final URL after redirects, which
    /// is what links on the page are relative to.
    async fn get_html(&self, url: &str) -> Result<(Url, String), ScraperError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?;
        let page_url = response.url().clone();
        let html = response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;
        Ok((page_url, html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HEMISPHERE_SLUGS: [&str; 4] = [
        "cerberus",
        "schiaparelli",
        "syrtis_major",
        "valles_marineris",
    ];

    fn fixture(name: &str) -> String {
        fs::read_to_string(format!("fixtures/{}", name)).expect("Failed to read fixture")
    }

    fn mock_sources(server: &MockServer) -> Sources {
        let uri = server.uri();
        Sources {
            news: format!("{}/news/?page=0", uri),
            featured_image: format!("{}/spaceimages/?search=&category=Mars", uri),
            weather: format!("{}/marswxreport", uri),
            facts: format!("{}/mars/", uri),
            hemispheres: format!("{}/search/results?q=hemisphere+enhanced", uri),
        }
    }

    fn mock_scraper(server: &MockServer) -> WebScraper {
        WebScraper::with_sources(mock_sources(server), Duration::from_secs(5))
            .expect("Failed to build scraper")
    }

    async fn serve(server: &MockServer, page: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn serve_hemispheres(server: &MockServer) {
        serve(server, "/search/results", fixture("hemisphere_search.html")).await;
        for slug in HEMISPHERE_SLUGS {
            let body = if slug == "cerberus" {
                fixture("hemisphere_cerberus.html")
            } else {
                format!(
                    r#"<div class="downloads"><a href="{slug}_enhanced.tif/full.jpg">Sample</a></div>"#
                )
            };
            serve(server, &format!("/search/map/Mars/Viking/{slug}_enhanced"), body).await;
        }
    }

    #[test]
    fn test_with_sources_keeps_overrides() {
        let sources = Sources {
            facts: "http://127.0.0.1:9/facts".to_string(),
            ..Sources::default()
        };

        let scraper = WebScraper::with_sources(sources.clone(), Duration::from_secs(5))
            .expect("Failed to build scraper");

        assert_eq!(scraper.sources(), &sources);
        assert_eq!(scraper.sources().news, Sources::default().news);
    }

    #[test]
    fn test_parse_error_converts_into_scraper_error() {
        let err: ScraperError = ParseError::MissingField("hemisphere links".into()).into();
        assert_eq!(
            err.to_string(),
            "Parse error: Missing required field: hemisphere links"
        );
    }

    #[test]
    fn test_browser_error_converts_into_scraper_error() {
        let err: ScraperError = BrowserError::Task("cancelled".into()).into();
        assert!(matches!(err, ScraperError::Browser(BrowserError::Task(_))));
    }

    #[tokio::test]
    async fn test_fetch_featured_image_resolves_against_page() {
        let server = MockServer::start().await;
        serve(&server, "/spaceimages/", fixture("featured_image.html")).await;

        let image = mock_scraper(&server)
            .fetch_featured_image()
            .await
            .expect("Failed to fetch featured image");

        assert_eq!(
            image.url,
            format!(
                "{}/spaceimages/images/mediumsize/PIA17932_ip.jpg",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_fetch_mars_facts_not_found() {
        let server = MockServer::start().await;

        let err = mock_scraper(&server)
            .fetch_mars_facts()
            .await
            .expect_err("A 404 should not parse");

        assert!(
            matches!(err, ScraperError::HttpError(ref e) if e.status() == Some(reqwest::StatusCode::NOT_FOUND)),
            "Expected an HTTP 404 error, got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_fetch_hemispheres_in_index_order() {
        let server = MockServer::start().await;
        serve_hemispheres(&server).await;

        let hemispheres = mock_scraper(&server)
            .fetch_hemispheres()
            .await
            .expect("Failed to fetch hemispheres");

        let titles: Vec<&str> = hemispheres.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Cerberus Hemisphere Enhanced",
                "Schiaparelli Hemisphere Enhanced",
                "Syrtis Major Hemisphere Enhanced",
                "Valles Marineris Hemisphere Enhanced",
            ]
        );
        assert_eq!(
            hemispheres[1].img_url,
            format!(
                "{}/search/map/Mars/Viking/schiaparelli_enhanced.tif/full.jpg",
                server.uri()
            )
        );

        let requested: Vec<String> = server
            .received_requests()
            .await
            .expect("Request recording should be enabled")
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        let mut expected = vec!["/search/results".to_string()];
        expected.extend(
            HEMISPHERE_SLUGS
                .iter()
                .map(|slug| format!("/search/map/Mars/Viking/{slug}_enhanced")),
        );
        assert_eq!(requested, expected);
    }

    #[tokio::test]
    async fn test_fetch_hemispheres_empty_index() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/search/results",
            r#"<div class="results"></div>"#.to_string(),
        )
        .await;

        let err = mock_scraper(&server)
            .fetch_hemispheres()
            .await
            .expect_err("An empty index should fail");

        assert!(matches!(
            err,
            ScraperError::ParseError(ParseError::MissingField(ref f)) if f == "hemisphere links"
        ));
    }

    #[tokio::test]
    async fn test_scrape_all_without_weather() {
        let server = MockServer::start().await;
        serve(&server, "/news/", fixture("news_listing.html")).await;
        serve(&server, "/spaceimages/", fixture("featured_image.html")).await;
        serve(&server, "/mars/", fixture("mars_facts.html")).await;
        serve_hemispheres(&server).await;

        let digest = mock_scraper(&server)
            .scrape_all(false)
            .await
            .expect("Failed to scrape digest");

        assert_eq!(
            digest.news.url,
            Some(format!(
                "{}/news/8805/nasas-mars-2020-rover-completes-its-first-drive/",
                server.uri()
            ))
        );
        assert!(digest.weather.is_none());
        assert_eq!(digest.facts.len(), 9);
        assert_eq!(digest.hemispheres.len(), 4);
    }

    #[tokio::test]
    async fn test_scrape_all_stops_at_first_error() {
        let server = MockServer::start().await;
        serve(&server, "/news/", fixture("news_listing.html")).await;
        serve(&server, "/spaceimages/", fixture("featured_image.html")).await;
        Mock::given(method("GET"))
            .and(path("/mars/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/results"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = mock_scraper(&server)
            .scrape_all(false)
            .await
            .expect_err("A failing facts page should abort the digest");

        assert!(
            matches!(err, ScraperError::HttpError(ref e) if e.status() == Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
            "Expected the facts error unchanged, got {err:?}"
        );
    }
}
