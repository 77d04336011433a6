// Headless Chrome session for pages that only fill in their content after
// scripts run. One browser per session; Chrome exits when it is dropped.

use std::ffi::OsStr;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};

use crate::config::BrowserOptions;

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Failed to launch headless Chrome (is Chrome/Chromium installed?): {0}")]
    Launch(String),
    #[error("Failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Timed out after {timeout:?} waiting for '{selector}' on {url}")]
    Timeout {
        url: String,
        selector: String,
        timeout: Duration,
    },
    #[error("Browser task failed: {0}")]
    Task(String),
}

pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    pub fn launch(options: &BrowserOptions) -> Result<Self, BrowserError> {
        log::info!("Launching headless Chrome browser");

        let (width, height) = options.window_size;
        let flags = [
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-dev-shm-usage".to_string(),
            format!("--user-agent={}", options.user_agent),
        ];

        let launch_options = LaunchOptions {
            headless: true,
            sandbox: options.sandbox,
            path: options.chrome_path.clone(),
            window_size: Some((width, height)),
            args: flags.iter().map(OsStr::new).collect(),
            ..Default::default()
        };

        let browser =
            Browser::new(launch_options).map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Loads `url` in a fresh tab and returns the document once
    /// `wait_selector` matches.
    pub fn render(
        &self,
        url: &str,
        wait_selector: &str,
        timeout: Duration,
    ) -> Result<String, BrowserError> {
        let navigation_error = |e: anyhow::Error| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let tab = self.browser.new_tab().map_err(navigation_error)?;

        log::info!("Rendering {}", url);
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(navigation_error)?;

        log::debug!("Waiting up to {:?} for '{}'", timeout, wait_selector);
        tab.wait_for_element_with_custom_timeout(wait_selector, timeout)
            .map_err(|e| {
                log::error!("Wait error: {e:?}");
                BrowserError::Timeout {
                    url: url.to_string(),
                    selector: wait_selector.to_string(),
                    timeout,
                }
            })?;

        let html = tab.get_content().map_err(navigation_error)?;

        if let Err(e) = tab.close(true) {
            log::warn!("Failed to close tab for {}: {}", url, e);
        }

        Ok(html)
    }
}
