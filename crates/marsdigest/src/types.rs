use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::utils::html_escape;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub teaser: String,
    pub url: Option<String>,
}

impl Display for NewsArticle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "  {}", self.teaser)?;
        if let Some(url) = &self.url {
            writeln!(f, "  {}", url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedImage {
    pub title: Option<String>,
    pub url: String,
}

impl Display for FeaturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{} ({})", title, self.url),
            None => write!(f, "{}", self.url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub text: String,
    pub sol: Option<u32>,
}

impl Display for WeatherReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sol {
            Some(sol) => write!(f, "[sol {}] {}", sol, self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub label: String,
    pub value: String,
}

impl Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Label/value rows of the facts table, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarsFacts {
    pub facts: Vec<Fact>,
}

impl MarsFacts {
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fact> {
        self.facts.iter()
    }

    /// Case-insensitive lookup; a trailing ':' on `label` is ignored.
    pub fn get(&self, label: &str) -> Option<&str> {
        let wanted = label.trim().trim_end_matches(':');
        self.facts
            .iter()
            .find(|fact| fact.label.eq_ignore_ascii_case(wanted))
            .map(|fact| fact.value.as_str())
    }

    pub fn to_html_table(&self) -> String {
        let mut html = String::from("<table class=\"table table-striped\">\n");
        html.push_str("  <thead>\n    <tr><th>Description</th><th>Value</th></tr>\n  </thead>\n");
        html.push_str("  <tbody>\n");
        for fact in &self.facts {
            html.push_str(&format!(
                "    <tr><th>{}</th><td>{}</td></tr>\n",
                html_escape(&fact.label),
                html_escape(&fact.value)
            ));
        }
        html.push_str("  </tbody>\n</table>");
        html
    }
}

impl Display for MarsFacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .facts
            .iter()
            .map(|fact| fact.label.chars().count())
            .max()
            .unwrap_or(0);
        for fact in &self.facts {
            writeln!(f, "  {:<width$}  {}", fact.label, fact.value, width = width)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HemisphereLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hemisphere {
    pub title: String,
    pub img_url: String,
}

impl Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.img_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarsDigest {
    pub news: NewsArticle,
    pub featured_image: FeaturedImage,
    pub weather: Option<WeatherReport>,
    pub facts: MarsFacts,
    pub hemispheres: Vec<Hemisphere>,
    pub scraped_at: DateTime<Utc>,
}

impl Display for MarsDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ Mars digest ─ {}", self.scraped_at.format("%Y-%m-%d %H:%M UTC"))?;
        writeln!(f, "│")?;
        writeln!(f, "── Latest news")?;
        write!(f, "{}", self.news)?;
        writeln!(f, "── Featured image")?;
        writeln!(f, "  {}", self.featured_image)?;
        writeln!(f, "── Weather")?;
        match &self.weather {
            Some(weather) => writeln!(f, "  {}", weather)?,
            None => writeln!(f, "  (skipped)")?,
        }
        writeln!(f, "── Facts")?;
        write!(f, "{}", self.facts)?;
        writeln!(f, "── Hemispheres")?;
        for (i, hemisphere) in self.hemispheres.iter().enumerate() {
            writeln!(f, "{:>2}. {}", i + 1, hemisphere)?;
        }
        Ok(())
    }
}
