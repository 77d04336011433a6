use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use super::types::{
    Fact, FeaturedImage, Hemisphere, HemisphereLink, MarsFacts, NewsArticle, WeatherReport,
};
use super::utils::{absolute_url, normalize_whitespace};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Invalid table: {0}")]
    InvalidTable(String),
    #[error("Cannot resolve link '{href}' against {page}")]
    InvalidUrl { href: String, page: String },
}

static RE_BACKGROUND_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("invalid regex: background url")
});

static RE_SOL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsol\s+(\d+)").expect("invalid regex: sol number"));

static RE_PIC_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*pic\.twitter\.com/\S+").expect("invalid regex: pic link")
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector '{css}': {e}"))
}

fn elem_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn first_text(scope: ElementRef, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .map(elem_text)
        .find(|text| !text.is_empty())
}

fn first_attr(scope: ElementRef, sel: &Selector, attr: &str) -> Option<String> {
    scope
        .select(sel)
        .filter_map(|e| e.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn resolve(page_url: &Url, href: &str) -> Result<String, ParseError> {
    absolute_url(page_url, href).ok_or_else(|| ParseError::InvalidUrl {
        href: href.to_string(),
        page: page_url.to_string(),
    })
}

pub fn parse_latest_news(html: &str, page_url: &Url) -> Result<NewsArticle, ParseError> {
    let document = Html::parse_document(html);
    let item_sel = selector("div.list_text, li.slide");
    let title_sel = selector("div.content_title");
    let title_link_sel = selector("div.content_title a[href]");
    let any_link_sel = selector("a[href]");
    let teaser_sel = selector("div.article_teaser_body, div.rollover_description_inner");

    let scope = document
        .select(&item_sel)
        .next()
        .unwrap_or_else(|| document.root_element());

    let title_link = scope.select(&title_link_sel).next();
    let title = title_link
        .map(elem_text)
        .filter(|t| !t.is_empty())
        .or_else(|| first_text(scope, &title_sel))
        .ok_or_else(|| ParseError::MissingField("news title".into()))?;

    let teaser = first_text(scope, &teaser_sel)
        .ok_or_else(|| ParseError::MissingField("news teaser".into()))?;

    let url = title_link
        .or_else(|| scope.select(&any_link_sel).next())
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| absolute_url(page_url, href));

    Ok(NewsArticle { title, teaser, url })
}

pub fn parse_featured_image(html: &str, page_url: &Url) -> Result<FeaturedImage, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let full_image_sel = selector("a#full_image");
    let carousel_sel = selector("article.carousel_item");
    let img_sel = selector("img.headerimage, img.fancybox-image");
    let feature_title_sel = selector("h1.media_feature_title");

    let path = first_attr(root, &full_image_sel, "data-fancybox-href")
        .or_else(|| {
            root.select(&carousel_sel)
                .filter_map(|e| e.value().attr("style"))
                .find_map(|style| {
                    RE_BACKGROUND_URL
                        .captures(style)
                        .map(|caps| caps[1].trim().to_string())
                })
        })
        .or_else(|| first_attr(root, &img_sel, "src"))
        .ok_or_else(|| ParseError::MissingField("featured image url".into()))?;

    let title = first_attr(root, &full_image_sel, "data-title")
        .or_else(|| first_attr(root, &carousel_sel, "alt"))
        .or_else(|| first_text(root, &feature_title_sel))
        .map(|t| normalize_whitespace(&t));

    Ok(FeaturedImage {
        title,
        url: resolve(page_url, &path)?,
    })
}

/// Returns the most recent post in a rendered profile page.
///
/// Posts appear newest first and the first one is taken as is; `sol` is only
/// filled in when that post carries a sol number. Current markup keeps post
/// text in `div[lang]` inside each `article`; the legacy `p.TweetTextSize`
/// layout is tried when no article matches.
pub fn parse_weather(html: &str) -> Result<WeatherReport, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let candidates = [
        selector("article div[lang]"),
        selector("p.TweetTextSize"),
        selector("[data-testid=\"tweetText\"]"),
    ];

    let text = candidates
        .iter()
        .find_map(|sel| first_text(root, sel))
        .map(|text| RE_PIC_LINK.replace_all(&text, "").trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ParseError::MissingField("weather post".into()))?;

    let sol = RE_SOL_NUMBER
        .captures(&text)
        .and_then(|caps| caps[1].parse::<u32>().ok());

    Ok(WeatherReport { text, sol })
}

/// Pairs the cells of the facts table: even cells are labels, odd cells values.
pub fn parse_mars_facts(html: &str) -> Result<MarsFacts, ParseError> {
    let document = Html::parse_document(html);
    let preferred_sel = selector("table#tablepress-p-mars");
    let table_sel = selector("table");
    let cell_sel = selector("td");

    let table = document
        .select(&preferred_sel)
        .next()
        .or_else(|| document.select(&table_sel).next())
        .ok_or_else(|| ParseError::MissingField("facts table".into()))?;

    let cells: Vec<String> = table.select(&cell_sel).map(elem_text).collect();
    if cells.is_empty() {
        return Err(ParseError::InvalidTable("facts table has no cells".into()));
    }

    let pairs = cells.chunks_exact(2);
    if let [dangling] = pairs.remainder() {
        log::warn!("Dropping unpaired facts cell '{}'", dangling);
    }

    let facts = pairs
        .map(|pair| Fact {
            label: pair[0].trim_end_matches(':').trim().to_string(),
            value: pair[1].clone(),
        })
        .collect::<Vec<_>>();

    if facts.is_empty() {
        return Err(ParseError::InvalidTable(
            "facts table has no label/value pairs".into(),
        ));
    }

    Ok(MarsFacts { facts })
}

/// Collects the detail-page links from the hemisphere search results.
///
/// Each result links twice (thumbnail and title); the first occurrence keeps
/// its position and takes the title from whichever link carries an `h3`.
pub fn parse_hemisphere_links(html: &str, page_url: &Url) -> Vec<HemisphereLink> {
    let document = Html::parse_document(html);
    let link_sel = selector("div.item a.itemLink[href], div.description a.itemLink[href]");
    let heading_sel = selector("h3");

    let mut links: Vec<HemisphereLink> = Vec::new();

    for link in document.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(url) = absolute_url(page_url, href) else {
            log::warn!("Skipping unresolvable hemisphere link '{}'", href);
            continue;
        };
        let title = first_text(link, &heading_sel).unwrap_or_default();

        match links.iter_mut().find(|l| l.url == url) {
            Some(existing) => {
                if existing.title.is_empty() {
                    existing.title = title;
                }
            }
            None => links.push(HemisphereLink { title, url }),
        }
    }

    links
}

/// The index title is kept verbatim; the page's own `h2.title` only fills in
/// when the index had none.
pub fn parse_hemisphere_detail(
    html: &str,
    page_url: &Url,
    index_title: &str,
) -> Result<Hemisphere, ParseError> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let title_sel = selector("h2.title");
    let download_sel = selector("div.downloads a[href]");
    let wide_image_sel = selector("img.wide-image");

    let title = Some(normalize_whitespace(index_title))
        .filter(|t| !t.is_empty())
        .or_else(|| first_text(root, &title_sel))
        .ok_or_else(|| ParseError::MissingField("hemisphere title".into()))?;

    let downloads: Vec<ElementRef> = root.select(&download_sel).collect();
    let href = downloads
        .iter()
        .find(|a| elem_text(**a).eq_ignore_ascii_case("sample"))
        .or_else(|| downloads.first())
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
        .or_else(|| first_attr(root, &wide_image_sel, "src"))
        .ok_or_else(|| ParseError::MissingField(format!("image for '{}'", title)))?;

    Ok(Hemisphere {
        img_url: resolve(page_url, &href)?,
        title,
    })
}
