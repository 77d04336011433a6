use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use marsdigest::config::{BrowserOptions, Sources};
use marsdigest::scraper::WebScraper;
use marsdigest::utils::DigestStats;

#[derive(Parser)]
#[command(name = "marsdigest")]
#[command(about = "Scrape the latest Mars news, images, weather and facts", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(flatten)]
    sources: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Overrides for the pages scraped; anything left unset uses the public site.
#[derive(Debug, Args)]
struct SourceArgs {
    #[arg(long, global = true, help = "News listing page")]
    news_url: Option<String>,

    #[arg(long, global = true, help = "Featured image gallery page")]
    image_url: Option<String>,

    #[arg(long, global = true, help = "Weather report profile page")]
    weather_url: Option<String>,

    #[arg(long, global = true, help = "Planet facts page")]
    facts_url: Option<String>,

    #[arg(long, global = true, help = "Hemisphere image search page")]
    hemispheres_url: Option<String>,

    #[arg(
        long,
        global = true,
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Request and page render timeout in seconds"
    )]
    timeout: u64,

    #[arg(long, global = true, help = "Chrome/Chromium executable for the weather scrape")]
    chrome_path: Option<PathBuf>,

    #[arg(long, global = true, help = "Launch Chrome without its sandbox")]
    no_sandbox: bool,
}

impl SourceArgs {
    fn sources(&self) -> Sources {
        let mut sources = Sources::default();
        if let Some(url) = &self.news_url {
            sources.news = url.clone();
        }
        if let Some(url) = &self.image_url {
            sources.featured_image = url.clone();
        }
        if let Some(url) = &self.weather_url {
            sources.weather = url.clone();
        }
        if let Some(url) = &self.facts_url {
            sources.facts = url.clone();
        }
        if let Some(url) = &self.hemispheres_url {
            sources.hemispheres = url.clone();
        }
        sources
    }

    fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            chrome_path: self.chrome_path.clone(),
            sandbox: !self.no_sandbox,
            render_timeout: Duration::from_secs(self.timeout),
            ..BrowserOptions::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Title and teaser of the most recent news article
    News {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Full-size URL of the current featured image
    Image {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Latest weather report, rendered in a headless browser
    Weather {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Planet profile table as label/value pairs
    Facts {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(long, conflicts_with = "format", help = "Print the facts as an HTML table")]
        html: bool,
    },
    /// Title and full-resolution image URL of each hemisphere
    Hemispheres {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Run every scrape and print the assembled digest
    All {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(long, help = "Skip the weather scrape, which needs Chrome")]
        skip_weather: bool,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn exit_on_error(what: &str, e: impl std::fmt::Display) -> ! {
    log::error!("Error fetching {}: {}", what, e);
    process::exit(1);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let scraper = WebScraper::with_sources(
        cli.sources.sources(),
        Duration::from_secs(cli.sources.timeout),
    )
    .unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    })
    .with_browser_options(cli.sources.browser_options());

    match cli.command {
        Commands::News { format } => {
            let article = scraper
                .fetch_latest_news()
                .await
                .unwrap_or_else(|e| exit_on_error("latest news", e));
            match format {
                OutputFormat::Json => serialize_json(&article),
                OutputFormat::Text => print!("{}", article),
            }
        }

        Commands::Image { format } => {
            let image = scraper
                .fetch_featured_image()
                .await
                .unwrap_or_else(|e| exit_on_error("featured image", e));
            match format {
                OutputFormat::Json => serialize_json(&image),
                OutputFormat::Text => println!("{}", image),
            }
        }

        Commands::Weather { format } => {
            let report = scraper
                .fetch_weather()
                .await
                .unwrap_or_else(|e| exit_on_error("weather report", e));
            match format {
                OutputFormat::Json => serialize_json(&report),
                OutputFormat::Text => println!("{}", report),
            }
        }

        Commands::Facts { format, html } => {
            let facts = scraper
                .fetch_mars_facts()
                .await
                .unwrap_or_else(|e| exit_on_error("Mars facts", e));
            if html {
                println!("{}", facts.to_html_table());
            } else {
                match format {
                    OutputFormat::Json => serialize_json(&facts),
                    OutputFormat::Text => print!("{}", facts),
                }
            }
        }

        Commands::Hemispheres { format } => {
            let hemispheres = scraper
                .fetch_hemispheres()
                .await
                .unwrap_or_else(|e| exit_on_error("hemispheres", e));
            match format {
                OutputFormat::Json => serialize_json(&hemispheres),
                OutputFormat::Text => {
                    for (i, hemisphere) in hemispheres.iter().enumerate() {
                        println!("{:>2}. {}", i + 1, hemisphere);
                    }
                }
            }
        }

        Commands::All {
            format,
            skip_weather,
        } => {
            let digest = scraper
                .scrape_all(!skip_weather)
                .await
                .unwrap_or_else(|e| exit_on_error("Mars digest", e));
            match format {
                OutputFormat::Json => serialize_json(&digest),
                OutputFormat::Text => {
                    print!("{}", digest);
                    print!("{}", DigestStats::from_digest(&digest));
                }
            }
        }
    }
}
