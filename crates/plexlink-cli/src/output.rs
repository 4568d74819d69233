use clap::ValueEnum;
use owo_colors::OwoColorize;
use plexlink_models::{CatalogRoute, ResolutionFailure, WatchedItem};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

const CATALOG_WEB_BASE: &str = "https://www.themoviedb.org";

/// Web page of a route, e.g. https://www.themoviedb.org/tv/1437/season/1/episode/1
pub fn catalog_url(route: &CatalogRoute) -> String {
    format!("{}/{}", CATALOG_WEB_BASE, route)
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message("success", msg.as_ref(), |m| println!("{} {}", "✓".green(), m));
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message("info", msg.as_ref(), |m| println!("{}", m));
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message("warning", msg.as_ref(), |m| println!("{} {}", "⚠".yellow(), m));
    }

    fn message(&self, kind: &str, msg: &str, human: impl FnOnce(&str)) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => human(msg),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": kind, "message": msg }));
            }
        }
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }
        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(data).unwrap_or_default()),
            OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(data).unwrap_or_default()),
            OutputFormat::Human => println!("{}", data),
        }
    }

    /// Rail heading, human format only
    pub fn heading(&self, title: &str) {
        if self.quiet || !self.is_human() {
            return;
        }
        println!("\n{}", title.bright_cyan().bold());
    }

    /// One history row, optionally with its resolution outcome
    pub fn row(&self, item: &WatchedItem, outcome: Option<&Result<CatalogRoute, ResolutionFailure>>) {
        if self.quiet || !self.is_human() {
            return;
        }
        let subtitle = item.display_subtitle();
        if subtitle.is_empty() {
            println!("  {}", item.display_title().bold());
        } else {
            println!("  {}  {}", item.display_title().bold(), subtitle.dimmed());
        }
        match outcome {
            Some(Ok(route)) => println!("    {} {}", "→".green(), catalog_url(route)),
            Some(Err(failure)) => println!("    {} {}", "✗".red(), failure),
            None => {}
        }
    }

    /// Full diagnosis of a failed resolution
    pub fn failure(&self, failure: &ResolutionFailure) {
        if !self.is_human() {
            self.print_json(&json!({ "type": "failure", "failure": failure }));
            return;
        }
        eprintln!("{} Could not open this item in TMDB", "✗".red());
        eprintln!("  Step:   {}", failure.step);
        if let Some(reason) = &failure.reason {
            eprintln!("  Reason: {}", reason);
        }
        for note in &failure.notes {
            eprintln!("    - {}", note.dimmed());
        }
        if let Some(query) = &failure.search_query {
            eprintln!(
                "  Try searching instead: {}/search?query={}",
                CATALOG_WEB_BASE,
                urlencoding::encode(query)
            );
        }
    }
}
