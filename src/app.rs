use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::engine::{Engine, EngineError};
use crate::gather::{GatherError, HttpFetcher, PageFetcher};
use crate::markup::RangeSide;
use crate::output::{self, OutputFormat};
use crate::utils;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Config(String),

    #[error("no source page provided (use --page or --url)")]
    NoSource,

    #[error("failed to read page '{path}': {source}")]
    PageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Gather(#[from] GatherError),

    #[error("failed to write output '{path}': {source}")]
    OutputWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Effective settings after layering CLI flags over the config file.
struct Settings {
    page: Option<String>,
    url: Option<String>,
    filters: Vec<String>,
    ranges: Vec<String>,
    search: Option<String>,
    sort: Option<String>,
    page_number: Option<usize>,
    timeout: u64,
    output: Option<String>,
    format: Option<String>,
    tags: bool,
    filter_data: bool,
}

fn merge(args: CliArgs, config: ConfigFile) -> Settings {
    Settings {
        page: args.page.or(config.page),
        url: args.url.or(config.url),
        filters: if args.filter.is_empty() {
            config.filters.unwrap_or_default()
        } else {
            args.filter
        },
        ranges: if args.range.is_empty() {
            config.ranges.unwrap_or_default()
        } else {
            args.range
        },
        search: args.search.or(config.search),
        sort: args.sort.or(config.sort),
        page_number: args.page_number.or(config.page_number),
        timeout: args
            .timeout
            .or(config.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        output: args.output.or(config.output),
        format: args.format.or(config.output_format),
        tags: args.tags,
        filter_data: args.filter_data,
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cardsift={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

pub async fn run() -> Result<(), AppError> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);
    if args.no_color {
        colored::control::set_override(false);
    }
    validation::validate(&args).map_err(AppError::InvalidArgs)?;

    let explicit_config = args.config.clone();
    let config = match explicit_config {
        Some(path) => {
            let path = config::expand_tilde(&path);
            config::load_config(&path, false).map_err(AppError::Config)?
        }
        None => match config::default_config_path() {
            Some(path) => {
                if let Err(error) = config::ensure_default_config_file(&path) {
                    warn!(%error, "could not seed default config");
                }
                config::load_config(&path, true).map_err(AppError::Config)?
            }
            None => ConfigFile::default(),
        },
    };

    let settings = merge(args, config);
    let fetcher = HttpFetcher::new(Duration::from_secs(settings.timeout))?;

    let (source, html) = load_page(&settings, &fetcher).await?;
    let mut engine = Engine::from_page(&html)?;

    let progress = crawl_progress();
    engine.initialize(&fetcher, &progress).await;
    progress.finish_and_clear();

    apply_settings(&mut engine, &settings);

    let format = settings
        .format
        .as_deref()
        .and_then(OutputFormat::parse)
        .or_else(|| {
            settings
                .output
                .as_deref()
                .and_then(output::infer_format_from_path)
        })
        .unwrap_or(OutputFormat::Text);

    let report = output::build_report(&engine, &source, settings.tags, settings.filter_data);
    let rendered = match format {
        OutputFormat::Text => output::report::render_text(&report),
        OutputFormat::Json => output::report::render_json(&report),
    };

    match settings.output.as_deref() {
        Some(path) => {
            let expanded = config::expand_tilde_string(path);
            tokio::fs::write(&expanded, rendered.as_bytes())
                .await
                .map_err(|e| AppError::OutputWrite {
                    path: expanded.clone(),
                    source: e,
                })?;
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

async fn load_page(
    settings: &Settings,
    fetcher: &HttpFetcher,
) -> Result<(String, String), AppError> {
    if let Some(path) = settings.page.as_deref() {
        let expanded = config::expand_tilde_string(path);
        let html = tokio::fs::read_to_string(&expanded)
            .await
            .map_err(|e| AppError::PageRead {
                path: expanded.clone(),
                source: e,
            })?;
        return Ok((expanded, html));
    }
    if let Some(url) = settings.url.as_deref() {
        let html = fetcher.fetch(url).await?;
        return Ok((url.to_string(), html));
    }
    Err(AppError::NoSource)
}

/// Pushes the requested filter state into the engine's controls and
/// runs one apply cycle, then walks to the requested page.
fn apply_settings(engine: &mut Engine, settings: &Settings) {
    for raw in &settings.filters {
        let Ok((category, value)) = utils::parse_key_value(raw) else {
            continue;
        };
        let hit = engine.set_checked(&category, &value, true)
            || engine.set_text(&category, &value);
        if !hit {
            warn!(category = %category, value = %value, "no control matches this filter");
        }
    }
    for raw in &settings.ranges {
        let Ok((category, from, to)) = utils::parse_range_flag(raw) else {
            continue;
        };
        let mut hit = false;
        if let Some(from) = from {
            hit |= engine.set_range_value(&category, RangeSide::From, &from.to_string());
        }
        if let Some(to) = to {
            hit |= engine.set_range_value(&category, RangeSide::To, &to.to_string());
        }
        if !hit {
            warn!(category = %category, "no range control matches this filter");
        }
    }
    if let Some(search) = settings.search.as_deref() {
        if !engine.set_text(crate::filter::WILDCARD_CATEGORY, search) {
            warn!("page has no global search control");
        }
    }
    if let Some(sort) = settings.sort.as_deref() {
        if !engine.set_sort(sort) {
            warn!(sort = %sort, "sort value not offered by the page");
        }
    }
    engine.submit();

    if let Some(target) = settings.page_number {
        for _ in 1..target {
            engine.next_page();
        }
    }
}

fn crawl_progress() -> ProgressBar {
    let progress = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} gathering source pages {pos}/{len}")
    {
        progress.set_style(style);
    }
    progress
}
