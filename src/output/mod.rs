pub mod report;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::{Engine, FilterData};
use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord {
    pub position: usize,
    pub attributes: BTreeMap<String, String>,
    pub facets: BTreeMap<String, String>,
    pub excerpt: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub source: String,
    pub results: usize,
    pub total_records: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub records: Vec<OutputRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_data: Option<FilterData>,
}

pub fn build_report(
    engine: &Engine,
    source: &str,
    with_tags: bool,
    with_filter_data: bool,
) -> Report {
    let records = engine
        .visible_records()
        .enumerate()
        .map(|(idx, record)| OutputRecord {
            position: idx + 1,
            attributes: record
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            facets: record
                .facets
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            excerpt: utils::truncate_chars(&record.text, 80).into_owned(),
        })
        .collect();

    let data = engine.filter_data();
    Report {
        source: source.to_string(),
        results: data.results,
        total_records: engine.store().len(),
        current_page: data.current_page,
        total_pages: data.total_pages,
        records,
        tags: with_tags.then(|| {
            engine
                .view()
                .tags
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|tag| tag.label.clone())
                .collect()
        }),
        filter_data: with_filter_data.then(|| engine.filter_data()),
    }
}
