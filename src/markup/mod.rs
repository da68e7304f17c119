use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::record::RecordSource;
use crate::utils;

pub const ATTR_ELEMENT: &str = "wt-cmsfilter-element";
pub const ATTR_CATEGORY: &str = "wt-cmsfilter-category";
pub const ATTR_RANGE: &str = "wt-cmsfilter-range";
pub const ATTR_LOAD_MODE: &str = "wt-cmsfilter-loadmode";
pub const ATTR_TRIGGER: &str = "wt-cmsfilter-trigger";
pub const ATTR_DEBOUNCE: &str = "wt-cmsfilter-debounce";
pub const ATTR_FILTERING: &str = "wt-cmsfilter-filtering";
pub const ATTR_ACTIVE_CLASS: &str = "wt-cmsfilter-class";
pub const ATTR_TAG_CATEGORY: &str = "wt-cmsfilter-tag-category";
pub const ATTR_DEFAULT: &str = "wt-cmsfilter-default";
pub const ATTR_PAGINATION: &str = "wt-cmsfilter-pagination";

/// Class Webflow stamps on its native page counter; the crawl reads
/// the "current / total" indicator from it.
pub const PAGE_COUNT_CLASS: &str = "w-page-count";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("filter form not found ([wt-cmsfilter-element=\"filter-form\"])")]
    MissingFilterForm,

    #[error("list container not found ([wt-cmsfilter-element=\"list\"])")]
    MissingListContainer,

    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

fn selector(raw: &str) -> Result<Selector, ScanError> {
    Selector::parse(raw).map_err(|e| ScanError::Selector {
        selector: raw.to_string(),
        message: e.to_string(),
    })
}

fn role_selector(role: &str) -> Result<Selector, ScanError> {
    selector(&format!("[{ATTR_ELEMENT}=\"{role}\"]"))
}

/// How the engine treats the source list: gather every remote page up
/// front and render the whole set, or slice it page by page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadMode {
    #[default]
    LoadAll,
    Paginate,
}

impl LoadMode {
    /// Older widget generations used the attribute's mere presence to
    /// mean "gather all"; only an explicit `paginate` selects slicing.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("paginate") => Self::Paginate,
            _ => Self::LoadAll,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerMode {
    #[default]
    Live,
    Button,
}

impl TriggerMode {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("button") => Self::Button,
            _ => Self::Live,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleKind {
    Checkbox,
    Radio,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeSide {
    From,
    To,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputScan {
    Toggle {
        kind: ToggleKind,
        label: String,
        checked: bool,
    },
    Text {
        value: String,
    },
    RangeEndpoint {
        side: RangeSide,
        value: String,
        default: Option<f64>,
    },
}

/// One category-bound control found inside the filter form. A control
/// element without a usable input still binds its category.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlScan {
    pub category: String,
    pub input: Option<InputScan>,
}

#[derive(Clone, Debug)]
pub struct FormScan {
    pub advanced: bool,
    pub trigger: TriggerMode,
    pub debounce_ms: Option<u64>,
    pub active_class: Option<String>,
    pub controls: Vec<ControlScan>,
}

#[derive(Clone, Debug)]
pub struct ListScan {
    pub load_mode: LoadMode,
    pub records: Vec<RecordSource>,
}

#[derive(Clone, Debug, Default)]
pub struct PaginationScan {
    pub indicator: Option<String>,
    pub base_link: Option<String>,
    pub has_prev: bool,
    pub has_next: bool,
    pub has_custom_prev: bool,
    pub has_custom_next: bool,
    pub has_counter: bool,
}

#[derive(Clone, Debug)]
pub struct SortScan {
    pub options: Vec<String>,
    pub initial: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TagTemplateScan {
    pub show_category: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Collaborators {
    pub pagination: Option<PaginationScan>,
    pub has_clear_all: bool,
    pub sort: Option<SortScan>,
    pub has_result_count: bool,
    pub has_empty: bool,
    pub tag_template: Option<TagTemplateScan>,
}

/// Everything the engine needs, lifted out of one pass over the page.
/// Nothing holds onto the parsed document afterwards.
#[derive(Clone, Debug)]
pub struct PageScan {
    pub form: FormScan,
    pub list: ListScan,
    pub collaborators: Collaborators,
}

pub fn scan_page(html: &str) -> Result<PageScan, ScanError> {
    let document = Html::parse_document(html);

    let form_el = document
        .select(&role_selector("filter-form")?)
        .next()
        .ok_or(ScanError::MissingFilterForm)?;
    let list_el = document
        .select(&role_selector("list")?)
        .next()
        .ok_or(ScanError::MissingListContainer)?;

    let form = scan_form(form_el)?;
    let list = ListScan {
        load_mode: LoadMode::parse(list_el.value().attr(ATTR_LOAD_MODE)),
        records: record_sources(list_el)?,
    };
    let collaborators = scan_collaborators(&document)?;

    Ok(PageScan {
        form,
        list,
        collaborators,
    })
}

/// Records of the list container in a fetched source page.
pub fn list_records(html: &str) -> Result<Vec<RecordSource>, ScanError> {
    let document = Html::parse_document(html);
    let list_el = document
        .select(&role_selector("list")?)
        .next()
        .ok_or(ScanError::MissingListContainer)?;
    record_sources(list_el)
}

fn record_sources(list_el: ElementRef<'_>) -> Result<Vec<RecordSource>, ScanError> {
    let facet_sel = selector(&format!("[{ATTR_CATEGORY}]"))?;
    let mut out = Vec::new();
    for child in list_el.children().filter_map(ElementRef::wrap) {
        let mut attributes = HashMap::new();
        for (name, value) in child.value().attrs() {
            if let Some(key) = utils::dataset_key_from_attr(name) {
                attributes.insert(key, value.to_string());
            }
        }
        let mut facets = HashMap::new();
        for facet in child.select(&facet_sel) {
            if let Some(category) = facet.value().attr(ATTR_CATEGORY) {
                facets
                    .entry(category.to_string())
                    .or_insert_with(|| utils::normalize_text(&text_of(facet)));
            }
        }
        out.push(RecordSource {
            attributes,
            facets,
            text: utils::normalize_text(&text_of(child)),
            html: child.html(),
        });
    }
    Ok(out)
}

fn scan_form(form_el: ElementRef<'_>) -> Result<FormScan, ScanError> {
    let control_sel = selector(&format!("[{ATTR_CATEGORY}]"))?;
    let input_sel = selector("input[type=\"checkbox\"], input[type=\"radio\"], input[type=\"text\"]")?;

    let mut controls = Vec::new();
    for control_el in form_el.select(&control_sel) {
        let Some(category) = control_el.value().attr(ATTR_CATEGORY) else {
            continue;
        };
        controls.push(ControlScan {
            category: category.to_string(),
            input: scan_input(control_el, &input_sel),
        });
    }

    let attr = |name: &str| form_el.value().attr(name);
    Ok(FormScan {
        advanced: attr(ATTR_FILTERING).map(str::trim) == Some("advanced"),
        trigger: TriggerMode::parse(attr(ATTR_TRIGGER)),
        debounce_ms: attr(ATTR_DEBOUNCE).and_then(|v| v.trim().parse().ok()),
        active_class: attr(ATTR_ACTIVE_CLASS)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        controls,
    })
}

fn scan_input(control_el: ElementRef<'_>, input_sel: &Selector) -> Option<InputScan> {
    let (input_el, input_type) = if control_el.value().name().eq_ignore_ascii_case("input") {
        let ty = control_el.value().attr("type").unwrap_or("text");
        (control_el, ty.to_string())
    } else {
        let found = control_el.select(input_sel).next()?;
        let ty = found.value().attr("type").unwrap_or("text");
        (found, ty.to_string())
    };

    match input_type.as_str() {
        "checkbox" | "radio" => {
            let kind = if input_type == "checkbox" {
                ToggleKind::Checkbox
            } else {
                ToggleKind::Radio
            };
            Some(InputScan::Toggle {
                kind,
                label: toggle_label(input_el),
                checked: input_el.value().attr("checked").is_some(),
            })
        }
        "text" => {
            let value = input_el.value().attr("value").unwrap_or_default().to_string();
            match range_side(control_el, input_el) {
                Some(side) => Some(InputScan::RangeEndpoint {
                    side,
                    value,
                    default: input_el
                        .value()
                        .attr(ATTR_DEFAULT)
                        .and_then(utils::parse_number),
                }),
                None => Some(InputScan::Text { value }),
            }
        }
        _ => None,
    }
}

/// The toggle's visible label is its next sibling element's text.
fn toggle_label(input_el: ElementRef<'_>) -> String {
    input_el
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .map(|el| utils::normalize_text(&text_of(el)))
        .unwrap_or_default()
}

fn range_side(control_el: ElementRef<'_>, input_el: ElementRef<'_>) -> Option<RangeSide> {
    let raw = control_el
        .value()
        .attr(ATTR_RANGE)
        .or_else(|| input_el.value().attr(ATTR_RANGE))?;
    match raw.trim() {
        "from" => Some(RangeSide::From),
        "to" => Some(RangeSide::To),
        _ => None,
    }
}

fn scan_collaborators(document: &Html) -> Result<Collaborators, ScanError> {
    let exists = |role: &str| -> Result<bool, ScanError> {
        Ok(document.select(&role_selector(role)?).next().is_some())
    };

    let pagination = match document.select(&role_selector("pagination-wrapper")?).next() {
        Some(wrapper) => Some(scan_pagination(document, wrapper)?),
        None => None,
    };

    let sort = match document.select(&role_selector("sort-options")?).next() {
        Some(sort_el) => Some(scan_sort(sort_el)?),
        None => None,
    };

    let tag_template = document
        .select(&role_selector("tag-template")?)
        .next()
        .map(|el| TagTemplateScan {
            show_category: el.value().attr(ATTR_TAG_CATEGORY).map(str::trim) != Some("false"),
        });

    Ok(Collaborators {
        pagination,
        has_clear_all: exists("clear-all")?,
        sort,
        has_result_count: exists("results-count")?,
        has_empty: exists("empty")?,
        tag_template,
    })
}

fn scan_pagination(
    document: &Html,
    wrapper: ElementRef<'_>,
) -> Result<PaginationScan, ScanError> {
    let counter_sel = selector(&format!(".{PAGE_COUNT_CLASS}"))?;
    let link_sel = selector("a[href]")?;
    let page_sel = |dir: &str| selector(&format!("[{ATTR_PAGINATION}=\"{dir}\"]"));

    let native_counter = wrapper
        .select(&counter_sel)
        .next()
        .map(|el| utils::normalize_text(&text_of(el)));
    let collaborator_counter = document
        .select(&role_selector("page-count")?)
        .next()
        .map(|el| utils::normalize_text(&text_of(el)));

    Ok(PaginationScan {
        indicator: native_counter.clone().or_else(|| collaborator_counter.clone()),
        base_link: wrapper
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string),
        has_prev: document.select(&page_sel("prev")?).next().is_some(),
        has_next: document.select(&page_sel("next")?).next().is_some(),
        has_custom_prev: document
            .select(&role_selector("custom-prev")?)
            .next()
            .is_some(),
        has_custom_next: document
            .select(&role_selector("custom-next")?)
            .next()
            .is_some(),
        has_counter: native_counter.is_some() || collaborator_counter.is_some(),
    })
}

fn scan_sort(sort_el: ElementRef<'_>) -> Result<SortScan, ScanError> {
    let option_sel = selector("option")?;
    let mut options = Vec::new();
    let mut initial = None;
    for option in sort_el.select(&option_sel) {
        let value = option
            .value()
            .attr("value")
            .map(str::to_string)
            .unwrap_or_else(|| utils::normalize_text(&text_of(option)));
        if option.value().attr("selected").is_some() && initial.is_none() {
            initial = Some(value.clone());
        }
        options.push(value);
    }
    if initial.is_none() {
        initial = options.first().cloned();
    }
    Ok(SortScan { options, initial })
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}
