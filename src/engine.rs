use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::controls::{ControlBank, ControlState};
use crate::filter::{FilterSpec, FilterValue};
use crate::gather::{self, PageFetcher};
use crate::markup::{self, LoadMode, PageScan, RangeSide, ScanError, TriggerMode};
use crate::record::{ItemStore, Record};
use crate::sort::{self, SortOrder};
use crate::utils;
use crate::view::{self, PaginationDisplay, ViewState};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Trailing-edge debouncer. Every input event takes a ticket and waits
/// the configured delay; only the burst's latest ticket settles true,
/// so a burst collapses into one apply.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    seq: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay_ms: Option<u64>) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms.unwrap_or(0)),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn settle(&self) -> bool {
        let ticket = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        ticket == self.seq.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
struct PaginationUi {
    indicator: Option<String>,
    base_link: Option<String>,
    has_counter: bool,
    has_prev_button: bool,
    has_next_button: bool,
}

/// Serializable snapshot of the engine's filter state.
#[derive(Clone, Debug, Serialize)]
pub struct FilterData {
    pub active: BTreeMap<String, Vec<FilterValue>>,
    pub available: BTreeMap<String, BTreeSet<String>>,
    pub results: usize,
    pub per_page_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// The list-filtering engine: holds the record store, live control
/// state and pagination state, and recomputes the filtered subset and
/// `ViewState` on every apply cycle.
#[derive(Debug)]
pub struct Engine {
    store: ItemStore,
    controls: ControlBank,
    load_mode: LoadMode,
    trigger: TriggerMode,
    debouncer: Debouncer,

    sort_options: Option<Vec<String>>,
    sort_value: Option<String>,

    pagination: Option<PaginationUi>,
    current_page: usize,
    items_per_page: usize,
    total_pages: usize,

    active: FilterSpec,
    available: BTreeMap<String, BTreeSet<String>>,

    has_result_count: bool,
    has_empty: bool,
    tag_show_category: Option<bool>,

    gathered: bool,
    view: ViewState,
}

impl Engine {
    pub fn from_page(html: &str) -> Result<Self, EngineError> {
        Ok(Self::from_scan(markup::scan_page(html)?))
    }

    pub fn from_scan(scan: PageScan) -> Self {
        let store = ItemStore::new(scan.list.records);
        // Frozen before any crawling: one source page's worth.
        let items_per_page = store.len();

        let pagination = scan.collaborators.pagination.map(|p| PaginationUi {
            indicator: p.indicator,
            base_link: p.base_link,
            has_counter: p.has_counter,
            // A custom button supersedes the stock one.
            has_prev_button: p.has_custom_prev || p.has_prev,
            has_next_button: p.has_custom_next || p.has_next,
        });

        Self {
            controls: ControlBank::from_scan(&scan.form),
            load_mode: scan.list.load_mode,
            trigger: scan.form.trigger,
            debouncer: Debouncer::new(scan.form.debounce_ms),
            sort_options: scan.collaborators.sort.as_ref().map(|s| s.options.clone()),
            sort_value: scan.collaborators.sort.and_then(|s| s.initial),
            pagination,
            current_page: 1,
            items_per_page,
            total_pages: 1,
            active: FilterSpec::new(),
            available: BTreeMap::new(),
            has_result_count: scan.collaborators.has_result_count,
            has_empty: scan.collaborators.has_empty,
            tag_show_category: scan
                .collaborators
                .tag_template
                .map(|t| t.show_category),
            gathered: false,
            store,
            view: ViewState::default(),
        }
    }

    /// Crawls the remaining source pages when a pagination wrapper is
    /// present, then runs the first apply cycle. Crawl failures only
    /// cost the affected pages.
    pub async fn initialize(&mut self, fetcher: &dyn PageFetcher, progress: &ProgressBar) {
        if !self.gathered {
            self.gathered = true;
            if let Some(p) = &self.pagination {
                let pair = p.indicator.clone().zip(p.base_link.clone());
                if let Some((indicator, base_link)) = pair {
                    match gather::gather_remaining_pages(fetcher, &indicator, &base_link, progress)
                        .await
                    {
                        Ok(outcome) => {
                            if outcome.pages_failed > 0 {
                                warn!(
                                    failed = outcome.pages_failed,
                                    "some source pages were skipped"
                                );
                            }
                            self.store.append(outcome.records);
                        }
                        Err(error) => warn!(%error, "page aggregation skipped"),
                    }
                }
            }
        }
        self.store.reset_filtered();
        self.apply();
    }

    /// The full filter-apply cycle: read controls, filter, reset to
    /// page one, sort, rebuild the view, recompute available values,
    /// and rebuild the tag chips.
    pub fn apply(&mut self) {
        let spec = self.controls.build_spec();
        self.current_page = 1;
        let ids: Vec<usize> = self
            .store
            .records()
            .iter()
            .filter(|record| spec.matches(record))
            .map(|record| record.id)
            .collect();
        self.store.set_filtered(ids);
        self.active = spec;
        self.sort_filtered();
        self.render();
        self.update_available();
        self.view.result_count = self.result_count();
        self.view.tags = self
            .tag_show_category
            .map(|show| view::build_tags(&self.active, show));
        self.view.active_controls = self.controls.active_controls();
    }

    fn sort_filtered(&mut self) {
        if self.sort_options.is_none() {
            return;
        }
        let Some(order) = self.sort_value.as_deref().and_then(SortOrder::parse) else {
            return;
        };
        sort::sort_filtered(&mut self.store, &order);
    }

    fn render(&mut self) {
        // Nothing matched and nothing is constrained: show everything.
        if self.store.filtered_len() == 0 && !self.active.is_active() {
            self.store.reset_filtered();
        }

        self.total_pages = if self.items_per_page == 0 {
            1
        } else {
            self.store
                .filtered_len()
                .div_ceil(self.items_per_page)
                .max(1)
        };

        let paginated = self.pagination.is_some() && self.load_mode == LoadMode::Paginate;
        self.view.visible = if paginated {
            let start = (self.current_page - 1) * self.items_per_page;
            let end = (start + self.items_per_page).min(self.store.filtered_len());
            if start >= self.store.filtered_len() {
                Vec::new()
            } else {
                self.store.filtered()[start..end].to_vec()
            }
        } else {
            self.store.filtered().to_vec()
        };

        if self.pagination.is_some() && self.load_mode == LoadMode::LoadAll {
            // Paging is client-side from here on; drop the wrapper.
            self.pagination = None;
        }

        self.view.empty_visible = self.has_empty && self.store.filtered_len() == 0;
        self.view.pagination = self.pagination.as_ref().map(|p| PaginationDisplay {
            counter: p
                .has_counter
                .then(|| format!("{} / {}", self.current_page, self.total_pages)),
            prev_present: p.has_prev_button,
            prev_hidden: self.current_page == 1,
            next_present: p.has_next_button,
            next_hidden: self.current_page == self.total_pages,
        });
    }

    fn update_available(&mut self) {
        self.view.hidden_controls.clear();
        if !self.controls.advanced() {
            self.available.clear();
            return;
        }
        let mut available: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for control in self.controls.controls() {
            let key = utils::dataset_key(&control.category);
            available
                .entry(control.category.clone())
                .or_insert_with(|| {
                    self.store
                        .filtered_records()
                        .filter_map(|record| record.attribute(&key))
                        .filter(|value| !value.is_empty())
                        .map(str::to_string)
                        .collect()
                });
        }
        let mut hidden = Vec::new();
        for control in self.controls.controls() {
            if let ControlState::Toggle { label, .. } = &control.state {
                let present = available
                    .get(&control.category)
                    .is_some_and(|values| values.contains(label));
                if !present {
                    hidden.push(control.id);
                }
            }
        }
        self.available = available;
        self.view.hidden_controls = hidden;
    }

    fn result_count(&self) -> Option<usize> {
        self.has_result_count.then(|| self.results())
    }

    fn results(&self) -> usize {
        if self.active.is_active() {
            self.store.filtered_len()
        } else {
            self.store.len()
        }
    }

    /// Re-renders the next page slice; a no-op on the last page.
    pub fn next_page(&mut self) {
        if self.current_page < self.total_pages {
            self.current_page += 1;
            self.render();
        }
    }

    /// Re-renders the previous page slice; a no-op on page one.
    pub fn prev_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
            self.render();
        }
    }

    /// Resets every control and re-applies, restoring the full set.
    pub fn clear_all(&mut self) {
        self.controls.clear_all();
        self.apply();
    }

    /// Removes one active (category, value) pair by clearing the
    /// control(s) behind it, then re-applies.
    pub fn remove_tag(&mut self, category: &str, value: &FilterValue) {
        self.controls.clear_for_tag(category, value);
        self.apply();
    }

    pub fn set_checked(&mut self, category: &str, label: &str, checked: bool) -> bool {
        self.controls.set_checked(category, label, checked)
    }

    pub fn set_text(&mut self, category: &str, value: &str) -> bool {
        self.controls.set_text(category, value)
    }

    pub fn set_range_value(&mut self, category: &str, side: RangeSide, value: &str) -> bool {
        self.controls.set_range_value(category, side, value)
    }

    /// Selects a sort order; only values offered by the sort selector
    /// are accepted, and pages without one cannot sort.
    pub fn set_sort(&mut self, value: &str) -> bool {
        let Some(options) = &self.sort_options else {
            return false;
        };
        if !options.is_empty() && !options.iter().any(|o| o == value) {
            return false;
        }
        self.sort_value = Some(value.to_string());
        true
    }

    /// Explicit form submit; the entry point for button-trigger forms.
    pub fn submit(&mut self) {
        self.apply();
    }

    /// Live input notification: debounce-applies on live-trigger forms
    /// and ignores the event entirely on button-trigger forms.
    pub async fn live_input(&mut self) {
        if self.trigger == TriggerMode::Button {
            return;
        }
        let debouncer = self.debouncer.clone();
        if debouncer.settle().await {
            self.apply();
        }
    }

    /// Handle for debouncing live input events: await `settle` on a
    /// clone per event and apply only when it reports true.
    pub fn debounce(&self) -> Debouncer {
        self.debouncer.clone()
    }

    pub fn trigger(&self) -> TriggerMode {
        self.trigger
    }

    pub fn load_mode(&self) -> LoadMode {
        self.load_mode
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn controls(&self) -> &ControlBank {
        &self.controls
    }

    pub fn active_filters(&self) -> &FilterSpec {
        &self.active
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn visible_records(&self) -> impl Iterator<Item = &Record> {
        self.view
            .visible
            .iter()
            .filter_map(|&id| self.store.get(id))
    }

    pub fn range_shared(
        &self,
        category: &str,
        side: RangeSide,
    ) -> Option<crate::controls::Shared<String>> {
        self.controls.range_shared(category, side)
    }

    pub fn filter_data(&self) -> FilterData {
        FilterData {
            active: self.active.clone().into_categories(),
            available: self.available.clone(),
            results: self.results(),
            per_page_items: self.items_per_page,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}
