use std::collections::HashMap;

use async_trait::async_trait;
use indicatif::ProgressBar;

use crate::engine::{Debouncer, Engine};
use crate::filter::FilterValue;
use crate::gather::{GatherError, PageFetcher};
use crate::markup::{LoadMode, RangeSide};

const FULL_PAGE: &str = r#"
<html><body>
<form wt-cmsfilter-element="filter-form" wt-cmsfilter-class="is-active">
  <label wt-cmsfilter-category="category"><input type="checkbox"><span>Alpha</span></label>
  <label wt-cmsfilter-category="category"><input type="checkbox"><span>Beta</span></label>
  <label wt-cmsfilter-category="category"><input type="checkbox"><span>Gamma</span></label>
  <input type="text" wt-cmsfilter-category="*">
  <div wt-cmsfilter-category="price" wt-cmsfilter-range="from"><input type="text" value="0"></div>
  <div wt-cmsfilter-category="price" wt-cmsfilter-range="to"><input type="text" value="1000"></div>
</form>
<select wt-cmsfilter-element="sort-options">
  <option value="price-asc">cheap first</option>
  <option value="price-desc">expensive first</option>
</select>
<div wt-cmsfilter-element="list">
  <div data-category="Alpha" data-price="10"><h3 wt-cmsfilter-category="name">Alpha Item</h3></div>
  <div data-category="Beta" data-price="25"><h3 wt-cmsfilter-category="name">Beta Item</h3></div>
  <div data-category="Gamma" data-price="50"><h3 wt-cmsfilter-category="name">Gamma Item</h3></div>
</div>
<div wt-cmsfilter-element="results-count"></div>
<div wt-cmsfilter-element="empty">No results</div>
<a wt-cmsfilter-element="clear-all">Clear</a>
<div wt-cmsfilter-element="tag-template">
  <span wt-cmsfilter-element="tag-text"></span>
  <a wt-cmsfilter-element="tag-remove">x</a>
</div>
</body></html>
"#;

const PAGED_PAGE: &str = r#"
<html><body>
<form wt-cmsfilter-element="filter-form">
  <input type="text" wt-cmsfilter-category="*">
</form>
<div wt-cmsfilter-element="list" wt-cmsfilter-loadmode="paginate">
  <div data-name="One">One</div>
  <div data-name="Two">Two</div>
  <div data-name="Three">Three</div>
</div>
<div wt-cmsfilter-element="pagination-wrapper">
  <a href="https://shop.test/items?page=1">2</a>
  <div class="w-page-count">1 / 2</div>
</div>
<a wt-cmsfilter-pagination="prev">prev</a>
<a wt-cmsfilter-pagination="next">next</a>
</body></html>
"#;

const PAGE_TWO: &str = r#"
<html><body>
<div wt-cmsfilter-element="list">
  <div data-name="Four">Four</div>
  <div data-name="Five">Five</div>
  <div data-name="Six">Six</div>
</div>
</body></html>
"#;

#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, String>,
}

impl StubFetcher {
    fn with_page(url: &str, html: &str) -> Self {
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), html.to_string());
        Self { pages }
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, GatherError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| GatherError::BadStatus {
                url: url.to_string(),
                status: 500,
            })
    }
}

async fn engine_from(html: &str, fetcher: &StubFetcher) -> Engine {
    let mut engine = Engine::from_page(html).unwrap();
    engine.initialize(fetcher, &ProgressBar::hidden()).await;
    engine
}

fn visible_attr(engine: &Engine, key: &str) -> Vec<String> {
    engine
        .visible_records()
        .map(|r| r.attribute(key).unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn unconstrained_engine_shows_the_full_set() {
    let engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    assert_eq!(
        visible_attr(&engine, "category"),
        ["Alpha", "Beta", "Gamma"]
    );
    assert_eq!(engine.view().result_count, Some(3));
    assert!(!engine.view().empty_visible);
    assert_eq!(engine.view().tags.as_deref().map(<[_]>::len), Some(0));
}

#[tokio::test]
async fn checking_beta_then_removing_its_tag_restores_all_three() {
    let mut engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;

    engine.set_checked("category", "Beta", true);
    engine.apply();
    assert_eq!(visible_attr(&engine, "category"), ["Beta"]);
    assert_eq!(engine.view().result_count, Some(1));

    let tags = engine.view().tags.clone().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].label, "category: Beta");
    assert_eq!(tags[0].value, FilterValue::Text("Beta".to_string()));

    let tag = tags[0].clone();
    engine.remove_tag(&tag.category, &tag.value);
    assert_eq!(
        visible_attr(&engine, "category"),
        ["Alpha", "Beta", "Gamma"]
    );
    assert_eq!(engine.view().tags.as_deref().map(<[_]>::len), Some(0));
}

#[tokio::test]
async fn price_range_20_to_30_keeps_only_the_25_record() {
    let mut engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    engine.set_range_value("price", RangeSide::From, "20");
    engine.set_range_value("price", RangeSide::To, "30");
    engine.apply();
    assert_eq!(visible_attr(&engine, "price"), ["25"]);

    let tags = engine.view().tags.clone().unwrap();
    assert_eq!(tags[0].label, "price: 20 - 30");
}

#[tokio::test]
async fn range_back_at_its_default_stops_constraining() {
    let mut engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    engine.set_range_value("price", RangeSide::From, "20");
    engine.apply();
    assert_eq!(visible_attr(&engine, "price"), ["25", "50"]);

    engine.set_range_value("price", RangeSide::From, "0");
    engine.apply();
    assert_eq!(visible_attr(&engine, "price"), ["10", "25", "50"]);
    assert!(!engine.active_filters().is_active());
}

#[tokio::test]
async fn wildcard_search_hits_text_and_attributes() {
    let mut engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    engine.set_text("*", "gamma");
    engine.apply();
    assert_eq!(visible_attr(&engine, "category"), ["Gamma"]);
}

#[tokio::test]
async fn filters_matching_nothing_show_the_empty_state() {
    let mut engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    engine.set_text("*", "omega");
    engine.apply();
    assert!(engine.view().visible.is_empty());
    assert!(engine.view().empty_visible);
    assert_eq!(engine.view().result_count, Some(0));
}

#[tokio::test]
async fn clear_all_restores_everything_and_empties_tags() {
    let mut engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    engine.set_checked("category", "Alpha", true);
    engine.set_text("*", "alpha");
    engine.set_range_value("price", RangeSide::To, "15");
    engine.apply();
    assert_eq!(visible_attr(&engine, "category"), ["Alpha"]);
    assert!(!engine.view().tags.clone().unwrap().is_empty());

    engine.clear_all();
    assert_eq!(
        visible_attr(&engine, "category"),
        ["Alpha", "Beta", "Gamma"]
    );
    assert_eq!(engine.view().tags.as_deref().map(<[_]>::len), Some(0));
    assert_eq!(engine.view().result_count, Some(3));
    // Range endpoints are back at their recorded defaults.
    assert_eq!(engine.range_shared("price", RangeSide::To).unwrap().get(), "1000");
}

#[tokio::test]
async fn sorting_follows_the_selector_value() {
    let mut engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    assert!(engine.set_sort("price-desc"));
    engine.apply();
    assert_eq!(visible_attr(&engine, "price"), ["50", "25", "10"]);

    assert!(engine.set_sort("price-asc"));
    engine.apply();
    assert_eq!(visible_attr(&engine, "price"), ["10", "25", "50"]);

    assert!(!engine.set_sort("rating-asc"));
}

#[tokio::test]
async fn aggregation_flattens_source_pages_in_order() {
    let fetcher = StubFetcher::with_page("https://shop.test/items?page=2", PAGE_TWO);
    let engine = engine_from(PAGED_PAGE, &fetcher).await;

    assert_eq!(engine.store().len(), 6);
    assert_eq!(engine.items_per_page(), 3);
    let names: Vec<_> = engine
        .store()
        .records()
        .iter()
        .map(|r| r.attribute("name").unwrap_or_default())
        .collect();
    assert_eq!(names, ["One", "Two", "Three", "Four", "Five", "Six"]);
}

#[tokio::test]
async fn fetch_failure_keeps_the_first_page_records() {
    let engine = engine_from(PAGED_PAGE, &StubFetcher::default()).await;
    assert_eq!(engine.store().len(), 3);
    assert_eq!(visible_attr(&engine, "name"), ["One", "Two", "Three"]);
}

#[tokio::test]
async fn paginate_mode_slices_and_clamps_navigation() {
    let fetcher = StubFetcher::with_page("https://shop.test/items?page=2", PAGE_TWO);
    let mut engine = engine_from(PAGED_PAGE, &fetcher).await;

    assert_eq!(engine.load_mode(), LoadMode::Paginate);
    assert_eq!(engine.total_pages(), 2);
    assert_eq!(visible_attr(&engine, "name"), ["One", "Two", "Three"]);

    let display = engine.view().pagination.clone().unwrap();
    assert_eq!(display.counter.as_deref(), Some("1 / 2"));
    assert!(display.prev_hidden);
    assert!(!display.next_hidden);

    engine.prev_page();
    assert_eq!(engine.current_page(), 1);

    engine.next_page();
    assert_eq!(visible_attr(&engine, "name"), ["Four", "Five", "Six"]);
    let display = engine.view().pagination.clone().unwrap();
    assert_eq!(display.counter.as_deref(), Some("2 / 2"));
    assert!(display.next_hidden);

    engine.next_page();
    assert_eq!(engine.current_page(), 2);

    engine.prev_page();
    assert_eq!(engine.current_page(), 1);
    assert_eq!(visible_attr(&engine, "name"), ["One", "Two", "Three"]);
}

#[tokio::test]
async fn filtering_resets_pagination_to_page_one() {
    let fetcher = StubFetcher::with_page("https://shop.test/items?page=2", PAGE_TWO);
    let mut engine = engine_from(PAGED_PAGE, &fetcher).await;
    engine.next_page();
    assert_eq!(engine.current_page(), 2);

    engine.set_text("*", "o");
    engine.apply();
    assert_eq!(engine.current_page(), 1);
    // One, Two, Four contain an "o"; first slice shows all of them.
    assert_eq!(visible_attr(&engine, "name"), ["One", "Two", "Four"]);
    assert_eq!(engine.total_pages(), 1);
}

#[tokio::test]
async fn load_all_mode_renders_everything_and_drops_the_wrapper() {
    let page = PAGED_PAGE.replace(" wt-cmsfilter-loadmode=\"paginate\"", "");
    let fetcher = StubFetcher::with_page("https://shop.test/items?page=2", PAGE_TWO);
    let engine = engine_from(&page, &fetcher).await;

    assert_eq!(engine.load_mode(), LoadMode::LoadAll);
    assert_eq!(
        visible_attr(&engine, "name"),
        ["One", "Two", "Three", "Four", "Five", "Six"]
    );
    assert!(engine.view().pagination.is_none());
}

#[tokio::test]
async fn advanced_mode_hides_toggles_without_matching_records() {
    const ADVANCED_PAGE: &str = r#"
    <html><body>
    <form wt-cmsfilter-element="filter-form" wt-cmsfilter-filtering="advanced"
          wt-cmsfilter-class="is-on">
      <label wt-cmsfilter-category="color"><input type="checkbox"><span>Red</span></label>
      <label wt-cmsfilter-category="color"><input type="checkbox"><span>Blue</span></label>
      <label wt-cmsfilter-category="size"><input type="checkbox"><span>M</span></label>
    </form>
    <div wt-cmsfilter-element="list">
      <div data-color="Red" data-size="M">Red M</div>
      <div data-color="Blue" data-size="M">Blue M</div>
    </div>
    </body></html>
    "#;
    let mut engine = engine_from(ADVANCED_PAGE, &StubFetcher::default()).await;
    assert!(engine.view().hidden_controls.is_empty());

    engine.set_checked("color", "Red", true);
    engine.apply();
    assert_eq!(visible_attr(&engine, "color"), ["Red"]);
    // The Blue toggle (control id 1) no longer has a matching record.
    assert_eq!(engine.view().hidden_controls, vec![1]);
    // The checked Red toggle carries the active class.
    assert_eq!(engine.view().active_controls, vec![0]);

    let data = engine.filter_data();
    assert!(data.available["color"].contains("Red"));
    assert!(!data.available["color"].contains("Blue"));
    assert!(data.available["size"].contains("M"));
}

#[tokio::test(start_paused = true)]
async fn debounce_coalesces_a_burst_into_the_trailing_call() {
    let debouncer = Debouncer::new(Some(100));
    let (a, b, c) = tokio::join!(debouncer.settle(), debouncer.settle(), debouncer.settle());
    assert!(!a);
    assert!(!b);
    assert!(c);
}

#[tokio::test(start_paused = true)]
async fn separate_bursts_each_settle() {
    let debouncer = Debouncer::new(Some(50));
    assert!(debouncer.settle().await);
    assert!(debouncer.settle().await);
}

#[tokio::test]
async fn undebounced_forms_settle_immediately() {
    let debouncer = Debouncer::new(None);
    assert!(debouncer.settle().await);
}

#[tokio::test]
async fn live_input_applies_on_live_forms() {
    let mut engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    engine.set_text("*", "gamma");
    engine.live_input().await;
    assert_eq!(visible_attr(&engine, "category"), ["Gamma"]);
}

#[tokio::test]
async fn live_input_is_ignored_on_button_trigger_forms() {
    let page = FULL_PAGE.replace(
        "wt-cmsfilter-class=\"is-active\"",
        "wt-cmsfilter-class=\"is-active\" wt-cmsfilter-trigger=\"button\"",
    );
    let mut engine = engine_from(&page, &StubFetcher::default()).await;
    engine.set_text("*", "gamma");
    engine.live_input().await;
    assert_eq!(
        visible_attr(&engine, "category"),
        ["Alpha", "Beta", "Gamma"]
    );

    engine.submit();
    assert_eq!(visible_attr(&engine, "category"), ["Gamma"]);
}

#[tokio::test]
async fn registry_tracks_instances_until_cleared() {
    let mut registry = crate::registry::Registry::new();
    let engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    registry.insert("catalog", engine);
    assert_eq!(registry.len(), 1);
    assert!(registry.get("catalog").is_some());

    if let Some(engine) = registry.get_mut("catalog") {
        engine.set_checked("category", "Gamma", true);
        engine.apply();
        assert_eq!(engine.view().result_count, Some(1));
    }

    registry.clear();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn missing_required_collaborators_abort_initialization() {
    assert!(Engine::from_page("<html><body>nothing here</body></html>").is_err());
}

#[tokio::test]
async fn paired_widget_writes_flow_through_the_shared_value() {
    let mut engine = engine_from(FULL_PAGE, &StubFetcher::default()).await;
    let slider = engine.range_shared("price", RangeSide::From).unwrap();
    slider.set("20".to_string());
    engine.apply();
    assert_eq!(visible_attr(&engine, "price"), ["25", "50"]);
}
