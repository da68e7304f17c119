use std::error::Error;

use indicatif::ProgressBar;

use cardsift::engine::Engine;
use cardsift::gather::{GatherError, PageFetcher};
use cardsift::markup::RangeSide;

struct NoFetch;

#[async_trait::async_trait]
impl PageFetcher for NoFetch {
    async fn fetch(&self, url: &str) -> Result<String, GatherError> {
        Err(GatherError::BadStatus {
            url: url.to_string(),
            status: 404,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let page = r#"
    <form wt-cmsfilter-element="filter-form">
      <label wt-cmsfilter-category="roast"><input type="checkbox"><span>Dark</span></label>
      <label wt-cmsfilter-category="roast"><input type="checkbox"><span>Light</span></label>
      <div wt-cmsfilter-category="price" wt-cmsfilter-range="from"><input type="text" value="0"></div>
      <div wt-cmsfilter-category="price" wt-cmsfilter-range="to"><input type="text" value="50"></div>
    </form>
    <div wt-cmsfilter-element="list">
      <div data-roast="Dark" data-price="14">Midnight Blend</div>
      <div data-roast="Light" data-price="12">Morning Blend</div>
      <div data-roast="Dark" data-price="32">Reserve Blend</div>
    </div>
    <div wt-cmsfilter-element="results-count"></div>
    "#;

    let mut engine = Engine::from_page(page)?;
    engine.initialize(&NoFetch, &ProgressBar::hidden()).await;

    engine.set_checked("roast", "Dark", true);
    engine.set_range_value("price", RangeSide::To, "20");
    engine.apply();

    println!("Results: {:?}", engine.view().result_count);
    for record in engine.visible_records() {
        println!("{}", record.text);
    }

    Ok(())
}
