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
      <div wt-cmsfilter-category="price" wt-cmsfilter-range="from"><input type="text" value="0"></div>
      <div wt-cmsfilter-category="price" wt-cmsfilter-range="to"><input type="text" value="100"></div>
    </form>
    <div wt-cmsfilter-element="list">
      <div data-price="15">Budget</div>
      <div data-price="45">Standard</div>
      <div data-price="90">Premium</div>
    </div>
    "#;

    let mut engine = Engine::from_page(page)?;
    engine.initialize(&NoFetch, &ProgressBar::hidden()).await;

    // A slider widget and the text input share one observed value;
    // either side's writes are visible to the other and to the engine.
    let slider_handle = engine.range_shared("price", RangeSide::To).unwrap();
    slider_handle.subscribe(|value| println!("slider moved, text input now reads {value}"));

    slider_handle.set("50".to_string());
    engine.apply();

    for record in engine.visible_records() {
        println!("{}", record.text);
    }

    Ok(())
}
