// Example: surfacing a transient load failure and retrying it.
use lazyfeed::{ComponentItem, FeedOptions, Query};
use lazyfeed_adapter::{DataSource, FeedDriver, PagedVecSource, SourceError};

fn main() {
    let mut inner = PagedVecSource::new((0..8).map(|i| format!("row {i}")).collect());
    let mut calls = 0u32;
    let flaky = move |query: &Query| {
        calls += 1;
        if calls == 1 {
            return Err(SourceError::Unavailable);
        }
        inner.get(query)
    };

    let options = FeedOptions::new(|item: &ComponentItem<String>| {
        item.data.clone().unwrap_or_default()
    })
    .with_chunk_size(4);
    let mut driver = FeedDriver::new(options).with_source(flaky);

    driver.init_load().expect("source is attached");
    let slots = driver.slots();
    println!(
        "after failure: errored={} retry_slot={}",
        driver.snapshot().is_last_errored,
        slots.retry
    );

    driver.retry().expect("source is attached");
    let snap = driver.snapshot();
    println!(
        "after retry: items={} done={}",
        snap.items_len, snap.is_lifecycle_done
    );
}
