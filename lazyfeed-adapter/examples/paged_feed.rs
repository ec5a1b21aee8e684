// Example: a viewport-driven feed over an in-memory paged source.
use lazyfeed::ComponentItem;
use lazyfeed::FeedOptions;
use lazyfeed_adapter::{FeedDriver, PagedVecSource};

fn main() {
    let posts: Vec<String> = (0..40).map(|i| format!("post #{i}")).collect();

    let options = FeedOptions::new(|item: &ComponentItem<String>| {
        item.data.clone().unwrap_or_default()
    })
    .with_chunk_size(10)
    .with_item_key(|_: &String, index| index as u64);

    let mut driver = FeedDriver::new(options)
        .with_source(PagedVecSource::new(posts))
        .with_deferred_frames(true);

    driver.init_load().expect("source is attached");

    // Simulate the user scrolling to the bottom of each rendered page.
    while !driver.snapshot().is_lifecycle_done {
        driver.tick().expect("source is attached");
        let children = driver.snapshot().children_len;
        if children > 0 {
            driver.element_enter(children - 1).expect("source is attached");
        }
        let snap = driver.snapshot();
        println!(
            "rendered={} loaded={} page={}",
            snap.items_len, snap.data_len, snap.load_page
        );
    }

    println!("done after {} render pages", driver.snapshot().render_page);
}
