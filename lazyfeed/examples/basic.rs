// Example: driving the engine by hand, without the adapter driver.
use lazyfeed::{ComponentItem, Effect, FeedEngine, FeedOptions, RawPayload};

fn main() {
    let options = FeedOptions::new(|item: &ComponentItem<u32>| format!("<li #{}>", item.key))
        .with_chunk_size(5)
        .with_on_event(Some(|event: &lazyfeed::FeedEvent| println!("event: {event:?}")));
    let mut engine = FeedEngine::new(options);

    // The backing "server": three pages of five, then nothing.
    let pages: Vec<Vec<u32>> = vec![(0..5).collect(), (5..10).collect(), (10..15).collect()];
    let mut next_page = 0;

    engine.init_load_next();
    loop {
        let effects = engine.take_effects();
        if effects.is_empty() {
            break;
        }
        for effect in effects {
            match effect {
                Effect::Fetch {
                    token, is_initial, ..
                } => {
                    let page = pages.get(next_page).cloned().unwrap_or_default();
                    next_page += 1;
                    engine.on_data_load_success(token, is_initial, RawPayload::List(page));
                }
                Effect::ScheduleInsert { token } => engine.on_insert_frame(token),
            }
        }
    }

    let snapshot = engine.snapshot();
    println!("items={} pages={}", snapshot.items_len, snapshot.render_page);
    println!("lifecycle_done={}", snapshot.is_lifecycle_done);
    for child in engine.state().items().take(3) {
        println!("first items: {:?}", child.node);
    }
}
