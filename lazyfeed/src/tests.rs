use crate::*;

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use std::sync::Mutex;

/// Key-carrying stand-in for a render-engine node.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Node {
    key: ItemKey,
    kind: ChildKind,
}

type Recorded = Arc<Mutex<Vec<FeedEvent>>>;

fn recording_options(chunk: usize) -> (FeedOptions<u32, Node>, Recorded) {
    let events: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let options = FeedOptions::new(|item: &ComponentItem<u32>| Node {
        key: item.key,
        kind: item.kind,
    })
    .with_chunk_size(chunk)
    .with_on_event(Some(move |event: &FeedEvent| {
        sink.lock().unwrap().push(event.clone());
    }));
    (options, events)
}

fn recorded(events: &Recorded) -> Vec<FeedEvent> {
    events.lock().unwrap().clone()
}

fn count_events(events: &Recorded, f: impl Fn(&FeedEvent) -> bool) -> usize {
    events.lock().unwrap().iter().filter(|e| f(e)).count()
}

/// Minimal host: answers fetches from a fixed page list and runs (or defers)
/// insert frames.
struct Pump {
    pages: Vec<Vec<u32>>,
    next_page: usize,
    defer_frames: bool,
    frames: Vec<InsertToken>,
}

impl Pump {
    fn new(pages: Vec<Vec<u32>>) -> Self {
        Self {
            pages,
            next_page: 0,
            defer_frames: false,
            frames: Vec::new(),
        }
    }

    fn deferred(pages: Vec<Vec<u32>>) -> Self {
        Self {
            defer_frames: true,
            ..Self::new(pages)
        }
    }

    fn drive(&mut self, engine: &mut FeedEngine<u32, Node>) {
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
                        let page = self.pages.get(self.next_page).cloned().unwrap_or_default();
                        self.next_page += 1;
                        engine.on_data_load_success(token, is_initial, RawPayload::List(page));
                    }
                    Effect::ScheduleInsert { token } => {
                        if self.defer_frames {
                            self.frames.push(token);
                        } else {
                            engine.on_insert_frame(token);
                        }
                    }
                }
            }
        }
    }

    fn flush_frames(&mut self, engine: &mut FeedEngine<u32, Node>) {
        for token in core::mem::take(&mut self.frames) {
            engine.on_insert_frame(token);
        }
        self.drive(engine);
    }
}

fn page(range: core::ops::Range<u32>) -> Vec<u32> {
    range.collect()
}

#[test]
fn initial_full_page_renders_then_drains_to_done() {
    let (options, events) = recording_options(4);
    let mut engine = FeedEngine::new(options);
    // One full page, then the source is empty: a single load entry point
    // must carry the lifecycle all the way to done.
    let mut pump = Pump::new(vec![page(0..4)]);

    engine.init_load_next();
    pump.drive(&mut engine);

    let snap = engine.snapshot();
    assert_eq!(snap.items_len, 4);
    assert_eq!(snap.data_offset, 4);
    assert_eq!(snap.render_page, 1);
    assert_eq!(snap.load_page, 2);
    assert!(!snap.is_initial_render);
    assert!(snap.are_requests_stopped);
    assert!(snap.is_lifecycle_done);
    let slots = engine.slots();
    assert!(slots.done);
    assert!(!slots.loader && !slots.retry && !slots.empty);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::RenderStart { .. })), 1);
}

#[test]
fn data_offset_never_passes_data_len() {
    let (options, _) = recording_options(3);
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::new(vec![page(0..3), page(3..6), page(6..8), vec![]]);

    engine.init_load_next();
    pump.drive(&mut engine);
    for step in 0..8 {
        let snap = engine.snapshot();
        assert!(
            snap.data_offset <= snap.data_len,
            "offset {} passed len {} at step {step}",
            snap.data_offset,
            snap.data_len
        );
        let children = engine.state().children_len();
        if children == 0 {
            break;
        }
        engine.on_element_enter(children - 1);
        pump.drive(&mut engine);
        if engine.snapshot().is_lifecycle_done {
            break;
        }
    }
    let snap = engine.snapshot();
    assert!(snap.is_lifecycle_done);
    assert_eq!(snap.items_len, 8);
    assert!(snap.data_offset <= snap.data_len);
}

#[test]
fn items_are_a_subsequence_of_child_list() {
    let (options, _) = recording_options(4);
    let options = options.with_items_processor("separators", |mut items: Vec<ComponentItem<u32>>| {
        // One separator after every second descriptor.
        let mut out = Vec::with_capacity(items.len() + items.len() / 2);
        for (i, item) in items.drain(..).enumerate() {
            out.push(item);
            if i % 2 == 1 {
                out.push(ComponentItem {
                    key: 9_000 + i as ItemKey,
                    name: ChildName::Borrowed("separator"),
                    kind: ChildKind::Separator,
                    props: Props::new(),
                    data: None,
                });
            }
        }
        out
    });
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::new(vec![page(0..4)]);

    engine.init_load_next();
    pump.drive(&mut engine);

    let children = engine.state().child_list();
    assert_eq!(children.len(), 6);
    let from_children: Vec<ItemKey> = children
        .iter()
        .filter(|c| c.kind.is_item())
        .map(|c| c.key)
        .collect();
    let from_items: Vec<ItemKey> = engine.state().items().map(|c| c.key).collect();
    assert_eq!(from_items, from_children);

    // Child indexes are the mount order; item indexes count items only.
    for (i, child) in children.iter().enumerate() {
        assert_eq!(child.child_index, i);
    }
    let item_indexes: Vec<usize> = engine.state().items().map(|c| c.item_index.unwrap()).collect();
    assert_eq!(item_indexes, vec![0, 1, 2, 3]);

    // Separators consumed no data.
    assert_eq!(engine.snapshot().data_offset, 4);
}

#[test]
fn guard_short_slice_is_done_only_when_terminal() {
    let (options, _) = recording_options(4);
    let engine = FeedEngine::new(options);

    let mut snap = FeedSnapshot {
        data_len: 6,
        data_offset: 4,
        are_requests_stopped: true,
        is_last_render: true,
        ..FeedSnapshot::default()
    };
    assert_eq!(engine.render_guard(&snap), GuardResult::Skip(SkipReason::Done));

    snap.is_last_render = false;
    assert_eq!(
        engine.render_guard(&snap),
        GuardResult::Skip(SkipReason::NotEnoughData)
    );

    snap.are_requests_stopped = false;
    assert_eq!(
        engine.render_guard(&snap),
        GuardResult::Skip(SkipReason::NotEnoughData)
    );
}

#[test]
fn guard_first_render_ignores_client_predicate() {
    let (options, _) = recording_options(4);
    let options = options.with_should_perform_data_render(Some(|_: &FeedSnapshot| false));
    let engine = FeedEngine::new(options);

    let mut snap = FeedSnapshot {
        data_len: 8,
        data_offset: 0,
        is_initial_render: true,
        ..FeedSnapshot::default()
    };
    assert_eq!(engine.render_guard(&snap), GuardResult::Render);

    snap.is_initial_render = false;
    assert_eq!(
        engine.render_guard(&snap),
        GuardResult::Skip(SkipReason::NoPermission)
    );
}

#[test]
fn lifecycle_done_is_idempotent() {
    let (options, events) = recording_options(4);
    let mut engine = FeedEngine::new(options);

    engine.on_lifecycle_done();
    engine.on_lifecycle_done();

    assert!(engine.snapshot().is_lifecycle_done);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::LifecycleDone)), 1);
}

#[test]
fn render_done_precedes_lifecycle_done_for_in_flight_batch() {
    let (options, events) = recording_options(8);
    let mut engine = FeedEngine::new(options);
    // Short initial page: flush-partial-chunk path renders then closes.
    let mut pump = Pump::deferred(vec![page(0..3)]);

    engine.init_load_next();
    pump.drive(&mut engine);

    // The insert frame has not run yet: lifecycle-done must be deferred.
    assert!(!engine.snapshot().is_lifecycle_done);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::LifecycleDone)), 0);

    pump.flush_frames(&mut engine);

    assert!(engine.snapshot().is_lifecycle_done);
    let all = recorded(&events);
    let render_done = all
        .iter()
        .position(|e| matches!(e, FeedEvent::RenderDone { .. }))
        .unwrap();
    let lifecycle_done = all
        .iter()
        .position(|e| matches!(e, FeedEvent::LifecycleDone))
        .unwrap();
    assert!(render_done < lifecycle_done);
}

#[test]
fn stale_fetch_completion_after_reset_is_a_noop() {
    let (options, _) = recording_options(4);
    let mut engine = FeedEngine::new(options);

    engine.init_load_next();
    let effects = engine.take_effects();
    let Some(Effect::Fetch { token, .. }) = effects.first().cloned() else {
        panic!("expected a fetch effect");
    };

    engine.reset();
    engine.on_data_load_success(token, true, RawPayload::List(page(0..4)));

    let snap = engine.snapshot();
    assert_eq!(snap.data_len, 0);
    assert_eq!(snap.load_page, 0);
    assert_eq!(snap.items_len, 0);
}

#[test]
fn stale_insert_frame_after_reset_is_a_noop() {
    let (options, _) = recording_options(4);
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::deferred(vec![page(0..4)]);

    engine.init_load_next();
    pump.drive(&mut engine);
    assert_eq!(pump.frames.len(), 1);

    engine.reset();
    let token = pump.frames.pop().unwrap();
    engine.on_insert_frame(token);

    assert_eq!(engine.snapshot().children_len, 0);
}

#[test]
fn max_viewed_update_is_commutative() {
    let (options, _) = recording_options(6);
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::new(vec![page(0..6)]);

    engine.init_load_next();
    pump.drive(&mut engine);

    // Later index first.
    engine.on_element_enter(5);
    pump.drive(&mut engine);
    engine.on_element_enter(2);
    pump.drive(&mut engine);

    let snap = engine.snapshot();
    assert_eq!(snap.max_viewed_item, Some(5));
    assert_eq!(snap.max_viewed_child, Some(5));
    assert_eq!(snap.remaining_items, 0);
}

#[test]
fn unwatched_viewport_entry_is_ignored() {
    let (options, events) = recording_options(4);
    let mut engine = FeedEngine::new(options);

    // Nothing rendered yet, so nothing is watched.
    engine.on_element_enter(0);

    assert_eq!(engine.snapshot().max_viewed_child, None);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::ElementEnter { .. })), 0);
}

#[test]
fn manual_trigger_mode_disables_observer_events() {
    let (options, events) = recording_options(4);
    let options = options.with_observation_enabled(false);
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::new(vec![page(0..4), page(4..8), vec![]]);

    engine.init_load_next();
    pump.drive(&mut engine);
    assert_eq!(engine.snapshot().items_len, 4);

    // Automatic entries are inert in manual mode.
    engine.on_element_enter(3);
    pump.drive(&mut engine);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::ElementEnter { .. })), 0);
    assert_eq!(engine.snapshot().items_len, 4);

    // The consumer drives loading explicitly instead.
    engine.init_load_next();
    pump.drive(&mut engine);
    assert_eq!(engine.snapshot().items_len, 8);
}

#[test]
fn stopped_requests_block_further_fetches() {
    let (options, _) = recording_options(4);
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::new(vec![page(0..2)]);

    engine.init_load_next();
    pump.drive(&mut engine);

    // Short first page stopped requests and closed the lifecycle.
    let snap = engine.snapshot();
    assert!(snap.are_requests_stopped);
    assert!(snap.is_lifecycle_done);

    engine.init_load_next();
    assert!(engine.take_effects().is_empty());
}

#[test]
fn load_error_waits_for_explicit_retry() {
    let (options, events) = recording_options(4);
    let mut engine = FeedEngine::new(options);

    engine.init_load_next();
    let effects = engine.take_effects();
    let Some(Effect::Fetch { token, query, .. }) = effects.first().cloned() else {
        panic!("expected a fetch effect");
    };
    engine.on_data_load_error(token);

    let snap = engine.snapshot();
    assert!(snap.is_last_errored);
    assert!(!snap.is_loading_in_progress);
    let slots = engine.slots();
    assert!(slots.retry);
    assert!(!slots.loader && !slots.done && !slots.render_next);

    // The loop refuses to act while errored.
    engine.load_data_or_perform_render();
    assert!(engine.take_effects().is_empty());
    // So does a plain load request.
    engine.init_load_next();
    assert!(engine.take_effects().is_empty());

    engine.reload_last();
    let retried = engine.take_effects();
    let Some(Effect::Fetch {
        query: retry_query, ..
    }) = retried.first()
    else {
        panic!("expected a retried fetch");
    };
    assert_eq!(*retry_query, query);
    assert!(!engine.snapshot().is_last_errored);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::DataLoadStart { .. })), 2);
}

#[test]
fn default_query_paginates_over_base_query() {
    let (options, _) = recording_options(7);
    let mut base = Query::new();
    base.insert("feed".into(), "news".into());
    let options = options.with_base_query(base);
    let mut engine = FeedEngine::new(options);

    engine.init_load_next();
    let effects = engine.take_effects();
    let Some(Effect::Fetch { query, .. }) = effects.first() else {
        panic!("expected a fetch effect");
    };
    assert_eq!(query.get("feed").map(String::as_str), Some("news"));
    assert_eq!(query.get("page").map(String::as_str), Some("1"));
    assert_eq!(query.get("per_page").map(String::as_str), Some("7"));
}

#[test]
fn client_request_query_overrides_default_pagination() {
    let (options, _) = recording_options(4);
    let options = options.with_request_query(Some(|snap: &FeedSnapshot| {
        let mut q = Query::new();
        q.insert("cursor".into(), alloc::format!("{}", snap.data_len));
        q
    }));
    let mut engine = FeedEngine::new(options);

    engine.init_load_next();
    let effects = engine.take_effects();
    let Some(Effect::Fetch { query, .. }) = effects.first() else {
        panic!("expected a fetch effect");
    };
    assert_eq!(query.get("cursor").map(String::as_str), Some("0"));
    assert!(!query.contains_key("page"));
}

#[test]
fn factory_produces_short_slice_as_is() {
    let (options, _) = recording_options(10);
    let factory = ItemFactory::from_options(&options);
    let data: Vec<u32> = (0..3).collect();

    let produced = factory.produce_component_items(&data, 0, 10);
    assert_eq!(produced.items.len(), 3);
    assert_eq!(produced.consumed, 3);
    assert!(produced.items.iter().all(|i| i.kind.is_item()));

    let past_end = factory.produce_component_items(&data, 3, 10);
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.consumed, 0);
}

#[test]
fn factory_processors_apply_in_declaration_order() {
    let (options, _) = recording_options(4);
    let options = options
        .with_items_processor("first", |mut items: Vec<ComponentItem<u32>>| {
            for item in &mut items {
                item.props.insert("order".into(), "first".into());
            }
            items
        })
        .with_items_processor("second", |mut items: Vec<ComponentItem<u32>>| {
            for item in &mut items {
                item.props.insert("order".into(), "second".into());
            }
            items
        });
    let factory = ItemFactory::from_options(&options);
    let data: Vec<u32> = (0..2).collect();

    let produced = factory.produce_component_items(&data, 0, 2);
    for item in &produced.items {
        assert_eq!(item.props.get("order").map(String::as_str), Some("second"));
    }
}

#[test]
fn item_kind_resolver_marks_inline_separators() {
    let (options, _) = recording_options(6);
    let options = options.with_item_kind(Some(|datum: &u32, _| {
        if datum % 3 == 0 {
            ChildKind::Separator
        } else {
            ChildKind::Item
        }
    }));
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::new(vec![page(0..6)]);

    engine.init_load_next();
    pump.drive(&mut engine);

    let snap = engine.snapshot();
    assert_eq!(snap.children_len, 6);
    assert_eq!(snap.items_len, 4);
    // Every datum consumed a data slot regardless of its resolved kind.
    assert_eq!(snap.data_offset, 6);

    let kinds: Vec<ChildKind> = engine.state().child_list().iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChildKind::Separator,
            ChildKind::Item,
            ChildKind::Item,
            ChildKind::Separator,
            ChildKind::Item,
            ChildKind::Item,
        ]
    );
    // Resolved separators keep their datum but get no item index.
    let separator = &engine.state().child_list()[0];
    assert_eq!(separator.item_index, None);
    assert_eq!(separator.data, Some(0));
}

#[test]
fn factory_tombstones_are_a_distinct_path() {
    let (options, _) = recording_options(4);
    let factory = ItemFactory::from_options(&options);

    let tombstones = factory.produce_tombstones(3);
    assert_eq!(tombstones.len(), 3);
    assert!(tombstones.iter().all(|t| t.kind == ChildKind::Tombstone));
    assert!(tombstones.iter().all(|t| t.data.is_none()));
}

#[test]
fn factory_mounted_indexes_continue_counters() {
    let (options, _) = recording_options(4);
    let factory = ItemFactory::from_options(&options);
    let items = vec![
        ComponentItem {
            key: 10,
            name: ChildName::Borrowed("item"),
            kind: ChildKind::Item,
            props: Props::new(),
            data: Some(10u32),
        },
        ComponentItem {
            key: 11,
            name: ChildName::Borrowed("separator"),
            kind: ChildKind::Separator,
            props: Props::new(),
            data: None,
        },
        ComponentItem {
            key: 12,
            name: ChildName::Borrowed("item"),
            kind: ChildKind::Item,
            props: Props::new(),
            data: Some(12u32),
        },
    ];
    let nodes = factory.produce_nodes(&items);
    let mounted = factory.produce_mounted(items, nodes, 5, 2);

    assert_eq!(
        mounted.iter().map(|c| c.child_index).collect::<Vec<_>>(),
        vec![5, 6, 7]
    );
    assert_eq!(
        mounted.iter().map(|c| c.item_index).collect::<Vec<_>>(),
        vec![Some(2), None, Some(3)]
    );
}

#[test]
fn tombstone_strip_tracks_the_fetch_in_flight() {
    let (options, _) = recording_options(4);
    let mut engine = FeedEngine::new(options.with_tombstone_count(Some(3)));

    engine.init_load_next();

    assert_eq!(engine.tombstones().len(), 3);
    assert!(engine.tombstones().iter().all(|t| t.kind == ChildKind::Tombstone));
    assert!(engine.slots().tombstones);
    // Placeholders never join the real child list.
    assert_eq!(engine.snapshot().children_len, 0);

    let effects = engine.take_effects();
    let Some(Effect::Fetch {
        token, is_initial, ..
    }) = effects.first().cloned()
    else {
        panic!("expected a fetch effect");
    };
    engine.on_data_load_success(token, is_initial, RawPayload::List(page(0..4)));

    assert!(engine.tombstones().is_empty());
    assert!(!engine.slots().tombstones);
}

#[test]
fn tombstone_strip_clears_on_load_failure() {
    let (options, _) = recording_options(4);
    let mut engine = FeedEngine::new(options.with_tombstone_count(Some(2)));

    engine.init_load_next();
    assert_eq!(engine.tombstones().len(), 2);

    let effects = engine.take_effects();
    let Some(Effect::Fetch { token, .. }) = effects.first().cloned() else {
        panic!("expected a fetch effect");
    };
    engine.on_data_load_error(token);

    assert!(engine.tombstones().is_empty());
    assert!(engine.slots().retry);
}

#[test]
fn tombstone_events_gate_on_observation() {
    let (options, events) = recording_options(4);
    let mut engine = FeedEngine::new(options);

    engine.on_tombstones_enter();
    assert!(engine.snapshot().is_tombstones_in_view);
    engine.on_tombstones_leave();
    assert!(!engine.snapshot().is_tombstones_in_view);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::TombstonesEnter)), 1);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::TombstonesLeave)), 1);

    let (options, events) = recording_options(4);
    let mut manual = FeedEngine::new(options.with_observation_enabled(false));
    manual.on_tombstones_enter();
    assert!(!manual.snapshot().is_tombstones_in_view);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::TombstonesEnter)), 0);
}

#[test]
fn reset_reinitializes_everything() {
    let (options, events) = recording_options(4);
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::new(vec![page(0..4)]);

    engine.init_load_next();
    pump.drive(&mut engine);
    assert!(engine.snapshot().items_len > 0);

    engine.reset();

    let snap = engine.snapshot();
    assert_eq!(snap, FeedSnapshot {
        is_initial_render: true,
        ..FeedSnapshot::default()
    });
    assert_eq!(engine.observer().watched_len(), 0);
    assert_eq!(engine.slots(), SlotsState::default());
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::ResetState)), 1);
}

#[test]
fn empty_processor_output_still_completes_render() {
    let (options, events) = recording_options(2);
    // A processor that swallows everything: render must still complete so
    // waiters are unblocked, and the cursor must advance past the consumed
    // slice or the loop would retry the same slice forever.
    let options = options.with_items_processor("drop-all", |_items: Vec<ComponentItem<u32>>| {
        Vec::new()
    });
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::new(vec![page(0..2)]);

    engine.init_load_next();
    pump.drive(&mut engine);

    let snap = engine.snapshot();
    assert_eq!(snap.items_len, 0);
    assert_eq!(snap.data_offset, 2);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::RenderDone { .. })), 1);
    assert_eq!(count_events(&events, |e| matches!(e, FeedEvent::DomInsertStart { .. })), 0);
}

#[test]
fn render_pages_are_never_repeated() {
    let (options, events) = recording_options(3);
    let mut engine = FeedEngine::new(options);
    let mut pump = Pump::new(vec![page(0..3), page(3..6), vec![]]);

    engine.init_load_next();
    pump.drive(&mut engine);
    engine.on_element_enter(2);
    pump.drive(&mut engine);
    engine.on_element_enter(5);
    pump.drive(&mut engine);

    assert!(engine.snapshot().is_lifecycle_done);
    let mut pages: Vec<u32> = recorded(&events)
        .iter()
        .filter_map(|e| match e {
            FeedEvent::RenderStart { render_page } => Some(*render_page),
            _ => None,
        })
        .collect();
    let before = pages.len();
    pages.dedup();
    assert_eq!(pages.len(), before);
    assert_eq!(pages, vec![0, 1]);
}
