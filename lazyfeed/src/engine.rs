use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;

use crate::events::{Effect, FeedEvent};
use crate::factory::ItemFactory;
use crate::observer::ViewportObserver;
use crate::options::FeedOptions;
use crate::scope::{AsyncScope, InsertToken, ScopeToken};
use crate::slots::{SlotsController, SlotsState};
use crate::state::{FeedSnapshot, FeedState};
use crate::types::{MountedChild, Query, RawPayload};

/// Outcome of the render guard, evaluated before every render attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardResult {
    /// Render the pending chunk now.
    Render,
    /// Do not render; the reason says what to do instead.
    Skip(SkipReason),
}

/// Why the render guard declined a render pass.
///
/// This engine uses the two-reason model for short chunks: a short slice is
/// either terminal (`Done`) or provisional (`NotEnoughData`); there is no
/// separate "no data at all" reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No more data will ever arrive and the final render pass has happened.
    Done,
    /// The pending slice is shorter than a chunk and more data may arrive.
    NotEnoughData,
    /// A full chunk is pending but the client render predicate said no.
    NoPermission,
}

/// One scheduled insert batch awaiting its frame.
#[derive(Debug)]
struct PendingInsert {
    token: InsertToken,
    /// Start of the batch within the state's child list.
    start: usize,
    count: usize,
}

/// The orchestrating state machine: decides, after each data load or
/// viewport event, whether to request more data, render a pending chunk, or
/// declare the lifecycle done.
///
/// The engine is headless and single-owner. It never performs I/O: fetches
/// and frame scheduling are queued as [`Effect`]s for the host to perform,
/// and completions re-enter through the `on_*` entry points carrying the
/// token the effect was issued with. A [`Self::reset`] invalidates every
/// outstanding token, so late completions are benign no-ops.
pub struct FeedEngine<T, N> {
    options: FeedOptions<T, N>,
    factory: ItemFactory<T, N>,
    state: FeedState<T, N>,
    observer: ViewportObserver,
    slots: SlotsController,
    scope: AsyncScope,
    effects: Vec<Effect>,
    /// Placeholder strip shown while a fetch is in flight; separate from the
    /// state's child list so real child indexes never shift.
    tombstones: Vec<MountedChild<T, N>>,
    pending_inserts: Vec<PendingInsert>,
    lifecycle_done_deferred: bool,
    last_query: Option<(Query, bool)>,
}

impl<T: Clone, N> FeedEngine<T, N> {
    pub fn new(options: FeedOptions<T, N>) -> Self {
        let factory = ItemFactory::from_options(&options);
        let observer = ViewportObserver::new(options.observation_enabled);
        Self {
            options,
            factory,
            state: FeedState::new(),
            observer,
            slots: SlotsController::new(),
            scope: AsyncScope::default(),
            effects: Vec::new(),
            tombstones: Vec::new(),
            pending_inserts: Vec::new(),
            lifecycle_done_deferred: false,
            last_query: None,
        }
    }

    pub fn options(&self) -> &FeedOptions<T, N> {
        &self.options
    }

    pub fn factory(&self) -> &ItemFactory<T, N> {
        &self.factory
    }

    pub fn state(&self) -> &FeedState<T, N> {
        &self.state
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.snapshot()
    }

    pub fn slots(&self) -> SlotsState {
        self.slots.state()
    }

    pub fn observer(&self) -> &ViewportObserver {
        &self.observer
    }

    /// The mounted placeholder strip, non-empty while a fetch is in flight
    /// and `tombstone_count` is configured. Hosts show it alongside the
    /// `tombstones` slot flag and report visibility through
    /// [`Self::on_tombstones_enter`] / [`Self::on_tombstones_leave`].
    pub fn tombstones(&self) -> &[MountedChild<T, N>] {
        &self.tombstones
    }

    /// Drains the queued host effects.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        core::mem::take(&mut self.effects)
    }

    /// Restarts the lifecycle: clears state, observer and slots, cancels all
    /// outstanding async work, and emits `ResetState`.
    pub fn reset(&mut self) {
        fdebug!(load_page = self.state.load_page(), "reset");
        self.scope.clear();
        self.state.reset();
        self.observer.reset();
        self.slots.reset();
        self.effects.clear();
        self.tombstones.clear();
        self.pending_inserts.clear();
        self.lifecycle_done_deferred = false;
        self.last_query = None;
        self.emit(FeedEvent::ResetState);
    }

    /// Issues the next data fetch, unless one is in flight or the lifecycle
    /// no longer accepts requests.
    ///
    /// A re-entrancy guard (`is_loading_in_progress`) prevents overlapping
    /// fetches. After a failed load, only [`Self::reload_last`] may re-issue.
    pub fn init_load_next(&mut self) {
        if self.state.is_loading_in_progress()
            || self.state.are_requests_stopped()
            || self.state.is_lifecycle_done()
            || self.state.is_last_errored()
        {
            ftrace!(
                loading = self.state.is_loading_in_progress(),
                stopped = self.state.are_requests_stopped(),
                done = self.state.is_lifecycle_done(),
                errored = self.state.is_last_errored(),
                "init_load_next skipped"
            );
            return;
        }
        let snapshot = self.state.snapshot();
        let is_initial = snapshot.load_page == 0;
        let query = self.build_query(&snapshot);
        self.issue_fetch(query, is_initial);
    }

    /// Clears the last load error and re-issues the same request.
    ///
    /// The engine never retries on its own; this is the explicit caller
    /// action spec'd for transient failures.
    pub fn reload_last(&mut self) {
        if !self.state.is_last_errored() || self.state.is_loading_in_progress() {
            return;
        }
        let Some((query, is_initial)) = self.last_query.clone() else {
            return;
        };
        self.state.set_is_last_errored(false);
        self.issue_fetch(query, is_initial);
    }

    fn issue_fetch(&mut self, query: Query, is_initial: bool) {
        self.state.set_is_loading_in_progress(true);
        self.slots.loading_progress_state();
        if let Some(count) = self.options.tombstone_count {
            if count > 0 && self.tombstones.is_empty() {
                let items = self.factory.produce_tombstones(count);
                let nodes = self.factory.produce_nodes(&items);
                // Indexes local to the strip; tombstones never join the
                // state's child list.
                self.tombstones = self.factory.produce_mounted(items, nodes, 0, 0);
            }
        }
        self.last_query = Some((query.clone(), is_initial));
        self.emit(FeedEvent::DataLoadStart { is_initial });
        let token = self.scope.token();
        fdebug!(is_initial, ?token, "fetch issued");
        self.effects.push(Effect::Fetch {
            token,
            query,
            is_initial,
        });
    }

    fn build_query(&self, snapshot: &FeedSnapshot) -> Query {
        let mut query = self.options.base_query.clone();
        match &self.options.request_query {
            Some(f) => query.extend(f(snapshot)),
            None => {
                let chunk = self.chunk_size(snapshot);
                query.insert("page".into(), format!("{}", snapshot.load_page + 1));
                query.insert("per_page".into(), chunk.to_string());
            }
        }
        query
    }

    /// Applies a successful load response.
    ///
    /// Stale tokens (issued before the last reset) are silently dropped: a
    /// cancelled fetch's completion must not mutate state.
    pub fn on_data_load_success(
        &mut self,
        token: ScopeToken,
        is_initial: bool,
        payload: RawPayload<T>,
    ) {
        if !self.scope.accepts(token) {
            ftrace!(?token, "stale load success dropped");
            return;
        }
        if self.state.is_lifecycle_done() {
            return;
        }
        self.state.set_is_loading_in_progress(false);
        self.tombstones.clear();

        let (data, total) = payload.normalize();
        let count = data.len();
        self.emit(FeedEvent::DataConverted { count });

        self.state.update_data(data, is_initial, total);
        self.state.increment_load_page();

        let snapshot = self.state.snapshot();
        let stopped = self.should_stop_requesting(&snapshot);
        self.state.set_is_requests_stopped(stopped);
        fdebug!(count, is_initial, stopped, page = snapshot.load_page, "load success");

        self.emit(FeedEvent::DataLoadSuccess { count, is_initial });

        if is_initial && count == 0 && stopped {
            // Terminal short-circuit: nothing was ever loaded and nothing
            // will be; the render guard never needs to run.
            self.slots.empty_state();
            self.emit(FeedEvent::DataLoadEmpty);
            self.on_lifecycle_done();
            return;
        }

        self.slots.loading_success_state();
        self.load_data_or_perform_render();
    }

    /// Applies a failed load: sets the error flag and the retry presentation
    /// state. Never auto-retries.
    pub fn on_data_load_error(&mut self, token: ScopeToken) {
        if !self.scope.accepts(token) {
            ftrace!(?token, "stale load error dropped");
            return;
        }
        if self.state.is_lifecycle_done() {
            return;
        }
        let is_initial = self
            .last_query
            .as_ref()
            .map(|(_, is_initial)| *is_initial)
            .unwrap_or(true);
        self.state.set_is_loading_in_progress(false);
        self.tombstones.clear();
        self.state.set_is_last_errored(true);
        self.slots.loading_failed_state();
        fdebug!(is_initial, "load failed");
        self.emit(FeedEvent::DataLoadError { is_initial });
    }

    /// A watched child entered the viewport.
    pub fn on_element_enter(&mut self, child_index: usize) {
        if !self.observer.accept_enter(child_index) {
            return;
        }
        self.state.note_viewed(child_index);
        let item_index = self
            .state
            .child_list()
            .get(child_index)
            .and_then(|child| child.item_index);
        self.emit(FeedEvent::ElementEnter {
            child_index,
            item_index,
        });
        self.load_data_or_perform_render();
    }

    /// The tombstone container entered the viewport: keep preloading while
    /// placeholders are visible.
    pub fn on_tombstones_enter(&mut self) {
        if !self.observer.is_enabled() {
            return;
        }
        self.state.set_is_tombstones_in_view(true);
        self.emit(FeedEvent::TombstonesEnter);
        self.load_data_or_perform_render();
    }

    pub fn on_tombstones_leave(&mut self) {
        if !self.observer.is_enabled() {
            return;
        }
        self.state.set_is_tombstones_in_view(false);
        self.emit(FeedEvent::TombstonesLeave);
    }

    /// The decision function, evaluated before every render attempt.
    pub fn render_guard(&self, snapshot: &FeedSnapshot) -> GuardResult {
        let chunk = self.chunk_size(snapshot);
        let pending = snapshot.data_len.saturating_sub(snapshot.data_offset);

        if pending < chunk {
            if snapshot.are_requests_stopped && snapshot.is_last_render {
                return GuardResult::Skip(SkipReason::Done);
            }
            return GuardResult::Skip(SkipReason::NotEnoughData);
        }

        // First paint must never be blocked by the client predicate.
        if snapshot.is_initial_render {
            return GuardResult::Render;
        }

        if self.should_perform_render(snapshot) {
            GuardResult::Render
        } else {
            GuardResult::Skip(SkipReason::NoPermission)
        }
    }

    /// The controller loop: invoked after every load success and every
    /// viewport entry, and directly by the consumer in manual-trigger mode.
    pub fn load_data_or_perform_render(&mut self) {
        if self.state.is_last_errored() || self.state.is_lifecycle_done() {
            return;
        }
        let snapshot = self.state.snapshot();
        let guard = self.render_guard(&snapshot);
        ftrace!(?guard, offset = snapshot.data_offset, data = snapshot.data_len, "guard");

        match guard {
            GuardResult::Render => self.perform_render(),
            GuardResult::Skip(SkipReason::Done) => self.on_lifecycle_done(),
            GuardResult::Skip(SkipReason::NotEnoughData) => {
                if snapshot.are_requests_stopped {
                    // No more data will ever come; the partial chunk must
                    // still be shown before the lifecycle closes.
                    self.perform_render();
                    self.on_lifecycle_done();
                } else if self.should_perform_request(&snapshot) {
                    self.init_load_next();
                } else if snapshot.is_initial_render {
                    // Never leave the first paint empty waiting on a
                    // predicate.
                    self.perform_render();
                }
            }
            GuardResult::Skip(SkipReason::NoPermission) => {}
        }
    }

    /// Renders the pending chunk: produces descriptors and nodes, registers
    /// them with the observer, records the insert, and schedules the batched
    /// frame that performs the actual DOM work.
    fn perform_render(&mut self) {
        let snapshot = self.state.snapshot();
        let chunk = self.chunk_size(&snapshot);
        self.state.update_is_last_render(chunk);

        let produced =
            self.factory
                .produce_component_items(self.state.data(), self.state.data_cursor(), chunk);

        if produced.items.is_empty() {
            // A completed render with no DOM work; fire the done event so
            // waiters (deferred lifecycle-done included) are unblocked.
            self.state.advance_data_offset(produced.consumed);
            self.emit(FeedEvent::RenderDone {
                render_page: snapshot.render_page,
            });
            self.flush_deferred_done();
            return;
        }

        let count = produced.items.len();
        let render_page = snapshot.render_page;
        self.emit(FeedEvent::RenderStart { render_page });

        self.emit(FeedEvent::RenderEngineStart { count });
        let nodes = self.factory.produce_nodes(&produced.items);
        self.emit(FeedEvent::RenderEngineDone { count });

        let mounted = self.factory.produce_mounted(
            produced.items,
            nodes,
            self.state.children_len(),
            self.state.items_len(),
        );
        let items = mounted.iter().filter(|child| child.kind.is_item()).count();
        self.observer.observe(&mounted);
        self.emit(FeedEvent::ItemsInit {
            items,
            children: count,
        });

        let start = self.state.children_len();
        self.state.advance_data_offset(produced.consumed);
        self.state.update_mounted(mounted);
        self.state.set_is_initial_render(false);
        self.state.increment_render_page();
        self.emit(FeedEvent::DomInsertStart { count });

        // One batched frame per render pass; per-node inserts would thrash
        // layout.
        let token = self.scope.insert_token(render_page);
        self.pending_inserts.push(PendingInsert { token, start, count });
        fdebug!(count, page = render_page, "insert scheduled");
        self.effects.push(Effect::ScheduleInsert { token });
    }

    /// Runs a scheduled insert batch. Host calls this on the frame it
    /// promised when draining [`Effect::ScheduleInsert`].
    pub fn on_insert_frame(&mut self, token: InsertToken) {
        if !self.scope.accepts_insert(token) {
            ftrace!(?token, "stale insert frame dropped");
            return;
        }
        let Some(pos) = self.pending_inserts.iter().position(|p| p.token == token) else {
            return;
        };
        let batch = self.pending_inserts.remove(pos);
        if let Some(on_insert) = &self.options.on_insert {
            let children = &self.state.child_list()[batch.start..batch.start + batch.count];
            on_insert(children);
        }
        self.emit(FeedEvent::DomInsertDone { count: batch.count });
        self.emit(FeedEvent::RenderDone {
            render_page: token.render_page(),
        });
        self.flush_deferred_done();

        // Observer-driven mode chains the next decision off the completed
        // frame, so a drained source reaches lifecycle-done without any
        // viewport event. Rendering ahead of the viewport is not chained
        // here; a Render verdict waits for an entry or the next load.
        if self.observer.is_enabled()
            && !self.state.is_lifecycle_done()
            && !self.state.is_last_errored()
        {
            let snapshot = self.state.snapshot();
            if self.render_guard(&snapshot) != GuardResult::Render {
                self.load_data_or_perform_render();
            }
        }
    }

    /// Idempotent terminal transition.
    ///
    /// If an insert batch is mid-flight the terminal signal is deferred to
    /// the batch's render-done, guaranteeing `RenderDone` is observed before
    /// `LifecycleDone`.
    pub fn on_lifecycle_done(&mut self) {
        if self.state.is_lifecycle_done() || self.lifecycle_done_deferred {
            return;
        }
        if !self.pending_inserts.is_empty() {
            fdebug!(pending = self.pending_inserts.len(), "lifecycle done deferred");
            self.lifecycle_done_deferred = true;
            return;
        }
        self.finish_lifecycle();
    }

    fn flush_deferred_done(&mut self) {
        if self.lifecycle_done_deferred && self.pending_inserts.is_empty() {
            self.lifecycle_done_deferred = false;
            self.finish_lifecycle();
        }
    }

    fn finish_lifecycle(&mut self) {
        self.slots.done_state();
        self.state.set_is_lifecycle_done();
        fdebug!(
            items = self.state.items_len(),
            pages = self.state.render_page(),
            "lifecycle done"
        );
        self.emit(FeedEvent::LifecycleDone);
    }

    fn emit(&self, event: FeedEvent) {
        if let Some(on_event) = &self.options.on_event {
            on_event(&event);
        }
    }

    fn chunk_size(&self, snapshot: &FeedSnapshot) -> usize {
        (self.options.chunk_size)(snapshot).max(1)
    }

    fn should_stop_requesting(&self, snapshot: &FeedSnapshot) -> bool {
        match &self.options.should_stop_requesting_data {
            Some(f) => f(snapshot),
            None => snapshot.last_loaded_len < self.chunk_size(snapshot),
        }
    }

    fn should_perform_request(&self, snapshot: &FeedSnapshot) -> bool {
        match &self.options.should_perform_data_request {
            Some(f) => f(snapshot),
            // Until something has entered the viewport there is no scroll
            // signal to wait on, so the pipeline stays primed. Afterwards,
            // fetch only when the unviewed tail is within the preload window.
            None => match snapshot.max_viewed_item {
                None => true,
                Some(_) => snapshot.remaining_items <= (self.options.preload_amount)(snapshot),
            },
        }
    }

    fn should_perform_render(&self, snapshot: &FeedSnapshot) -> bool {
        match &self.options.should_perform_data_render {
            Some(f) => f(snapshot),
            None => true,
        }
    }
}

impl<T, N> core::fmt::Debug for FeedEngine<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeedEngine")
            .field("snapshot", &self.state.snapshot())
            .field("slots", &self.slots.state())
            .field("tombstones", &self.tombstones.len())
            .field("pending_inserts", &self.pending_inserts.len())
            .field("queued_effects", &self.effects.len())
            .finish_non_exhaustive()
    }
}
