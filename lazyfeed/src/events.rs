use crate::scope::{InsertToken, ScopeToken};
use crate::types::Query;

/// Consumer-observable lifecycle events, fire-and-forget.
///
/// Events carry small owned payloads so observers can record them without
/// borrowing the engine. Full state is available from
/// [`crate::FeedEngine::snapshot`] inside the callback.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FeedEvent {
    /// The lifecycle was reset; all cursors and flags are back to defaults.
    ResetState,
    /// A fetch was issued.
    DataLoadStart { is_initial: bool },
    /// A raw payload was normalized into the feed's data representation.
    DataConverted { count: usize },
    /// A load response was applied to the state.
    DataLoadSuccess { count: usize, is_initial: bool },
    /// A load failed; the feed is waiting for an explicit retry.
    DataLoadError { is_initial: bool },
    /// The initial load produced no data and requests are stopped.
    DataLoadEmpty,
    /// A render pass produced a non-empty chunk and is under way.
    RenderStart { render_page: u32 },
    /// Node materialization through the injected render function started.
    RenderEngineStart { count: usize },
    RenderEngineDone { count: usize },
    /// Mounted children were appended and an insert batch was scheduled.
    DomInsertStart { count: usize },
    DomInsertDone { count: usize },
    /// The render pass (including its insert batch, if any) completed.
    RenderDone { render_page: u32 },
    /// Terminal: no further loads or renders until an explicit reset.
    LifecycleDone,
    /// A watched child entered the viewport.
    ElementEnter {
        child_index: usize,
        item_index: Option<usize>,
    },
    TombstonesEnter,
    TombstonesLeave,
    /// A batch of children was produced and indexed.
    ItemsInit { items: usize, children: usize },
}

/// Work the engine needs its host to perform.
///
/// The engine is headless: it never fetches or touches a real frame
/// scheduler. Instead it queues effects, the host drains them with
/// [`crate::FeedEngine::take_effects`], performs the work, and feeds results
/// back through the corresponding completion entry point with the token the
/// effect carried. Stale tokens (from before a reset) are silently ignored.
///
/// Deliberately exhaustive: a host that cannot handle an effect must fail to
/// compile rather than silently drop it and wedge the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the next page. Complete via
    /// [`crate::FeedEngine::on_data_load_success`] or
    /// [`crate::FeedEngine::on_data_load_error`].
    Fetch {
        token: ScopeToken,
        query: Query,
        is_initial: bool,
    },
    /// Run the pending insert batch on the next frame. Complete via
    /// [`crate::FeedEngine::on_insert_frame`].
    ScheduleInsert { token: InsertToken },
}
