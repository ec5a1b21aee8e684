use alloc::boxed::Box;
use alloc::vec::Vec;

use lazyfeed::{
    Effect, FeedEngine, FeedError, FeedOptions, FeedSnapshot, InsertToken, SlotsState,
};

use crate::source::{DataSource, SourceError};

/// A framework-neutral driver that wraps a [`lazyfeed::FeedEngine`] and owns
/// the effect loop.
///
/// This type does not hold any UI objects. Hosts drive it by calling:
/// - `init_load` once to start the lifecycle
/// - `element_enter` / `tombstones_enter` when intersection events occur
/// - `tick()` each frame when insert batches are deferred
///
/// Fetch effects are served inline from the attached [`DataSource`]. A source
/// `Unavailable` error becomes the engine's errored state (retry via
/// [`Self::retry`]); a `Malformed` payload and a missing source are caller
/// errors and are returned as [`FeedError`] after the engine is parked in its
/// errored state so it cannot wedge mid-load.
pub struct FeedDriver<T, N> {
    engine: FeedEngine<T, N>,
    source: Option<Box<dyn DataSource<T>>>,
    defer_frames: bool,
    frames: Vec<InsertToken>,
}

impl<T: Clone, N> FeedDriver<T, N> {
    pub fn new(options: FeedOptions<T, N>) -> Self {
        Self {
            engine: FeedEngine::new(options),
            source: None,
            defer_frames: false,
            frames: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl DataSource<T> + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Holds insert batches until the next [`Self::tick`] instead of running
    /// them inline, mirroring an animation-frame scheduler.
    pub fn with_deferred_frames(mut self, defer_frames: bool) -> Self {
        self.defer_frames = defer_frames;
        self
    }

    pub fn set_source(&mut self, source: impl DataSource<T> + 'static) {
        self.source = Some(Box::new(source));
    }

    pub fn engine(&self) -> &FeedEngine<T, N> {
        &self.engine
    }

    /// Direct engine access, e.g. for manual-trigger mode.
    pub fn engine_mut(&mut self) -> &mut FeedEngine<T, N> {
        &mut self.engine
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.engine.snapshot()
    }

    pub fn slots(&self) -> SlotsState {
        self.engine.slots()
    }

    /// Starts (or continues) loading and runs the effect loop to quiescence.
    pub fn init_load(&mut self) -> Result<(), FeedError> {
        self.engine.init_load_next();
        self.pump()
    }

    /// Clears the last load error and re-issues the failed request.
    pub fn retry(&mut self) -> Result<(), FeedError> {
        self.engine.reload_last();
        self.pump()
    }

    /// A rendered child entered the viewport.
    pub fn element_enter(&mut self, child_index: usize) -> Result<(), FeedError> {
        self.engine.on_element_enter(child_index);
        self.pump()
    }

    pub fn tombstones_enter(&mut self) -> Result<(), FeedError> {
        self.engine.on_tombstones_enter();
        self.pump()
    }

    pub fn tombstones_leave(&mut self) {
        self.engine.on_tombstones_leave();
    }

    /// Runs all deferred insert batches, then any follow-up effects.
    pub fn tick(&mut self) -> Result<(), FeedError> {
        for token in core::mem::take(&mut self.frames) {
            self.engine.on_insert_frame(token);
        }
        self.pump()
    }

    /// Restarts the lifecycle and drops any deferred frames; the engine's
    /// epoch bump already made their tokens stale.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.frames.clear();
    }

    fn pump(&mut self) -> Result<(), FeedError> {
        loop {
            let effects = self.engine.take_effects();
            if effects.is_empty() {
                return Ok(());
            }
            for effect in effects {
                match effect {
                    Effect::Fetch {
                        token,
                        query,
                        is_initial,
                    } => {
                        let Some(source) = self.source.as_mut() else {
                            self.engine.on_data_load_error(token);
                            return Err(FeedError::MissingDataSource);
                        };
                        match source.get(&query) {
                            Ok(payload) => {
                                self.engine.on_data_load_success(token, is_initial, payload);
                            }
                            Err(SourceError::Unavailable) => {
                                self.engine.on_data_load_error(token);
                            }
                            Err(SourceError::Malformed(message)) => {
                                self.engine.on_data_load_error(token);
                                return Err(FeedError::MalformedPayload(message));
                            }
                        }
                    }
                    Effect::ScheduleInsert { token } => {
                        if self.defer_frames {
                            self.frames.push(token);
                        } else {
                            self.engine.on_insert_frame(token);
                        }
                    }
                }
            }
        }
    }
}

impl<T, N> core::fmt::Debug for FeedDriver<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeedDriver")
            .field("engine", &self.engine)
            .field("has_source", &self.source.is_some())
            .field("defer_frames", &self.defer_frames)
            .field("deferred", &self.frames.len())
            .finish_non_exhaustive()
    }
}
