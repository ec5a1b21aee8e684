/// Presentation flags derived from engine state transitions.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotsState {
    pub done: bool,
    pub empty: bool,
    pub loader: bool,
    pub retry: bool,
    pub tombstones: bool,
    pub render_next: bool,
}

/// Pure projection from named state transitions to slot visibility.
///
/// No decision logic lives here: each method is one row of a lookup table,
/// called by the engine with the transition that just happened.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlotsController {
    state: SlotsState,
}

impl SlotsController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SlotsState {
        self.state
    }

    pub(crate) fn loading_progress_state(&mut self) {
        self.state.loader = true;
        self.state.tombstones = true;
        self.state.done = false;
        self.state.retry = false;
        self.state.render_next = false;
    }

    pub(crate) fn loading_success_state(&mut self) {
        self.state.loader = false;
        self.state.tombstones = false;
        self.state.retry = false;
        self.state.render_next = true;
    }

    pub(crate) fn loading_failed_state(&mut self) {
        self.state.loader = false;
        self.state.tombstones = false;
        self.state.retry = true;
        self.state.render_next = false;
    }

    pub(crate) fn empty_state(&mut self) {
        self.state.empty = true;
        self.state.loader = false;
        self.state.tombstones = false;
        self.state.render_next = false;
    }

    pub(crate) fn done_state(&mut self) {
        self.state.done = true;
        self.state.loader = false;
        self.state.tombstones = false;
        self.state.retry = false;
        self.state.render_next = false;
    }

    pub(crate) fn reset(&mut self) {
        self.state = SlotsState::default();
    }
}
