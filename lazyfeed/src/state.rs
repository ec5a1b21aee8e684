use alloc::vec::Vec;

use crate::types::MountedChild;

/// A lightweight, serializable snapshot of the feed's cursors and flags.
///
/// This is what every client predicate receives. Derived fields
/// (`remaining_items`, `remaining_children`) are computed at snapshot time
/// and clamped to zero.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedSnapshot {
    /// Total data accumulated over the lifecycle.
    pub data_len: usize,
    /// Size of the most recent load response.
    pub last_loaded_len: usize,
    /// Total count reported by the source, when it reports one.
    pub total: Option<u64>,
    /// Rendered `Item`-kind children.
    pub items_len: usize,
    /// All rendered children (items plus separators/tombstones).
    pub children_len: usize,
    /// Cursor into the data marking what has been sliced into chunks.
    pub data_offset: usize,
    pub load_page: u32,
    pub render_page: u32,
    /// Highest item index observed entering the viewport.
    pub max_viewed_item: Option<usize>,
    /// Highest child index observed entering the viewport.
    pub max_viewed_child: Option<usize>,
    /// Rendered items not yet viewed; equals `items_len` before any viewing.
    pub remaining_items: usize,
    pub remaining_children: usize,
    pub is_loading_in_progress: bool,
    pub is_last_errored: bool,
    pub is_last_render: bool,
    pub is_initial_render: bool,
    pub are_requests_stopped: bool,
    pub is_lifecycle_done: bool,
    pub is_tombstones_in_view: bool,
}

/// The authoritative data/render state of one feed lifecycle.
///
/// Single-writer: all mutation goes through the named transition methods
/// below, and the engine is the only caller. No method performs I/O and none
/// fails; malformed input is a programming error and is debug-asserted.
pub struct FeedState<T, N> {
    data: Vec<T>,
    last_loaded: Vec<T>,
    total: Option<u64>,
    child_list: Vec<MountedChild<T, N>>,
    /// Positions of `Item`-kind children within `child_list`, in order.
    item_positions: Vec<usize>,
    data_offset: usize,
    load_page: u32,
    render_page: u32,
    max_viewed_item: Option<usize>,
    max_viewed_child: Option<usize>,
    is_loading_in_progress: bool,
    is_last_errored: bool,
    is_last_render: bool,
    is_initial_render: bool,
    are_requests_stopped: bool,
    is_lifecycle_done: bool,
    is_tombstones_in_view: bool,
}

impl<T, N> Default for FeedState<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, N> FeedState<T, N> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            last_loaded: Vec::new(),
            total: None,
            child_list: Vec::new(),
            item_positions: Vec::new(),
            data_offset: 0,
            load_page: 0,
            render_page: 0,
            max_viewed_item: None,
            max_viewed_child: None,
            is_loading_in_progress: false,
            is_last_errored: false,
            is_last_render: false,
            is_initial_render: true,
            are_requests_stopped: false,
            is_lifecycle_done: false,
            is_tombstones_in_view: false,
        }
    }

    /// Returns a stable snapshot merging the counters with derived fields.
    pub fn snapshot(&self) -> FeedSnapshot {
        let items_len = self.item_positions.len();
        let children_len = self.child_list.len();
        let remaining_items = match self.max_viewed_item {
            Some(max) => items_len.saturating_sub(max.saturating_add(1)),
            None => items_len,
        };
        let remaining_children = match self.max_viewed_child {
            Some(max) => children_len.saturating_sub(max.saturating_add(1)),
            None => children_len,
        };
        FeedSnapshot {
            data_len: self.data.len(),
            last_loaded_len: self.last_loaded.len(),
            total: self.total,
            items_len,
            children_len,
            data_offset: self.data_offset,
            load_page: self.load_page,
            render_page: self.render_page,
            max_viewed_item: self.max_viewed_item,
            max_viewed_child: self.max_viewed_child,
            remaining_items,
            remaining_children,
            is_loading_in_progress: self.is_loading_in_progress,
            is_last_errored: self.is_last_errored,
            is_last_render: self.is_last_render,
            is_initial_render: self.is_initial_render,
            are_requests_stopped: self.are_requests_stopped,
            is_lifecycle_done: self.is_lifecycle_done,
            is_tombstones_in_view: self.is_tombstones_in_view,
        }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn last_loaded(&self) -> &[T] {
        &self.last_loaded
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// All mounted children, in mount order.
    pub fn child_list(&self) -> &[MountedChild<T, N>] {
        &self.child_list
    }

    /// Iterates the `Item`-kind children, a subsequence of [`Self::child_list`].
    pub fn items(&self) -> impl Iterator<Item = &MountedChild<T, N>> {
        self.item_positions.iter().map(|&pos| &self.child_list[pos])
    }

    pub fn items_len(&self) -> usize {
        self.item_positions.len()
    }

    pub fn children_len(&self) -> usize {
        self.child_list.len()
    }

    /// The cursor into loaded data marking what has been sliced into chunks.
    pub fn data_cursor(&self) -> usize {
        self.data_offset
    }

    pub fn load_page(&self) -> u32 {
        self.load_page
    }

    pub fn render_page(&self) -> u32 {
        self.render_page
    }

    pub fn is_loading_in_progress(&self) -> bool {
        self.is_loading_in_progress
    }

    pub fn is_last_errored(&self) -> bool {
        self.is_last_errored
    }

    pub fn is_last_render(&self) -> bool {
        self.is_last_render
    }

    pub fn is_initial_render(&self) -> bool {
        self.is_initial_render
    }

    pub fn are_requests_stopped(&self) -> bool {
        self.are_requests_stopped
    }

    pub fn is_lifecycle_done(&self) -> bool {
        self.is_lifecycle_done
    }

    pub fn is_tombstones_in_view(&self) -> bool {
        self.is_tombstones_in_view
    }

    /// Appends a load response to the accumulated data.
    ///
    /// The initial load also rewinds the data cursor, so a lifecycle that was
    /// reset mid-flight starts slicing from the beginning.
    pub(crate) fn update_data(&mut self, chunk: Vec<T>, is_initial: bool, total: Option<u64>)
    where
        T: Clone,
    {
        if self.is_lifecycle_done {
            debug_assert!(!self.is_lifecycle_done, "update_data after lifecycle done");
            return;
        }
        if is_initial {
            self.data_offset = 0;
        }
        self.data.extend(chunk.iter().cloned());
        self.last_loaded = chunk;
        if total.is_some() {
            self.total = total;
        }
    }

    /// Advances the data cursor by the number of data items consumed by the
    /// most recently produced chunk.
    pub(crate) fn advance_data_offset(&mut self, consumed: usize) {
        let next = self.data_offset.saturating_add(consumed);
        debug_assert!(
            next <= self.data.len(),
            "data_offset would pass data.len() (offset={next}, len={})",
            self.data.len()
        );
        self.data_offset = next.min(self.data.len());
    }

    /// Appends freshly mounted children, keeping the item subsequence index.
    pub(crate) fn update_mounted(&mut self, mounted: Vec<MountedChild<T, N>>) {
        if self.is_lifecycle_done {
            debug_assert!(!self.is_lifecycle_done, "update_mounted after lifecycle done");
            return;
        }
        for child in mounted {
            debug_assert_eq!(
                child.child_index,
                self.child_list.len(),
                "mounted children must continue the child index sequence"
            );
            if child.kind.is_item() {
                self.item_positions.push(self.child_list.len());
            }
            self.child_list.push(child);
        }
    }

    pub(crate) fn increment_load_page(&mut self) {
        self.load_page = self.load_page.saturating_add(1);
    }

    pub(crate) fn increment_render_page(&mut self) {
        self.render_page = self.render_page.saturating_add(1);
    }

    /// Records a viewport entry for the child at `child_index`.
    ///
    /// The update is a commutative max, so out-of-order entries converge on
    /// the same result. Unknown indexes are ignored.
    pub(crate) fn note_viewed(&mut self, child_index: usize) {
        let Some(child) = self.child_list.get(child_index) else {
            debug_assert!(
                child_index < self.child_list.len(),
                "viewed child_index out of bounds (i={child_index}, len={})",
                self.child_list.len()
            );
            return;
        };
        self.max_viewed_child = Some(match self.max_viewed_child {
            Some(max) => max.max(child_index),
            None => child_index,
        });
        if let Some(item_index) = child.item_index {
            self.max_viewed_item = Some(match self.max_viewed_item {
                Some(max) => max.max(item_index),
                None => item_index,
            });
        }
    }

    pub(crate) fn set_is_loading_in_progress(&mut self, value: bool) {
        self.is_loading_in_progress = value;
    }

    pub(crate) fn set_is_last_errored(&mut self, value: bool) {
        self.is_last_errored = value;
    }

    pub(crate) fn set_is_requests_stopped(&mut self, value: bool) {
        self.are_requests_stopped = value;
    }

    pub(crate) fn set_is_initial_render(&mut self, value: bool) {
        self.is_initial_render = value;
    }

    pub(crate) fn set_is_tombstones_in_view(&mut self, value: bool) {
        self.is_tombstones_in_view = value;
    }

    /// Terminal flag; irreversible for the lifetime of this state object.
    pub(crate) fn set_is_lifecycle_done(&mut self) {
        self.is_lifecycle_done = true;
    }

    /// Recomputes whether the next render pass is the terminal one: no more
    /// data will arrive and the candidate chunk covers everything left.
    pub(crate) fn update_is_last_render(&mut self, chunk_size: usize) {
        let pending = self.data.len().saturating_sub(self.data_offset);
        self.is_last_render = self.are_requests_stopped && pending <= chunk_size;
    }

    /// Reinitializes every field to defaults. Used on explicit reset only.
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}
