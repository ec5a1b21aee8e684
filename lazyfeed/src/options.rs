use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::events::FeedEvent;
use crate::state::FeedSnapshot;
use crate::types::{ChildKind, ChildName, ComponentItem, ItemKey, MountedChild, Props, Query};

/// Chunk size for one rendering pass.
pub type ChunkSizeFn = Arc<dyn Fn(&FeedSnapshot) -> usize + Send + Sync>;

/// How many unseen items may remain before another fetch is worthwhile.
pub type PreloadAmountFn = Arc<dyn Fn(&FeedSnapshot) -> usize + Send + Sync>;

/// Whether the data source is exhausted and requests should stop.
pub type ShouldStopRequestsFn = Arc<dyn Fn(&FeedSnapshot) -> bool + Send + Sync>;

/// Whether a fetch may be issued right now.
pub type ShouldPerformRequestFn = Arc<dyn Fn(&FeedSnapshot) -> bool + Send + Sync>;

/// Whether a pending full chunk may be rendered right now.
pub type ShouldPerformRenderFn = Arc<dyn Fn(&FeedSnapshot) -> bool + Send + Sync>;

/// Builds the request parameters for the next fetch.
pub type RequestQueryFn = Arc<dyn Fn(&FeedSnapshot) -> Query + Send + Sync>;

/// Resolves the component/tag name for a datum at its absolute item index.
pub type ItemNameFn<T> = Arc<dyn Fn(&T, usize) -> ChildName + Send + Sync>;

/// Resolves a stable key for a datum at its absolute item index.
pub type ItemKeyFn<T> = Arc<dyn Fn(&T, usize) -> ItemKey + Send + Sync>;

/// Resolves extra presentation props for a datum.
pub type ItemPropsFn<T> = Arc<dyn Fn(&T, usize) -> Props + Send + Sync>;

/// Resolves the child kind for a datum, e.g. to mark inline separators.
pub type ItemKindFn<T> = Arc<dyn Fn(&T, usize) -> ChildKind + Send + Sync>;

/// A pure middleware transform over a produced descriptor list.
pub type ItemsProcessorFn<T> =
    Arc<dyn Fn(Vec<ComponentItem<T>>) -> Vec<ComponentItem<T>> + Send + Sync>;

/// The injected render engine: materializes a descriptor into a node.
pub type RenderFn<T, N> = Arc<dyn Fn(&ComponentItem<T>) -> N + Send + Sync>;

/// The injected DOM-append primitive: receives one batched insert.
pub type InsertFn<T, N> = Arc<dyn Fn(&[MountedChild<T, N>]) + Send + Sync>;

/// Observer callback for lifecycle events.
pub type EventCallback = Arc<dyn Fn(&FeedEvent) + Send + Sync>;

pub(crate) const DEFAULT_CHUNK_SIZE: usize = 10;

/// Configuration for [`crate::FeedEngine`].
///
/// This type is designed to be cheap to clone: every callback is stored in an
/// `Arc`, so hosts can tweak a few fields and rebuild an engine without
/// reallocating closures. All predicates are pure functions of the snapshot;
/// the engine supplies sensible defaults for any hook left unset.
pub struct FeedOptions<T, N> {
    /// Bounded slice size for one rendering pass.
    pub chunk_size: ChunkSizeFn,

    /// Threshold for the default request-permission predicate: another fetch
    /// is issued once `remaining_items` drops to this amount.
    pub preload_amount: PreloadAmountFn,

    /// How many tombstone placeholders the host renders while loading.
    /// `None` disables tombstone production.
    pub tombstone_count: Option<usize>,

    /// Recomputed after each successful load; once true, no further fetch is
    /// dispatched until an explicit reset. Default: the last page was shorter
    /// than the current chunk size.
    pub should_stop_requesting_data: Option<ShouldStopRequestsFn>,

    /// Consulted when more data is needed. Default: always, until something
    /// has entered the viewport; afterwards, only when `remaining_items` is
    /// at or below the preload amount.
    pub should_perform_data_request: Option<ShouldPerformRequestFn>,

    /// Consulted before rendering a full chunk (never consulted for the very
    /// first render). Default: always render.
    pub should_perform_data_render: Option<ShouldPerformRenderFn>,

    /// Extra parameters for the next fetch, merged over [`Self::base_query`].
    /// Default: `page`/`per_page` pagination derived from the snapshot.
    pub request_query: Option<RequestQueryFn>,

    /// Parameters sent with every fetch.
    pub base_query: Query,

    pub item_name: ItemNameFn<T>,
    pub item_key: ItemKeyFn<T>,
    pub item_props: Option<ItemPropsFn<T>>,

    /// Marks individual data as non-`Item` children without writing a whole
    /// items processor. Default: every datum is an `Item`.
    pub item_kind: Option<ItemKindFn<T>>,

    /// Ordered, named descriptor-list transforms, applied in declaration
    /// order; each receives the output of the previous one.
    pub items_processors: Vec<(ChildName, ItemsProcessorFn<T>)>,

    pub render: RenderFn<T, N>,

    /// Called once per insert batch, on the frame that flushes it.
    pub on_insert: Option<InsertFn<T, N>>,

    pub on_event: Option<EventCallback>,

    /// When false (manual-trigger mode) the viewport observer is inert: no
    /// automatic enter events are accepted and the consumer drives
    /// [`crate::FeedEngine::load_data_or_perform_render`] explicitly.
    pub observation_enabled: bool,
}

impl<T, N> FeedOptions<T, N> {
    /// Creates options around an injected render function.
    ///
    /// `render` materializes one descriptor into a render-engine node; it is
    /// the only mandatory collaborator.
    pub fn new(render: impl Fn(&ComponentItem<T>) -> N + Send + Sync + 'static) -> Self {
        Self {
            chunk_size: Arc::new(|_| DEFAULT_CHUNK_SIZE),
            preload_amount: Arc::new(|_| 0),
            tombstone_count: None,
            should_stop_requesting_data: None,
            should_perform_data_request: None,
            should_perform_data_render: None,
            request_query: None,
            base_query: Query::new(),
            item_name: Arc::new(|_, _| ChildName::Borrowed("item")),
            item_key: Arc::new(|_, index| index as ItemKey),
            item_props: None,
            item_kind: None,
            items_processors: Vec::new(),
            render: Arc::new(render),
            on_insert: None,
            on_event: None,
            observation_enabled: true,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Arc::new(move |_| chunk_size);
        self
    }

    pub fn with_chunk_size_fn(
        mut self,
        chunk_size: impl Fn(&FeedSnapshot) -> usize + Send + Sync + 'static,
    ) -> Self {
        self.chunk_size = Arc::new(chunk_size);
        self
    }

    pub fn with_preload_amount(mut self, preload_amount: usize) -> Self {
        self.preload_amount = Arc::new(move |_| preload_amount);
        self
    }

    pub fn with_preload_amount_fn(
        mut self,
        preload_amount: impl Fn(&FeedSnapshot) -> usize + Send + Sync + 'static,
    ) -> Self {
        self.preload_amount = Arc::new(preload_amount);
        self
    }

    pub fn with_tombstone_count(mut self, tombstone_count: Option<usize>) -> Self {
        self.tombstone_count = tombstone_count;
        self
    }

    pub fn with_should_stop_requesting_data(
        mut self,
        f: Option<impl Fn(&FeedSnapshot) -> bool + Send + Sync + 'static>,
    ) -> Self {
        self.should_stop_requesting_data = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_should_perform_data_request(
        mut self,
        f: Option<impl Fn(&FeedSnapshot) -> bool + Send + Sync + 'static>,
    ) -> Self {
        self.should_perform_data_request = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_should_perform_data_render(
        mut self,
        f: Option<impl Fn(&FeedSnapshot) -> bool + Send + Sync + 'static>,
    ) -> Self {
        self.should_perform_data_render = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_request_query(
        mut self,
        f: Option<impl Fn(&FeedSnapshot) -> Query + Send + Sync + 'static>,
    ) -> Self {
        self.request_query = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_base_query(mut self, base_query: Query) -> Self {
        self.base_query = base_query;
        self
    }

    pub fn with_item_name(
        mut self,
        item_name: impl Fn(&T, usize) -> ChildName + Send + Sync + 'static,
    ) -> Self {
        self.item_name = Arc::new(item_name);
        self
    }

    pub fn with_item_key(
        mut self,
        item_key: impl Fn(&T, usize) -> ItemKey + Send + Sync + 'static,
    ) -> Self {
        self.item_key = Arc::new(item_key);
        self
    }

    pub fn with_item_props(
        mut self,
        item_props: Option<impl Fn(&T, usize) -> Props + Send + Sync + 'static>,
    ) -> Self {
        self.item_props = item_props.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_item_kind(
        mut self,
        item_kind: Option<impl Fn(&T, usize) -> ChildKind + Send + Sync + 'static>,
    ) -> Self {
        self.item_kind = item_kind.map(|f| Arc::new(f) as _);
        self
    }

    /// Appends a named items processor; processors run in insertion order.
    pub fn with_items_processor(
        mut self,
        name: impl Into<ChildName>,
        processor: impl Fn(Vec<ComponentItem<T>>) -> Vec<ComponentItem<T>> + Send + Sync + 'static,
    ) -> Self {
        self.items_processors.push((name.into(), Arc::new(processor)));
        self
    }

    pub fn with_on_insert(
        mut self,
        on_insert: Option<impl Fn(&[MountedChild<T, N>]) + Send + Sync + 'static>,
    ) -> Self {
        self.on_insert = on_insert.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_event(
        mut self,
        on_event: Option<impl Fn(&FeedEvent) + Send + Sync + 'static>,
    ) -> Self {
        self.on_event = on_event.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_observation_enabled(mut self, observation_enabled: bool) -> Self {
        self.observation_enabled = observation_enabled;
        self
    }
}

impl<T, N> Clone for FeedOptions<T, N> {
    fn clone(&self) -> Self {
        Self {
            chunk_size: Arc::clone(&self.chunk_size),
            preload_amount: Arc::clone(&self.preload_amount),
            tombstone_count: self.tombstone_count,
            should_stop_requesting_data: self.should_stop_requesting_data.clone(),
            should_perform_data_request: self.should_perform_data_request.clone(),
            should_perform_data_render: self.should_perform_data_render.clone(),
            request_query: self.request_query.clone(),
            base_query: self.base_query.clone(),
            item_name: Arc::clone(&self.item_name),
            item_key: Arc::clone(&self.item_key),
            item_props: self.item_props.clone(),
            item_kind: self.item_kind.clone(),
            items_processors: self.items_processors.clone(),
            render: Arc::clone(&self.render),
            on_insert: self.on_insert.clone(),
            on_event: self.on_event.clone(),
            observation_enabled: self.observation_enabled,
        }
    }
}

impl<T, N> core::fmt::Debug for FeedOptions<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeedOptions")
            .field("tombstone_count", &self.tombstone_count)
            .field("base_query", &self.base_query)
            .field(
                "items_processors",
                &self
                    .items_processors
                    .iter()
                    .map(|(name, _)| name)
                    .collect::<Vec<_>>(),
            )
            .field("observation_enabled", &self.observation_enabled)
            .finish_non_exhaustive()
    }
}
