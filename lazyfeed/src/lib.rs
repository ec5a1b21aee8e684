//! A headless chunked-rendering and data-loading engine for infinite-scroll
//! feeds.
//!
//! The engine coordinates paginated data fetching, chunked item production,
//! viewport observation, and render-guard decisions under cancellable
//! asynchronous conditions, without touching the network or the DOM itself.
//! A host (UI adapter) drives it by:
//!
//! - draining queued [`Effect`]s (perform the fetch, schedule the frame)
//! - feeding completions back through the `on_*` entry points with the token
//!   each effect carried
//! - reporting viewport entries by child index
//!
//! Rendering is exposed via injected functions: a render function turning a
//! [`ComponentItem`] descriptor into a node, and an insert callback receiving
//! each batched mount. For a framework-neutral driver and data-source
//! utilities, see the `lazyfeed-adapter` crate.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod engine;
mod error;
mod events;
mod factory;
mod observer;
mod options;
mod scope;
mod slots;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use engine::{FeedEngine, GuardResult, SkipReason};
pub use error::FeedError;
pub use events::{Effect, FeedEvent};
pub use factory::{ItemFactory, ProducedChunk};
pub use observer::ViewportObserver;
pub use options::{
    ChunkSizeFn, EventCallback, FeedOptions, InsertFn, ItemKeyFn, ItemKindFn, ItemNameFn,
    ItemPropsFn, ItemsProcessorFn, PreloadAmountFn, RenderFn, RequestQueryFn,
    ShouldPerformRenderFn, ShouldPerformRequestFn, ShouldStopRequestsFn,
};
pub use scope::{InsertToken, ScopeToken};
pub use slots::{SlotsController, SlotsState};
pub use state::{FeedSnapshot, FeedState};
pub use types::{
    ChildKind, ChildName, ComponentItem, ItemKey, MountedChild, Props, Query, RawPayload,
};
