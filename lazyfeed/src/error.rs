use alloc::string::String;

/// Configuration errors surfaced to the caller of a load entry point.
///
/// These are caller mistakes, not runtime conditions: they are never retried
/// and never converted into presentation state. Transient load failures are
/// not errors at this level; they set `is_last_errored` on the feed state and
/// emit [`crate::FeedEvent::DataLoadError`] instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FeedError {
    /// A load was requested but no data source is attached.
    #[error("no data source is attached to the feed")]
    MissingDataSource,

    /// The data source produced a payload the feed cannot interpret.
    #[error("malformed load payload: {0}")]
    MalformedPayload(String),
}
