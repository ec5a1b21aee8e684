use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use lazyfeed::{Query, RawPayload};

/// Errors a data source may return for one `get` call.
///
/// `Unavailable` is the transient case: the driver converts it into the
/// engine's errored state so a retry affordance can be shown.
/// `Malformed` is a configuration error and propagates to the caller as
/// [`lazyfeed::FeedError::MalformedPayload`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("data source unavailable")]
    Unavailable,

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// A paginated data provider.
///
/// Sources are synchronous here: the driver performs the fetch inline while
/// pumping effects. An async host can skip the driver's source slot entirely
/// and complete fetch effects itself.
pub trait DataSource<T> {
    fn get(&mut self, query: &Query) -> Result<RawPayload<T>, SourceError>;
}

/// Any `FnMut(&Query) -> Result<RawPayload<T>, SourceError>` is a source.
///
/// Handy for tests and for scripted sources (error once, then succeed).
impl<T, F> DataSource<T> for F
where
    F: FnMut(&Query) -> Result<RawPayload<T>, SourceError>,
{
    fn get(&mut self, query: &Query) -> Result<RawPayload<T>, SourceError> {
        self(query)
    }
}

impl<T> DataSource<T> for Box<dyn DataSource<T>> {
    fn get(&mut self, query: &Query) -> Result<RawPayload<T>, SourceError> {
        (**self).get(query)
    }
}

/// An in-memory source serving slices of a fixed item list.
///
/// Understands the engine's default `page`/`per_page` query and reports the
/// backing length as `total`. Pages past the end resolve to an empty payload
/// rather than an error, matching how list endpoints behave.
#[derive(Clone, Debug)]
pub struct PagedVecSource<T> {
    items: Vec<T>,
}

impl<T> PagedVecSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> DataSource<T> for PagedVecSource<T> {
    fn get(&mut self, query: &Query) -> Result<RawPayload<T>, SourceError> {
        let page = parse_param(query, "page")?;
        let per_page = parse_param(query, "per_page")?;
        if page == 0 || per_page == 0 {
            return Err(SourceError::Malformed(alloc::format!(
                "page and per_page must be positive (page={page}, per_page={per_page})"
            )));
        }
        let start = (page - 1).saturating_mul(per_page).min(self.items.len());
        let end = start.saturating_add(per_page).min(self.items.len());
        Ok(RawPayload::Paged {
            data: self.items[start..end].to_vec(),
            total: Some(self.items.len() as u64),
        })
    }
}

fn parse_param(query: &Query, name: &str) -> Result<usize, SourceError> {
    let raw = query
        .get(name)
        .ok_or_else(|| SourceError::Malformed(alloc::format!("missing `{name}` parameter")))?;
    raw.parse()
        .map_err(|_| SourceError::Malformed(alloc::format!("`{name}` is not a number: {raw}")))
}
