use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// Stable identity assigned to every produced child.
pub type ItemKey = u64;

/// Component/tag name carried by a produced child.
pub type ChildName = Cow<'static, str>;

/// Client-declared props attached to a descriptor.
///
/// The render function receives the full descriptor (including the source
/// datum), so props are for the extra presentation hints a host wants to
/// thread through item processors, analogous to GET-style string maps.
pub type Props = BTreeMap<String, String>;

/// Request parameters for a data fetch.
pub type Query = BTreeMap<String, String>;

/// What role a produced child plays in the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChildKind {
    /// A real data-backed item.
    Item,
    /// A non-item child inserted by an items processor (separator, ad, …).
    Separator,
    /// A loading placeholder.
    Tombstone,
}

impl ChildKind {
    pub fn is_item(&self) -> bool {
        matches!(self, Self::Item)
    }
}

/// A renderable child descriptor produced by the item factory.
///
/// Descriptors are pure data: they carry everything the injected render
/// function needs to materialize a node, and nothing else.
#[derive(Clone, Debug)]
pub struct ComponentItem<T> {
    pub key: ItemKey,
    pub name: ChildName,
    pub kind: ChildKind,
    pub props: Props,
    /// The source datum for `Item`-kind children; `None` for tombstones and
    /// processor-inserted children that carry no datum.
    pub data: Option<T>,
}

/// A rendered child paired with its position metadata.
///
/// Immutable after creation. `node` is the owned render-engine handle; it
/// lives in the feed state until the next reset.
pub struct MountedChild<T, N> {
    /// Position among all mounted children.
    pub child_index: usize,
    /// Position among `Item`-kind children only; `None` for non-items.
    pub item_index: Option<usize>,
    pub key: ItemKey,
    pub name: ChildName,
    pub kind: ChildKind,
    pub props: Props,
    pub data: Option<T>,
    pub node: N,
}

impl<T: core::fmt::Debug, N> core::fmt::Debug for MountedChild<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MountedChild")
            .field("child_index", &self.child_index)
            .field("item_index", &self.item_index)
            .field("key", &self.key)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("props", &self.props)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// A raw load response as produced by a data source.
///
/// Sources may return a bare list or a paged wrapper carrying an optional
/// total count.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RawPayload<T> {
    List(Vec<T>),
    Paged { data: Vec<T>, total: Option<u64> },
}

impl<T> RawPayload<T> {
    /// Flattens the payload into `(items, total)`.
    pub fn normalize(self) -> (Vec<T>, Option<u64>) {
        match self {
            Self::List(data) => (data, None),
            Self::Paged { data, total } => (data, total),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::List(data) | Self::Paged { data, .. } => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> From<Vec<T>> for RawPayload<T> {
    fn from(data: Vec<T>) -> Self {
        Self::List(data)
    }
}
