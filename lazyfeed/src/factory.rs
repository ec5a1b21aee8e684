use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::options::{
    FeedOptions, ItemKeyFn, ItemKindFn, ItemNameFn, ItemPropsFn, ItemsProcessorFn, RenderFn,
};
use crate::types::{ChildKind, ChildName, ComponentItem, ItemKey, MountedChild, Props};

/// A bounded descriptor list plus the number of data items it consumed.
///
/// `consumed` counts raw data elements sliced from the feed, before item
/// processors ran; processors may insert or remove descriptors without
/// affecting the data cursor.
#[derive(Debug)]
pub struct ProducedChunk<T> {
    pub items: Vec<ComponentItem<T>>,
    pub consumed: usize,
}

/// Produces renderable child descriptors from pending data and materializes
/// them into nodes.
///
/// Pure with respect to engine state: the factory only reads the slices it is
/// given and the client resolvers it was built from.
pub struct ItemFactory<T, N> {
    item_name: ItemNameFn<T>,
    item_key: ItemKeyFn<T>,
    item_props: Option<ItemPropsFn<T>>,
    item_kind: Option<ItemKindFn<T>>,
    processors: Vec<(ChildName, ItemsProcessorFn<T>)>,
    render: RenderFn<T, N>,
}

impl<T, N> ItemFactory<T, N> {
    pub fn from_options(options: &FeedOptions<T, N>) -> Self {
        Self {
            item_name: Arc::clone(&options.item_name),
            item_key: Arc::clone(&options.item_key),
            item_props: options.item_props.clone(),
            item_kind: options.item_kind.clone(),
            processors: options.items_processors.clone(),
            render: Arc::clone(&options.render),
        }
    }

    /// Slices `data[offset .. offset + chunk_size]` into descriptors and runs
    /// the processor chain over the result.
    ///
    /// A slice shorter than `chunk_size` still produces descriptors for
    /// exactly what is available; whether that is acceptable is the render
    /// guard's call, not the factory's.
    pub fn produce_component_items(
        &self,
        data: &[T],
        offset: usize,
        chunk_size: usize,
    ) -> ProducedChunk<T>
    where
        T: Clone,
    {
        let end = offset.saturating_add(chunk_size).min(data.len());
        let slice = data.get(offset..end).unwrap_or(&[]);

        let consumed = slice.len();
        let mut items = Vec::with_capacity(slice.len());
        for (i, datum) in slice.iter().enumerate() {
            let index = offset + i;
            items.push(ComponentItem {
                key: (self.item_key)(datum, index),
                name: (self.item_name)(datum, index),
                kind: match &self.item_kind {
                    Some(f) => f(datum, index),
                    None => ChildKind::Item,
                },
                props: match &self.item_props {
                    Some(f) => f(datum, index),
                    None => Props::new(),
                },
                data: Some(datum.clone()),
            });
        }
        if !self.processors.is_empty() {
            for (_, processor) in &self.processors {
                items = processor(items);
            }
            ftrace!(
                processors = self.processors.len(),
                len = items.len(),
                "items processors applied"
            );
        }

        ProducedChunk { items, consumed }
    }

    /// Produces loading placeholders; independent of real-data slicing.
    pub fn produce_tombstones(&self, count: usize) -> Vec<ComponentItem<T>> {
        (0..count)
            .map(|i| ComponentItem {
                key: i as ItemKey,
                name: ChildName::Borrowed("tombstone"),
                kind: ChildKind::Tombstone,
                props: Props::new(),
                data: None,
            })
            .collect()
    }

    /// Materializes descriptors into render-engine nodes.
    pub fn produce_nodes(&self, items: &[ComponentItem<T>]) -> Vec<N> {
        items.iter().map(|item| (self.render)(item)).collect()
    }

    /// Zips descriptors and nodes into mounted records, assigning child and
    /// item indexes sequentially from the given counters.
    pub fn produce_mounted(
        &self,
        items: Vec<ComponentItem<T>>,
        nodes: Vec<N>,
        mut next_child_index: usize,
        mut next_item_index: usize,
    ) -> Vec<MountedChild<T, N>> {
        debug_assert_eq!(
            items.len(),
            nodes.len(),
            "descriptor/node count mismatch ({} vs {})",
            items.len(),
            nodes.len()
        );
        items
            .into_iter()
            .zip(nodes)
            .map(|(item, node)| {
                let child_index = next_child_index;
                next_child_index += 1;
                let item_index = if item.kind.is_item() {
                    let idx = next_item_index;
                    next_item_index += 1;
                    Some(idx)
                } else {
                    None
                };
                MountedChild {
                    child_index,
                    item_index,
                    key: item.key,
                    name: item.name,
                    kind: item.kind,
                    props: item.props,
                    data: item.data,
                    node,
                }
            })
            .collect()
    }
}

impl<T, N> core::fmt::Debug for ItemFactory<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ItemFactory")
            .field(
                "processors",
                &self.processors.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
