#[cfg(not(feature = "std"))]
use alloc::collections::BTreeSet;
#[cfg(feature = "std")]
use std::collections::HashSet;

use crate::types::MountedChild;

#[cfg(feature = "std")]
type WatchSet = HashSet<usize>;
#[cfg(not(feature = "std"))]
type WatchSet = BTreeSet<usize>;

/// Registry of children watched for viewport entry.
///
/// The observer is headless: actual intersection detection happens in the
/// host platform, which reports entries by child index. The observer's job is
/// validation: only children it was asked to watch produce events, and in
/// manual-trigger mode nothing does.
#[derive(Clone, Debug)]
pub struct ViewportObserver {
    enabled: bool,
    watched: WatchSet,
}

impl ViewportObserver {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            watched: WatchSet::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn watched_len(&self) -> usize {
        self.watched.len()
    }

    /// Registers freshly mounted children for intersection tracking.
    pub fn observe<T, N>(&mut self, children: &[MountedChild<T, N>]) {
        if !self.enabled {
            return;
        }
        for child in children {
            self.watched.insert(child.child_index);
        }
        fdebug!(
            added = children.len(),
            watched = self.watched.len(),
            "observe"
        );
    }

    /// Validates a host-reported viewport entry.
    ///
    /// Returns true when the entry should be forwarded into the engine.
    /// Unwatched indexes are ignored rather than asserted on: intersection
    /// callbacks can race a reset and arrive for children that no longer
    /// exist. A watched child may enter more than once.
    pub fn accept_enter(&mut self, child_index: usize) -> bool {
        if !self.enabled {
            return false;
        }
        if !self.watched.contains(&child_index) {
            fwarn!(child_index, "viewport entry for unwatched child");
            return false;
        }
        true
    }

    /// Unregisters all currently tracked nodes. Used on lifecycle reset.
    pub fn reset(&mut self) {
        self.watched.clear();
    }
}
