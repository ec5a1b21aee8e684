/// Epoch-based cancellation scope for host-performed async work.
///
/// Every effect the engine hands to its host carries a token minted from the
/// current epoch. A [`crate::FeedEngine::reset`] bumps the epoch, so any
/// completion that arrives afterwards carries a stale token and is dropped as
/// a silent no-op. Cancellation never surfaces as an error.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AsyncScope {
    epoch: u64,
}

/// Token tying a fetch completion to the scope that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeToken {
    epoch: u64,
}

/// Token tying a deferred insert batch (one "animation frame") to the scope
/// and render page that scheduled it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InsertToken {
    epoch: u64,
    render_page: u32,
}

impl InsertToken {
    /// The render page whose batch this token completes.
    pub fn render_page(&self) -> u32 {
        self.render_page
    }
}

impl AsyncScope {
    pub(crate) fn token(&self) -> ScopeToken {
        ScopeToken { epoch: self.epoch }
    }

    pub(crate) fn insert_token(&self, render_page: u32) -> InsertToken {
        InsertToken {
            epoch: self.epoch,
            render_page,
        }
    }

    pub(crate) fn accepts(&self, token: ScopeToken) -> bool {
        token.epoch == self.epoch
    }

    pub(crate) fn accepts_insert(&self, token: InsertToken) -> bool {
        token.epoch == self.epoch
    }

    /// Invalidates every outstanding token.
    pub(crate) fn clear(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }
}
