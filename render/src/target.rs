//! `RenderTarget`: a D3D texture plus a lazily-created D2D bitmap view, exposed
//! through an explicit `Unattached -> {D2D, D3D} -> Unattached`
//! transition table rather than an ad hoc `match`. Acquiring a
//! target that is already attached, or attempting a transition not
//! in the table, is `fatal!` - the original source treats this as a
//! broken invariant, not a recoverable error.
use std::panic::Location;
use std::sync::Mutex;

use geometry::PixelSize;
use shm::RenderTargetID;
use utils::log;

use crate::backend::TextureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unattached,
    D2D,
    D3D,
}

impl State {
    /// The allowed-transition table.
    fn can_transition_to(self, next: State) -> bool {
        matches!(
            (self, next),
            (State::Unattached, State::D2D)
                | (State::Unattached, State::D3D)
                | (State::D2D, State::Unattached)
                | (State::D3D, State::Unattached)
        )
    }
}

/// One render target: a GPU texture identity plus the acquire/release
/// state machine guarding which API (D2D or D3D) currently holds it.
pub struct RenderTarget {
    pub texture: TextureId,
    pub size: PixelSize,
    state: Mutex<State>,
}

impl RenderTarget {
    pub fn new(texture: TextureId, size: PixelSize) -> Self {
        RenderTarget {
            texture,
            size,
            state: Mutex::new(State::Unattached),
        }
    }

    fn transition(&self, next: State, caller: &'static Location<'static>) {
        let mut state = self.state.lock().unwrap();
        if !state.can_transition_to(next) {
            log::fatal!(
                "illegal RenderTarget transition {:?} -> {:?} at {}:{}",
                *state,
                next,
                caller.file(),
                caller.line()
            );
        }
        *state = next;
    }

    /// Acquires this target for D2D drawing. Panics (`fatal!`) if the
    /// target is already attached to either API.
    #[track_caller]
    pub fn d2d(&self) -> D2DGuard<'_> {
        self.transition(State::D2D, Location::caller());
        D2DGuard { target: self }
    }

    /// Acquires this target for D3D drawing. Panics (`fatal!`) if the
    /// target is already attached to either API.
    #[track_caller]
    pub fn d3d(&self) -> D3DGuard<'_> {
        self.transition(State::D3D, Location::caller());
        D3DGuard { target: self }
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap();
        // Releasing from Unattached can't happen through the public
        // API (only the guards' Drop calls this), so an unexpected
        // state here means a guard outlived its target's lifetime
        // invariants - also `fatal!`.
        if !state.can_transition_to(State::Unattached) {
            log::fatal!("RenderTarget released from invalid state {:?}", *state);
        }
        *state = State::Unattached;
    }

    fn is_unattached(&self) -> bool {
        *self.state.lock().unwrap() == State::Unattached
    }
}

/// RAII scope for D2D drawing on a [`RenderTarget`]; the caller's
/// `#[track_caller]` location is what `fatal!` reports if a
/// double-acquire somehow races past the guard.
pub struct D2DGuard<'a> {
    target: &'a RenderTarget,
}

impl Drop for D2DGuard<'_> {
    fn drop(&mut self) {
        self.target.release();
    }
}

pub struct D3DGuard<'a> {
    target: &'a RenderTarget,
}

impl Drop for D3DGuard<'_> {
    fn drop(&mut self) {
        self.target.release();
    }
}

/// Overlays several logical [`RenderTargetID`]s on one backing
/// texture: `CachedLayer` keys on
/// the logical identity, so e.g. the same physical swapchain texture
/// used for two active views caches each view's content separately
/// even though the memory underneath is shared.
pub struct RenderTargetWithMultipleIdentities {
    backing: RenderTarget,
    identities: Vec<RenderTargetID>,
}

impl RenderTargetWithMultipleIdentities {
    pub fn new(backing: RenderTarget, identities: Vec<RenderTargetID>) -> Self {
        RenderTargetWithMultipleIdentities {
            backing,
            identities,
        }
    }

    pub fn backing(&self) -> &RenderTarget {
        &self.backing
    }

    /// The logical identity at `index`, used as the `RenderTargetID`
    /// half of a [`crate::cache::CachedLayer`] key.
    pub fn identity(&self, index: usize) -> Option<RenderTargetID> {
        self.identities.get(index).copied()
    }

    pub fn identities(&self) -> &[RenderTargetID] {
        &self.identities
    }
}
