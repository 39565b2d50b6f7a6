//! Opaque, monotonically-increasing 64-bit handles.
//!
//! `PageID`, `RenderTargetID`, `KneeboardViewID`, `LayerID`,
//! `EventHandlerToken` and `EventContext` are all minted from this one
//! generic family rather than each hand-rolling a `NonZeroU64`
//! newtype. This generalizes the original engine's `UniqueIDBase<T>`
//! CRTP pattern (`OpenKneeboard/UniqueID.h`) the way this workspace's
//! `ECSId`/`ECSInstance` mint monotonically increasing entity ids
//! (`utils::ecs`) - but handles here are never persisted and are
//! never reused, so there's no free-list to track, just an atomic
//! counter.
//!
//! Value 0 is the reserved "null" sentinel and is never minted by
//! `HandleAllocator`.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// A handle tagged with a zero-sized marker type so `Handle<PageTag>`
/// and `Handle<LayerTag>` aren't interchangeable even though they're
/// both just a `u64` underneath.
pub struct Handle<Tag> {
    value: u64,
    _marker: PhantomData<fn() -> Tag>,
}

impl<Tag> Handle<Tag> {
    /// The reserved null sentinel. Never returned by `HandleAllocator::mint`.
    pub const NULL: Handle<Tag> = Handle {
        value: 0,
        _marker: PhantomData,
    };

    pub const fn from_raw(value: u64) -> Self {
        Handle {
            value,
            _marker: PhantomData,
        }
    }

    pub const fn raw(&self) -> u64 {
        self.value
    }

    pub const fn is_null(&self) -> bool {
        self.value == 0
    }
}

impl<Tag> Clone for Handle<Tag> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<Tag> Copy for Handle<Tag> {}

impl<Tag> PartialEq for Handle<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl<Tag> Eq for Handle<Tag> {}

impl<Tag> Hash for Handle<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<Tag> Default for Handle<Tag> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<Tag> fmt::Debug for Handle<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.value)
    }
}

/// Mints never-reused `Handle<Tag>` values starting at 1. One
/// allocator instance is shared (usually via a `lazy_static`/`OnceLock`
/// process-wide singleton) per handle kind.
pub struct HandleAllocator<Tag> {
    next: AtomicU64,
    _marker: PhantomData<fn() -> Tag>,
}

impl<Tag> HandleAllocator<Tag> {
    pub const fn new() -> Self {
        HandleAllocator {
            next: AtomicU64::new(1),
            _marker: PhantomData,
        }
    }

    /// Mint a fresh, never-before-seen handle.
    pub fn mint(&self) -> Handle<Tag> {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        Handle::from_raw(value)
    }
}

impl<Tag> Default for HandleAllocator<Tag> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TagA;
    struct TagB;

    #[test]
    fn null_is_zero_and_never_minted() {
        assert!(Handle::<TagA>::NULL.is_null());
        let alloc = HandleAllocator::<TagA>::new();
        for _ in 0..100 {
            assert!(!alloc.mint().is_null());
        }
    }

    #[test]
    fn handles_are_monotonic_and_never_reused() {
        let alloc = HandleAllocator::<TagA>::new();
        let mut seen = std::collections::HashSet::new();
        let mut prev = 0u64;
        for _ in 0..1000 {
            let h = alloc.mint();
            assert!(h.raw() > prev);
            assert!(seen.insert(h.raw()));
            prev = h.raw();
        }
    }

    #[test]
    fn differently_tagged_handles_are_distinct_types() {
        let a = Handle::<TagA>::from_raw(5);
        let b = Handle::<TagB>::from_raw(5);
        // Would not compile: assert_eq!(a, b);
        assert_eq!(a.raw(), b.raw());
    }
}
