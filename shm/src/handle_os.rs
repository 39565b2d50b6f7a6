//! RAII wrapper around an OS-owned NT handle.
//!
//! The writer creates pool textures with a shareable misc flag; each
//! reader duplicates the handle into its own process and imports it
//! as a local texture, and must close its copy exactly once.
//! `OwnedHandle` makes "exactly once" structural instead of a
//! convention every call site has to remember.

/// Failure duplicating a handle into a new, independently-closable
/// one referring to the same underlying kernel object.
#[derive(Debug, thiserror::Error)]
#[error("failed to duplicate a shared handle")]
pub struct DuplicateError;

#[cfg(windows)]
mod imp {
    use windows::Win32::Foundation::{CloseHandle, DuplicateHandle, DUPLICATE_SAME_ACCESS, HANDLE};
    use windows::Win32::System::Threading::GetCurrentProcess;

    use super::DuplicateError;

    /// An NT handle this process owns. Closed on drop; never closed
    /// twice because `Drop` can only run once.
    #[derive(Debug, PartialEq)]
    pub struct OwnedHandle(HANDLE);

    impl OwnedHandle {
        /// # Safety
        /// `handle` must be a valid, uniquely-owned NT handle that no
        /// other `OwnedHandle` also claims to own.
        pub unsafe fn from_raw(handle: HANDLE) -> Self {
            OwnedHandle(handle)
        }

        pub fn raw(&self) -> HANDLE {
            self.0
        }

        pub fn is_invalid(&self) -> bool {
            self.0.is_invalid()
        }

        /// Produces a second, independently-closable handle to the
        /// same kernel object, the way a reader imports a writer's
        /// shared texture instead of taking ownership of the writer's
        /// own handle value.
        pub fn duplicate(&self) -> Result<Self, DuplicateError> {
            let process = unsafe { GetCurrentProcess() };
            let mut duplicated = HANDLE::default();
            let ok = unsafe {
                DuplicateHandle(
                    process,
                    self.0,
                    process,
                    &mut duplicated,
                    0,
                    false,
                    DUPLICATE_SAME_ACCESS,
                )
            };
            match ok {
                Ok(()) => Ok(OwnedHandle(duplicated)),
                Err(_) => Err(DuplicateError),
            }
        }
    }

    impl Drop for OwnedHandle {
        fn drop(&mut self) {
            if !self.0.is_invalid() {
                // Best-effort: a failing CloseHandle here indicates a
                // process-wide handle-table corruption bug elsewhere,
                // but we can't log across a possible Drop-during-unwind
                // without risking a double panic, so we swallow the
                // error like the original engine's `wil::unique_handle`
                // does.
                let _ = unsafe { CloseHandle(self.0) };
            }
        }
    }

    unsafe impl Send for OwnedHandle {}
    unsafe impl Sync for OwnedHandle {}
}

#[cfg(not(windows))]
mod imp {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::DuplicateError;

    static NEXT: AtomicU64 = AtomicU64::new(1);

    /// Portable stand-in used when building/testing off Windows: NT
    /// handles don't exist here, so this just mints a unique opaque id
    /// with the same move-only, close-once shape.
    #[derive(Debug, PartialEq)]
    pub struct OwnedHandle(u64);

    impl OwnedHandle {
        pub fn mint_for_test() -> Self {
            OwnedHandle(NEXT.fetch_add(1, Ordering::Relaxed))
        }

        pub fn raw(&self) -> u64 {
            self.0
        }

        pub fn is_invalid(&self) -> bool {
            self.0 == 0
        }

        /// Mints a fresh stand-in id rather than performing a real
        /// `DuplicateHandle`, so the reader-side import path still
        /// produces a distinct, independently-dropped value off
        /// Windows.
        pub fn duplicate(&self) -> Result<Self, DuplicateError> {
            Ok(OwnedHandle(NEXT.fetch_add(1, Ordering::Relaxed)))
        }
    }
}

pub use imp::OwnedHandle;
