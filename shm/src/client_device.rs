//! The reader-side device seam: importing a writer's shared texture
//! handle into the reader's own process and waiting for the writer's
//! GPU work on it to finish before it's safe to sample.
use std::sync::atomic::{AtomicU64, Ordering};

use utils::handle::{Handle, HandleAllocator};

use crate::handle_os::OwnedHandle;

pub struct ClientTextureTag;

/// A reader-local id for a texture imported from a writer's shared
/// handle; distinct from the writer's own `texture_index` pool slot.
pub type ClientTextureId = Handle<ClientTextureTag>;

static CLIENT_TEXTURE_IDS: HandleAllocator<ClientTextureTag> = HandleAllocator::new();

#[derive(Debug, thiserror::Error)]
pub enum ClientDeviceError {
    #[error("failed to import a shared texture handle")]
    Import,
    #[error("timed out waiting for the writer's GPU work to reach fence value {0}")]
    FenceTimeout(u64),
}

/// Production code runs the `cfg(windows)` Direct3D11 backend;
/// tests and non-Windows builds use [`NullClientDevice`].
pub trait ClientDevice: Send + Sync {
    /// Duplicates `handle` into this process, binds it as a local
    /// texture, and blocks until the writer's GPU has signalled past
    /// `fence_value`. Returns the id the rest of the reader treats the
    /// now-safe-to-sample texture as.
    fn import_and_wait(
        &self,
        handle: &OwnedHandle,
        fence_value: u64,
    ) -> Result<ClientTextureId, ClientDeviceError>;
}

/// Mints a distinct client-local id per import without touching any
/// real GPU resource; used in unit tests and off Windows, where there
/// is no GPU device to import into.
#[derive(Default)]
pub struct NullClientDevice {
    imports: std::sync::Mutex<u64>,
}

impl NullClientDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: how many times `import_and_wait` has been called.
    pub fn import_count(&self) -> u64 {
        *self.imports.lock().unwrap()
    }
}

impl ClientDevice for NullClientDevice {
    fn import_and_wait(
        &self,
        handle: &OwnedHandle,
        _fence_value: u64,
    ) -> Result<ClientTextureId, ClientDeviceError> {
        if handle.is_invalid() {
            return Err(ClientDeviceError::Import);
        }
        *self.imports.lock().unwrap() += 1;
        Ok(CLIENT_TEXTURE_IDS.mint())
    }
}

#[cfg(windows)]
mod d3d11 {
    use windows::core::Interface;
    use windows::Win32::Graphics::Direct3D11::ID3D11Device;

    use super::{ClientDeviceError, ClientTextureId, CLIENT_TEXTURE_IDS};
    use crate::handle_os::OwnedHandle;

    /// Thin client-side device: opens the writer's shared handle as a
    /// local `ID3D11Texture2D` and acquires its keyed mutex at the
    /// frame's fence value before handing back an id, mirroring how a
    /// real injected client imports and waits on a shared kneeboard
    /// texture.
    pub struct D3D11ClientDevice {
        device: ID3D11Device,
    }

    unsafe impl Send for D3D11ClientDevice {}
    unsafe impl Sync for D3D11ClientDevice {}

    impl D3D11ClientDevice {
        /// # Safety
        /// `device` must be a valid, live `ID3D11Device` belonging to
        /// this (injected client) process.
        pub unsafe fn from_raw(device: ID3D11Device) -> Self {
            D3D11ClientDevice { device }
        }
    }

    impl super::ClientDevice for D3D11ClientDevice {
        fn import_and_wait(
            &self,
            handle: &OwnedHandle,
            fence_value: u64,
        ) -> Result<ClientTextureId, ClientDeviceError> {
            use windows::Win32::Graphics::Direct3D11::ID3D11Texture2D;
            use windows::Win32::Graphics::Dxgi::IDXGIKeyedMutex;

            let texture: ID3D11Texture2D = unsafe {
                self.device
                    .OpenSharedResource(handle.raw())
                    .map_err(|_| ClientDeviceError::Import)?
            };
            let keyed_mutex: IDXGIKeyedMutex =
                texture.cast().map_err(|_| ClientDeviceError::Import)?;
            unsafe {
                keyed_mutex
                    .AcquireSync(fence_value, 1000)
                    .map_err(|_| ClientDeviceError::FenceTimeout(fence_value))?;
                let _ = keyed_mutex.ReleaseSync(fence_value);
            }
            Ok(CLIENT_TEXTURE_IDS.mint())
        }
    }
}

#[cfg(windows)]
pub use d3d11::D3D11ClientDevice;

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[test]
    fn null_client_device_counts_successful_imports() {
        let device = NullClientDevice::new();
        let handle = OwnedHandle::mint_for_test();

        let a = device.import_and_wait(&handle, 1).unwrap();
        let b = device.import_and_wait(&handle, 2).unwrap();
        assert_ne!(a, b);
        assert_eq!(device.import_count(), 2);
    }
}
