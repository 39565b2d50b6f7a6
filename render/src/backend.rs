//! The GPU device abstraction and `DXResources`.
//!
//! The original engine's `DXResources` is a process-global bag of the
//! D3D device, the D2D device/context, the sprite batch and a handful
//! of common solid-color brushes, all reached through a single
//! recursive lock so nested draw calls on the same thread don't
//! deadlock. We keep that shape but factor the literal D3D11/D2D
//! calls behind a small `GraphicsDevice` trait (mirrored on the
//! `shm::handle_os` pattern: a thin `cfg(windows)` backend wrapping
//! real Direct3D11 calls, and a portable stand-in used off Windows
//! and in unit tests) so the cache/state-machine/sprite-batching
//! logic above it is exercised without a live GPU.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use geometry::PixelSize;
use parking_lot::ReentrantMutex;
use shm::OwnedHandle;
use utils::handle::{Handle, HandleAllocator};

use crate::error::RenderError;

pub struct TextureTag;
/// Opaque handle to one GPU texture, minted by whichever
/// [`GraphicsDevice`] created it.
pub type TextureId = Handle<TextureTag>;

static TEXTURE_IDS: HandleAllocator<TextureTag> = HandleAllocator::new();

/// The seam between the renderer's platform-independent logic
/// (cache, state machine, sprite batching) and an actual graphics
/// API. Production code runs the `cfg(windows)` Direct3D11
/// implementation; tests and non-Windows builds use [`NullDevice`].
pub trait GraphicsDevice: Send + Sync {
    /// Allocates a new GPU texture of `size`, returning the handle the
    /// rest of the renderer will refer to it by.
    fn create_texture(&self, size: PixelSize) -> Result<TextureId, RenderError>;
    /// Releases a texture previously returned by `create_texture`.
    fn release_texture(&self, id: TextureId);
    /// The NT handle a reader can duplicate into its own process to
    /// import `id` as a local texture, if the backing texture has one.
    /// Always `None` on [`NullDevice`], which holds no real GPU
    /// resource to share.
    fn shared_handle(&self, id: TextureId) -> Option<OwnedHandle>;
}

/// The portable stand-in used off Windows and in `#[cfg(test)]`: mints
/// distinct ids without touching any real GPU resource.
pub struct NullDevice {
    released: Arc<std::sync::Mutex<Vec<TextureId>>>,
}

impl NullDevice {
    pub fn new() -> Self {
        NullDevice {
            released: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Test hook: every id passed to `release_texture` so far.
    pub fn released(&self) -> Vec<TextureId> {
        self.released.lock().unwrap().clone()
    }
}

impl Default for NullDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for NullDevice {
    fn create_texture(&self, size: PixelSize) -> Result<TextureId, RenderError> {
        if size.is_empty() {
            return Err(RenderError::TextureCreation(size));
        }
        Ok(TEXTURE_IDS.mint())
    }

    fn release_texture(&self, id: TextureId) {
        self.released.lock().unwrap().push(id);
    }

    fn shared_handle(&self, _id: TextureId) -> Option<OwnedHandle> {
        None
    }
}

#[cfg(windows)]
mod d3d11 {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use windows::core::Interface;
    use windows::Win32::Graphics::Direct3D11::{
        ID3D11Device, ID3D11Texture2D, D3D11_BIND_RENDER_TARGET, D3D11_BIND_SHADER_RESOURCE,
        D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX, D3D11_RESOURCE_MISC_SHARED_NTHANDLE,
    };

    use super::*;

    /// One texture this device has created and still owns: the live
    /// `ID3D11Texture2D` plus the NT handle readers duplicate to
    /// import it. Dropping the entry (on `release_texture`) releases
    /// both.
    struct Texture {
        texture: ID3D11Texture2D,
        handle: OwnedHandle,
    }

    /// Thin wrapper over a live `ID3D11Device`. Kept intentionally
    /// small: texture creation is the one call the platform-
    /// independent renderer logic actually needs from a real device;
    /// swapchain presentation and the injected-process side of the
    /// pipeline live in `shm`, not here.
    pub struct D3D11Device {
        device: ID3D11Device,
        textures: Mutex<HashMap<super::TextureId, Texture>>,
    }

    unsafe impl Send for D3D11Device {}
    unsafe impl Sync for D3D11Device {}

    impl D3D11Device {
        /// # Safety
        /// `device` must be a valid, live `ID3D11Device`.
        pub unsafe fn from_raw(device: ID3D11Device) -> Self {
            D3D11Device {
                device,
                textures: Mutex::new(HashMap::new()),
            }
        }
    }

    impl super::GraphicsDevice for D3D11Device {
        fn create_texture(&self, size: geometry::PixelSize) -> Result<super::TextureId, crate::error::RenderError> {
            use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_SAMPLE_DESC};
            use windows::Win32::Graphics::Direct3D11::D3D11_TEXTURE2D_DESC;
            use windows::Win32::Graphics::Dxgi::{IDXGIResource1, DXGI_SHARED_RESOURCE_READ, DXGI_SHARED_RESOURCE_WRITE};
            use windows::Win32::Foundation::PCWSTR;

            if size.is_empty() {
                return Err(crate::error::RenderError::TextureCreation(size));
            }
            let desc = D3D11_TEXTURE2D_DESC {
                Width: size.width as u32,
                Height: size.height as u32,
                MipLevels: 1,
                ArraySize: 1,
                Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Usage: Default::default(),
                BindFlags: D3D11_BIND_RENDER_TARGET.0 | D3D11_BIND_SHADER_RESOURCE.0,
                CPUAccessFlags: 0,
                MiscFlags: D3D11_RESOURCE_MISC_SHARED_NTHANDLE.0 | D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX.0,
            };
            let mut created: Option<ID3D11Texture2D> = None;
            unsafe {
                self.device
                    .CreateTexture2D(&desc, None, Some(&mut created))
                    .map_err(|_| crate::error::RenderError::TextureCreation(size))?;
            }
            let texture = created.ok_or(crate::error::RenderError::TextureCreation(size))?;

            let resource: IDXGIResource1 = texture
                .cast()
                .map_err(|_| crate::error::RenderError::TextureCreation(size))?;
            let raw_handle = unsafe {
                resource
                    .CreateSharedHandle(
                        None,
                        (DXGI_SHARED_RESOURCE_READ.0 | DXGI_SHARED_RESOURCE_WRITE.0) as u32,
                        PCWSTR::null(),
                    )
                    .map_err(|_| crate::error::RenderError::TextureCreation(size))?
            };
            let handle = unsafe { OwnedHandle::from_raw(raw_handle) };

            let id = super::TEXTURE_IDS.mint();
            self.textures.lock().unwrap().insert(id, Texture { texture, handle });
            Ok(id)
        }

        fn release_texture(&self, id: super::TextureId) {
            // Dropping the entry releases the `ID3D11Texture2D` and
            // closes the NT handle; readers that already duplicated
            // the handle keep their own independent copy.
            self.textures.lock().unwrap().remove(&id);
        }

        fn shared_handle(&self, id: super::TextureId) -> Option<OwnedHandle> {
            let textures = self.textures.lock().unwrap();
            let entry = textures.get(&id)?;
            entry.handle.duplicate().ok()
        }
    }
}

#[cfg(windows)]
pub use d3d11::D3D11Device;

/// Process-global GPU resource bag (`DXResources`). `lock()` is
/// re-entrant: the same thread may call it again while already
/// holding the guard, matching the original engine's recursive mutex
/// so nested draw helpers don't deadlock.
pub type DeviceGuard<'a> = parking_lot::ReentrantMutexGuard<'a, Box<dyn GraphicsDevice>>;

pub struct DXResources {
    device: ReentrantMutex<Box<dyn GraphicsDevice>>,
    luid: AtomicU64,
}

impl DXResources {
    pub fn new(device: Box<dyn GraphicsDevice>) -> Arc<Self> {
        Arc::new(DXResources {
            device: ReentrantMutex::new(device),
            luid: AtomicU64::new(0),
        })
    }

    /// Re-entrant lock over the underlying device. Safe to call again
    /// from the same thread while already holding a guard.
    pub fn lock(&self) -> DeviceGuard<'_> {
        self.device.lock()
    }

    /// Mirrors the app-side half of a device-lost recovery: the
    /// device was lost and a new one was created; bump the LUID so
    /// downstream caches can tell a reconstructed device apart from
    /// the old one.
    pub fn on_device_lost(&self, new_luid: u64) {
        self.luid.store(new_luid, Ordering::SeqCst);
    }

    pub fn luid(&self) -> u64 {
        self.luid.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_device_mints_distinct_textures() {
        let device = NullDevice::new();
        let a = device.create_texture(PixelSize::new(32, 32)).unwrap();
        let b = device.create_texture(PixelSize::new(32, 32)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_size_is_rejected() {
        let device = NullDevice::new();
        assert!(device.create_texture(PixelSize::new(0, 32)).is_err());
    }

    #[test]
    fn null_device_never_has_a_shared_handle() {
        let device = NullDevice::new();
        let id = device.create_texture(PixelSize::new(32, 32)).unwrap();
        assert!(device.shared_handle(id).is_none());
    }

    #[test]
    fn dx_resources_lock_is_reentrant_on_one_thread() {
        let resources = DXResources::new(Box::new(NullDevice::new()));
        let outer = resources.lock();
        // Re-locking from the same thread must not deadlock.
        let inner = resources.lock();
        drop(inner);
        drop(outer);
    }
}
