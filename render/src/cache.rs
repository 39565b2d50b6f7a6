//! `CachedLayer`: keyed on `(RenderTargetID, content key,
//! PixelSize)`, this is the shared caching policy both the renderer's
//! own layer compositing and `PageSourceWithDelegates`'s per-page
//! cache build on.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use geometry::PixelSize;
use shm::RenderTargetID;

use crate::backend::{GraphicsDevice, TextureId};
use crate::error::RenderError;

type CacheKey = (RenderTargetID, u64, PixelSize);

/// Caches one rendered texture per `(RenderTargetID, key, size)`
/// triple.
pub struct CachedLayer {
    device: Arc<dyn GraphicsDevice>,
    entries: Mutex<HashMap<CacheKey, TextureId>>,
}

impl CachedLayer {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        CachedLayer {
            device,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Render(rect, key, rt, producer):
    /// 1. look up `(rt_id, key, size)`; if present, return the cached
    ///    texture (the caller blits it).
    /// 2. otherwise create a texture, call `producer` to render into
    ///    it at origin `(0,0,size)`, cache it, and return it.
    pub fn render<F>(
        &self,
        target_id: RenderTargetID,
        key: u64,
        size: PixelSize,
        producer: F,
    ) -> Result<TextureId, RenderError>
    where
        F: FnOnce(TextureId, PixelSize) -> Result<(), RenderError>,
    {
        let cache_key = (target_id, key, size);
        {
            let entries = self.entries.lock().unwrap();
            if let Some(texture) = entries.get(&cache_key) {
                return Ok(*texture);
            }
        }

        let texture = self.device.create_texture(size)?;
        producer(texture, size)?;
        self.entries.lock().unwrap().insert(cache_key, texture);
        Ok(texture)
    }

    /// `evContentChanged` clears the whole cache.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock().unwrap();
        for texture in entries.values() {
            self.device.release_texture(*texture);
        }
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullDevice;
    use std::sync::atomic::{AtomicU32, Ordering};
    use utils::handle::Handle;

    #[test]
    fn second_render_with_same_key_hits_cache_without_reproducing() {
        let cache = CachedLayer::new(Arc::new(NullDevice::new()));
        let calls = Arc::new(AtomicU32::new(0));
        let target_id: RenderTargetID = Handle::from_raw(1);
        let size = PixelSize::new(100, 100);

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            cache
                .render(target_id, 42, size, move |_tex, _size| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_sizes_are_distinct_cache_entries() {
        let cache = CachedLayer::new(Arc::new(NullDevice::new()));
        let target_id: RenderTargetID = Handle::from_raw(1);
        cache.render(target_id, 1, PixelSize::new(10, 10), |_, _| Ok(())).unwrap();
        cache.render(target_id, 1, PixelSize::new(20, 20), |_, _| Ok(())).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_all_clears_and_releases_every_entry() {
        let device = Arc::new(NullDevice::new());
        let cache = CachedLayer::new(Arc::clone(&device) as Arc<dyn GraphicsDevice>);
        let target_id: RenderTargetID = Handle::from_raw(1);
        cache.render(target_id, 1, PixelSize::new(10, 10), |_, _| Ok(())).unwrap();
        cache.render(target_id, 2, PixelSize::new(10, 10), |_, _| Ok(())).unwrap();

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(device.released().len(), 2);
    }
}
