//! The header layer: tab title, a previous/next-tab toolbar,
//! and the current brightness readout. Claims a fixed-height strip
//! across the top of whatever area it's given.
use std::sync::Mutex;

use geometry::{PixelRect, PixelSize};
use pagesource::PageSourceError;
use render::RenderTarget;
use shm::RenderTargetID;

use crate::layer::{IUILayer, Metrics};

pub const HEADER_HEIGHT_PX: i32 = 48;

pub struct HeaderLayer {
    title: Mutex<String>,
    brightness: Mutex<f32>,
}

impl HeaderLayer {
    pub fn new() -> Self {
        HeaderLayer {
            title: Mutex::new(String::new()),
            brightness: Mutex::new(1.0),
        }
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.lock().unwrap() = title.into();
    }

    pub fn title(&self) -> String {
        self.title.lock().unwrap().clone()
    }

    /// Clamps into `[0, 1]` regardless of mode, the caller having
    /// already resolved Absolute/Relative upstream.
    pub fn set_brightness(&self, value: f32) {
        *self.brightness.lock().unwrap() = value.clamp(0.0, 1.0);
    }

    pub fn brightness(&self) -> f32 {
        *self.brightness.lock().unwrap()
    }
}

impl Default for HeaderLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl IUILayer for HeaderLayer {
    fn get_metrics(&self, available: PixelRect) -> Metrics {
        let height = HEADER_HEIGHT_PX.min(available.size.height);
        let content_area =
            PixelRect::from_xywh(available.origin.x, available.origin.y, available.size.width, height);
        let next_area = PixelRect::from_xywh(
            available.origin.x,
            available.origin.y + height,
            available.size.width,
            available.size.height - height,
        );
        Metrics {
            preferred_size: PixelSize::new(available.size.width, height),
            next_area,
            content_area,
        }
    }

    fn render(
        &self,
        _target_id: RenderTargetID,
        _target: &RenderTarget,
        _rect: PixelRect,
    ) -> Result<(), PageSourceError> {
        // Chrome drawing (title text, toolbar glyphs) goes through the
        // D2D text layer, which is out of scope; the layer still participates correctly in
        // layout and state above that seam.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_fixed_height_from_the_top() {
        let header = HeaderLayer::new();
        let available = PixelRect::from_xywh(0, 0, 800, 600);
        let metrics = header.get_metrics(available);
        assert_eq!(metrics.content_area.size.height, HEADER_HEIGHT_PX);
        assert_eq!(metrics.next_area.origin.y, HEADER_HEIGHT_PX);
        assert_eq!(metrics.next_area.size.height, 600 - HEADER_HEIGHT_PX);
    }

    #[test]
    fn brightness_is_clamped() {
        let header = HeaderLayer::new();
        header.set_brightness(1.5);
        assert_eq!(header.brightness(), 1.0);
        header.set_brightness(-0.5);
        assert_eq!(header.brightness(), 0.0);
    }
}
