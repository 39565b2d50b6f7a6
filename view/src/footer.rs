//! The footer layer: clock plus an optional game-provided
//! mission time string. Claims a fixed-height strip across the bottom
//! of whatever area it's given.
use std::sync::Mutex;

use geometry::{PixelRect, PixelSize};
use pagesource::PageSourceError;
use render::RenderTarget;
use shm::RenderTargetID;

use crate::layer::{IUILayer, Metrics};

pub const FOOTER_HEIGHT_PX: i32 = 32;

pub struct FooterLayer {
    mission_time: Mutex<Option<String>>,
}

impl FooterLayer {
    pub fn new() -> Self {
        FooterLayer {
            mission_time: Mutex::new(None),
        }
    }

    pub fn set_mission_time(&self, value: Option<String>) {
        *self.mission_time.lock().unwrap() = value;
    }

    pub fn mission_time(&self) -> Option<String> {
        self.mission_time.lock().unwrap().clone()
    }
}

impl Default for FooterLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl IUILayer for FooterLayer {
    fn get_metrics(&self, available: PixelRect) -> Metrics {
        let height = FOOTER_HEIGHT_PX.min(available.size.height);
        let content_area = PixelRect::from_xywh(
            available.origin.x,
            available.bottom() - height,
            available.size.width,
            height,
        );
        let next_area = PixelRect::from_xywh(
            available.origin.x,
            available.origin.y,
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_fixed_height_from_the_bottom() {
        let footer = FooterLayer::new();
        let available = PixelRect::from_xywh(0, 0, 800, 600);
        let metrics = footer.get_metrics(available);
        assert_eq!(metrics.content_area.origin.y, 600 - FOOTER_HEIGHT_PX);
        assert_eq!(metrics.next_area.size.height, 600 - FOOTER_HEIGHT_PX);
    }

    #[test]
    fn mission_time_round_trips() {
        let footer = FooterLayer::new();
        assert_eq!(footer.mission_time(), None);
        footer.set_mission_time(Some("01:23:45".to_string()));
        assert_eq!(footer.mission_time().as_deref(), Some("01:23:45"));
    }
}
