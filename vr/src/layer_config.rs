//! Per-layer VR configuration and the engine's per-frame output
//!: `LayerConfig` is what a `KneeboardView` contributes once it
//! decides to show up in VR; `ResolvedLayer`/`RenderParameters` is what
//! `VRKneeboard::resolve` hands back for the SHM writer to publish.
use cgmath::Matrix4;

use pagesource::PhysicalSize;
use shm::{DisplayArea, LayerID, Opacity, VRPose};

/// How a layer's world pose is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    Normal,
    /// Mirrors another layer's resolved pose, horizontally flipped.
    /// The referenced layer is resolved (and treated as enabled) even
    /// if its own `enable_in_vr` is false.
    HorizontalMirror(LayerID),
}

/// The input to `VRKneeboard::resolve` for one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerConfig {
    pub layer_id: LayerID,
    pub enable_in_vr: bool,
    pub view_type: ViewType,
    /// The layer's configured local pose, pre-recenter.
    pub pose: VRPose,
    /// Normal (non-zoomed) size in meters, (width, height).
    pub normal_size_m: (f32, f32),
    pub zoom_scale: f32,
    pub gaze_target_scale: f32,
    pub enable_gaze_zoom: bool,
    pub opacity: Opacity,
    pub display_area: DisplayArea,
    /// The content's declared physical size, if any.
    pub physical_size: Option<PhysicalSize>,
    /// Identifies this frame's content for the SHM/cache key.
    pub cache_key: u64,
}

/// Per-frame result for one layer: the resolved `LayerConfig`
/// paired with its `RenderParameters` (kneeboard pose, size, cache
/// key, opacity, and whether the HMD is currently looking at it).
#[derive(Debug, Clone, Copy)]
pub struct RenderParameters {
    pub kneeboard_pose: Matrix4<f32>,
    /// Resolved (possibly zoomed, possibly physical-size-rescaled)
    /// size in meters.
    pub kneeboard_size_m: (f32, f32),
    pub cache_key: u64,
    pub kneeboard_opacity: f32,
    pub is_looking_at_kneeboard: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedLayer {
    pub layer_id: LayerID,
    pub params: RenderParameters,
}
