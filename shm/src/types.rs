//! The on-the-wire layout of the SHM region: the fixed header and the
//! per-layer records that follow it.
use geometry::PixelRect;
use utils::handle::{Handle, HandleAllocator};

/// Up to this many layers may be published in one frame.
pub const MAX_VIEW_COUNT: usize = 4;

/// Number of pool textures per layer the writer round-robins through.
pub const SWAPCHAIN_LENGTH: usize = 3;

/// Protocol version embedded in the SHM name and the header.
pub const PROTOCOL_VERSION: u32 = 1;

/// Magic used to sanity-check an opened region before trusting its
/// contents; a mismatch here is a fatal condition for a reader.
pub const SHM_MAGIC: u32 = 0x4f4b_4231; // "OKB1"

pub struct RenderTargetTag;
pub struct PageTag;
pub struct KneeboardViewTag;
pub struct LayerTag;

pub type RenderTargetID = Handle<RenderTargetTag>;
pub type PageID = Handle<PageTag>;
pub type KneeboardViewID = Handle<KneeboardViewTag>;
pub type LayerID = Handle<LayerTag>;

pub static LAYER_IDS: HandleAllocator<LayerTag> = HandleAllocator::new();
pub static KNEEBOARD_VIEW_IDS: HandleAllocator<KneeboardViewTag> = HandleAllocator::new();
pub static PAGE_IDS: HandleAllocator<PageTag> = HandleAllocator::new();
pub static RENDER_TARGET_IDS: HandleAllocator<RenderTargetTag> = HandleAllocator::new();

/// Whether a layer's VR surface shows the full canvas or just the
/// content sub-rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayArea {
    Full,
    ContentOnly,
}

/// A world-space pose for one layer's kneeboard surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VRPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
    pub eye_y_offset: f32,
}

impl Default for VRPose {
    fn default() -> Self {
        VRPose {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rx: 0.0,
            ry: 0.0,
            rz: 0.0,
            eye_y_offset: 0.0,
        }
    }
}

/// Normal/gaze opacity pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opacity {
    pub normal: f32,
    pub gaze: f32,
}

impl Default for Opacity {
    fn default() -> Self {
        Opacity {
            normal: 1.0,
            gaze: 1.0,
        }
    }
}

/// Global VR settings published once per frame in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VRSettings {
    pub recenter_count: u32,
    pub force_zoom: bool,
    pub gaze_input_focus: bool,
}

/// One published layer record. `texture_index` is an index into the
/// writer's texture pool; `shared_handle` is the exported NT handle
/// for whichever real texture currently backs that pool slot, if the
/// device behind this frame produced one (a `NullDevice`-backed
/// writer never does). A reader duplicates `shared_handle` into its
/// own process once per newly-observed frame rather than taking
/// ownership of the writer's own handle.
#[derive(Debug, Clone, PartialEq)]
pub struct SHMLayer {
    pub layer_id: LayerID,
    pub enable_in_vr: bool,
    pub texture_index: u32,
    pub fence_value: u64,
    pub shared_handle: Option<std::sync::Arc<crate::handle_os::OwnedHandle>>,
    pub full_rect: PixelRect,
    pub content_rect: PixelRect,
    pub pose: VRPose,
    pub physical_size_m: (f32, f32),
    pub max_physical_size_m: (f32, f32),
    pub opacity: Opacity,
    pub zoom_scale: f32,
    pub gaze_target_scale: f32,
    pub enable_gaze_zoom: bool,
    pub display_area: DisplayArea,
}

impl SHMLayer {
    pub fn new(layer_id: LayerID, full_rect: PixelRect) -> Self {
        SHMLayer {
            layer_id,
            enable_in_vr: true,
            texture_index: 0,
            fence_value: 0,
            shared_handle: None,
            full_rect,
            content_rect: full_rect,
            pose: VRPose::default(),
            physical_size_m: (0.25, 0.25),
            max_physical_size_m: (0.5, 0.5),
            opacity: Opacity::default(),
            zoom_scale: 2.0,
            gaze_target_scale: 1.0,
            enable_gaze_zoom: false,
            display_area: DisplayArea::Full,
        }
    }
}

/// The fixed header record at the start of the region. `sequence` is
/// the seqlock field: a reader sees a new frame iff it changed since
/// the reader last observed it.
#[derive(Debug, Clone, PartialEq)]
pub struct SHMHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u64,
    pub feeder_process_id: u32,
    pub feeder_thread_id: u32,
    pub feeder_gpu_luid: i64,
    pub layer_count: u8,
    pub global_input_layer_id: LayerID,
    pub vr: VRSettings,
    pub fence_value: u64,
    pub layers: Vec<SHMLayer>,
}

impl SHMHeader {
    pub fn empty() -> Self {
        SHMHeader {
            magic: SHM_MAGIC,
            version: PROTOCOL_VERSION,
            sequence: 0,
            feeder_process_id: std::process::id(),
            feeder_thread_id: 0,
            feeder_gpu_luid: 0,
            layer_count: 0,
            global_input_layer_id: LayerID::NULL,
            vr: VRSettings::default(),
            fence_value: 0,
            layers: Vec::new(),
        }
    }
}

/// Windows named-object names are derived from this reverse-domain
/// stem. Kept as a plain constant rather than threaded through every
/// call site, mirroring how the original engine bakes it into a
/// single header.
pub const SHM_NAME_STEM: &str = "com.openkneeboard";

pub fn shm_region_name() -> String {
    format!("Local\\{}.shm.v{}", SHM_NAME_STEM, PROTOCOL_VERSION)
}
