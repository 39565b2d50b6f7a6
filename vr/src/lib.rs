//! The VR placement engine: recenter, per-layer
//! world pose, gaze-driven zoom and opacity, and active-view election.
pub mod engine;
pub mod layer_config;
pub mod pose;

pub use engine::VRKneeboard;
pub use layer_config::{LayerConfig, RenderParameters, ResolvedLayer, ViewType};
pub use pose::{horizontal_mirror, kneeboard_world_pose, recenter_matrix_from_hmd, HmdPose};
