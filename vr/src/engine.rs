//! `VRKneeboard`: resolves the HMD pose plus each
//! layer's static config into the per-frame `VRLayer` records the SHM
//! writer publishes.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};

use event::Event;
use pagesource::PhysicalSizeDirection;
use shm::{LayerID, VRSettings};

use crate::layer_config::{LayerConfig, RenderParameters, ResolvedLayer, ViewType};
use crate::pose::{horizontal_mirror, kneeboard_world_pose, recenter_matrix_from_hmd, HmdPose};

struct Resolved {
    layer_id: LayerID,
    enable_in_vr: bool,
    params: RenderParameters,
}

/// Per-process VR placement state: the latched eye height, the
/// current recenter transform, and per-layer gaze hysteresis.
pub struct VRKneeboard {
    recenter_count: AtomicU32,
    recenter_matrix: Mutex<Matrix4<f32>>,
    eye_height: Mutex<Option<f32>>,
    looking: Mutex<HashMap<LayerID, bool>>,
    active_layer: Mutex<LayerID>,
    active_layer_changed: Arc<Event<LayerID>>,
}

impl VRKneeboard {
    pub fn new() -> Self {
        VRKneeboard {
            recenter_count: AtomicU32::new(0),
            recenter_matrix: Mutex::new(Matrix4::identity()),
            eye_height: Mutex::new(None),
            looking: Mutex::new(HashMap::new()),
            active_layer: Mutex::new(LayerID::NULL),
            active_layer_changed: Event::new(),
        }
    }

    pub fn active_layer_changed(&self) -> &Arc<Event<LayerID>> {
        &self.active_layer_changed
    }

    /// Snapshots a new recenter transform iff `vr.recenter_count` has
    /// advanced since the last call.
    fn maybe_recenter(&self, vr: &VRSettings, hmd: &HmdPose) {
        let previous = self.recenter_count.load(Ordering::SeqCst);
        if vr.recenter_count != previous {
            *self.recenter_matrix.lock().unwrap() = recenter_matrix_from_hmd(hmd);
            self.recenter_count.store(vr.recenter_count, Ordering::SeqCst);
        }
    }

    fn latched_eye_height(&self, hmd: &HmdPose) -> f32 {
        let mut eye_height = self.eye_height.lock().unwrap();
        *eye_height.get_or_insert(hmd.position.y)
    }

    /// Resolves every layer in `configs` for one frame, given the
    /// current HMD pose and global VR settings. Layers are
    /// resolved in order; a `HorizontalMirror` entry must appear after
    /// the layer it mirrors.
    pub fn resolve(&self, hmd: &HmdPose, vr: &VRSettings, configs: &[LayerConfig]) -> Vec<ResolvedLayer> {
        self.maybe_recenter(vr, hmd);
        let recenter = *self.recenter_matrix.lock().unwrap();
        let eye_height = self.latched_eye_height(hmd);

        let mut by_id: HashMap<LayerID, Resolved> = HashMap::new();
        let mut ordered_ids = Vec::with_capacity(configs.len());

        for config in configs {
            let source_pose = match config.view_type {
                ViewType::Normal => config.pose,
                ViewType::HorizontalMirror(of) => {
                    // The referenced layer's pose is used even if
                    // that layer itself is disabled; since we resolve in
                    // declaration order, it must already be in `by_id`
                    // or we fall back to this layer's own configured
                    // pose (a misconfigured mirror target).
                    by_id
                        .get(&of)
                        .map(|_| horizontal_mirror(&config.pose))
                        .unwrap_or(config.pose)
                }
            };

            let world_pose = kneeboard_world_pose(&source_pose, eye_height, &recenter);
            let is_looking = self.test_gaze(hmd, &world_pose, config);

            let mut size_m = if vr.force_zoom || (is_looking && config.enable_gaze_zoom) {
                (
                    config.normal_size_m.0 * config.zoom_scale,
                    config.normal_size_m.1 * config.zoom_scale,
                )
            } else {
                config.normal_size_m
            };

            if let Some(physical) = config.physical_size {
                size_m = rescale_to_physical(size_m, physical.length, physical.direction);
            }

            let opacity = if is_looking {
                config.opacity.gaze
            } else {
                config.opacity.normal
            };

            let cache_key = config.cache_key | (is_looking as u64);

            self.looking.lock().unwrap().insert(config.layer_id, is_looking);

            by_id.insert(
                config.layer_id,
                Resolved {
                    layer_id: config.layer_id,
                    enable_in_vr: config.enable_in_vr,
                    params: RenderParameters {
                        kneeboard_pose: world_pose,
                        kneeboard_size_m: size_m,
                        cache_key,
                        kneeboard_opacity: opacity,
                        is_looking_at_kneeboard: is_looking,
                    },
                },
            );
            ordered_ids.push(config.layer_id);
        }

        // Mirror targets are resolved above even when disabled, so a
        // `HorizontalMirror` referent is available; only enabled
        // layers are actually published.
        ordered_ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .filter(|r| r.enable_in_vr)
            .map(|r| ResolvedLayer {
                layer_id: r.layer_id,
                params: r.params,
            })
            .collect()
    }

    /// Ray-rectangle intersection with hysteresis - if the layer was
    /// being looked at last frame, the zoomed rect is used for this
    /// frame's test too, so the zoom doesn't flicker at the edge.
    fn test_gaze(&self, hmd: &HmdPose, world_pose: &Matrix4<f32>, config: &LayerConfig) -> bool {
        let was_looking = self
            .looking
            .lock()
            .unwrap()
            .get(&config.layer_id)
            .copied()
            .unwrap_or(false);

        let base = config.normal_size_m;
        let test_size = if was_looking {
            (
                base.0 * config.zoom_scale * config.gaze_target_scale,
                base.1 * config.zoom_scale * config.gaze_target_scale,
            )
        } else {
            (base.0 * config.gaze_target_scale, base.1 * config.gaze_target_scale)
        };

        ray_hits_rect(hmd.position, hmd.forward(), world_pose, test_size)
    }

    /// Active-view election: default is `global_input_layer_id`; if
    /// gaze-input-focus is enabled and that default isn't currently
    /// gazed, the last enabled gazed layer takes over, and the change
    /// is published through `active_layer_changed` (the Rust stand-in
    /// for `ActiveConsumers::SetActiveInGameViewID`). `resolved` is the
    /// output of [`Self::resolve`], which already excludes disabled
    /// layers.
    pub fn resolve_active_layer(&self, global_input_layer_id: LayerID, vr: &VRSettings, resolved: &[ResolvedLayer]) -> LayerID {
        let mut active = global_input_layer_id;

        if vr.gaze_input_focus {
            let default_is_gazed = resolved
                .iter()
                .find(|r| r.layer_id == active)
                .map(|r| r.params.is_looking_at_kneeboard)
                .unwrap_or(false);

            if !default_is_gazed {
                if let Some(last_gazed) = resolved.iter().rev().find(|r| r.params.is_looking_at_kneeboard) {
                    active = last_gazed.layer_id;
                }
            }
        }

        let mut current = self.active_layer.lock().unwrap();
        if *current != active {
            *current = active;
            drop(current);
            self.active_layer_changed.emit(active);
        }
        active
    }
}

impl Default for VRKneeboard {
    fn default() -> Self {
        Self::new()
    }
}

fn rescale_to_physical(size_m: (f32, f32), target_length: f32, direction: PhysicalSizeDirection) -> (f32, f32) {
    let current = match direction {
        PhysicalSizeDirection::Horizontal => size_m.0,
        PhysicalSizeDirection::Vertical => size_m.1,
        PhysicalSizeDirection::Diagonal => (size_m.0 * size_m.0 + size_m.1 * size_m.1).sqrt(),
    };
    if current <= 0.0 {
        return size_m;
    }
    let scale = target_length / current;
    (size_m.0 * scale, size_m.1 * scale)
}

/// Ray-plane intersection against the kneeboard's own plane (local Z
/// = 0), then a local-space rect test against half-extents derived
/// from `size_m`.
fn ray_hits_rect(origin: Vector3<f32>, direction: Vector3<f32>, world_pose: &Matrix4<f32>, size_m: (f32, f32)) -> bool {
    let Some(inverse) = world_pose.invert() else {
        return false;
    };

    // Ray in the kneeboard's local space.
    let local_origin = inverse * Vector4::new(origin.x, origin.y, origin.z, 1.0);
    let local_dir = inverse * Vector4::new(direction.x, direction.y, direction.z, 0.0);

    if local_dir.z.abs() < 1e-6 {
        return false;
    }
    // Plane is z=0 locally: solve local_origin.z + t*local_dir.z = 0.
    let t = -local_origin.z / local_dir.z;
    if t < 0.0 {
        return false;
    }

    let hit_x = local_origin.x + t * local_dir.x;
    let hit_y = local_origin.y + t * local_dir.y;

    let half_w = size_m.0 / 2.0;
    let half_h = size_m.1 / 2.0;
    hit_x.abs() <= half_w && hit_y.abs() <= half_h
}

#[cfg(test)]
mod tests {
    use super::*;
    use shm::{DisplayArea, Opacity, VRPose, LAYER_IDS};

    fn config(pose: VRPose) -> LayerConfig {
        LayerConfig {
            layer_id: LAYER_IDS.mint(),
            enable_in_vr: true,
            view_type: ViewType::Normal,
            pose,
            normal_size_m: (0.3, 0.3),
            zoom_scale: 2.0,
            gaze_target_scale: 1.0,
            enable_gaze_zoom: true,
            opacity: Opacity::default(),
            display_area: DisplayArea::Full,
            physical_size: None,
            cache_key: 0,
        }
    }

    fn looking_hmd() -> HmdPose {
        // Looking straight along -Z from the origin at a kneeboard
        // placed 1m in front, facing back toward the viewer.
        HmdPose::new(Vector3::new(0.0, 1.7, 0.0), 0.0, 0.0, 0.0)
    }

    /// A layer straight ahead of the HMD at `distance` meters, at the
    /// same height as the HMD's eye (no extra rotation, so the world
    /// transform is a pure translation and the straight-ahead gaze ray
    /// hits its exact center).
    fn ahead_pose(distance: f32) -> VRPose {
        VRPose {
            x: 0.0,
            y: 0.0,
            z: -distance,
            rx: 0.0,
            ry: 0.0,
            rz: 0.0,
            eye_y_offset: 0.0,
        }
    }

    #[test]
    fn s6_recenter_uses_hmd_xz_and_yaw_only() {
        let engine = VRKneeboard::new();
        let hmd = HmdPose::new(Vector3::new(0.5, 1.7, 0.1), 0.5235988, 0.0, 0.0); // 30 deg yaw
        let vr = VRSettings {
            recenter_count: 1,
            ..VRSettings::default()
        };
        let origin_pose = VRPose {
            eye_y_offset: -hmd.position.y, // cancel the eye-height latch for this check
            ..VRPose::default()
        };
        let configs = vec![config(origin_pose)];
        let resolved = engine.resolve(&hmd, &vr, &configs);

        let world_origin = resolved[0].params.kneeboard_pose * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((world_origin.x - 0.5).abs() < 1e-4);
        assert!((world_origin.y).abs() < 1e-4);
        assert!((world_origin.z - 0.1).abs() < 1e-4);
    }

    #[test]
    fn s5_gaze_hysteresis_keeps_looking_true_at_zoomed_edge() {
        let engine = VRKneeboard::new();
        let hmd = looking_hmd();
        let vr = VRSettings::default();

        // A kneeboard placed 1m ahead, 0.2x0.2m, offset just inside the
        // normal gaze rect (half-width 0.1m).
        let mut cfg = config(ahead_pose(1.0));
        cfg.normal_size_m = (0.2, 0.2);
        cfg.pose.x = -0.07;
        let first = engine.resolve(&hmd, &vr, &[cfg]);
        assert!(first[0].params.is_looking_at_kneeboard);

        // Move further off-axis: now outside the *normal* half-width
        // (0.1m) but still inside the *zoomed* half-width (0.2m).
        // Hysteresis from the prior `is_looking=true` must retest
        // against the zoomed rect and keep reporting `true` - same
        // layer_id, so the engine remembers last frame's state.
        cfg.pose.x = -0.13;
        let second = engine.resolve(&hmd, &vr, &[cfg]);
        assert!(second[0].params.is_looking_at_kneeboard);
    }

    #[test]
    fn gaze_miss_reports_not_looking() {
        let engine = VRKneeboard::new();
        let hmd = looking_hmd();
        let vr = VRSettings::default();
        // Placed far off to the side: the forward ray never hits it.
        let mut pose = ahead_pose(1.0);
        pose.x = 5.0;
        let configs = vec![config(pose)];
        let resolved = engine.resolve(&hmd, &vr, &configs);
        assert!(!resolved[0].params.is_looking_at_kneeboard);
    }

    #[test]
    fn active_view_defaults_to_global_input_layer() {
        let engine = VRKneeboard::new();
        let layer_a = LAYER_IDS.mint();
        let resolved = vec![ResolvedLayer {
            layer_id: layer_a,
            params: RenderParameters {
                kneeboard_pose: Matrix4::identity(),
                kneeboard_size_m: (0.3, 0.3),
                cache_key: 0,
                kneeboard_opacity: 1.0,
                is_looking_at_kneeboard: false,
            },
        }];
        let vr = VRSettings::default();
        let active = engine.resolve_active_layer(layer_a, &vr, &resolved);
        assert_eq!(active, layer_a);
    }

    #[test]
    fn gaze_input_focus_moves_active_layer_to_last_gazed() {
        let engine = VRKneeboard::new();
        let layer_a = LAYER_IDS.mint();
        let layer_b = LAYER_IDS.mint();
        let resolved = vec![
            ResolvedLayer {
                layer_id: layer_a,
                params: RenderParameters {
                    kneeboard_pose: Matrix4::identity(),
                    kneeboard_size_m: (0.3, 0.3),
                    cache_key: 0,
                    kneeboard_opacity: 1.0,
                    is_looking_at_kneeboard: false,
                },
            },
            ResolvedLayer {
                layer_id: layer_b,
                params: RenderParameters {
                    kneeboard_pose: Matrix4::identity(),
                    kneeboard_size_m: (0.3, 0.3),
                    cache_key: 0,
                    kneeboard_opacity: 1.0,
                    is_looking_at_kneeboard: true,
                },
            },
        ];
        let vr = VRSettings {
            gaze_input_focus: true,
            ..VRSettings::default()
        };
        let active = engine.resolve_active_layer(layer_a, &vr, &resolved);
        assert_eq!(active, layer_b);
    }
}
