//! Pose/matrix plumbing for the VR placement engine.
//!
//! `thundr`'s geometric pipeline (this workspace's forebear's renderer)
//! already builds its per-sprite model matrices with `cgmath::Matrix4`
//! (`thundr/src/pipelines/geometric.rs`); the VR engine reuses the same
//! crate for kneeboard world-pose composition rather than hand-rolling
//! 4x4 matrix math.
use cgmath::{Matrix3, Matrix4, Rad, Vector3};

use shm::VRPose;

/// The HMD's pose for one frame, as handed down by the host runtime
/// (OpenXR/OpenVR). Orientation is kept as separate yaw/pitch/roll
/// rather than a quaternion because VR placement only ever needs yaw
/// alone (recenter) or the full Euler composition (gaze ray) - both
/// are simpler to reason about in that form, and this workspace's
/// forebear favours small, explicit transforms over a general
/// quaternion type it doesn't otherwise need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HmdPose {
    pub position: Vector3<f32>,
    /// Rotation about Y (left/right look), radians.
    pub yaw: f32,
    /// Rotation about X (up/down look), radians.
    pub pitch: f32,
    /// Rotation about Z (head tilt), radians.
    pub roll: f32,
}

impl HmdPose {
    pub fn new(position: Vector3<f32>, yaw: f32, pitch: f32, roll: f32) -> Self {
        HmdPose {
            position,
            yaw,
            pitch,
            roll,
        }
    }

    /// Yaw-only rotation matrix, used for recenter.
    pub fn yaw_only_rotation(&self) -> Matrix3<f32> {
        Matrix3::from_angle_y(Rad(self.yaw))
    }

    /// The full Rx*Ry*Rz orientation.
    pub fn full_rotation(&self) -> Matrix3<f32> {
        Matrix3::from_angle_x(Rad(self.pitch))
            * Matrix3::from_angle_y(Rad(self.yaw))
            * Matrix3::from_angle_z(Rad(self.roll))
    }

    /// The HMD's forward-look direction in world space (-Z rotated by
    /// the full orientation), used as the gaze ray.
    pub fn forward(&self) -> Vector3<f32> {
        self.full_rotation() * Vector3::new(0.0, 0.0, -1.0)
    }
}

/// Builds the world transform for one layer's kneeboard surface
///: `Rx(pose.rx)*Ry(pose.ry)*Rz(pose.rz)*
/// Translate(pose.x, pose.eye_y+eye_height, pose.z)*recenter`.
pub fn kneeboard_world_pose(pose: &VRPose, eye_height: f32, recenter: &Matrix4<f32>) -> Matrix4<f32> {
    let rx = Matrix4::from_angle_x(Rad(pose.rx));
    let ry = Matrix4::from_angle_y(Rad(pose.ry));
    let rz = Matrix4::from_angle_z(Rad(pose.rz));
    let translate = Matrix4::from_translation(Vector3::new(pose.x, pose.eye_y_offset + eye_height, pose.z));
    rx * ry * rz * translate * recenter
}

/// The recenter transform snapshotted from an HMD pose:
/// the HMD's position with Y zeroed, plus its yaw-only rotation.
pub fn recenter_matrix_from_hmd(hmd: &HmdPose) -> Matrix4<f32> {
    let translate = Matrix4::from_translation(Vector3::new(hmd.position.x, 0.0, hmd.position.z));
    let rotate = Matrix4::from(hmd.yaw_only_rotation());
    translate * rotate
}

/// Mirrors a view's pose: negates the pose's X translation and the
/// Y-axis (yaw) rotation angle before composing the world transform,
/// the way `pose.GetHorizontalMirror()` does.
pub fn horizontal_mirror(pose: &VRPose) -> VRPose {
    VRPose {
        x: -pose.x,
        ry: -pose.ry,
        ..*pose
    }
}
