//! Per-emote transform state.
//!
//! Every walking emote owns one [`Instance`]. The animation mixer writes the
//! sampled keyframe into it each frame and the emote then applies its fixed
//! orientation correction in local space. Hosts upload the result with
//! [`Instance::to_raw`] when they batch emotes into one instanced draw.

use std::ops::Mul;

use cgmath::{Deg, One, Rad, Rotation3, SquareMatrix};

/// Position, rotation (as quaternion) and non-uniform scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Identity transform: origin, no rotation, unit scale.
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Rotate around the object's own X axis.
    pub fn rotate_x(&mut self, angle: impl Into<Rad<f32>>) {
        self.rotation = self.rotation * cgmath::Quaternion::from_angle_x(angle.into());
    }

    /// Rotate around the object's own Z axis.
    pub fn rotate_z(&mut self, angle: impl Into<Rad<f32>>) {
        self.rotation = self.rotation * cgmath::Quaternion::from_angle_z(angle.into());
    }

    /// Move along the object's own Y axis (after rotation, before scale).
    pub fn translate_y(&mut self, distance: f32) {
        self.position += self.rotation * cgmath::Vector3::new(0.0, distance, 0.0);
    }

    pub fn scale_by(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// Yaw helper for hosts that spread emotes around a path.
    pub fn with_heading(mut self, heading: Deg<f32>) -> Self {
        self.rotation = cgmath::Quaternion::from_angle_y(heading) * self.rotation;
        self
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let world_matrix = self.to_matrix();
        InstanceRaw {
            model: world_matrix.into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
            // mirrored scales flip the winding order
            handedness: world_matrix.determinant().signum(),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// Parent-times-child composition, used to place an emote's local transform
/// under the host's path/root transform.
impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        Instance {
            position: self.position + (self.rotation * scaled_rhs_pos),
            rotation: self.rotation * rhs.rotation,
            scale: cgmath::Vector3::new(
                self.scale.x * rhs.scale.x,
                self.scale.y * rhs.scale.y,
                self.scale.z * rhs.scale.z,
            ),
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Instance;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

/**
 * GPU layout of an emote transform: a 4x4 model matrix, the 3x3 rotation
 * used for normals and a handedness sign.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
    pub handedness: f32,
}

impl InstanceRaw {
    /// Pack a batch of transforms for `Queue::write_buffer`.
    pub fn as_bytes(raw: &[InstanceRaw]) -> &[u8] {
        bytemuck::cast_slice(raw)
    }
}
