//! Local transforms: position, rotation and scale of a single node.
//!
//! Rotation is stored as a quaternion. Euler angles are accepted through
//! [`Euler`], which carries an explicit axis order so that `YXZ` and `XYZ`
//! rotations of the same angles never get confused.

use cgmath::{
    InnerSpace, Matrix3, Matrix4, One, Quaternion, Rad, Rotation3, Vector3, Zero,
};

use crate::error::CameraError;

/// Squared length under which two points are treated as coincident.
const COINCIDENT_EPSILON: f32 = 1e-12;

/// Order in which Euler rotations are applied (intrinsic, left to right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EulerOrder {
    #[default]
    XYZ,
    XZY,
    YXZ,
    YZX,
    ZXY,
    ZYX,
}

/// Euler angles in radians with their application order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub order: EulerOrder,
}

impl Euler {
    pub fn new(x: f32, y: f32, z: f32, order: EulerOrder) -> Self {
        Self { x, y, z, order }
    }

    /// Same angles, applied in a different order.
    pub fn reorder(self, order: EulerOrder) -> Self {
        Self { order, ..self }
    }

    pub fn to_quaternion(self) -> Quaternion<f32> {
        let qx = Quaternion::from_angle_x(Rad(self.x));
        let qy = Quaternion::from_angle_y(Rad(self.y));
        let qz = Quaternion::from_angle_z(Rad(self.z));
        match self.order {
            EulerOrder::XYZ => qx * qy * qz,
            EulerOrder::XZY => qx * qz * qy,
            EulerOrder::YXZ => qy * qx * qz,
            EulerOrder::YZX => qy * qz * qx,
            EulerOrder::ZXY => qz * qx * qy,
            EulerOrder::ZYX => qz * qy * qx,
        }
    }
}

impl From<Euler> for Quaternion<f32> {
    fn from(euler: Euler) -> Self {
        euler.to_quaternion()
    }
}

/// Position, rotation and scale relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::identity()
        }
    }

    /// Local matrix, composed as `T * R * S`.
    pub fn matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let r = Matrix4::from(self.rotation);
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vector3::new(x, y, z);
    }

    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale = Vector3::new(x, y, z);
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vector3::new(scale, scale, scale);
    }

    pub fn set_euler(&mut self, euler: Euler) {
        self.rotation = euler.to_quaternion();
    }

    /// Rotate around the local X axis.
    pub fn rotate_x(&mut self, angle: Rad<f32>) {
        self.rotation = self.rotation * Quaternion::from_angle_x(angle);
    }

    /// Rotate around the local Y axis.
    pub fn rotate_y(&mut self, angle: Rad<f32>) {
        self.rotation = self.rotation * Quaternion::from_angle_y(angle);
    }

    /// Rotate around the local Z axis.
    pub fn rotate_z(&mut self, angle: Rad<f32>) {
        self.rotation = self.rotation * Quaternion::from_angle_z(angle);
    }

    /// Distance of the local position from the parent origin.
    pub fn length(&self) -> f32 {
        self.position.magnitude()
    }

    pub fn distance_to(&self, point: Vector3<f32>) -> f32 {
        (self.position - point).magnitude()
    }

    /// Scales the position to unit length. A zero position stays at the origin.
    pub fn normalize_position(&mut self) {
        if self.position.magnitude2() > COINCIDENT_EPSILON {
            self.position = self.position.normalize();
        }
    }

    /// Rotates so that the local -Z axis points at `target`.
    ///
    /// Leaves the rotation untouched and returns
    /// [`CameraError::DegenerateLookAt`] when `target` equals the position.
    pub fn look_at(&mut self, target: Vector3<f32>, up: Vector3<f32>) -> Result<(), CameraError> {
        self.rotation = look_rotation(self.position, target, up)?;
        Ok(())
    }
}

/// Rotation whose -Z axis points from `eye` toward `target`.
///
/// `up` resolves roll. When `up` is parallel to the view direction the basis
/// is nudged slightly so a valid rotation still comes out. A zero `up` has no
/// roll to resolve and is rejected like a coincident target.
pub fn look_rotation(
    eye: Vector3<f32>,
    target: Vector3<f32>,
    up: Vector3<f32>,
) -> Result<Quaternion<f32>, CameraError> {
    let mut z = eye - target;
    if z.magnitude2() <= COINCIDENT_EPSILON {
        return Err(CameraError::DegenerateLookAt);
    }
    if up.magnitude2() <= COINCIDENT_EPSILON {
        return Err(CameraError::DegenerateLookAt);
    }
    z = z.normalize();

    let mut x = up.cross(z);
    if x.magnitude2() <= COINCIDENT_EPSILON {
        if (up.z.abs() - 1.0).abs() <= f32::EPSILON {
            z.x += 1e-4;
        } else {
            z.z += 1e-4;
        }
        z = z.normalize();
        x = up.cross(z);
        if x.magnitude2() == 0.0 {
            return Err(CameraError::DegenerateLookAt);
        }
    }
    let x = x.normalize();
    let y = z.cross(x);

    Ok(Quaternion::from(Matrix3::from_cols(x, y, z)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Rotation, Transform as _};
    use std::f32::consts::FRAC_PI_4;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-3
    }

    #[test]
    fn test_matrix_applies_scale_then_rotation_then_translation() {
        let mut t = Transform::from_position(1.0, 0.0, 0.0);
        t.set_scale(2.0, 2.0, 2.0);
        t.rotate_y(Rad(std::f32::consts::FRAC_PI_2));

        let p = t.matrix().transform_point(cgmath::Point3::new(1.0, 0.0, 0.0));
        assert!(close(Vector3::new(p.x, p.y, p.z), Vector3::new(1.0, 0.0, -2.0)));
    }

    #[test]
    fn test_euler_order_matters() {
        let yxz = Euler::new(FRAC_PI_4, FRAC_PI_4, 0.0, EulerOrder::YXZ).to_quaternion();
        let xyz = Euler::new(FRAC_PI_4, FRAC_PI_4, 0.0, EulerOrder::XYZ).to_quaternion();

        let v = Vector3::new(0.0, 0.0, 1.0);
        assert!(!close(yxz.rotate_vector(v), xyz.rotate_vector(v)));

        let expected = Quaternion::from_angle_y(Rad(FRAC_PI_4)) * Quaternion::from_angle_x(Rad(FRAC_PI_4));
        assert!(close(yxz.rotate_vector(v), expected.rotate_vector(v)));
    }

    #[test]
    fn test_look_at_points_negative_z_at_target() {
        let mut t = Transform::from_position(0.5, -0.5, 5.0);
        let target = Vector3::new(-0.85, -0.75, 0.5);
        t.look_at(target, Vector3::unit_y()).unwrap();

        let forward = t.rotation.rotate_vector(-Vector3::unit_z());
        let expected = (target - t.position).normalize();
        assert!(close(forward, expected));
    }

    #[test]
    fn test_look_at_degenerate_keeps_rotation() {
        let mut t = Transform::from_position(1.0, 2.0, 3.0);
        t.rotate_x(Rad(0.3));
        let before = t.rotation;

        let result = t.look_at(Vector3::new(1.0, 2.0, 3.0), Vector3::unit_y());
        assert_eq!(result, Err(CameraError::DegenerateLookAt));
        assert_eq!(t.rotation, before);
    }

    #[test]
    fn test_look_at_straight_down_along_up_axis() {
        let mut t = Transform::from_position(0.0, 10.0, 0.0);
        t.look_at(Vector3::zero(), Vector3::unit_y()).unwrap();

        let forward = t.rotation.rotate_vector(-Vector3::unit_z());
        assert!(close(forward, -Vector3::unit_y()));
    }

    #[test]
    fn test_look_at_with_zero_up_is_rejected() {
        let mut t = Transform::from_position(0.0, 0.0, 5.0);
        let before = t.rotation;

        let result = t.look_at(Vector3::zero(), Vector3::zero());
        assert_eq!(result, Err(CameraError::DegenerateLookAt));
        assert_eq!(t.rotation, before);
        assert!(t.rotation.s.is_finite());
    }

    #[test]
    fn test_vector_helpers() {
        let mut t = Transform::from_position(3.0, 4.0, 0.0);
        assert!((t.length() - 5.0).abs() < 1e-6);
        assert!((t.distance_to(Vector3::new(3.0, 0.0, 0.0)) - 4.0).abs() < 1e-6);

        t.normalize_position();
        assert!((t.length() - 1.0).abs() < 1e-6);

        let mut origin = Transform::identity();
        origin.normalize_position();
        assert_eq!(origin.position, Vector3::zero());
    }
}
