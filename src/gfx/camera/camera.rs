use cgmath::{Deg, InnerSpace, Matrix4, Vector3};

use crate::{
    error::CameraError,
    gfx::scene::transform::{look_rotation, Transform},
};

/// Projection parameters for the two camera variants.
///
/// Angles are in degrees, distances in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    /// Checks `0 < near < far` plus the variant's own shape constraints.
    pub fn validate(&self) -> Result<(), CameraError> {
        let (near, far) = match *self {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => {
                if !(aspect > 0.0) {
                    return Err(CameraError::InvalidProjection("aspect must be positive"));
                }
                if !(fov_y > 0.0 && fov_y < 180.0) {
                    return Err(CameraError::InvalidProjection(
                        "field of view must be within (0, 180) degrees",
                    ));
                }
                (near, far)
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                near,
                far,
            } => {
                if !(right > left && top > bottom) {
                    return Err(CameraError::InvalidProjection("extents are empty or inverted"));
                }
                (near, far)
            }
        };
        if !(near > 0.0) {
            return Err(CameraError::InvalidProjection("near must be positive"));
        }
        if !(far > near) {
            return Err(CameraError::InvalidProjection("far must exceed near"));
        }
        Ok(())
    }

    /// Width over height of the view volume.
    pub fn aspect(&self) -> f32 {
        match *self {
            Projection::Perspective { aspect, .. } => aspect,
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                ..
            } => (right - left) / (top - bottom),
        }
    }

    /// OpenGL-convention projection matrix for the current parameters.
    pub fn matrix(&self) -> Matrix4<f32> {
        match *self {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => cgmath::perspective(Deg(fov_y), aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                near,
                far,
            } => cgmath::ortho(left, right, bottom, top, near, far),
        }
    }
}

/// A viewpoint with its own transform and a cached projection.
///
/// Projection parameters can be written freely, but the cached matrix only
/// changes on [`Camera::update_projection`], so several writes in one tick
/// cost a single recomputation.
#[derive(Debug, Clone)]
pub struct Camera {
    pub name: String,
    pub transform: Transform,
    /// Reference direction used to resolve roll in [`Camera::look_at`].
    pub up: Vector3<f32>,
    pub projection: Projection,
    projection_matrix: Matrix4<f32>,
}

impl Camera {
    pub fn new(projection: Projection) -> Result<Self, CameraError> {
        projection.validate()?;
        Ok(Self {
            name: "Camera".to_string(),
            transform: Transform::identity(),
            up: Vector3::unit_y(),
            projection_matrix: projection.matrix(),
            projection,
        })
    }

    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Result<Self, CameraError> {
        Self::new(Projection::Perspective {
            fov_y,
            aspect,
            near,
            far,
        })
    }

    pub fn orthographic(
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, CameraError> {
        Self::new(Projection::Orthographic {
            left,
            right,
            top,
            bottom,
            near,
            far,
        })
    }

    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.set_position(x, y, z);
        self
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.position
    }

    pub fn is_perspective(&self) -> bool {
        matches!(self.projection, Projection::Perspective { .. })
    }

    pub fn aspect(&self) -> f32 {
        self.projection.aspect()
    }

    /// Sets the aspect ratio without touching the cached matrix.
    ///
    /// An orthographic camera keeps its vertical extent and centre and widens
    /// or narrows horizontally, so the image is never skewed.
    pub fn set_aspect(&mut self, ratio: f32) {
        match &mut self.projection {
            Projection::Perspective { aspect, .. } => *aspect = ratio,
            Projection::Orthographic {
                left, right, top, bottom, ..
            } => {
                let half_width = (*top - *bottom) * 0.5 * ratio;
                let center = (*left + *right) * 0.5;
                *left = center - half_width;
                *right = center + half_width;
            }
        }
    }

    /// Replaces the orthographic extents. Fails on a perspective camera.
    pub fn set_extents(
        &mut self,
        new_left: f32,
        new_right: f32,
        new_top: f32,
        new_bottom: f32,
    ) -> Result<(), CameraError> {
        match &mut self.projection {
            Projection::Orthographic {
                left, right, top, bottom, ..
            } => {
                *left = new_left;
                *right = new_right;
                *top = new_top;
                *bottom = new_bottom;
                Ok(())
            }
            Projection::Perspective { .. } => Err(CameraError::InvalidProjection(
                "extents only apply to orthographic cameras",
            )),
        }
    }

    /// Adapts the aspect ratio to a surface size. A zero height is ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if height == 0 {
            log::debug!("ignoring viewport with zero height");
            return;
        }
        self.set_aspect(width as f32 / height as f32);
    }

    /// Recomputes the cached projection matrix from the stored parameters.
    ///
    /// Invalid parameters leave the previous matrix in place.
    pub fn update_projection(&mut self) -> Result<(), CameraError> {
        self.projection.validate()?;
        self.projection_matrix = self.projection.matrix();
        Ok(())
    }

    /// The matrix computed by the last successful [`Camera::update_projection`].
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix
    }

    /// World-to-view matrix. Camera scale is ignored.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let rotation = Matrix4::from(self.transform.rotation.conjugate());
        rotation * Matrix4::from_translation(-self.transform.position)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix * self.view_matrix()
    }

    /// Unit vector the camera is looking along (its local -Z).
    pub fn forward(&self) -> Vector3<f32> {
        (self.transform.rotation * -Vector3::unit_z()).normalize()
    }

    /// Points the camera at `target`.
    ///
    /// When `target` is the camera position the rotation is left as it was;
    /// the error is logged and returned.
    pub fn look_at(&mut self, target: Vector3<f32>) -> Result<(), CameraError> {
        match look_rotation(self.transform.position, target, self.up) {
            Ok(rotation) => {
                self.transform.rotation = rotation;
                Ok(())
            }
            Err(err) => {
                log::warn!("{}: {err}", self.name);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector4, Zero};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_perspective_matrix_matches_parameters() {
        let camera = Camera::perspective(55.0, 4.0 / 3.0, 0.1, 1000.0).unwrap();
        assert_eq!(
            camera.projection_matrix(),
            cgmath::perspective(Deg(55.0), 4.0 / 3.0, 0.1, 1000.0)
        );
        assert!(camera.is_perspective());
    }

    #[test]
    fn test_parameter_writes_wait_for_update_projection() {
        let mut camera = Camera::perspective(55.0, 800.0 / 600.0, 0.1, 1000.0).unwrap();
        let before = camera.projection_matrix();

        camera.set_aspect(2.0);
        if let Projection::Perspective { fov_y, .. } = &mut camera.projection {
            *fov_y = 75.0;
        }
        assert_eq!(camera.projection_matrix(), before);

        camera.update_projection().unwrap();
        assert_eq!(
            camera.projection_matrix(),
            cgmath::perspective(Deg(75.0), 2.0, 0.1, 1000.0)
        );
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(Camera::perspective(55.0, 1.0, 0.0, 10.0).is_err());
        assert!(Camera::perspective(55.0, 1.0, 10.0, 1.0).is_err());
        assert!(Camera::perspective(55.0, 0.0, 0.1, 10.0).is_err());
        assert!(Camera::orthographic(1.0, -1.0, 1.0, -1.0, 0.1, 10.0).is_err());

        let mut camera = Camera::perspective(55.0, 1.0, 0.1, 10.0).unwrap();
        let before = camera.projection_matrix();
        camera.set_aspect(-1.0);
        assert!(matches!(
            camera.update_projection(),
            Err(CameraError::InvalidProjection(_))
        ));
        assert_eq!(camera.projection_matrix(), before);
    }

    #[test]
    fn test_orthographic_aspect_keeps_extents_symmetric() {
        let mut camera = Camera::orthographic(-1.0, 1.0, 1.0, -1.0, 0.1, 100.0).unwrap();
        camera.set_viewport(800, 400);
        camera.update_projection().unwrap();

        match camera.projection {
            Projection::Orthographic {
                left, right, top, bottom, ..
            } => {
                assert!(approx(left, -2.0) && approx(right, 2.0));
                assert!(approx(top, 1.0) && approx(bottom, -1.0));
            }
            Projection::Perspective { .. } => unreachable!(),
        }
        assert!(approx(camera.aspect(), 2.0));
    }

    #[test]
    fn test_set_extents_only_for_orthographic() {
        let mut perspective = Camera::perspective(55.0, 1.0, 0.1, 10.0).unwrap();
        assert!(perspective.set_extents(-2.0, 2.0, 1.0, -1.0).is_err());

        let mut ortho = Camera::orthographic(-1.0, 1.0, 1.0, -1.0, 0.1, 10.0).unwrap();
        ortho.set_extents(-2.0, 2.0, 1.0, -1.0).unwrap();
        ortho.update_projection().unwrap();
        assert!(approx(ortho.aspect(), 2.0));
    }

    #[test]
    fn test_zero_height_viewport_is_ignored() {
        let mut camera = Camera::perspective(55.0, 1.5, 0.1, 10.0).unwrap();
        camera.set_viewport(800, 0);
        assert_eq!(camera.aspect(), 1.5);
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut camera = Camera::perspective(55.0, 1.0, 0.1, 100.0)
            .unwrap()
            .with_position(0.0, 0.0, 5.0);
        camera.look_at(Vector3::zero()).unwrap();

        let forward = camera.forward();
        assert!(approx(forward.z, -1.0));

        let origin = camera.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(approx(origin.x, 0.0) && approx(origin.y, 0.0) && approx(origin.z, -5.0));
    }

    #[test]
    fn test_degenerate_look_at_keeps_rotation() {
        let mut camera = Camera::perspective(55.0, 1.0, 0.1, 100.0)
            .unwrap()
            .with_position(1.0, 2.0, 3.0);
        camera.look_at(Vector3::zero()).unwrap();
        let rotation = camera.transform.rotation;

        assert_eq!(
            camera.look_at(Vector3::new(1.0, 2.0, 3.0)),
            Err(CameraError::DegenerateLookAt)
        );
        assert_eq!(camera.transform.rotation, rotation);
    }
}
