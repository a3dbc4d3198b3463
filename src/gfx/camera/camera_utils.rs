use cgmath::{Matrix4, SquareMatrix};

use super::camera::Camera;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix, in wgpu clip space.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    /// Creates a default [CameraUniform].
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        let mut uniform = Self::default();
        uniform.update(camera);
        uniform
    }

    /// Refreshes from the camera's current transform and cached projection.
    pub fn update(&mut self, camera: &Camera) {
        let eye = camera.position();
        self.view_position = [eye.x, eye.y, eye.z, 1.0];
        self.view_proj = convert_matrix4_to_array(OPENGL_TO_WGPU_MATRIX * camera.view_projection());
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}
