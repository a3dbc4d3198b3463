//! Unlit material definitions.
//!
//! A [`BasicMaterial`] is a flat colour, optionally modulated by a texture
//! map. Maps handed out by the loader start as placeholders and are filled
//! in place once their image arrives, so a material bound before the load
//! settles starts rendering the texture without being touched again.

use super::texture::{LoadStatus, Texture};

/// GPU-friendly snapshot of a material, for sinks that upload uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    /// 1.0 when a loaded map should be sampled, 0.0 otherwise.
    pub use_map: f32,
    pub wireframe: f32,
    _padding: [f32; 2],
}

/// Flat-colour material with an optional texture map.
///
/// Every field is public so a debug panel can edit it live.
#[derive(Debug, Clone)]
pub struct BasicMaterial {
    pub name: String,
    /// RGBA colour; alpha is the opacity.
    pub color: [f32; 4],
    pub map: Option<Texture>,
    pub wireframe: bool,
    pub visible: bool,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            color: [1.0, 1.0, 1.0, 1.0],
            map: None,
            wireframe: false,
            visible: true,
        }
    }
}

impl BasicMaterial {
    pub fn new(name: &str, color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            color,
            ..Default::default()
        }
    }

    /// Creates an opaque material from a `0xRRGGBB` colour.
    pub fn from_hex(name: &str, hex: u32) -> Self {
        Self::new(name, hex_to_rgba(hex))
    }

    /// Builder pattern: Set base color from RGB values
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.color = [r, g, b, self.color[3]];
        self
    }

    /// Builder pattern: Set alpha transparency
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.color[3] = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn with_map(mut self, map: Texture) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    /// Set the colour from `0xRRGGBB`, keeping the current alpha.
    pub fn set_hex(&mut self, hex: u32) {
        let [r, g, b, _] = hex_to_rgba(hex);
        self.color = [r, g, b, self.color[3]];
    }

    /// True when the map, if any, has a decoded image to sample.
    pub fn map_ready(&self) -> bool {
        self.map
            .as_ref()
            .is_some_and(|map| map.status() == LoadStatus::Loaded)
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.color,
            use_map: if self.map_ready() { 1.0 } else { 0.0 },
            wireframe: if self.wireframe { 1.0 } else { 0.0 },
            _padding: [0.0; 2],
        }
    }
}

fn hex_to_rgba(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let red = BasicMaterial::from_hex("red", 0xff0000);
        assert_eq!(red.color, [1.0, 0.0, 0.0, 1.0]);

        let mut cyan = BasicMaterial::from_hex("cyan", 0x00ffff).with_alpha(0.5);
        assert_eq!(cyan.color, [0.0, 1.0, 1.0, 0.5]);
        cyan.set_hex(0xffff00);
        assert_eq!(cyan.color, [1.0, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_uniform_ignores_unloaded_map() {
        let material = BasicMaterial::default()
            .with_map(Texture::pending("door.jpg"))
            .with_wireframe(true);
        let uniform = material.uniform();
        assert_eq!(uniform.use_map, 0.0);
        assert_eq!(uniform.wireframe, 1.0);
        assert!(!material.map_ready());
    }
}
