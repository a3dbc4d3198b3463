//! Application configuration
//!
//! Defaults give an 800×600 window with a 55° perspective camera five units
//! back from the origin, orbiting with fairly heavy damping.

use std::{path::PathBuf, time::Duration};

use crate::error::{Error, Result};

/// Initial camera placement and projection.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Point the camera initially looks at and orbits around
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y: 55.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// Orbit controller tuning.
#[derive(Debug, Clone)]
pub struct OrbitConfig {
    pub enabled: bool,
    /// Fraction of the remaining distance kept each tick, in `[0, 1)`
    pub damping: f32,
    /// Radians per pixel of pointer drag
    pub rotate_speed: f32,
    /// Relative radius change per wheel line
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            damping: 0.9,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance: 0.5,
            max_distance: 100.0,
        }
    }
}

/// Where textures come from and how they are fetched.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Directory that texture urls are resolved against
    pub asset_root: PathBuf,
    /// Worker threads for fetch and decode; 0 means one per logical CPU
    pub workers: usize,
    /// Loads still pending after this long are failed
    pub timeout: Option<Duration>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            workers: 2,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Top-level configuration for a [`crate::app::ThistleApp`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Upper bound applied to the display's pixel density
    pub max_pixel_density: f64,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub loader: LoaderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "thistle".to_string(),
            width: 800,
            height: 600,
            max_pixel_density: 2.0,
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            loader: LoaderConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_orbit(mut self, orbit: OrbitConfig) -> Self {
        self.orbit = orbit;
        self
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    /// Overrides defaults from `THISTLE_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(root) = std::env::var("THISTLE_ASSET_ROOT") {
            config.loader.asset_root = PathBuf::from(root);
        }
        if let Some(workers) = parse_env("THISTLE_LOADER_WORKERS") {
            config.loader.workers = workers;
        }
        if let Some(secs) = parse_env::<u64>("THISTLE_LOAD_TIMEOUT_SECS") {
            config.loader.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(damping) = parse_env("THISTLE_ORBIT_DAMPING") {
            config.orbit.damping = damping;
        }
        if let Some(density) = parse_env("THISTLE_MAX_PIXEL_DENSITY") {
            config.max_pixel_density = density;
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config("window size must be non-zero".to_string()));
        }
        if !(self.max_pixel_density > 0.0) {
            return Err(Error::Config("max pixel density must be positive".to_string()));
        }

        let camera = &self.camera;
        if !(camera.near > 0.0) {
            return Err(Error::Config("camera near plane must be positive".to_string()));
        }
        if !(camera.far > camera.near) {
            return Err(Error::Config("camera far plane must exceed near".to_string()));
        }
        if !(camera.fov_y > 0.0 && camera.fov_y < 180.0) {
            return Err(Error::Config("field of view must be within (0, 180) degrees".to_string()));
        }
        if camera.position == camera.target {
            return Err(Error::Config("camera position coincides with its target".to_string()));
        }

        let orbit = &self.orbit;
        if !(0.0..1.0).contains(&orbit.damping) {
            return Err(Error::Config("orbit damping must be within [0, 1)".to_string()));
        }
        if !(orbit.min_distance > 0.0 && orbit.max_distance >= orbit.min_distance) {
            return Err(Error::Config("orbit distance bounds are invalid".to_string()));
        }

        Ok(())
    }

    /// Aspect ratio of the initial window.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("ignoring {key}={value}: not a valid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.camera.fov_y, 55.0);
        assert_eq!(config.orbit.damping, 0.9);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_damping = AppConfig::default().with_orbit(OrbitConfig {
            damping: 1.0,
            ..Default::default()
        });
        assert!(matches!(bad_damping.validate(), Err(Error::Config(_))));

        let bad_planes = AppConfig::default().with_camera(CameraConfig {
            near: 10.0,
            far: 1.0,
            ..Default::default()
        });
        assert!(bad_planes.validate().is_err());

        assert!(AppConfig::default().with_size(0, 600).validate().is_err());
    }

    #[test]
    fn test_builder_setters() {
        let config = AppConfig::default().with_title("demo").with_size(400, 300);
        assert_eq!(config.title, "demo");
        assert!((config.aspect() - 4.0 / 3.0).abs() < 1e-6);
    }
}
