use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Vector3, Zero};

use crate::{
    config::OrbitConfig,
    error::CameraError,
    gfx::scene::{graph::SceneGraph, NodeId},
    input::InputEvent,
};

use super::camera::Camera;

/// Differences below this are treated as converged and snapped.
const SNAP_EPSILON: f32 = 1e-4;

/// Highest damping that still moves; 1.0 would freeze the camera.
const MAX_DAMPING: f32 = 0.999;

/// What the camera orbits around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitTarget {
    Point(Vector3<f32>),
    /// Follows the node's world position as of the last world-transform pass.
    Node(NodeId),
}

/// Offset from the orbit centre in spherical coordinates.
///
/// `polar` is measured from +Y, `azimuth` around +Y starting at +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub polar: f32,
    pub azimuth: f32,
}

impl Spherical {
    pub fn new(radius: f32, polar: f32, azimuth: f32) -> Self {
        Self {
            radius,
            polar,
            azimuth,
        }
    }

    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Self::new(0.0, 0.0, 0.0);
        }
        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }

    pub fn to_offset(self) -> Vector3<f32> {
        let horizontal = self.radius * self.polar.sin();
        Vector3::new(
            horizontal * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            horizontal * self.azimuth.cos(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging,
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitBounds {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Keeps the polar angle inside `(ε, π − ε)` so the view never flips.
    pub polar_epsilon: f32,
}

impl Default for OrbitBounds {
    fn default() -> Self {
        Self {
            min_distance: 0.5,
            max_distance: 100.0,
            polar_epsilon: 1e-3,
        }
    }
}

impl OrbitBounds {
    fn clamp_polar(&self, polar: f32) -> f32 {
        polar.clamp(self.polar_epsilon, PI - self.polar_epsilon)
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }
}

/// Damped orbit around a point or node.
///
/// Input only moves the goal offset. Every [`OrbitController::update`]
/// eases the actual offset toward the goal, so it has to be called once per
/// tick even when no input arrived.
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub target: OrbitTarget,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    /// In `[0, 1)`: 0 snaps instantly, values near 1 move very slowly.
    pub damping: f32,
    pub enabled: bool,
    pub bounds: OrbitBounds,
    state: DragState,
    goal: Spherical,
    actual: Spherical,
    home: Spherical,
    last_center: Vector3<f32>,
}

impl OrbitController {
    /// `offset` is the starting camera position relative to the target.
    pub fn new(config: &OrbitConfig, target: OrbitTarget, offset: Vector3<f32>) -> Self {
        let bounds = OrbitBounds {
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            ..Default::default()
        };
        let mut start = Spherical::from_offset(offset);
        start.radius = bounds.clamp_distance(start.radius);
        start.polar = bounds.clamp_polar(start.polar);

        Self {
            target,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            damping: config.damping,
            enabled: true,
            bounds,
            state: DragState::Idle,
            goal: start,
            actual: start,
            home: start,
            last_center: match target {
                OrbitTarget::Point(point) => point,
                OrbitTarget::Node(_) => Vector3::zero(),
            },
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Where input has asked the camera to go.
    pub fn goal(&self) -> Spherical {
        self.goal
    }

    /// Where the camera currently is.
    pub fn actual(&self) -> Spherical {
        self.actual
    }

    pub fn is_settled(&self) -> bool {
        self.actual == self.goal
    }

    /// Orbit centre used by the last update.
    pub fn center(&self) -> Vector3<f32> {
        self.last_center
    }

    pub fn set_goal(&mut self, goal: Spherical) {
        self.goal = Spherical {
            radius: self.bounds.clamp_distance(goal.radius),
            polar: self.bounds.clamp_polar(goal.polar),
            azimuth: goal.azimuth,
        };
        self.wrap_azimuth();
    }

    /// Brings the goal azimuth back into `(-π, π]`, shifting the actual
    /// azimuth by the same whole turns so the easing path is unchanged.
    fn wrap_azimuth(&mut self) {
        let turns = ((self.goal.azimuth - PI) / TAU).ceil();
        if turns != 0.0 && turns.is_finite() {
            self.goal.azimuth -= turns * TAU;
            self.actual.azimuth -= turns * TAU;
        }
    }

    /// Returns to the starting offset and ends any drag. Damping still applies.
    pub fn reset(&mut self) {
        self.goal = self.home;
        self.state = DragState::Idle;
    }

    /// Feeds one input event. Returns true when the event was consumed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if !self.enabled {
            return false;
        }
        match *event {
            InputEvent::PointerDown { .. } => {
                self.state = DragState::Dragging;
                true
            }
            InputEvent::PointerMove { dx, dy } => {
                if self.state != DragState::Dragging {
                    return false;
                }
                self.goal.azimuth += dx * self.rotate_speed;
                self.goal.polar = self.bounds.clamp_polar(self.goal.polar + dy * self.rotate_speed);
                self.wrap_azimuth();
                true
            }
            InputEvent::PointerUp | InputEvent::PointerLeave => {
                let was_dragging = self.state == DragState::Dragging;
                self.state = DragState::Idle;
                was_dragging
            }
            InputEvent::Wheel { delta } => {
                let scale = (1.0 + self.zoom_speed).powf(-delta);
                self.goal.radius = self.bounds.clamp_distance(self.goal.radius * scale);
                true
            }
            InputEvent::Resize { .. } | InputEvent::PixelDensity(_) => false,
        }
    }

    /// Eases toward the goal, then places the camera and aims it at the centre.
    pub fn update(&mut self, camera: &mut Camera, graph: &SceneGraph) -> Result<(), CameraError> {
        self.last_center = self.resolve_center(graph);

        let factor = 1.0 - self.damping.clamp(0.0, MAX_DAMPING);
        self.actual.radius = ease(self.actual.radius, self.goal.radius, factor);
        self.actual.polar = ease(self.actual.polar, self.goal.polar, factor);
        self.actual.azimuth = ease(self.actual.azimuth, self.goal.azimuth, factor);

        camera.transform.position = self.last_center + self.actual.to_offset();
        camera.look_at(self.last_center)
    }

    fn resolve_center(&self, graph: &SceneGraph) -> Vector3<f32> {
        match self.target {
            OrbitTarget::Point(point) => point,
            OrbitTarget::Node(id) => graph.world_position(id).unwrap_or_else(|| {
                log::debug!("orbit target {id} is gone, keeping last centre");
                self.last_center
            }),
        }
    }
}

fn ease(actual: f32, goal: f32, factor: f32) -> f32 {
    let next = actual + (goal - actual) * factor;
    // A step below half an ulp of `actual` rounds away and would never land.
    if next == actual || (goal - next).abs() < SNAP_EPSILON {
        goal
    } else {
        next
    }
}
