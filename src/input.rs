//! Discrete input events consumed by the orbit controller and the scheduler.
//!
//! The host turns raw window events into [`InputEvent`]s; nothing in the
//! core polls device state. [`PointerTracker`] does that translation for
//! `winit` cursor and button events.

use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta},
};

/// Pixels treated as one wheel line for high-resolution scroll devices.
pub const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { dx: f32, dy: f32 },
    PointerUp,
    /// The pointer left the surface; cancels any drag.
    PointerLeave,
    /// Positive values zoom in.
    Wheel { delta: f32 },
    Resize { width: u32, height: u32 },
    PixelDensity(f64),
}

/// Turns absolute cursor positions into pointer deltas.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerTracker {
    position: Option<(f32, f32)>,
    pressed: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Records the new cursor position and returns the movement since the last one.
    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) -> Option<InputEvent> {
        let current = (position.x as f32, position.y as f32);
        let previous = self.position.replace(current);
        let (px, py) = previous?;
        Some(InputEvent::PointerMove {
            dx: current.0 - px,
            dy: current.1 - py,
        })
    }

    /// Only the left button drives the pointer.
    pub fn button(&mut self, button: MouseButton, state: ElementState) -> Option<InputEvent> {
        if button != MouseButton::Left {
            return None;
        }
        match state {
            ElementState::Pressed => {
                self.pressed = true;
                let (x, y) = self.position.unwrap_or_default();
                Some(InputEvent::PointerDown { x, y })
            }
            ElementState::Released => {
                self.pressed = false;
                Some(InputEvent::PointerUp)
            }
        }
    }

    pub fn cursor_left(&mut self) -> InputEvent {
        self.position = None;
        self.pressed = false;
        InputEvent::PointerLeave
    }

    pub fn wheel(&self, delta: MouseScrollDelta) -> InputEvent {
        let delta = match delta {
            MouseScrollDelta::LineDelta(_, lines) => lines,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => y as f32 / PIXELS_PER_LINE,
        };
        InputEvent::Wheel { delta }
    }
}
