// src/lib.rs
//! Thistle Scene Core
//!
//! A retained-mode 3D scene core: an arena-backed scene graph, perspective and
//! orthographic cameras, asynchronous texture loading, a damped orbit
//! controller and a cooperative frame scheduler. Drawing is left to a
//! [`RenderSink`](scheduler::RenderSink) supplied by the application.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod performance;
pub mod prelude;
pub mod scheduler;

// Re-export main types for convenience
pub use app::ThistleApp;
pub use config::AppConfig;
pub use error::{Error, Result};

/// Installs `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
///
/// Calling it more than once is harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
