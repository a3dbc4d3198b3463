//! Error types for the scene core.
//!
//! Graph structure violations are rejected synchronously and leave the graph
//! unchanged. Camera orientation faults are logged and reported, never fatal.
//! Load failures are per-resource and never abort sibling loads.

use std::time::Duration;

use thiserror::Error;

use crate::gfx::scene::NodeId;

/// Scene graph structure errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The child is the parent itself or one of its ancestors.
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    /// The child is already attached somewhere and must be detached first.
    #[error("{child} already has parent {existing}")]
    DuplicateParent { child: NodeId, existing: NodeId },

    /// The id does not refer to a live node.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The root cannot be re-parented, detached or removed.
    #[error("the scene root cannot be re-parented, detached or removed")]
    RootImmovable,
}

/// Camera orientation and projection errors.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CameraError {
    /// `look_at` target coincides with the camera position.
    #[error("look-at target coincides with the camera position")]
    DegenerateLookAt,

    /// Stored projection parameters violate `0 < near < far` or `aspect > 0`.
    #[error("invalid projection: {0}")]
    InvalidProjection(&'static str),
}

/// Why a single load failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadErrorKind {
    /// The asset source could not produce the bytes.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The bytes were fetched but could not be decoded as an image.
    #[error("decode failed: {0}")]
    Decode(String),

    /// No result arrived within the configured timeout.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// A failed resource load, carrying the failing source identity.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to load `{url}`: {kind}")]
pub struct LoadError {
    pub url: String,
    pub kind: LoadErrorKind,
}

impl LoadError {
    pub fn new(url: impl Into<String>, kind: LoadErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

/// Umbrella error for the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// Configuration values violate an invariant.
    #[error("config error: {0}")]
    Config(String),

    /// The loader worker pool could not be created.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
