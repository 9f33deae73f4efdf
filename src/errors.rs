//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`SableError`] aggregates the failure modes surfaced by
//! the renderer core:
//! - Compositor graph configuration errors (missing node types, cycles)
//! - Scene lookups with keys the renderer was never notified about
//! - Render settings parsing errors
//!
//! Device-level failures are owned by the [`RenderApi`](crate::renderer::core::RenderApi)
//! implementation and never surface here.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sable::errors::Result;
//!
//! fn load_settings(json: &str) -> Result<RenderSettings> {
//!     Ok(RenderSettings::from_json(json)?)
//! }
//! ```

use thiserror::Error;

use crate::renderer::graph::CompositorError;
use crate::scene::CameraKey;

/// The main error type for the Sable engine.
#[derive(Error, Debug)]
pub enum SableError {
    // ========================================================================
    // Frame Graph Errors
    // ========================================================================
    /// The compositor graph could not be built.
    #[error("Compositor error: {0}")]
    Compositor(#[from] CompositorError),

    // ========================================================================
    // Scene Errors
    // ========================================================================
    /// A camera key was used that the renderer was never notified about.
    #[error("Camera {camera:?} is not registered with the renderer")]
    UnknownCamera {
        /// The unregistered key
        camera: CameraKey,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Render settings could not be parsed.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Errors raised while loading render settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings document is not valid JSON for [`RenderSettings`](crate::renderer::settings::RenderSettings).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field holds a value outside its valid range.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// Human readable explanation
        reason: String,
    },
}

/// Alias for `Result<T, SableError>`.
pub type Result<T> = std::result::Result<T, SableError>;
