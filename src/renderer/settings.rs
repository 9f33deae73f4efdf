//! Renderer Settings
//!
//! Two levels of configuration:
//!
//! - [`RendererSettings`]: global, consumed once by [`Renderer::new`](crate::renderer::Renderer::new).
//! - [`RenderSettings`]: per view, shared through `Rc`. Many of its fields
//!   change the shape of the compositor graph, so a view rebuilds its
//!   compositor whenever new settings are applied.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sable::renderer::settings::{RenderSettings, MotionBlurQuality};
//!
//! let mut settings = RenderSettings::default();
//! settings.bloom.enabled = true;
//! settings.motion_blur.quality = MotionBlurQuality::Medium;
//! renderer.set_render_settings(camera_key, Rc::new(settings));
//!
//! // Or from a JSON document:
//! let settings = RenderSettings::from_json(r#"{ "enable_fxaa": false }"#)?;
//! ```

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

// ---------------------------------------------------------------------------
// Sub-settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub enabled: bool,
    /// Multiplier applied when compositing bloom over the scene.
    pub intensity: f32,
    /// Luminance above which pixels contribute.
    pub threshold: f32,
    /// Number of down/up-sample steps.
    pub quality: u32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 1.0,
            threshold: 1.0,
            quality: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TonemappingSettings {
    pub enabled: bool,
    pub exposure_scale: f32,
    pub gamma: f32,
    pub enable_auto_exposure: bool,
}

impl Default for TonemappingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            exposure_scale: 0.0,
            gamma: 2.2,
            enable_auto_exposure: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionBlurQuality {
    #[default]
    Off,
    Low,
    Medium,
    High,
}

impl MotionBlurQuality {
    /// Samples taken along the velocity vector.
    #[must_use]
    pub fn sample_count(self) -> u32 {
        match self {
            Self::Off => 0,
            Self::Low => 4,
            Self::Medium => 8,
            Self::High => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlurSettings {
    pub quality: MotionBlurQuality,
    /// Fraction of the frame the virtual shutter stays open.
    pub shutter_fraction: f32,
}

impl Default for MotionBlurSettings {
    fn default() -> Self {
        Self {
            quality: MotionBlurQuality::Off,
            shutter_fraction: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalAaSettings {
    pub enabled: bool,
    /// Jitter positions accumulated for a converged image.
    pub sample_count: u32,
}

impl Default for TemporalAaSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sample_count: 8,
        }
    }
}

/// Which intermediate the final resolve writes to the view target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputChannel {
    #[default]
    Final,
    SceneColor,
    SceneDepth,
    Bloom,
}

/// How the opaque render queue is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StateReduction {
    /// Submission order.
    None,
    /// Group by pipeline then material, front to back within a group.
    #[default]
    Material,
    /// Front to back only.
    Distance,
}

// ---------------------------------------------------------------------------
// RenderSettings
// ---------------------------------------------------------------------------

/// Per-view render settings.
///
/// | Field              | Affects graph | Default        |
/// |--------------------|---------------|----------------|
/// | `enable_hdr`       | no            | `true`         |
/// | `enable_lighting`  | no            | `true`         |
/// | `enable_skybox`    | no            | `true`         |
/// | `bloom`            | yes           | disabled       |
/// | `tonemapping`      | no            | enabled        |
/// | `motion_blur`      | yes           | `Off`          |
/// | `enable_fxaa`      | yes           | `true`         |
/// | `temporal_aa`      | no            | disabled       |
/// | `output_channel`   | yes           | `Final`        |
/// | `cull_distance`    | no            | infinite       |
/// | `state_reduction`  | no            | `Material`     |
/// | `msaa_samples`     | no            | `1`            |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub enable_hdr: bool,
    pub enable_lighting: bool,
    pub enable_skybox: bool,
    pub bloom: BloomSettings,
    pub tonemapping: TonemappingSettings,
    pub motion_blur: MotionBlurSettings,
    pub enable_fxaa: bool,
    pub temporal_aa: TemporalAaSettings,
    pub output_channel: OutputChannel,
    /// Base distance beyond which objects are culled. Scaled per object by
    /// its cull distance factor. Serialized as `null` when infinite.
    #[serde(deserialize_with = "deserialize_cull_distance")]
    pub cull_distance: f32,
    pub state_reduction: StateReduction,
    pub msaa_samples: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            enable_hdr: true,
            enable_lighting: true,
            enable_skybox: true,
            bloom: BloomSettings::default(),
            tonemapping: TonemappingSettings::default(),
            motion_blur: MotionBlurSettings::default(),
            enable_fxaa: true,
            temporal_aa: TemporalAaSettings::default(),
            output_channel: OutputChannel::Final,
            cull_distance: f32::INFINITY,
            state_reduction: StateReduction::Material,
            msaa_samples: 1,
        }
    }
}

impl RenderSettings {
    /// Parses settings from JSON. Missing fields take their defaults.
    ///
    /// `cull_distance` may be omitted or `null` for "no distance culling".
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values no pass can work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.cull_distance.is_nan() || self.cull_distance <= 0.0 {
            return Err(SettingsError::InvalidValue {
                field: "cull_distance",
                reason: format!("must be positive, got {}", self.cull_distance),
            });
        }
        if !matches!(self.msaa_samples, 1 | 2 | 4 | 8) {
            return Err(SettingsError::InvalidValue {
                field: "msaa_samples",
                reason: format!("must be 1, 2, 4 or 8, got {}", self.msaa_samples),
            });
        }
        if self.temporal_aa.enabled && self.temporal_aa.sample_count == 0 {
            return Err(SettingsError::InvalidValue {
                field: "temporal_aa.sample_count",
                reason: "must be at least 1 when temporal AA is enabled".to_owned(),
            });
        }
        Ok(())
    }

    /// Whether the bloom node participates in the graph.
    #[inline]
    #[must_use]
    pub fn bloom_active(&self) -> bool {
        self.bloom.enabled
    }

    #[inline]
    #[must_use]
    pub fn motion_blur_active(&self) -> bool {
        self.motion_blur.quality != MotionBlurQuality::Off
    }

    /// Scene color format for this view.
    #[inline]
    #[must_use]
    pub fn scene_color_format(&self) -> wgpu::TextureFormat {
        if self.enable_hdr {
            wgpu::TextureFormat::Rgba16Float
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }
}

fn deserialize_cull_distance<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::INFINITY))
}

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

/// Global configuration for renderer initialization.
///
/// | Field               | Description                                  | Default         |
/// |---------------------|----------------------------------------------|-----------------|
/// | `default_settings`  | Settings given to newly created views        | defaults        |
/// | `pool_prune_age`    | Frames a free pooled resource survives       | `3`             |
/// | `initial_capacity`  | Pre-sized capacity of scene arrays           | `64`            |
/// | `clear_color`       | Scene clear color when a camera keeps color  | Black (0,0,0,1) |
#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub default_settings: RenderSettings,
    pub pool_prune_age: u64,
    pub initial_capacity: usize,
    pub clear_color: Vec4,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            default_settings: RenderSettings::default(),
            pool_prune_age: 3,
            initial_capacity: 64,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}
