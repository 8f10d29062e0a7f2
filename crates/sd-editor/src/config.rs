//! Editor tuning knobs, loadable from JSON. Every field has a default, so
//! `{}` is a valid config.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inclusive scale range for one element kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleLimits {
    pub min: f32,
    pub max: f32,
}

impl ScaleLimits {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }
}

/// Smallest on-canvas size a resize may produce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Scale range for text and visuals.
    pub scale: ScaleLimits,
    pub mockup_scale: ScaleLimits,
    pub min_size: MinSize,
    /// Logical padding around text hit regions.
    pub text_hit_padding: f32,
    /// Resize handle side in screen pixels.
    pub handle_size_px: f32,
    /// Rotation knob distance above the top edge, in screen pixels.
    pub rotate_handle_offset_px: f32,
    pub rotation_snap_degrees: f32,
    pub autosave_debounce_ms: u64,
    /// Wrap width of text without an explicit width, as a fraction of the
    /// canvas width.
    pub text_width_fraction: f32,
    pub undo_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            scale: ScaleLimits::new(0.1, 5.0),
            mockup_scale: ScaleLimits::new(0.3, 2.5),
            min_size: MinSize {
                width: 50.0,
                height: 100.0,
            },
            text_hit_padding: sd_render::hit::DEFAULT_TEXT_HIT_PADDING,
            handle_size_px: 10.0,
            rotate_handle_offset_px: 30.0,
            rotation_snap_degrees: 15.0,
            autosave_debounce_ms: 2000,
            text_width_fraction: sd_core::layout::DEFAULT_TEXT_WIDTH_FRACTION,
            undo_depth: 100,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// Scale range that applies to an element.
    pub fn limits_for(&self, el: &sd_core::Element) -> ScaleLimits {
        if el.is_mockup() {
            self.mockup_scale
        } else {
            self.scale
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, limits) in [("scale", self.scale), ("mockupScale", self.mockup_scale)] {
            if !(limits.min > 0.0 && limits.min <= limits.max) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected 0 < min <= max, got {}..{}", limits.min, limits.max),
                });
            }
        }
        if self.min_size.width < 0.0 || self.min_size.height < 0.0 {
            return Err(ConfigError::Invalid {
                field: "minSize",
                reason: "must not be negative".into(),
            });
        }
        if !(self.text_width_fraction > 0.0 && self.text_width_fraction <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "textWidthFraction",
                reason: format!("{} is outside (0, 1]", self.text_width_fraction),
            });
        }
        if self.rotation_snap_degrees <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "rotationSnapDegrees",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}
