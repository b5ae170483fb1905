//! Static tuning for a shelf instance. Everything here is read once at
//! construction; a JSON preset may override any subset of fields and the rest
//! fall back to the compiled defaults, per field.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfError};

/// The two selectable row arities of the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowLayout {
    #[default]
    Single,
    Grid,
}

impl RowLayout {
    pub fn toggled(self) -> Self {
        match self {
            RowLayout::Single => RowLayout::Grid,
            RowLayout::Grid => RowLayout::Single,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RowLayout::Single => "single-row",
            RowLayout::Grid => "grid",
        }
    }
}

/// How far the shelf may be dragged. `Centered` clamps to the full
/// `[min, max]` range; `LeftAnchored` never pans right of the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanPolicy {
    #[default]
    Centered,
    LeftAnchored,
}

/// Pixel rectangle inside the composite cover texture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtlasSlice {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Normalised texture coordinates of one slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

/// Layout of a composite cover scan: back, spine and front side by side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverAtlas {
    pub width: u32,
    pub height: u32,
    pub back: AtlasSlice,
    pub spine: AtlasSlice,
    pub front: AtlasSlice,
}

impl Default for CoverAtlas {
    fn default() -> Self {
        Self {
            width: 1088,
            height: 720,
            back: AtlasSlice {
                x: 0,
                y: 0,
                width: 512,
                height: 720,
            },
            spine: AtlasSlice {
                x: 512,
                y: 0,
                width: 64,
                height: 720,
            },
            front: AtlasSlice {
                x: 576,
                y: 0,
                width: 512,
                height: 720,
            },
        }
    }
}

impl CoverAtlas {
    /// Width over height of the front cover.
    pub fn aspect_ratio(&self) -> f32 {
        self.front.width as f32 / self.front.height.max(1) as f32
    }

    /// Box depth as a fraction of its width, taken from the spine slice.
    pub fn depth_ratio(&self) -> f32 {
        self.spine.width as f32 / self.front.width.max(1) as f32
    }

    pub fn uv(&self, slice: &AtlasSlice) -> UvRect {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        UvRect {
            u0: slice.x as f32 / w,
            v0: slice.y as f32 / h,
            u1: (slice.x + slice.width) as f32 / w,
            v1: (slice.y + slice.height) as f32 / h,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, slice) in [
            ("back", &self.back),
            ("spine", &self.spine),
            ("front", &self.front),
        ] {
            if slice.width == 0 || slice.height == 0 {
                return Err(ShelfError::EmptyAtlasSlice(name));
            }
        }
        Ok(())
    }
}

/// Per-layout tuning. Gaps and paddings are ratios of the item width
/// (horizontal) or height (vertical).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutProfile {
    pub rows: u32,
    pub scale: f32,
    pub gap_x: f32,
    pub gap_y: f32,
    pub pad_left: f32,
    pub pad_right: f32,
}

/// The two layouts carry different defaults, so a preset is read field by
/// field and merged over [`LayoutTable::default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "LayoutTablePreset")]
pub struct LayoutTable {
    pub single: LayoutProfile,
    pub grid: LayoutProfile,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct LayoutTablePreset {
    #[serde(default)]
    single: Option<LayoutProfilePreset>,
    #[serde(default)]
    grid: Option<LayoutProfilePreset>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct LayoutProfilePreset {
    #[serde(default)]
    rows: Option<u32>,
    #[serde(default)]
    scale: Option<f32>,
    #[serde(default)]
    gap_x: Option<f32>,
    #[serde(default)]
    gap_y: Option<f32>,
    #[serde(default)]
    pad_left: Option<f32>,
    #[serde(default)]
    pad_right: Option<f32>,
}

impl LayoutProfilePreset {
    fn merge_over(self, base: LayoutProfile) -> LayoutProfile {
        LayoutProfile {
            rows: self.rows.unwrap_or(base.rows),
            scale: self.scale.unwrap_or(base.scale),
            gap_x: self.gap_x.unwrap_or(base.gap_x),
            gap_y: self.gap_y.unwrap_or(base.gap_y),
            pad_left: self.pad_left.unwrap_or(base.pad_left),
            pad_right: self.pad_right.unwrap_or(base.pad_right),
        }
    }
}

impl From<LayoutTablePreset> for LayoutTable {
    fn from(preset: LayoutTablePreset) -> Self {
        let defaults = LayoutTable::default();
        Self {
            single: preset
                .single
                .unwrap_or_default()
                .merge_over(defaults.single),
            grid: preset.grid.unwrap_or_default().merge_over(defaults.grid),
        }
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self {
            single: LayoutProfile {
                rows: 1,
                scale: 1.0,
                gap_x: 0.18,
                gap_y: 0.0,
                pad_left: 0.5,
                pad_right: 0.5,
            },
            grid: LayoutProfile {
                rows: 2,
                scale: 0.72,
                gap_x: 0.15,
                gap_y: 0.12,
                pad_left: 0.4,
                pad_right: 0.4,
            },
        }
    }
}

impl LayoutTable {
    pub fn profile(&self, layout: RowLayout) -> &LayoutProfile {
        match layout {
            RowLayout::Single => &self.single,
            RowLayout::Grid => &self.grid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    pub fov_degrees: f32,
    /// Extra vertical room around the grid, as a fraction of its height.
    pub vertical_margin: f32,
    pub min_distance: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            fov_degrees: 40.0,
            vertical_margin: 0.6,
            min_distance: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub step_repeat_ms: u64,
    pub long_press_ms: u64,
    pub texture_retry_ms: u64,
    pub max_texture_attempts: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            step_repeat_ms: 260,
            long_press_ms: 700,
            texture_retry_ms: 400,
            max_texture_attempts: 3,
        }
    }
}

impl Timing {
    pub fn step_repeat(&self) -> Duration {
        Duration::from_millis(self.step_repeat_ms)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn texture_retry(&self) -> Duration {
        Duration::from_millis(self.texture_retry_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Fraction of the remaining pan distance covered each frame.
    pub pan_damping: f32,
    pub overscroll_damping: f32,
    /// Drag speed relative to a 1:1 pointer-to-grid mapping.
    pub drag_speed: f32,
    /// Item spin in radians per dragged pixel while rotating.
    pub rotate_speed: f32,
    pub long_press_slop_px: f32,
    pub selection_scale: f32,
    pub bob_amplitude: f32,
    pub bob_speed: f32,
    pub pulse_amplitude: f32,
    pub pulse_speed: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            pan_damping: 0.12,
            overscroll_damping: 0.15,
            drag_speed: 1.0,
            rotate_speed: 0.01,
            long_press_slop_px: 4.0,
            selection_scale: 1.12,
            bob_amplitude: 0.025,
            bob_speed: 1.6,
            pulse_amplitude: 0.04,
            pulse_speed: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    pub atlas: CoverAtlas,
    pub layouts: LayoutTable,
    pub camera: CameraTuning,
    pub timing: Timing,
    pub motion: MotionTuning,
    pub pan_policy: PanPolicy,
    /// Width of an unscaled cover box in world units.
    pub item_width: f32,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            atlas: CoverAtlas::default(),
            layouts: LayoutTable::default(),
            camera: CameraTuning::default(),
            timing: Timing::default(),
            motion: MotionTuning::default(),
            pan_policy: PanPolicy::default(),
            item_width: 1.0,
        }
    }
}

impl ShelfConfig {
    pub fn validate(&self) -> Result<()> {
        self.atlas.validate()?;
        for profile in [&self.layouts.single, &self.layouts.grid] {
            if profile.rows == 0 {
                return Err(ShelfError::InvalidRows(profile.rows));
            }
            positive("layouts.scale", profile.scale)?;
            non_negative("layouts.gap_x", profile.gap_x)?;
            non_negative("layouts.gap_y", profile.gap_y)?;
            non_negative("layouts.pad_left", profile.pad_left)?;
            non_negative("layouts.pad_right", profile.pad_right)?;
        }
        if self.layouts.single.rows != 1 {
            return Err(ShelfError::InvalidRows(self.layouts.single.rows));
        }
        positive("item_width", self.item_width)?;
        positive("camera.fov_degrees", self.camera.fov_degrees)?;
        if self.camera.fov_degrees >= 180.0 {
            return Err(ShelfError::InvalidTuning {
                field: "camera.fov_degrees",
                value: self.camera.fov_degrees,
            });
        }
        positive("motion.pan_damping", self.motion.pan_damping)?;
        positive("motion.selection_scale", self.motion.selection_scale)?;
        if self.timing.step_repeat_ms == 0 {
            return Err(ShelfError::InvalidTuning {
                field: "timing.step_repeat_ms",
                value: 0.0,
            });
        }
        if self.timing.max_texture_attempts == 0 {
            return Err(ShelfError::InvalidTuning {
                field: "timing.max_texture_attempts",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ShelfError::InvalidTuning { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ShelfError::InvalidTuning { field, value })
    }
}
