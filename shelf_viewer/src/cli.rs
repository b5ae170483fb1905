use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use shelf_core::{PanPolicy, RowLayout, ShelfConfig};

#[derive(Parser, Debug)]
#[command(about = "Animated 3D cover shelf for a game catalog", version)]
pub struct Args {
    /// Catalog manifest JSON: { "games": [{ "id", "title", "cover" }] }
    #[arg(long, default_value = "catalog.json")]
    pub catalog: PathBuf,

    /// Optional tuning preset JSON merged over the built-in shelf defaults
    #[arg(long)]
    pub tuning: Option<PathBuf>,

    /// Start in the multi-row grid layout instead of a single row
    #[arg(long)]
    pub rows: bool,

    /// Never pan right of the first column (left-anchored shelf)
    #[arg(long)]
    pub left_anchored: bool,

    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Resolve the shelf and print a layout summary without opening a window
    #[arg(long)]
    pub headless: bool,

    /// When set, write the resolved layout (cells, positions, bounds) as JSON
    #[arg(long)]
    pub dump_layout: Option<PathBuf>,
}

impl Args {
    pub fn initial_layout(&self) -> RowLayout {
        if self.rows {
            RowLayout::Grid
        } else {
            RowLayout::Single
        }
    }

    /// Tuning preset (or defaults) with command-line overrides applied.
    pub fn shelf_config(&self) -> Result<ShelfConfig> {
        let mut config = match self.tuning.as_deref() {
            Some(path) => load_tuning_preset(path)?,
            None => ShelfConfig::default(),
        };
        if self.left_anchored {
            config.pan_policy = PanPolicy::LeftAnchored;
        }
        config
            .validate()
            .context("validating shelf tuning")?;
        Ok(config)
    }
}

pub fn load_tuning_preset(path: &Path) -> Result<ShelfConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading tuning preset {}", path.display()))?;
    let config: ShelfConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing tuning preset {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["shelf_viewer"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn preset_and_flags_combine() {
        let temp = tempdir().expect("temp dir");
        let preset_path = temp.path().join("tuning.json");
        let preset = json!({
            "layouts": {
                "grid": { "rows": 3, "scale": 0.6 }
            },
            "timing": { "step_repeat_ms": 200 }
        });
        fs::write(&preset_path, preset.to_string()).expect("write preset");

        let preset_arg = preset_path.to_string_lossy().into_owned();
        let args = args(&["--tuning", &preset_arg, "--left-anchored", "--rows"]);
        let config = args.shelf_config().expect("config");
        assert_eq!(config.layouts.grid.rows, 3);
        assert_eq!(config.layouts.grid.scale, 0.6);
        assert_eq!(config.layouts.grid.gap_y, 0.12);
        assert_eq!(config.layouts.single.rows, 1);
        assert_eq!(config.timing.step_repeat_ms, 200);
        assert_eq!(config.timing.long_press_ms, 700);
        assert_eq!(config.pan_policy, PanPolicy::LeftAnchored);
        assert_eq!(args.initial_layout(), RowLayout::Grid);
    }

    #[test]
    fn invalid_preset_is_rejected() {
        let temp = tempdir().expect("temp dir");
        let preset_path = temp.path().join("tuning.json");
        fs::write(&preset_path, r#"{ "item_width": -1.0 }"#).expect("write preset");
        let preset_arg = preset_path.to_string_lossy().into_owned();
        assert!(args(&["--tuning", &preset_arg]).shelf_config().is_err());
    }

    #[test]
    fn defaults_without_preset() {
        let args = args(&[]);
        let config = args.shelf_config().expect("config");
        assert_eq!(config, ShelfConfig::default());
        assert_eq!(args.initial_layout(), RowLayout::Single);
        assert_eq!(args.catalog, PathBuf::from("catalog.json"));
    }
}
