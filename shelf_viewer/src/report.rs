use std::{fs, path::Path};

use anyhow::{Context, Result};
use shelf_core::LayoutReport;

pub fn print_layout_summary(report: &LayoutReport) {
    println!(
        "Shelf layout: {} ({} row{} x {} col{}), {} slots",
        report.layout,
        report.rows,
        if report.rows == 1 { "" } else { "s" },
        report.cols,
        if report.cols == 1 { "" } else { "s" },
        report.items.len()
    );
    println!(
        "  viewport {}x{}, camera distance {:.2} (fov {:.1}), {:.1} px/unit",
        report.viewport.width,
        report.viewport.height,
        report.camera.distance,
        report.camera.fov_degrees,
        report.pixels_per_unit
    );
    println!(
        "  pan bounds [{:.2}, {:.2}], offset {:.2}",
        report.pan.bounds.min, report.pan.bounds.max, report.pan.offset
    );
    match report.selected {
        Some(slot) => println!("  selected slot {slot}"),
        None => println!("  nothing selected"),
    }
}

pub fn write_layout_dump(path: &Path, report: &LayoutReport) -> Result<()> {
    let json = serde_json::to_vec_pretty(report).context("serializing layout report")?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating layout dump directory {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("writing layout dump {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use shelf_core::{RowLayout, Shelf, ShelfConfig, Viewport};
    use tempfile::tempdir;

    #[test]
    fn dump_lists_every_slot() {
        let mut shelf: Shelf<()> = Shelf::new(
            ShelfConfig::default(),
            RowLayout::Grid,
            Viewport::new(1280, 720),
        )
        .expect("shelf");
        let sequence: Vec<String> = ["a.png", "b.png", "c.png", shelf_core::ADD_NEW_SENTINEL]
            .iter()
            .map(|cover| cover.to_string())
            .collect();
        shelf.set_catalog(&sequence).expect("sync");

        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("dumps").join("layout.json");
        write_layout_dump(&path, &shelf.layout_report()).expect("dump");

        let value: Value = serde_json::from_slice(&fs::read(&path).expect("read")).expect("json");
        assert_eq!(value["layout"], "grid");
        assert_eq!(value["items"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["items"][3]["cover"], Value::Null);
        assert_eq!(value["items"][0]["cover"], "a.png");
    }
}
