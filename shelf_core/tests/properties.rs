//! Exhaustive sweeps over small catalogs, row counts and input sequences.

use shelf_core::layout::{GridLayout, cell_for_index, column_count, index_for_cell};
use shelf_core::{
    ADD_NEW_SENTINEL, Direction, PanPolicy, RowLayout, Shelf, ShelfConfig, Viewport,
};

const DIRECTIONS: [Direction; 4] = [
    Direction::LEFT,
    Direction::RIGHT,
    Direction::UP,
    Direction::DOWN,
];

fn config(rows: u32, policy: PanPolicy) -> ShelfConfig {
    let mut config = ShelfConfig::default();
    config.layouts.grid.rows = rows;
    config.pan_policy = policy;
    config
}

fn sequence(covers: usize) -> Vec<String> {
    let mut sequence: Vec<String> = (0..covers).map(|i| format!("{i}.png")).collect();
    sequence.push(ADD_NEW_SENTINEL.to_string());
    sequence
}

fn layouts_and_rows() -> Vec<(RowLayout, u32)> {
    vec![
        (RowLayout::Single, 2),
        (RowLayout::Grid, 2),
        (RowLayout::Grid, 3),
        (RowLayout::Grid, 4),
    ]
}

#[test]
fn grid_indexing_round_trips() {
    for rows in 1..=5u32 {
        for count in 0..40usize {
            let cols = column_count(count, rows);
            for index in 0..count {
                let cell = cell_for_index(index, rows);
                assert!(cell.row < rows && cell.col < cols);
                assert_eq!(index_for_cell(cell, rows), index);
            }
        }
    }
}

#[test]
fn positions_are_distinct_and_within_bounds_span() {
    let config = ShelfConfig::default();
    for (layout, _) in layouts_and_rows() {
        let profile = config.layouts.profile(layout);
        let dims = shelf_core::layout::BoxDimensions::for_profile(
            &config.atlas,
            config.item_width,
            profile,
        );
        for count in 0..20usize {
            let grid = GridLayout::resolve(count, profile, dims);
            for a in 0..count {
                let pa = grid.position(a);
                // Every item can be centred without leaving the bounds.
                assert!(grid.bounds.contains(-pa.x) || grid.cols <= 1);
                for b in (a + 1)..count {
                    assert!(pa.distance(grid.position(b)) > 1e-4);
                }
            }
        }
    }
}

#[test]
fn navigation_stays_on_playable_cells() {
    for policy in [PanPolicy::Centered, PanPolicy::LeftAnchored] {
        for (layout, rows) in layouts_and_rows() {
            for covers in 0..9usize {
                for start in 0..covers.max(1) {
                    for path in 0..(4u32.pow(3)) {
                        let mut shelf: Shelf<()> =
                            Shelf::new(config(rows, policy), layout, Viewport::new(800, 600))
                                .expect("config");
                        shelf.set_catalog(&sequence(covers)).expect("sync");
                        if covers > 0 {
                            shelf.select(start);
                        }
                        let mut code = path;
                        for _ in 0..3 {
                            let direction = DIRECTIONS[(code % 4) as usize];
                            code /= 4;
                            shelf.press_direction(direction, std::time::Duration::ZERO);
                            shelf.release_direction(direction);

                            let grid = shelf.pool().grid();
                            let pan = shelf.pan();
                            match shelf.current_selection() {
                                Some(index) => {
                                    assert!(index < covers, "placeholder never navigated to");
                                    let cell = grid.cell(index);
                                    assert!(cell.row < grid.rows && cell.col < grid.cols);
                                }
                                None => assert_eq!(covers, 0),
                            }
                            assert!(
                                pan.bounds.contains(pan.target),
                                "target {} outside {:?}",
                                pan.target,
                                pan.bounds
                            );
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn reselecting_never_emits() {
    for covers in 1..8usize {
        let mut shelf: Shelf<()> =
            Shelf::new(ShelfConfig::default(), RowLayout::Grid, Viewport::new(800, 600))
                .expect("config");
        shelf.set_catalog(&sequence(covers)).expect("sync");
        for slot in 0..covers {
            shelf.select(slot);
            let pan = *shelf.pan();
            shelf.drain_events();
            shelf.select(slot);
            assert!(shelf.drain_events().is_empty());
            assert_eq!(*shelf.pan(), pan);
        }
    }
}

#[test]
fn catalog_edits_keep_selection_consistent() {
    let sizes = [0usize, 3, 7, 1, 7, 2, 0, 5];
    let mut shelf: Shelf<()> =
        Shelf::new(ShelfConfig::default(), RowLayout::Single, Viewport::new(800, 600))
            .expect("config");
    for (step, &covers) in sizes.iter().enumerate() {
        shelf.set_catalog(&sequence(covers)).expect("sync");
        if step % 2 == 1 {
            shelf.toggle_layout().expect("toggle");
        }
        assert_eq!(shelf.pool().len(), covers + 1);
        assert_eq!(shelf.pool().playable_count(), covers);
        let selected: Vec<usize> = shelf
            .pool()
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| item.selected)
            .map(|(slot, _)| slot)
            .collect();
        match shelf.current_selection() {
            Some(index) => {
                assert!(index < covers);
                assert_eq!(selected, [index]);
            }
            None => {
                assert_eq!(covers, 0);
                assert!(selected.is_empty());
            }
        }
        let pan = shelf.pan();
        assert!(pan.bounds.contains(pan.target));
        assert!(pan.bounds.contains(pan.offset));
    }
}
