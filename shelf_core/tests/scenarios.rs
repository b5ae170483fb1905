use std::time::Duration;

use shelf_core::layout::GridCell;
use shelf_core::pool::{FALLBACK_COVER_COLOR, TextureState};
use shelf_core::{
    ADD_NEW_SENTINEL, CatalogEntry, CoverLoadError, Direction, ItemSurface, RowLayout, Selection,
    Shelf, ShelfConfig, ShelfEvent, TextureOutcome, Viewport, cover_sequence,
};

fn entries(count: usize) -> Vec<CatalogEntry> {
    (0..count)
        .map(|i| CatalogEntry {
            id: i as i64 + 100,
            title: format!("Game {i}"),
            cover_image_ref: format!("covers/{i}.png"),
        })
        .collect()
}

fn mounted<T>(covers: usize, layout: RowLayout) -> Shelf<T> {
    let mut shelf = Shelf::new(ShelfConfig::default(), layout, Viewport::new(1280, 720))
        .expect("default config is valid");
    shelf
        .set_catalog(&cover_sequence(&entries(covers)))
        .expect("sequence is well formed");
    shelf.drain_events();
    shelf
}

fn tap<T>(shelf: &mut Shelf<T>, direction: Direction, now: Duration) {
    shelf.press_direction(direction, now);
    shelf.release_direction(direction);
}

#[test]
fn single_row_walk_clamps_at_last_cover() {
    let mut shelf: Shelf<()> = mounted(5, RowLayout::Single);
    assert_eq!(shelf.current_selection(), Some(0));

    for _ in 0..3 {
        tap(&mut shelf, Direction::RIGHT, Duration::ZERO);
    }
    assert_eq!(shelf.current_selection(), Some(3));
    tap(&mut shelf, Direction::RIGHT, Duration::ZERO);
    assert_eq!(shelf.current_selection(), Some(4));
    shelf.drain_events();

    tap(&mut shelf, Direction::RIGHT, Duration::ZERO);
    assert_eq!(shelf.current_selection(), Some(4));
    assert!(shelf.drain_events().is_empty(), "edge is a silent no-op");
}

#[test]
fn two_row_grid_steps_down_within_column() {
    let mut shelf: Shelf<()> = mounted(6, RowLayout::Grid);
    let grid = shelf.pool().grid();
    assert_eq!(grid.rows, 2);
    assert_eq!(grid.cell(3), GridCell { row: 1, col: 1 });

    shelf.select(2);
    shelf.drain_events();
    tap(&mut shelf, Direction::DOWN, Duration::ZERO);
    assert_eq!(shelf.current_selection(), Some(3));
    assert_eq!(
        shelf.drain_events(),
        [ShelfEvent::Selected(Selection::Item(3)), ShelfEvent::Chime]
    );
}

#[test]
fn failing_cover_falls_back_and_stays_selectable() {
    let mut shelf: Shelf<u32> = mounted(4, RowLayout::Single);
    let mut now = Duration::ZERO;
    let mut outcomes = Vec::new();

    for _ in 0..20 {
        for request in shelf.poll_texture_requests(now) {
            let result = if request.ticket.slot == 2 {
                Err(CoverLoadError::Decode {
                    path: request.cover.clone(),
                    reason: "truncated".into(),
                })
            } else {
                Ok(request.ticket.slot as u32)
            };
            let outcome = shelf.complete_texture(request.ticket, result, now);
            if request.ticket.slot == 2 {
                outcomes.push(outcome);
            }
        }
        now += Duration::from_millis(100);
    }

    assert_eq!(
        outcomes,
        [
            TextureOutcome::RetryScheduled { attempt: 2 },
            TextureOutcome::RetryScheduled { attempt: 3 },
            TextureOutcome::FellBack,
        ]
    );
    assert!(matches!(
        shelf.pool().get(2).expect("slot 2").texture,
        TextureState::Failed
    ));

    let snapshot = shelf.snapshot();
    assert!(matches!(
        snapshot.items[2].surface,
        ItemSurface::Flat(color) if color == FALLBACK_COVER_COLOR
    ));
    assert!(matches!(snapshot.items[1].surface, ItemSurface::Cover(&1)));

    tap(&mut shelf, Direction::RIGHT, now);
    tap(&mut shelf, Direction::RIGHT, now);
    assert_eq!(shelf.current_selection(), Some(2));
    assert!(
        shelf
            .drain_events()
            .contains(&ShelfEvent::Selected(Selection::Item(2)))
    );
}

#[test]
fn clicking_the_add_slot_reports_minus_one() {
    let mut shelf: Shelf<()> = mounted(0, RowLayout::Single);
    assert_eq!(shelf.current_selection(), None);
    for frame in 0..10u64 {
        shelf.advance(Duration::from_millis(frame * 16));
    }
    shelf.pointer_pressed(640.0, 360.0, Duration::from_millis(200));
    shelf.pointer_released();
    let events = shelf.drain_events();
    assert_eq!(events, [ShelfEvent::Selected(Selection::AddNew)]);
    assert_eq!(Selection::AddNew.as_index(), Some(-1));
    assert_eq!(shelf.current_selection(), None);

    tap(&mut shelf, Direction::RIGHT, Duration::ZERO);
    assert_eq!(shelf.current_selection(), None, "navigation is a no-op");
}

#[test]
fn long_press_on_cover_is_reported() {
    let mut shelf: Shelf<()> = mounted(3, RowLayout::Single);
    for frame in 0..300u64 {
        shelf.advance(Duration::from_millis(frame * 16));
    }
    let start = Duration::from_secs(5);
    shelf.pointer_pressed(640.0, 360.0, start);
    shelf.advance(start + Duration::from_millis(750));
    let events = shelf.drain_events();
    assert!(events.contains(&ShelfEvent::LongPress(0)), "{events:?}");
}

#[test]
fn misplaced_sentinel_is_an_error() {
    let mut shelf: Shelf<()> = mounted(1, RowLayout::Single);
    let sequence = vec![ADD_NEW_SENTINEL.to_string(), "covers/0.png".to_string()];
    assert!(shelf.set_catalog(&sequence).is_err());
    assert_eq!(shelf.pool().len(), 2, "pool untouched");
}

#[test]
fn reload_with_same_catalog_is_a_no_op() {
    let mut shelf: Shelf<()> = mounted(3, RowLayout::Single);
    let outcome = shelf
        .set_catalog(&cover_sequence(&entries(3)))
        .expect("sync");
    assert!(outcome.unchanged);
    assert!(shelf.drain_events().is_empty());
}

#[test]
fn removing_an_earlier_game_reselects_the_shifted_cover() {
    let mut shelf: Shelf<()> = mounted(5, RowLayout::Single);
    shelf.select(3);
    shelf.drain_events();

    let remaining = entries(5).split_off(1);
    shelf
        .set_catalog(&cover_sequence(&remaining))
        .expect("sync");
    assert_eq!(shelf.current_selection(), Some(3));
    assert_eq!(
        shelf.drain_events(),
        [ShelfEvent::Selected(Selection::Item(3))]
    );
    assert_eq!(remaining[3].title, "Game 4");
}
