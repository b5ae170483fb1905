use log::{info, warn};
use shelf_core::Direction;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent},
    keyboard::{Key, NamedKey},
};

use super::ViewerState;
use crate::catalog_file::load_catalog;

pub(super) fn handle_key_event(state: &mut ViewerState, event: &KeyEvent) {
    let Key::Named(named) = event.logical_key.as_ref() else {
        return;
    };

    if let Some(direction) = arrow_direction(named) {
        match event.state {
            // The controller runs its own hold repeat.
            ElementState::Pressed if !event.repeat => {
                let now = state.started.elapsed();
                state.shelf.press_direction(direction, now);
            }
            ElementState::Pressed => {}
            ElementState::Released => state.shelf.release_direction(direction),
        }
        return;
    }

    if event.state != ElementState::Pressed || event.repeat {
        return;
    }
    match named {
        NamedKey::Tab => toggle_layout(state),
        NamedKey::F5 => reload_catalog(state),
        NamedKey::Enter => activate(state),
        _ => {}
    }
}

fn arrow_direction(key: NamedKey) -> Option<Direction> {
    match key {
        NamedKey::ArrowLeft => Some(Direction::LEFT),
        NamedKey::ArrowRight => Some(Direction::RIGHT),
        NamedKey::ArrowUp => Some(Direction::UP),
        NamedKey::ArrowDown => Some(Direction::DOWN),
        _ => None,
    }
}

fn toggle_layout(state: &mut ViewerState) {
    match state.shelf.toggle_layout() {
        Ok(_) => info!("layout switched to {}", state.shelf.layout().label()),
        Err(err) => warn!("layout toggle rejected: {err}"),
    }
}

fn reload_catalog(state: &mut ViewerState) {
    let source = state.catalog.source.clone();
    let catalog = match load_catalog(&source) {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!("catalog reload failed, keeping current shelf: {err:#}");
            return;
        }
    };
    match state.shelf.set_catalog(&catalog.sequence()) {
        Ok(outcome) => {
            if outcome.unchanged {
                info!("catalog covers unchanged");
            } else {
                info!(
                    "catalog reloaded: {} games ({} created, {} removed, {} transitioned)",
                    catalog.len(),
                    outcome.created,
                    outcome.removed,
                    outcome.transitioned
                );
            }
            // Titles may change without touching the cover sequence.
            state.catalog = catalog;
        }
        Err(err) => warn!("catalog reload rejected: {err}"),
    }
}

fn activate(state: &ViewerState) {
    let entry = state
        .shelf
        .current_selection()
        .and_then(|index| state.catalog.entry(index));
    match entry {
        Some(entry) => println!("[shelf_viewer] launch {} (id {})", entry.title, entry.id),
        None => println!("[shelf_viewer] open creation form"),
    }
}

pub(super) fn cursor_moved(state: &mut ViewerState, position: PhysicalPosition<f64>) {
    state.pointer.position = Some(position);
    if state.pointer.pressed {
        state
            .shelf
            .pointer_moved(position.x as f32, position.y as f32);
    }
}

pub(super) fn mouse_button(state: &mut ViewerState, button_state: ElementState) {
    match button_state {
        ElementState::Pressed => {
            let Some(position) = state.pointer.position else {
                return;
            };
            state.pointer.pressed = true;
            let now = state.started.elapsed();
            state
                .shelf
                .pointer_pressed(position.x as f32, position.y as f32, now);
        }
        ElementState::Released => {
            if state.pointer.pressed {
                state.pointer.pressed = false;
                state.shelf.pointer_released();
            }
        }
    }
}
