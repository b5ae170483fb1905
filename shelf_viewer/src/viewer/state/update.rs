use log::{Level, debug, log, warn};
use shelf_core::{CoverLoadError, Selection, ShelfEvent, TextureOutcome};

use super::ViewerState;
use crate::catalog_file::LoadedCatalog;

const WINDOW_TITLE: &str = "Shelf Viewer";

pub(super) fn update(state: &mut ViewerState) -> bool {
    let now = state.started.elapsed();
    if !state.shelf.advance(now) {
        return false;
    }

    for request in state.shelf.poll_texture_requests(now) {
        let ticket = request.ticket;
        let cover = request.cover.clone();
        if let Err(err) = state.loader.request(request) {
            let failure = CoverLoadError::Io {
                path: cover,
                reason: format!("{err:#}"),
            };
            state.shelf.complete_texture(ticket, Err(failure), now);
        }
    }

    for finished in state.loader.drain() {
        let label = cover_label(&state.catalog, finished.ticket.slot);
        let uploaded = finished.result.and_then(|decoded| {
            state
                .covers
                .upload(&state.device, &state.queue, &label, &decoded)
                .map_err(|err| CoverLoadError::Decode {
                    path: label.clone(),
                    reason: format!("{err:#}"),
                })
        });
        let failure = uploaded.as_ref().err().map(ToString::to_string);
        match state.shelf.complete_texture(finished.ticket, uploaded, now) {
            TextureOutcome::Loaded => debug!(
                "cover ready for {label} ({} decodes pending)",
                state.loader.in_flight()
            ),
            TextureOutcome::RetryScheduled { attempt } => debug!(
                "cover for {label} failed on attempt {}; retry {attempt} scheduled",
                finished.attempt
            ),
            TextureOutcome::FellBack => warn!(
                "cover for {label} unavailable, drawing fallback: {}",
                failure.unwrap_or_default()
            ),
            TextureOutcome::Stale => debug!("dropped stale cover for slot {}", finished.ticket.slot),
        }
    }

    for event in state.shelf.drain_events() {
        report_event(state, event);
    }
    true
}

fn cover_label(catalog: &LoadedCatalog, slot: usize) -> String {
    catalog
        .entry(slot)
        .map(|entry| entry.title.clone())
        .unwrap_or_else(|| format!("slot {slot}"))
}

/// Log line and window title for one shelf event.
#[derive(Debug, PartialEq)]
struct EventReport {
    level: Level,
    message: String,
    title: Option<String>,
}

fn describe_event(catalog: &LoadedCatalog, event: ShelfEvent) -> EventReport {
    let report = |level, message: String, title: Option<String>| EventReport {
        level,
        message,
        title,
    };
    match event {
        ShelfEvent::Selected(Selection::Item(index)) => match catalog.entry(index) {
            Some(entry) => report(
                Level::Info,
                format!("selected {} (id {})", entry.title, entry.id),
                Some(format!("{WINDOW_TITLE} - {}", entry.title)),
            ),
            None => report(
                Level::Warn,
                format!("selection {index} has no catalog entry"),
                None,
            ),
        },
        ShelfEvent::Selected(Selection::AddNew) => report(
            Level::Info,
            "add-new slot activated: open creation form".to_string(),
            None,
        ),
        ShelfEvent::Selected(Selection::Cleared) => report(
            Level::Info,
            "selection cleared".to_string(),
            Some(WINDOW_TITLE.to_string()),
        ),
        ShelfEvent::LongPress(slot) => report(
            Level::Info,
            format!("long press on {}", cover_label(catalog, slot)),
            None,
        ),
        ShelfEvent::Chime => report(Level::Debug, "chime".to_string(), None),
    }
}

fn report_event(state: &ViewerState, event: ShelfEvent) {
    let report = describe_event(&state.catalog, event);
    log!(report.level, "{}", report.message);
    if let Some(title) = report.title {
        state.window.set_title(&title);
    }
}
