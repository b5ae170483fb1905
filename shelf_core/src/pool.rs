//! Arena of shelf items, one per entry of the cover sequence. Slots are
//! addressed by flat index; the vector is grown and truncated in place so
//! loaded textures survive small catalog edits. The pool is generic over the
//! texture handle `T` so the renderer can park GPU objects here and have them
//! released when their slot goes away.

use std::time::Duration;

use glam::Vec3;
use log::debug;

use crate::catalog::is_add_new;
use crate::config::{CoverAtlas, LayoutTable, RowLayout, ShelfConfig};
use crate::error::{CoverLoadError, Result, ShelfError};
use crate::layout::{BoxDimensions, GridCell, GridLayout};

/// Flat colour shown for covers that never loaded.
pub const FALLBACK_COVER_COLOR: [f32; 4] = [0.32, 0.34, 0.4, 1.0];
/// Colour shown while a cover is still in flight.
pub const PENDING_COVER_COLOR: [f32; 4] = [0.18, 0.19, 0.22, 1.0];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRole {
    RealCover { cover: String },
    AddPlaceholder,
}

impl ItemRole {
    pub fn from_reference(reference: &str) -> Self {
        if is_add_new(reference) {
            ItemRole::AddPlaceholder
        } else {
            ItemRole::RealCover {
                cover: reference.to_string(),
            }
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ItemRole::AddPlaceholder)
    }

    pub fn cover(&self) -> Option<&str> {
        match self {
            ItemRole::RealCover { cover } => Some(cover),
            ItemRole::AddPlaceholder => None,
        }
    }
}

/// Load progress of a cover texture. `Loading` with a `retry_at` is a failed
/// attempt waiting out its back-off; without one the request is in flight.
#[derive(Debug)]
pub enum TextureState<T> {
    Unloaded,
    Loading {
        attempt: u32,
        retry_at: Option<Duration>,
    },
    Loaded(T),
    Failed,
}

impl<T> TextureState<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, TextureState::Loaded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TextureState::Failed)
    }
}

/// Corner-bracket decoration around the selected cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionOutline {
    pub half_width: f32,
    pub half_height: f32,
    pub bracket_length: f32,
    pub thickness: f32,
    pub visible: bool,
}

impl SelectionOutline {
    pub fn sized_for(dimensions: &BoxDimensions) -> Self {
        let reach = dimensions.width.min(dimensions.height);
        Self {
            half_width: dimensions.width * 0.5 + reach * 0.08,
            half_height: dimensions.height * 0.5 + reach * 0.08,
            bracket_length: reach * 0.22,
            thickness: reach * 0.03,
            visible: false,
        }
    }
}

/// "+" mark carried by the add-new slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlusGlyph {
    pub arm_length: f32,
    pub thickness: f32,
}

impl PlusGlyph {
    pub fn sized_for(dimensions: &BoxDimensions) -> Self {
        let reach = dimensions.width.min(dimensions.height);
        Self {
            arm_length: reach * 0.5,
            thickness: reach * 0.1,
        }
    }
}

/// Role-specific parts of an item. Rebuilt wholesale on a role transition so
/// an item is never half cover, half placeholder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemDecoration {
    Outline(SelectionOutline),
    Glyph(PlusGlyph),
}

#[derive(Debug)]
pub struct VisualItem<T> {
    pub role: ItemRole,
    /// Changes whenever the slot starts showing a different cover, so late
    /// texture completions for the old one can be told apart.
    pub generation: u64,
    pub dimensions: BoxDimensions,
    pub cell: GridCell,
    pub position: Vec3,
    pub texture: TextureState<T>,
    pub decoration: ItemDecoration,
    pub phase: f32,
    pub selected: bool,
    /// Yaw in radians applied while the item is being inspected.
    pub spin: f32,
}

impl<T> VisualItem<T> {
    fn new(role: ItemRole, generation: u64, dimensions: BoxDimensions, phase: f32) -> Self {
        let decoration = decoration_for(&role, &dimensions);
        Self {
            role,
            generation,
            dimensions,
            cell: GridCell { row: 0, col: 0 },
            position: Vec3::ZERO,
            texture: TextureState::Unloaded,
            decoration,
            phase,
            selected: false,
            spin: 0.0,
        }
    }

    /// Swap the slot to a new role. Only the parts that differ between roles
    /// are rebuilt: texture, decoration and selection.
    fn transition(&mut self, role: ItemRole, generation: u64) {
        self.decoration = decoration_for(&role, &self.dimensions);
        self.texture = TextureState::Unloaded;
        self.generation = generation;
        self.selected = false;
        self.spin = 0.0;
        self.role = role;
    }

    fn resize(&mut self, dimensions: BoxDimensions) {
        self.dimensions = dimensions;
        let visible = self.outline().is_some_and(|outline| outline.visible);
        self.decoration = decoration_for(&self.role, &dimensions);
        self.set_outline_visible(visible);
    }

    pub fn is_placeholder(&self) -> bool {
        self.role.is_placeholder()
    }

    pub fn outline(&self) -> Option<&SelectionOutline> {
        match &self.decoration {
            ItemDecoration::Outline(outline) => Some(outline),
            ItemDecoration::Glyph(_) => None,
        }
    }

    pub fn glyph(&self) -> Option<&PlusGlyph> {
        match &self.decoration {
            ItemDecoration::Glyph(glyph) => Some(glyph),
            ItemDecoration::Outline(_) => None,
        }
    }

    /// Mark or unmark the item as the selection. Deselecting restores the
    /// idle pose.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        if !selected {
            self.spin = 0.0;
        }
        self.set_outline_visible(selected);
    }

    fn set_outline_visible(&mut self, visible: bool) {
        if let ItemDecoration::Outline(outline) = &mut self.decoration {
            outline.visible = visible;
        }
    }

    /// Surface colour for the current texture state (tint when loaded).
    pub fn surface_color(&self) -> [f32; 4] {
        match &self.texture {
            TextureState::Loaded(_) => [1.0, 1.0, 1.0, 1.0],
            TextureState::Failed => FALLBACK_COVER_COLOR,
            TextureState::Unloaded | TextureState::Loading { .. } => PENDING_COVER_COLOR,
        }
    }
}

fn decoration_for(role: &ItemRole, dimensions: &BoxDimensions) -> ItemDecoration {
    match role {
        ItemRole::RealCover { .. } => ItemDecoration::Outline(SelectionOutline::sized_for(dimensions)),
        ItemRole::AddPlaceholder => ItemDecoration::Glyph(PlusGlyph::sized_for(dimensions)),
    }
}

/// Per-slot phase in `[0, 2π)`, spread so neighbours bob out of step.
pub fn phase_for_slot(slot: usize) -> f32 {
    let mut z = (slot as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 40) as f32 / (1u64 << 24) as f32 * std::f32::consts::TAU
}

/// Identifies the slot and cover a texture load was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureTicket {
    pub slot: usize,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRequest {
    pub ticket: TextureTicket,
    pub cover: String,
    pub attempt: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureOutcome {
    Loaded,
    RetryScheduled { attempt: u32 },
    FellBack,
    /// The slot was removed or now shows another cover.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    pub unchanged: bool,
    pub created: usize,
    pub removed: usize,
    pub transitioned: usize,
    pub resized: bool,
}

pub struct MeshPool<T> {
    items: Vec<VisualItem<T>>,
    sequence: Vec<String>,
    layout: RowLayout,
    synced_once: bool,
    grid: GridLayout,
    atlas: CoverAtlas,
    layouts: LayoutTable,
    item_width: f32,
    retry_delay: Duration,
    max_attempts: u32,
    next_generation: u64,
}

impl<T> MeshPool<T> {
    pub fn new(config: &ShelfConfig, layout: RowLayout) -> Self {
        let profile = config.layouts.profile(layout);
        let dimensions = BoxDimensions::for_profile(&config.atlas, config.item_width, profile);
        Self {
            items: Vec::new(),
            sequence: Vec::new(),
            layout,
            synced_once: false,
            grid: GridLayout::resolve(0, profile, dimensions),
            atlas: config.atlas,
            layouts: config.layouts,
            item_width: config.item_width,
            retry_delay: config.timing.texture_retry(),
            max_attempts: config.timing.max_texture_attempts,
            next_generation: 0,
        }
    }

    /// Bring the arena in line with `sequence` under `layout`.
    pub fn sync(&mut self, sequence: &[String], layout: RowLayout) -> Result<SyncOutcome> {
        if let Some(index) = sequence.iter().position(|reference| is_add_new(reference)) {
            if index + 1 != sequence.len() {
                return Err(ShelfError::MisplacedSentinel {
                    index,
                    len: sequence.len(),
                });
            }
        }

        if self.synced_once && self.layout == layout && self.sequence == sequence {
            return Ok(SyncOutcome {
                unchanged: true,
                ..SyncOutcome::default()
            });
        }

        let mut outcome = SyncOutcome::default();
        let layout_changed = self.layout != layout;
        self.layout = layout;
        let dimensions = self.dimensions();

        if sequence.len() < self.items.len() {
            outcome.removed = self.items.len() - sequence.len();
            // Dropping the items releases any texture handles they own.
            self.items.truncate(sequence.len());
        }

        for (slot, reference) in sequence.iter().enumerate() {
            let role = ItemRole::from_reference(reference);
            if slot >= self.items.len() {
                let generation = self.bump_generation();
                self.items
                    .push(VisualItem::new(role, generation, dimensions, phase_for_slot(slot)));
                outcome.created += 1;
                continue;
            }
            if self.items[slot].role != role {
                let generation = self.bump_generation();
                let item = &mut self.items[slot];
                debug!(
                    "slot {slot}: {} -> {}",
                    describe_role(&item.role),
                    describe_role(&role)
                );
                item.transition(role, generation);
                outcome.transitioned += 1;
            }
        }

        if layout_changed {
            for item in &mut self.items {
                item.resize(dimensions);
            }
            outcome.resized = true;
        }

        self.sequence = sequence.to_vec();
        self.synced_once = true;
        self.place_items();
        debug!(
            "pool sync: {} items ({} created, {} removed, {} transitioned, layout {})",
            self.items.len(),
            outcome.created,
            outcome.removed,
            outcome.transitioned,
            layout.label()
        );
        Ok(outcome)
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn dimensions(&self) -> BoxDimensions {
        BoxDimensions::for_profile(
            &self.atlas,
            self.item_width,
            self.layouts.profile(self.layout),
        )
    }

    fn place_items(&mut self) {
        let profile = self.layouts.profile(self.layout);
        self.grid = GridLayout::resolve(self.items.len(), profile, self.dimensions());
        for (slot, item) in self.items.iter_mut().enumerate() {
            item.cell = self.grid.cell(slot);
            item.position = self.grid.position(slot);
        }
    }

    pub fn layout(&self) -> RowLayout {
        self.layout
    }

    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    /// The sequence the pool was last synced to.
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    pub fn layout_scale(&self) -> f32 {
        self.layouts.profile(self.layout).scale
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[VisualItem<T>] {
        &self.items
    }

    pub fn get(&self, slot: usize) -> Option<&VisualItem<T>> {
        self.items.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut VisualItem<T>> {
        self.items.get_mut(slot)
    }

    pub fn is_placeholder(&self, slot: usize) -> bool {
        self.items
            .get(slot)
            .is_some_and(VisualItem::is_placeholder)
    }

    /// Number of real covers. The add-new slot, when present, is last, so
    /// playable slots are exactly `0..playable_count()`.
    pub fn playable_count(&self) -> usize {
        match self.items.last() {
            Some(item) if item.is_placeholder() => self.items.len() - 1,
            _ => self.items.len(),
        }
    }

    /// Hand out loads that are due: first attempts for fresh covers and
    /// retries whose back-off has elapsed.
    pub fn poll_requests(&mut self, now: Duration) -> Vec<TextureRequest> {
        let mut requests = Vec::new();
        for (slot, item) in self.items.iter_mut().enumerate() {
            let Some(cover) = item.role.cover() else {
                continue;
            };
            let attempt = match item.texture {
                TextureState::Unloaded => 1,
                TextureState::Loading {
                    attempt,
                    retry_at: Some(at),
                } if at <= now => attempt,
                _ => continue,
            };
            item.texture = TextureState::Loading {
                attempt,
                retry_at: None,
            };
            requests.push(TextureRequest {
                ticket: TextureTicket {
                    slot,
                    generation: item.generation,
                },
                cover: cover.to_string(),
                attempt,
            });
        }
        requests
    }

    /// Apply the result of a load. Completions for removed or re-targeted
    /// slots are dropped without touching the pool.
    pub fn complete_texture(
        &mut self,
        ticket: TextureTicket,
        result: std::result::Result<T, CoverLoadError>,
        now: Duration,
    ) -> TextureOutcome {
        let retry_delay = self.retry_delay;
        let max_attempts = self.max_attempts;
        let Some(item) = self
            .items
            .get_mut(ticket.slot)
            .filter(|item| item.generation == ticket.generation)
        else {
            debug!("discarding texture for retired slot {}", ticket.slot);
            return TextureOutcome::Stale;
        };
        let TextureState::Loading {
            attempt,
            retry_at: None,
        } = item.texture
        else {
            return TextureOutcome::Stale;
        };

        match result {
            Ok(texture) => {
                item.texture = TextureState::Loaded(texture);
                TextureOutcome::Loaded
            }
            Err(err) if attempt < max_attempts => {
                debug!(
                    "slot {}: cover attempt {attempt}/{max_attempts} failed ({err}); retrying",
                    ticket.slot
                );
                item.texture = TextureState::Loading {
                    attempt: attempt + 1,
                    retry_at: Some(now + retry_delay),
                };
                TextureOutcome::RetryScheduled {
                    attempt: attempt + 1,
                }
            }
            Err(err) => {
                debug!(
                    "slot {}: giving up on cover after {attempt} attempts ({err})",
                    ticket.slot
                );
                item.texture = TextureState::Failed;
                TextureOutcome::FellBack
            }
        }
    }
}

fn describe_role(role: &ItemRole) -> &str {
    match role {
        ItemRole::RealCover { cover } => cover,
        ItemRole::AddPlaceholder => "<add new>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ADD_NEW_SENTINEL;
    use std::rc::Rc;

    fn refs(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn pool<T>() -> MeshPool<T> {
        MeshPool::new(&ShelfConfig::default(), RowLayout::Single)
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn sync_creates_items_with_placeholder_last() {
        let mut pool: MeshPool<()> = pool();
        let outcome = pool
            .sync(&refs(&["a.png", "b.png", ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");
        assert_eq!(outcome.created, 3);
        assert_eq!(pool.playable_count(), 2);
        assert!(pool.is_placeholder(2));
        assert!(pool.get(2).and_then(|item| item.glyph()).is_some());
        assert!(pool.get(0).and_then(|item| item.outline()).is_some());
    }

    #[test]
    fn identical_sync_is_a_no_op() {
        let mut pool: MeshPool<()> = pool();
        let sequence = refs(&["a.png", ADD_NEW_SENTINEL]);
        pool.sync(&sequence, RowLayout::Single).expect("sync");
        let outcome = pool.sync(&sequence, RowLayout::Single).expect("sync");
        assert!(outcome.unchanged);
    }

    #[test]
    fn misplaced_sentinel_is_rejected() {
        let mut pool: MeshPool<()> = pool();
        let err = pool
            .sync(&refs(&[ADD_NEW_SENTINEL, "a.png"]), RowLayout::Single)
            .expect_err("sentinel must be last");
        assert_eq!(err, ShelfError::MisplacedSentinel { index: 0, len: 2 });
    }

    #[test]
    fn shrinking_releases_trailing_textures() {
        let mut pool: MeshPool<Rc<()>> = pool();
        let handle = Rc::new(());
        pool.sync(&refs(&["a.png", "b.png", ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");
        let requests = pool.poll_requests(ms(0));
        let ticket = requests[1].ticket;
        pool.complete_texture(ticket, Ok(handle.clone()), ms(5));
        assert_eq!(Rc::strong_count(&handle), 2);

        let outcome = pool
            .sync(&refs(&["a.png", ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.transitioned, 1);
        assert_eq!(Rc::strong_count(&handle), 1, "slot 1 texture dropped");
        assert!(pool.is_placeholder(1));
    }

    #[test]
    fn placeholder_to_cover_swaps_decoration() {
        let mut pool: MeshPool<()> = pool();
        pool.sync(&refs(&["a.png", ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");
        let outcome = pool
            .sync(&refs(&["a.png", "b.png", ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");
        assert_eq!(outcome.transitioned, 1);
        assert_eq!(outcome.created, 1);
        let item = pool.get(1).expect("slot 1");
        assert_eq!(item.role.cover(), Some("b.png"));
        assert!(item.outline().is_some());
        assert!(item.glyph().is_none());
        assert!(matches!(item.texture, TextureState::Unloaded));
    }

    #[test]
    fn layout_change_resizes_every_item() {
        let mut pool: MeshPool<()> = pool();
        let sequence = refs(&["a.png", "b.png", "c.png", ADD_NEW_SENTINEL]);
        pool.sync(&sequence, RowLayout::Single).expect("sync");
        let single_width = pool.get(0).expect("item").dimensions.width;
        pool.get_mut(0).expect("item").set_selected(true);

        let outcome = pool.sync(&sequence, RowLayout::Grid).expect("sync");
        assert!(outcome.resized);
        let item = pool.get(0).expect("item");
        assert!(item.dimensions.width < single_width);
        let outline = item.outline().expect("outline");
        assert!(outline.visible, "selection survives the rebuild");
        assert!(outline.half_width < single_width * 0.75);
        assert_eq!(pool.get(3).expect("placeholder").cell, GridCell { row: 1, col: 1 });
    }

    #[test]
    fn failed_loads_retry_then_fall_back() {
        let mut pool: MeshPool<u32> = pool();
        pool.sync(&refs(&["a.png", ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");
        let failure = || Err(CoverLoadError::Missing("a.png".into()));

        let first = pool.poll_requests(ms(0));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].attempt, 1);
        assert_eq!(
            pool.complete_texture(first[0].ticket, failure(), ms(10)),
            TextureOutcome::RetryScheduled { attempt: 2 }
        );
        assert!(pool.poll_requests(ms(300)).is_empty(), "back-off not elapsed");

        let second = pool.poll_requests(ms(410));
        assert_eq!(second[0].attempt, 2);
        assert_eq!(
            pool.complete_texture(second[0].ticket, failure(), ms(420)),
            TextureOutcome::RetryScheduled { attempt: 3 }
        );

        let third = pool.poll_requests(ms(820));
        assert_eq!(third[0].attempt, 3);
        assert_eq!(
            pool.complete_texture(third[0].ticket, failure(), ms(830)),
            TextureOutcome::FellBack
        );
        let item = pool.get(0).expect("item");
        assert!(item.texture.is_failed());
        assert_eq!(item.surface_color(), FALLBACK_COVER_COLOR);
        assert!(pool.poll_requests(ms(5_000)).is_empty());
    }

    #[test]
    fn completion_for_retired_cover_is_ignored() {
        let mut pool: MeshPool<u32> = pool();
        pool.sync(&refs(&["a.png", ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");
        let request = pool.poll_requests(ms(0)).remove(0);
        pool.sync(&refs(&["z.png", ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");

        assert_eq!(
            pool.complete_texture(request.ticket, Ok(7), ms(5)),
            TextureOutcome::Stale
        );
        assert!(matches!(pool.get(0).expect("item").texture, TextureState::Unloaded));

        pool.sync(&refs(&[ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");
        assert_eq!(
            pool.complete_texture(request.ticket, Ok(7), ms(6)),
            TextureOutcome::Stale
        );
    }

    #[test]
    fn placeholder_never_requests_a_texture() {
        let mut pool: MeshPool<()> = pool();
        pool.sync(&refs(&[ADD_NEW_SENTINEL]), RowLayout::Single)
            .expect("sync");
        assert!(pool.poll_requests(ms(0)).is_empty());
        assert_eq!(pool.playable_count(), 0);
    }

    #[test]
    fn slot_phases_stay_in_range() {
        for slot in 0..256 {
            let phase = phase_for_slot(slot);
            assert!((0.0..std::f32::consts::TAU).contains(&phase));
        }
        assert_ne!(phase_for_slot(0), phase_for_slot(1));
    }
}
