//! Navigation state machine: which cover is centred, where the shelf is
//! panned to, and what the pointer is currently doing.

use std::time::Duration;

use glam::Vec2;
use log::trace;
use serde::Serialize;

use crate::animation::ease_toward;
use crate::config::{MotionTuning, PanPolicy, ShelfConfig, Timing};
use crate::layout::PanBounds;
use crate::pool::MeshPool;

/// Unit step on the grid. Components are -1, 0 or +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Direction {
    pub dx: i8,
    pub dy: i8,
}

impl Direction {
    pub const LEFT: Direction = Direction { dx: -1, dy: 0 };
    pub const RIGHT: Direction = Direction { dx: 1, dy: 0 };
    pub const UP: Direction = Direction { dx: 0, dy: -1 };
    pub const DOWN: Direction = Direction { dx: 0, dy: 1 };
}

/// What the host is told about the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Selection {
    Item(usize),
    /// The add-new slot was activated; the centred item did not change.
    AddNew,
    /// Nothing is selectable any more.
    Cleared,
}

impl Selection {
    /// Index form used by the host: `-1` for add-new, `None` when cleared.
    pub fn as_index(self) -> Option<i64> {
        match self {
            Selection::Item(index) => Some(index as i64),
            Selection::AddNew => Some(-1),
            Selection::Cleared => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShelfEvent {
    Selected(Selection),
    LongPress(usize),
    /// A navigation step landed on a new cover.
    Chime,
}

/// Horizontal pan of the whole grid, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PanState {
    pub offset: f32,
    pub target: f32,
    /// Visual overshoot past the bounds while dragging; the backdrop shows
    /// it, the grid does not.
    pub overscroll: f32,
    pub bounds: PanBounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerMode {
    Idle,
    Rotating {
        slot: usize,
        origin: Vec2,
        last_x: f32,
        /// Deadline of the pending long press, cleared once it fires or the
        /// pointer wanders off.
        long_press: Option<Duration>,
    },
    Panning {
        last_x: f32,
        /// Unclamped drag position.
        raw: f32,
    },
}

/// Directions currently held, newest last. Only the newest one repeats;
/// releasing it hands the repeat back to the one underneath.
#[derive(Debug, Clone, Default, PartialEq)]
struct HoldState {
    held: Vec<Direction>,
    next_fire: Duration,
}

impl HoldState {
    fn active(&self) -> Option<Direction> {
        self.held.last().copied()
    }
}

/// Index reached by one step from `current`. Leaving the grid is a no-op and
/// the result is clamped to the playable range.
pub fn step_target(current: usize, direction: Direction, rows: u32, playable: usize) -> usize {
    if playable == 0 {
        return current;
    }
    let rows = rows.max(1) as i64;
    let current_i = current as i64;
    let candidate = if rows == 1 {
        if direction.dx == 0 {
            return current;
        }
        current_i + direction.dx as i64
    } else {
        let col = current_i / rows;
        let row = current_i % rows;
        if direction.dx != 0 {
            let col = col + direction.dx as i64;
            if col < 0 {
                return current;
            }
            col * rows + row
        } else if direction.dy != 0 {
            let row = row + direction.dy as i64;
            if !(0..rows).contains(&row) {
                return current;
            }
            col * rows + row
        } else {
            return current;
        }
    };
    candidate.clamp(0, playable as i64 - 1) as usize
}

pub struct SelectionController {
    current: Option<usize>,
    /// Generation of the selected slot when it was picked; a catalog edit
    /// that puts a different cover in that slot changes it.
    selected_generation: Option<u64>,
    pan: PanState,
    mode: PointerMode,
    hold: HoldState,
    events: Vec<ShelfEvent>,
    policy: PanPolicy,
    timing: Timing,
    motion: MotionTuning,
}

impl SelectionController {
    pub fn new(config: &ShelfConfig) -> Self {
        Self {
            current: None,
            selected_generation: None,
            pan: PanState::default(),
            mode: PointerMode::Idle,
            hold: HoldState::default(),
            events: Vec::new(),
            policy: config.pan_policy,
            timing: config.timing,
            motion: config.motion,
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn pan(&self) -> &PanState {
        &self.pan
    }

    pub fn mode(&self) -> &PointerMode {
        &self.mode
    }

    pub fn is_holding(&self) -> bool {
        !self.hold.held.is_empty()
    }

    pub fn drain_events(&mut self) -> Vec<ShelfEvent> {
        std::mem::take(&mut self.events)
    }

    fn effective_bounds(&self, bounds: PanBounds) -> PanBounds {
        match self.policy {
            PanPolicy::Centered => bounds,
            PanPolicy::LeftAnchored => PanBounds {
                min: bounds.min,
                max: bounds.max.min(0.0).max(bounds.min),
            },
        }
    }

    fn target_for<T>(&self, pool: &MeshPool<T>, slot: usize) -> f32 {
        let x = pool.get(slot).map_or(0.0, |item| item.position.x);
        self.pan.bounds.clamp(-x)
    }

    /// Centre `slot`. The add-new slot only reports its activation; picking
    /// the already-centred cover just re-centres it.
    pub fn select_mesh<T>(&mut self, pool: &mut MeshPool<T>, slot: usize, play_sound: bool) {
        if slot >= pool.len() {
            return;
        }
        if pool.is_placeholder(slot) {
            self.events.push(ShelfEvent::Selected(Selection::AddNew));
            return;
        }
        if self.current == Some(slot) {
            self.pan.target = self.target_for(pool, slot);
            return;
        }
        if let Some(previous) = self.current.and_then(|previous| pool.get_mut(previous)) {
            previous.set_selected(false);
        }
        if let Some(item) = pool.get_mut(slot) {
            item.set_selected(true);
        }
        self.current = Some(slot);
        self.selected_generation = pool.get(slot).map(|item| item.generation);
        self.pan.target = self.target_for(pool, slot);
        self.events.push(ShelfEvent::Selected(Selection::Item(slot)));
        if play_sound {
            self.events.push(ShelfEvent::Chime);
        }
    }

    /// One discrete navigation step. With nothing selected the first cover
    /// is picked.
    pub fn step<T>(&mut self, pool: &mut MeshPool<T>, direction: Direction) {
        let playable = pool.playable_count();
        if playable == 0 {
            return;
        }
        let Some(current) = self.current else {
            self.select_mesh(pool, 0, true);
            return;
        };
        let next = step_target(current, direction, pool.grid().rows, playable);
        trace!("step {direction:?}: {current} -> {next}");
        if next != current {
            self.select_mesh(pool, next, true);
        }
    }

    /// Start holding a direction: step now, then repeat from [`tick`].
    /// Auto-repeat of the newest held key is ignored.
    ///
    /// [`tick`]: SelectionController::tick
    pub fn begin_hold<T>(&mut self, pool: &mut MeshPool<T>, direction: Direction, now: Duration) {
        if self.hold.active() == Some(direction) {
            return;
        }
        self.hold.held.retain(|held| *held != direction);
        self.hold.held.push(direction);
        self.hold.next_fire = now + self.timing.step_repeat();
        self.step(pool, direction);
    }

    /// Release a held direction. If it was repeating, the previously held
    /// one takes over on the current repeat schedule.
    pub fn end_hold(&mut self, direction: Direction) {
        self.hold.held.retain(|held| *held != direction);
        if let Some(resumed) = self.hold.active() {
            trace!("hold released {direction:?}, resuming {resumed:?}");
        }
    }

    /// Fire timers that are due: the held-direction repeat and the long press.
    pub fn tick<T>(&mut self, pool: &mut MeshPool<T>, now: Duration) {
        if let Some(direction) = self.hold.active() {
            if now >= self.hold.next_fire {
                self.step(pool, direction);
                self.hold.next_fire += self.timing.step_repeat();
                if self.hold.next_fire <= now {
                    self.hold.next_fire = now + self.timing.step_repeat();
                }
            }
        }
        if let PointerMode::Rotating {
            slot, long_press, ..
        } = &mut self.mode
        {
            if long_press.is_some_and(|deadline| now >= deadline) {
                *long_press = None;
                self.events.push(ShelfEvent::LongPress(*slot));
            }
        }
    }

    /// Pointer went down over `hit` (slot of the nearest item, if any).
    pub fn pointer_down<T>(
        &mut self,
        pool: &mut MeshPool<T>,
        hit: Option<usize>,
        position: Vec2,
        now: Duration,
    ) {
        match hit {
            Some(slot) if pool.is_placeholder(slot) => {
                self.select_mesh(pool, slot, false);
                self.mode = PointerMode::Idle;
            }
            Some(slot) if slot < pool.len() => {
                self.select_mesh(pool, slot, true);
                self.mode = PointerMode::Rotating {
                    slot,
                    origin: position,
                    last_x: position.x,
                    long_press: Some(now + self.timing.long_press()),
                };
            }
            _ => {
                self.mode = PointerMode::Panning {
                    last_x: position.x,
                    raw: self.pan.offset,
                };
            }
        }
    }

    pub fn pointer_move<T>(&mut self, pool: &mut MeshPool<T>, position: Vec2, pixels_per_unit: f32) {
        match &mut self.mode {
            PointerMode::Idle => {}
            PointerMode::Rotating {
                slot,
                origin,
                last_x,
                long_press,
            } => {
                if long_press.is_some() && position.distance(*origin) > self.motion.long_press_slop_px {
                    *long_press = None;
                }
                let dx = position.x - *last_x;
                *last_x = position.x;
                if let Some(item) = pool.get_mut(*slot) {
                    item.spin += dx * self.motion.rotate_speed;
                }
            }
            PointerMode::Panning { last_x, raw } => {
                let dx = position.x - *last_x;
                *last_x = position.x;
                if pixels_per_unit > f32::EPSILON {
                    *raw += dx * self.motion.drag_speed / pixels_per_unit;
                }
                let clamped = self.pan.bounds.clamp(*raw);
                self.pan.offset = clamped;
                self.pan.target = clamped;
                self.pan.overscroll = (*raw - clamped) * self.motion.overscroll_damping;
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.mode = PointerMode::Idle;
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.mode, PointerMode::Panning { .. })
    }

    /// Per-frame pan easing; overscroll relaxes once the drag ends.
    pub fn animate(&mut self) {
        self.pan.offset = ease_toward(self.pan.offset, self.pan.target, self.motion.pan_damping);
        if !self.is_panning() {
            self.pan.overscroll =
                ease_toward(self.pan.overscroll, 0.0, self.motion.pan_damping);
        }
    }

    /// Re-resolve bounds and the pan target after the pool was re-laid out
    /// or the catalog changed size.
    pub fn on_layout_changed<T>(&mut self, pool: &mut MeshPool<T>) {
        self.pan.bounds = self.effective_bounds(pool.grid().bounds);
        self.pan.offset = self.pan.bounds.clamp(self.pan.offset);
        self.pan.target = self.pan.bounds.clamp(self.pan.target);

        if let PointerMode::Rotating { slot, .. } = self.mode {
            if slot >= pool.playable_count() {
                self.mode = PointerMode::Idle;
            }
        }

        let playable = pool.playable_count();
        match self.current {
            Some(current) if current < playable => {
                let mut replaced = false;
                // A role transition may have reset the flag on this slot.
                if let Some(item) = pool.get_mut(current) {
                    if !item.selected {
                        item.set_selected(true);
                    }
                    replaced = self.selected_generation != Some(item.generation);
                    self.selected_generation = Some(item.generation);
                }
                self.pan.target = self.target_for(pool, current);
                if replaced {
                    trace!("slot {current} now shows a different cover");
                    self.events.push(ShelfEvent::Selected(Selection::Item(current)));
                }
            }
            Some(_) => {
                self.current = None;
                self.selected_generation = None;
                if playable > 0 {
                    self.select_mesh(pool, playable - 1, false);
                } else {
                    self.events.push(ShelfEvent::Selected(Selection::Cleared));
                }
            }
            None if playable > 0 => self.select_mesh(pool, 0, false),
            None => {}
        }
    }
}
