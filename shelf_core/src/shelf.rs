//! The shelf as the host sees it: one object that owns the pool, the
//! controller and the camera, takes input and time, and hands back a frame
//! description plus the selection events.

use std::time::Duration;

use glam::{Mat4, Quat, Vec2, Vec3};
use log::debug;
use serde::Serialize;

use crate::animation::{FrameClock, bob_offset, pulse};
use crate::config::{RowLayout, ShelfConfig};
use crate::controller::{Direction, PanState, Selection, SelectionController, ShelfEvent};
use crate::coords::{CameraRig, CoordinateMapper, Viewport};
use crate::error::{CoverLoadError, Result};
use crate::layout::GridCell;
use crate::pool::{
    ItemDecoration, MeshPool, SyncOutcome, TextureOutcome, TextureRequest, TextureState,
    TextureTicket, VisualItem,
};

const OUTLINE_COLOR: [f32; 4] = [1.0, 0.82, 0.3, 1.0];
const GLYPH_COLOR: [f32; 4] = [0.85, 0.88, 0.95, 1.0];

/// How an item's box is drawn this frame.
#[derive(Debug)]
pub enum ItemSurface<'a, T> {
    Cover(&'a T),
    Flat([f32; 4]),
    /// Present for picking and spacing only.
    Hidden,
}

#[derive(Debug)]
pub struct ItemFrame<'a, T> {
    pub slot: usize,
    /// Maps the unit cube onto the item's box.
    pub model: Mat4,
    pub surface: ItemSurface<'a, T>,
}

/// A flat-coloured unit cube, used for outline brackets and the "+" glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecorationFrame {
    pub slot: usize,
    pub model: Mat4,
    pub color: [f32; 4],
}

/// Backdrop panel behind the grid, in pixels (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackdropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug)]
pub struct FrameSnapshot<'a, T> {
    pub view_projection: Mat4,
    pub items: Vec<ItemFrame<'a, T>>,
    pub decorations: Vec<DecorationFrame>,
    pub backdrop: BackdropRect,
    pub pixels_per_unit: f32,
}

/// Serializable summary of the resolved layout.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub layout: &'static str,
    pub rows: u32,
    pub cols: u32,
    pub viewport: Viewport,
    pub camera: CameraRig,
    pub pixels_per_unit: f32,
    pub pan: PanState,
    pub selected: Option<usize>,
    pub items: Vec<ItemReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub slot: usize,
    pub cover: Option<String>,
    pub cell: GridCell,
    pub position: Vec3,
    pub size: [f32; 3],
}

pub struct Shelf<T> {
    config: ShelfConfig,
    viewport: Viewport,
    pool: MeshPool<T>,
    controller: SelectionController,
    camera: CameraRig,
    mapper: CoordinateMapper,
    clock: FrameClock,
    time: f32,
}

impl<T> Shelf<T> {
    pub fn new(config: ShelfConfig, layout: RowLayout, viewport: Viewport) -> Result<Self> {
        config.validate()?;
        let pool = MeshPool::new(&config, layout);
        let controller = SelectionController::new(&config);
        let camera = CameraRig::fit_height(&config.camera, 0.0);
        let mapper = CoordinateMapper::new(&camera, viewport);
        let mut shelf = Self {
            config,
            viewport,
            pool,
            controller,
            camera,
            mapper,
            clock: FrameClock::new(),
            time: 0.0,
        };
        shelf.relayout();
        Ok(shelf)
    }

    /// Replace the cover sequence (catalog order plus trailing sentinel).
    pub fn set_catalog(&mut self, sequence: &[String]) -> Result<SyncOutcome> {
        let layout = self.pool.layout();
        self.sync(sequence, layout)
    }

    pub fn set_layout(&mut self, layout: RowLayout) -> Result<SyncOutcome> {
        let sequence = self.pool.sequence().to_vec();
        self.sync(&sequence, layout)
    }

    pub fn toggle_layout(&mut self) -> Result<SyncOutcome> {
        self.set_layout(self.pool.layout().toggled())
    }

    fn sync(&mut self, sequence: &[String], layout: RowLayout) -> Result<SyncOutcome> {
        let outcome = self.pool.sync(sequence, layout)?;
        if !outcome.unchanged {
            self.relayout();
        }
        Ok(outcome)
    }

    fn relayout(&mut self) {
        let grid = self.pool.grid();
        // Frame every row of the layout, not just the occupied ones, so the
        // camera does not jump while the catalog is short.
        let framed = (grid.rows - 1) as f32 * grid.step_y + grid.dimensions.height;
        self.camera = CameraRig::fit_height(&self.config.camera, framed);
        self.mapper = CoordinateMapper::new(&self.camera, self.viewport);
        self.controller.on_layout_changed(&mut self.pool);
        debug!(
            "relayout: {} cols x {} rows, camera at {:.2}, {:.1} px/unit",
            self.pool.grid().cols,
            self.pool.grid().rows,
            self.camera.distance,
            self.mapper.pixels_per_unit
        );
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.mapper = CoordinateMapper::new(&self.camera, self.viewport);
    }

    pub fn press_direction(&mut self, direction: Direction, now: Duration) {
        self.controller.begin_hold(&mut self.pool, direction, now);
    }

    pub fn release_direction(&mut self, direction: Direction) {
        self.controller.end_hold(direction);
    }

    pub fn select(&mut self, slot: usize) {
        self.controller.select_mesh(&mut self.pool, slot, true);
    }

    pub fn pointer_pressed(&mut self, x: f32, y: f32, now: Duration) {
        let hit = self.hit_test(x, y);
        self.controller
            .pointer_down(&mut self.pool, hit, Vec2::new(x, y), now);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let pixels_per_unit = self.mapper.pixels_per_unit;
        self.controller
            .pointer_move(&mut self.pool, Vec2::new(x, y), pixels_per_unit);
    }

    pub fn pointer_released(&mut self) {
        self.controller.pointer_up();
    }

    /// Slot of the nearest item under the pixel, decorations included.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        let ray = self.camera.pick_ray(self.viewport, x, y);
        let pulse = pulse(self.time, &self.config.motion);
        let mut best: Option<(f32, usize)> = None;
        for (slot, item) in self.pool.items().iter().enumerate() {
            let transform = self.item_transform(item);
            let shapes = std::iter::once(transform * box_scale(item))
                .chain(decoration_models(item, pulse).into_iter().map(|local| transform * local));
            for model in shapes {
                if let Some(distance) = ray.intersect_unit_box(model) {
                    if best.is_none_or(|(nearest, _)| distance < nearest) {
                        best = Some((distance, slot));
                    }
                }
            }
        }
        best.map(|(_, slot)| slot)
    }

    /// Advance one frame. Returns `false` once the shelf was unmounted.
    pub fn advance(&mut self, now: Duration) -> bool {
        let Some(time) = self.clock.tick(now) else {
            return false;
        };
        self.time = time;
        self.controller.tick(&mut self.pool, now);
        self.controller.animate();
        true
    }

    pub fn unmount(&mut self) {
        self.clock.stop();
        self.controller.pointer_up();
    }

    pub fn is_mounted(&self) -> bool {
        self.clock.is_running()
    }

    pub fn drain_events(&mut self) -> Vec<ShelfEvent> {
        self.controller.drain_events()
    }

    pub fn poll_texture_requests(&mut self, now: Duration) -> Vec<TextureRequest> {
        self.pool.poll_requests(now)
    }

    pub fn complete_texture(
        &mut self,
        ticket: TextureTicket,
        result: std::result::Result<T, CoverLoadError>,
        now: Duration,
    ) -> TextureOutcome {
        self.pool.complete_texture(ticket, result, now)
    }

    pub fn current_selection(&self) -> Option<usize> {
        self.controller.current()
    }

    /// Selection as the host reports it.
    pub fn selection(&self) -> Selection {
        self.controller
            .current()
            .map_or(Selection::Cleared, Selection::Item)
    }

    pub fn pan(&self) -> &PanState {
        self.controller.pan()
    }

    pub fn pool(&self) -> &MeshPool<T> {
        &self.pool
    }

    pub fn layout(&self) -> RowLayout {
        self.pool.layout()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn config(&self) -> &ShelfConfig {
        &self.config
    }

    fn item_transform(&self, item: &VisualItem<T>) -> Mat4 {
        let bob = bob_offset(
            self.time,
            item.phase,
            &self.config.motion,
            self.pool.layout_scale(),
        );
        let scale = if item.selected {
            self.config.motion.selection_scale
        } else {
            1.0
        };
        let translation = item.position + Vec3::new(self.controller.pan().offset, bob, 0.0);
        Mat4::from_scale_rotation_translation(
            Vec3::splat(scale),
            Quat::from_rotation_y(item.spin),
            translation,
        )
    }

    pub fn snapshot(&self) -> FrameSnapshot<'_, T> {
        let pulse = pulse(self.time, &self.config.motion);
        let mut items = Vec::with_capacity(self.pool.len());
        let mut decorations = Vec::new();
        for (slot, item) in self.pool.items().iter().enumerate() {
            let transform = self.item_transform(item);
            let surface = match (&item.texture, item.is_placeholder()) {
                (_, true) => ItemSurface::Hidden,
                (TextureState::Loaded(texture), false) => ItemSurface::Cover(texture),
                _ => ItemSurface::Flat(item.surface_color()),
            };
            items.push(ItemFrame {
                slot,
                model: transform * box_scale(item),
                surface,
            });
            let color = if item.is_placeholder() {
                GLYPH_COLOR
            } else {
                OUTLINE_COLOR
            };
            decorations.extend(decoration_models(item, pulse).into_iter().map(|local| DecorationFrame {
                slot,
                model: transform * local,
                color,
            }));
        }
        FrameSnapshot {
            view_projection: self.camera.view_projection(self.viewport),
            items,
            decorations,
            backdrop: self.backdrop(),
            pixels_per_unit: self.mapper.pixels_per_unit,
        }
    }

    /// The backdrop tracks the pan 1:1 in screen space, overscroll included.
    fn backdrop(&self) -> BackdropRect {
        let grid = self.pool.grid();
        let pan = self.controller.pan();
        let width = self
            .mapper
            .to_pixels(grid.grid_width() + grid.pad_left + grid.pad_right);
        let height = self.mapper.to_pixels(grid.grid_height() * 1.15);
        let center = self
            .mapper
            .screen_point(Vec2::new(pan.offset + pan.overscroll, 0.0));
        BackdropRect {
            x: center.x - width * 0.5,
            y: center.y - height * 0.5,
            width,
            height,
        }
    }

    pub fn layout_report(&self) -> LayoutReport {
        let grid = self.pool.grid();
        LayoutReport {
            layout: self.pool.layout().label(),
            rows: grid.rows,
            cols: grid.cols,
            viewport: self.viewport,
            camera: self.camera,
            pixels_per_unit: self.mapper.pixels_per_unit,
            pan: *self.controller.pan(),
            selected: self.controller.current(),
            items: self
                .pool
                .items()
                .iter()
                .enumerate()
                .map(|(slot, item)| ItemReport {
                    slot,
                    cover: item.role.cover().map(str::to_string),
                    cell: item.cell,
                    position: item.position,
                    size: [
                        item.dimensions.width,
                        item.dimensions.height,
                        item.dimensions.depth,
                    ],
                })
                .collect(),
        }
    }
}

fn box_scale<T>(item: &VisualItem<T>) -> Mat4 {
    let dims = item.dimensions;
    Mat4::from_scale(Vec3::new(dims.width, dims.height, dims.depth))
}

/// Unit-cube models of an item's decoration pieces in item space.
fn decoration_models<T>(item: &VisualItem<T>, pulse: f32) -> Vec<Mat4> {
    let front = item.dimensions.depth * 0.5;
    let mut pieces = Vec::new();
    match item.decoration {
        ItemDecoration::Outline(outline) if outline.visible => {
            let len = outline.bracket_length;
            let thick = outline.thickness;
            let z = front + thick;
            for (sx, sy) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
                let corner = Vec2::new(
                    sx * outline.half_width * pulse,
                    sy * outline.half_height * pulse,
                );
                pieces.push(piece(
                    Vec3::new(corner.x - sx * len * 0.5, corner.y, z),
                    Vec3::new(len, thick, thick),
                ));
                pieces.push(piece(
                    Vec3::new(corner.x, corner.y - sy * len * 0.5, z),
                    Vec3::new(thick, len, thick),
                ));
            }
        }
        ItemDecoration::Outline(_) => {}
        ItemDecoration::Glyph(glyph) => {
            let z = front;
            let arm = glyph.arm_length;
            let thick = glyph.thickness;
            pieces.push(piece(Vec3::new(0.0, 0.0, z), Vec3::new(arm, thick, thick)));
            pieces.push(piece(Vec3::new(0.0, 0.0, z), Vec3::new(thick, arm, thick)));
        }
    }
    pieces
}

fn piece(center: Vec3, size: Vec3) -> Mat4 {
    Mat4::from_translation(center) * Mat4::from_scale(size)
}
