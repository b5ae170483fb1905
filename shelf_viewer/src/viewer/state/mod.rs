//! Runtime state of the shelf window. Owns the wgpu device and surface, the
//! shelf model with its GPU covers, and the decode worker. Submodules split
//! the lifecycle: `init` for setup, `layout` for resizes, `update` for the
//! per-frame tick, `input` for keyboard/pointer routing and `render` for the
//! draw passes.

use std::{sync::Arc, time::Instant};

use anyhow::Result;
use shelf_core::{RowLayout, Shelf, ShelfConfig};
use wgpu::SurfaceError;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent},
    window::Window,
};

use crate::catalog_file::LoadedCatalog;
use crate::cover_loader::CoverLoader;
use crate::texture::{CoverBinding, GpuCover};

mod init;
mod input;
mod layout;
mod render;
mod update;

pub struct ViewerState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    background: wgpu::Color,
    mesh: MeshResources,
    backdrop: BackdropResources,
    covers: CoverBinding,
    white: GpuCover,
    shelf: Shelf<GpuCover>,
    catalog: LoadedCatalog,
    loader: CoverLoader,
    started: Instant,
    pointer: PointerTracker,
}

struct PrimitiveBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

struct MeshResources {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    cover_box: PrimitiveBuffers,
}

struct BackdropResources {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

#[derive(Debug, Default)]
struct PointerTracker {
    position: Option<PhysicalPosition<f64>>,
    pressed: bool,
}

impl ViewerState {
    pub async fn new(
        window: Arc<Window>,
        shelf_config: ShelfConfig,
        layout: RowLayout,
        catalog: LoadedCatalog,
    ) -> Result<Self> {
        init::new(window, shelf_config, layout, catalog).await
    }

    pub fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        layout::resize(self, new_size);
    }

    pub fn render(&mut self) -> Result<(), SurfaceError> {
        render::render(self)
    }

    /// Advance animation, feed the decode worker and report shelf events.
    pub fn update(&mut self) -> bool {
        update::update(self)
    }

    pub fn shutdown(&mut self) {
        self.shelf.unmount();
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        input::handle_key_event(self, event);
    }

    pub fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        input::cursor_moved(self, position);
    }

    pub fn handle_mouse_button(&mut self, button_state: ElementState) {
        input::mouse_button(self, button_state);
    }
}
