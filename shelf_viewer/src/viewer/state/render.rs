use bytemuck::cast_slice;
use shelf_core::ItemSurface;
use wgpu::SurfaceError;

use super::super::mesh::{MeshInstance, view_projection_uniform};
use super::super::shaders::{QUAD_INDICES, quad_for_rect};
use super::init::create_instance_buffer;
use super::{MeshResources, ViewerState};
use crate::texture::GpuCover;

pub(super) fn render(state: &mut ViewerState) -> Result<(), SurfaceError> {
    let frame = state.surface.get_current_texture()?;
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let snapshot = state.shelf.snapshot();

    // Flat boxes and decorations share the white texture and go out as one
    // batch; each loaded cover needs its own bind group.
    let mut instances = Vec::with_capacity(snapshot.items.len() + snapshot.decorations.len());
    let mut covered: Vec<&GpuCover> = Vec::new();
    for item in &snapshot.items {
        if let ItemSurface::Flat(color) = item.surface {
            instances.push(MeshInstance::new(item.model, color));
        }
    }
    for decoration in &snapshot.decorations {
        instances.push(MeshInstance::new(decoration.model, decoration.color));
    }
    let flat_count = instances.len() as u32;
    for item in &snapshot.items {
        if let ItemSurface::Cover(cover) = item.surface {
            instances.push(MeshInstance::new(item.model, [1.0; 4]));
            covered.push(cover);
        }
    }

    ensure_instance_capacity(&mut state.mesh, &state.device, instances.len());
    if !instances.is_empty() {
        state
            .queue
            .write_buffer(&state.mesh.instance_buffer, 0, cast_slice(&instances));
    }
    state.queue.write_buffer(
        &state.mesh.uniform_buffer,
        0,
        cast_slice(&[view_projection_uniform(snapshot.view_projection)]),
    );

    let rect = snapshot.backdrop;
    let quad = quad_for_rect(
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        (state.size.width as f32, state.size.height as f32),
    );
    state
        .queue
        .write_buffer(&state.backdrop.vertex_buffer, 0, cast_slice(&quad));

    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("shelf-render-encoder"),
        });

    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shelf-backdrop-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(state.background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&state.backdrop.pipeline);
        pass.set_vertex_buffer(0, state.backdrop.vertex_buffer.slice(..));
        pass.set_index_buffer(
            state.backdrop.index_buffer.slice(..),
            wgpu::IndexFormat::Uint16,
        );
        pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }

    {
        let mesh = &state.mesh;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shelf-mesh-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &mesh.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&mesh.pipeline);
        pass.set_bind_group(0, &mesh.uniform_bind_group, &[]);
        pass.set_vertex_buffer(0, mesh.cover_box.vertex.slice(..));
        pass.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
        pass.set_index_buffer(mesh.cover_box.index.slice(..), wgpu::IndexFormat::Uint16);

        if flat_count > 0 {
            pass.set_bind_group(1, state.white.bind_group(), &[]);
            pass.draw_indexed(0..mesh.cover_box.index_count, 0, 0..flat_count);
        }
        for (offset, cover) in covered.iter().enumerate() {
            let instance = flat_count + offset as u32;
            pass.set_bind_group(1, cover.bind_group(), &[]);
            pass.draw_indexed(0..mesh.cover_box.index_count, 0, instance..instance + 1);
        }
    }

    state.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}

fn ensure_instance_capacity(mesh: &mut MeshResources, device: &wgpu::Device, required: usize) {
    if required <= mesh.instance_capacity {
        return;
    }
    let capacity = required.next_power_of_two();
    mesh.instance_buffer = create_instance_buffer(device, capacity);
    mesh.instance_capacity = capacity;
}
