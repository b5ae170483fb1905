use winit::dpi::PhysicalSize;

use super::ViewerState;
use super::init::create_mesh_depth_texture;

pub(super) fn resize(state: &mut ViewerState, new_size: PhysicalSize<u32>) {
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    state.size = new_size;
    state.config.width = new_size.width;
    state.config.height = new_size.height;
    state.surface.configure(&state.device, &state.config);

    let (depth_texture, depth_view) = create_mesh_depth_texture(&state.device, new_size);
    state.mesh._depth_texture = depth_texture;
    state.mesh.depth_view = depth_view;

    state.shelf.resize(new_size.width, new_size.height);
}
