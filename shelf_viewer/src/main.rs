mod catalog_file;
mod cli;
mod cover_loader;
mod report;
mod texture;
mod viewer;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pollster::FutureExt;
use shelf_core::{Shelf, Viewport};
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use crate::catalog_file::load_catalog;
use crate::cli::Args;
use crate::report::{print_layout_summary, write_layout_dump};
use crate::viewer::ViewerState;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    let catalog = load_catalog(&args.catalog).context("loading catalog manifest")?;
    println!(
        "Loaded {} game{} from {}",
        catalog.len(),
        if catalog.len() == 1 { "" } else { "s" },
        catalog.source.display()
    );
    if catalog.is_empty() {
        println!("  catalog is empty; the shelf shows only the add-new slot");
    }

    let shelf_config = args.shelf_config()?;
    let layout = args.initial_layout();

    // Resolve the layout without a GPU so headless runs and dumps agree with
    // what the window would show at the requested size.
    let mut preview: Shelf<()> = Shelf::new(
        shelf_config,
        layout,
        Viewport::new(args.width, args.height),
    )
    .context("building shelf preview")?;
    preview
        .set_catalog(&catalog.sequence())
        .context("syncing shelf preview")?;
    let report = preview.layout_report();
    print_layout_summary(&report);

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &report)?;
        println!("Layout dump written to {}", path.display());
    }

    if args.headless {
        println!("Headless mode requested; viewer window bootstrap skipped.");
        return Ok(());
    }

    println!("\nUse arrows to browse, Enter to launch, Tab to switch layout, F5 to reload.");

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Shelf Viewer")
            .with_inner_size(PhysicalSize::new(args.width, args.height))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let mut state = ViewerState::new(window, shelf_config, layout, catalog).block_on()?;

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested
                        | WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key: Key::Named(NamedKey::Escape),
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => {
                            state.shutdown();
                            target.exit();
                        }
                        WindowEvent::KeyboardInput { event, .. } => state.handle_key_event(&event),
                        WindowEvent::CursorMoved { position, .. } => {
                            state.handle_cursor_moved(position)
                        }
                        WindowEvent::MouseInput {
                            state: button_state,
                            button: MouseButton::Left,
                            ..
                        } => state.handle_mouse_button(button_state),
                        WindowEvent::Resized(new_size) => state.resize(new_size),
                        WindowEvent::RedrawRequested => match state.render() {
                            Ok(_) => {}
                            Err(SurfaceError::Lost) => state.resize(state.size()),
                            Err(SurfaceError::OutOfMemory) => target.exit(),
                            Err(err) => eprintln!("[shelf_viewer] render error: {err:?}"),
                        },
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    if state.update() {
                        state.window().request_redraw();
                    }
                }
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}
