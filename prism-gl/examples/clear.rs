//! Minimal swapchain round trip: record a clear-only render pass against the
//! implicit back buffer and resubmit it every frame.

use prism::command::{ClearValue, CommandBufferUsageFlags, Rect2D};
use prism::format::Format;
use prism::pass::{AttachmentDescription, LoadOp, RenderPassDescription, StoreOp};
use prism::Error;
use prism_gl::create_device_and_swapchain;
use winit::{Event, EventsLoop, WindowBuilder, WindowEvent};

const SURFACE_FORMAT: Format = Format::B8G8R8A8_UNORM;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let mut events_loop = EventsLoop::new();
    let window_builder = WindowBuilder::new().with_title("prism-gl clear");
    let cfg = config::Config::default();
    let (device, swapchain) =
        create_device_and_swapchain(&cfg, &events_loop, window_builder, SURFACE_FORMAT)?;

    let render_pass = device.create_render_pass(&RenderPassDescription::single_subpass(vec![
        AttachmentDescription::color(SURFACE_FORMAT, LoadOp::Clear, StoreOp::Store),
    ]));

    let framebuffer = {
        let guard = device.context().enable()?;
        let back_buffer = swapchain.back_buffer_view();
        device.create_framebuffer(&guard, &render_pass, &[&back_buffer], swapchain.extent())?
    };

    let (width, height) = swapchain.extent();
    let mut cmd = device.create_command_buffer();
    cmd.begin(CommandBufferUsageFlags::SIMULTANEOUS_USE);
    cmd.begin_render_pass(
        &framebuffer,
        Rect2D {
            x: 0,
            y: 0,
            width,
            height,
        },
        &[ClearValue::Color([0.1, 0.2, 0.4, 1.0])],
    );
    cmd.end_render_pass();
    cmd.end();

    let queue = device.queue(0, 0);
    let mut running = true;
    while running {
        events_loop.poll_events(|event| {
            if let Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } = event
            {
                running = false;
            }
        });

        let guard = device.context().enable()?;
        match swapchain.acquire_next_image() {
            Ok(_) => {
                queue.submit(&guard, &[&cmd], &[], &[], None)?;
                match swapchain.present(&guard, &queue) {
                    Ok(()) | Err(Error::OutOfDate) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            Err(Error::OutOfDate) => swapchain.recreate()?,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
