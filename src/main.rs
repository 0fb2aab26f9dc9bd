mod window;

use winit::event_loop::{ControlFlow, EventLoop};

/// Interactive burst demo.
///
/// Left click spawns a burst at the cursor. Arrow keys orbit the camera,
/// `T` toggles turbulence glyphs, `P` switches the particle projection,
/// `F` cycles particle factories, `R` reseeds the turbulence field and
/// space pauses.
fn main() -> Result<(), window::DemoError> {
    env_logger::init();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = window::App::new();
    event_loop.run_app(&mut app)?;
    app.into_result()
}
