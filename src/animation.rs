use crate::display::Framebuffer;

use fugit::MillisDurationU32;

pub trait Animation {
    /// Renders the next frame of the animation into the framebuffer and returns the duration this frame should be displayed for.
    ///
    /// Full-screen animations clear the framebuffer themselves; overlays such as the fireworks draw on top of what the caller left there.
    fn render_frame(&mut self, frame: &mut Framebuffer) -> MillisDurationU32;
}
