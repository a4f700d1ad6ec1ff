use crate::animation::Animation;
use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH, START_FRAME};
use crate::display::Framebuffer;

use fugit::MillisDurationU32;

const CELL_SHIFT: u8 = 3; // 8 px cells

/// Idle screen: a checkerboard that swaps colours every frame.
pub struct Checkerboard {
    phase: u8,
}

impl Checkerboard {
    pub const fn new() -> Self {
        Self { phase: 0 }
    }
}

impl Animation for Checkerboard {
    fn render_frame(&mut self, frame: &mut Framebuffer) -> MillisDurationU32 {
        frame.clear();
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                if ((x >> CELL_SHIFT) + (y >> CELL_SHIFT) + self.phase) & 1 == 0 {
                    frame.set_pixel(x, y);
                }
            }
        }
        self.phase ^= 1;
        START_FRAME
    }
}
