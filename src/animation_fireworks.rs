use crate::animation::Animation;
use crate::config::{FIREWORKS_FRAME, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::display::Framebuffer;

use fugit::MillisDurationU32;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoroshiro128StarStar;

const MAX_RADIUS: u8 = 6;

#[derive(Clone, Copy)]
struct Burst {
    x: u8,
    y: u8,
    r: u8,
}

impl Burst {
    const fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            r: 0xFF,
        }
    }

    fn is_active(&self) -> bool {
        self.r <= MAX_RADIUS
    }

    fn init(&mut self, r: u32) {
        self.x = (r % SCREEN_WIDTH as u32) as u8;
        self.y = ((r >> 8) % SCREEN_HEIGHT as u32) as u8;
        self.r = 0;
    }

    fn step(&mut self) {
        self.r += 1;
    }

    fn draw(&self, frame: &mut Framebuffer) {
        let (cx, cy) = (self.x as i16, self.y as i16);
        if self.r == 0 {
            frame.plot(cx, cy);
            return;
        }

        // Midpoint circle, one octant mirrored eight ways
        let mut dx = self.r as i16;
        let mut dy = 0i16;
        let mut err = 1 - dx;
        while dx >= dy {
            for (px, py) in [(dx, dy), (dy, dx), (-dy, dx), (-dx, dy)] {
                frame.plot(cx + px, cy + py);
                frame.plot(cx - px, cy - py);
            }
            dy += 1;
            if err < 0 {
                err += 2 * dy + 1;
            } else {
                dx -= 1;
                err += 2 * (dy - dx) + 1;
            }
        }
    }
}

const MAX_BURSTS: usize = 6;

/// Win screen celebration: rings bursting at random spots. Draws over
/// whatever the frame already holds, so the caller clears it.
pub struct Fireworks {
    rng: Xoroshiro128StarStar,
    bursts: [Burst; MAX_BURSTS],
}

impl Fireworks {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoroshiro128StarStar::seed_from_u64(seed),
            bursts: [Burst::new(); MAX_BURSTS],
        }
    }

    /// Drops every running burst and restarts the sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }
}

impl Animation for Fireworks {
    fn render_frame(&mut self, frame: &mut Framebuffer) -> MillisDurationU32 {
        for burst in self.bursts.iter_mut() {
            if burst.is_active() {
                burst.step();
            }
        }

        // Spawn a new burst in 1/2 of cases
        if (self.rng.next_u32() & 0b1) == 0 {
            if let Some(burst) = self.bursts.iter_mut().find(|b| !b.is_active()) {
                burst.init(self.rng.next_u32());
            }
        }

        for burst in self.bursts.iter() {
            if burst.is_active() {
                burst.draw(frame);
            }
        }

        FIREWORKS_FRAME
    }
}
