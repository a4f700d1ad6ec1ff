use fugit::MillisDurationU32;

pub const SCREEN_WIDTH: u8 = 128;
pub const SCREEN_HEIGHT: u8 = 64;

// Court geometry, in pixels. The y axis grows downward.
pub const BALL_RADIUS: f32 = 1.0;
pub const FLOOR_Y: f32 = 61.0;
pub const NET_X: f32 = 64.0;
pub const NET_HALF_WIDTH: f32 = 1.0;
/// Top of the net band; the ball is deflected by the net below this row.
pub const NET_TOP: f32 = 45.0;
/// Half width of the window around the net that counts as the middle region.
pub const CENTER_WINDOW: f32 = 6.0;

pub const SERVE_X: f32 = NET_X;
pub const SERVE_Y: f32 = 20.0;

// Kinematics, in pixels and milliseconds.
pub const SERVE_SPEED: f32 = 0.06;
pub const GRAVITY: f32 = 0.000_125;
pub const RESTITUTION: f32 = 0.8;
pub const HIT_BOOST: f32 = 1.1;

pub const START_FRAME: MillisDurationU32 = MillisDurationU32::millis(250);
pub const FIREWORKS_FRAME: MillisDurationU32 = MillisDurationU32::millis(100);
/// How long the winner is celebrated before a new match starts.
pub const WIN_DWELL: MillisDurationU32 = MillisDurationU32::secs(5);

/// Attempts per display transfer before the frame is given up.
pub const BUS_ATTEMPTS: u8 = 2;

pub const HIT_TONE_HZ: u32 = 294;
/// Overflow cycles the hit tone lasts for.
pub const HIT_TONE_CYCLES: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    pub sets_to_win: u8,
    pub games_to_set: u8,
}

impl MatchConfig {
    pub const fn new(sets_to_win: u8, games_to_set: u8) -> Self {
        Self {
            sets_to_win,
            games_to_set,
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new(2, 6)
    }
}
