//! Match state and the ball physics that advances it.

use crate::config::{
    BALL_RADIUS, CENTER_WINDOW, FLOOR_Y, GRAVITY, HIT_BOOST, NET_HALF_WIDTH, NET_TOP, NET_X,
    RESTITUTION, SCREEN_WIDTH, SERVE_SPEED, SERVE_X, SERVE_Y,
};
use crate::error::{Error, Result};
use crate::peripherals::{Button, ButtonIrq};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Player {
    /// Plays the left half of the court.
    One,
    /// Plays the right half of the court.
    Two,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    pub const fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub const fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub const fn side(self) -> Region {
        match self {
            Player::One => Region::Left,
            Player::Two => Region::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    Left,
    Middle,
    Right,
}

impl Region {
    /// The player defending this region, if any.
    pub const fn owner(self) -> Option<Player> {
        match self {
            Region::Left => Some(Player::One),
            Region::Middle => None,
            Region::Right => Some(Player::Two),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub const ZERO: Vector2D = Vector2D::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    /// Tennis point ladder: 0, 15, 30 or 40.
    pub points: u8,
    pub games: u8,
    pub sets: u8,
}

/// What a call to [`Board::update_score`] completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScoreEvent {
    Point,
    Game,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Board {
    pub ball_pos: Vector2D,
    pub ball_vel: Vector2D,
    pub score: [Score; 2],
    /// Floor contacts on each half since the ball last passed the middle.
    pub bounces_left: u8,
    pub bounces_right: u8,
    pub region: Region,
}

impl Board {
    pub const fn new() -> Self {
        Self {
            ball_pos: Vector2D::ZERO,
            ball_vel: Vector2D::ZERO,
            score: [Score {
                points: 0,
                games: 0,
                sets: 0,
            }; 2],
            bounces_left: 0,
            bounces_right: 0,
            region: Region::Middle,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Puts the ball back at the serve spot. The serve direction comes from
    /// the parity of `now_ms`: even serves right, odd serves left.
    pub fn reset_ball(&mut self, now_ms: u32) {
        let direction = if now_ms & 1 == 0 { 1.0 } else { -1.0 };
        self.ball_pos = Vector2D::new(SERVE_X, SERVE_Y);
        self.ball_vel = Vector2D::new(direction * SERVE_SPEED, 0.0);
        self.bounces_left = 0;
        self.bounces_right = 0;
        self.region = Region::Middle;
    }

    /// The player whose half the ball is travelling toward.
    pub fn heading(&self) -> Player {
        if self.ball_vel.x < 0.0 {
            Player::One
        } else {
            Player::Two
        }
    }

    /// Advances the ball by `dt_ms` and re-arms the paddle of whichever side
    /// the ball is now on.
    pub fn update<B>(&mut self, dt_ms: u32, buttons: &mut B)
    where
        B: ButtonIrq + ?Sized,
    {
        let dt = dt_ms as f32;
        let prev = self.ball_pos;

        self.ball_pos.x += self.ball_vel.x * dt;
        self.ball_pos.y += self.ball_vel.y * dt + GRAVITY * dt * dt / 2.0;
        self.ball_vel.y += GRAVITY * dt;

        self.bounce_on_floor();
        self.bounce_on_net(prev);

        if self.ball_pos.y + BALL_RADIUS < NET_TOP {
            self.track_region(buttons);
        }
    }

    fn bounce_on_floor(&mut self) {
        let rest = FLOOR_Y - BALL_RADIUS;
        if self.ball_pos.y < rest || self.ball_vel.y <= 0.0 {
            return;
        }
        self.ball_pos.y = rest;
        self.ball_vel.y = -self.ball_vel.y * RESTITUTION;
        if self.ball_pos.x < NET_X {
            self.bounces_left = self.bounces_left.saturating_add(1);
        } else {
            self.bounces_right = self.bounces_right.saturating_add(1);
        }
    }

    fn bounce_on_net(&mut self, prev: Vector2D) {
        let in_band = self.ball_pos.y + BALL_RADIUS >= NET_TOP || prev.y + BALL_RADIUS >= NET_TOP;
        if !in_band {
            return;
        }

        let reach = NET_HALF_WIDTH + BALL_RADIUS;
        let was_left = prev.x < NET_X;
        let crossed = was_left != (self.ball_pos.x < NET_X);
        let overlaps = libm::fabsf(self.ball_pos.x - NET_X) < reach;
        if !crossed && !overlaps {
            return;
        }

        // Push the ball back out on the side it came from.
        self.ball_pos.x = if was_left { NET_X - reach } else { NET_X + reach };
        let approaching = if was_left {
            self.ball_vel.x > 0.0
        } else {
            self.ball_vel.x < 0.0
        };
        if approaching {
            self.ball_vel.x = -self.ball_vel.x * RESTITUTION;
        }
    }

    fn track_region<B>(&mut self, buttons: &mut B)
    where
        B: ButtonIrq + ?Sized,
    {
        let offset = self.ball_pos.x - NET_X;
        let zone = if libm::fabsf(offset) < CENTER_WINDOW {
            Region::Middle
        } else if offset < 0.0 {
            Region::Left
        } else {
            Region::Right
        };
        if zone == self.region {
            return;
        }

        if self.region != Region::Middle {
            // Leaving a side, possibly straight across to the other one.
            self.bounces_left = 0;
            self.bounces_right = 0;
            for player in Player::BOTH {
                buttons.disarm(Button::Paddle(player));
            }
        }
        if let Some(player) = zone.owner() {
            buttons.arm(Button::Paddle(player));
        }
        debug!("ball entered {}", zone);
        self.region = zone;
    }

    /// Returns the winner of the rally, or `None` while it is still live.
    ///
    /// A side loses once its half collects a second bounce. A ball leaving
    /// the court through a side, after one bounce or none, goes against the
    /// player defending that side.
    pub fn check_winner_point(&self) -> Option<Player> {
        if self.bounces_left > 1 {
            return Some(Player::Two);
        }
        if self.bounces_right > 1 {
            return Some(Player::One);
        }

        let out_on = if self.ball_pos.x < 0.0 {
            Region::Left
        } else if self.ball_pos.x >= SCREEN_WIDTH as f32 {
            Region::Right
        } else {
            return None;
        };
        out_on.owner().map(Player::opponent)
    }

    pub fn check_winner_match(&self, sets_to_win: u8) -> Option<Player> {
        Player::BOTH
            .into_iter()
            .find(|player| self.score[player.index()].sets >= sets_to_win)
    }

    /// Returns the ball toward the other half, faster than it came.
    pub fn hit_ball(&mut self) {
        self.ball_vel.x = -self.ball_vel.x * HIT_BOOST;
        self.ball_vel.y = if self.ball_vel.y > 0.0 {
            -self.ball_vel.y
        } else {
            self.ball_vel.y * HIT_BOOST
        };
    }

    /// Credits a point to `winner`, rolling over into games and sets.
    ///
    /// There is no deuce: the fourth point from 40 always takes the game, and
    /// the first player to `games_to_set` games takes the set.
    pub fn update_score(&mut self, winner: Option<Player>, games_to_set: u8) -> Result<ScoreEvent> {
        let winner = winner.ok_or(Error::NoWinner)?;
        let idx = winner.index();

        if let Some(points) = next_point(self.score[idx].points) {
            self.score[idx].points = points;
            return Ok(ScoreEvent::Point);
        }

        for score in self.score.iter_mut() {
            score.points = 0;
        }
        self.score[idx].games += 1;
        if self.score[idx].games < games_to_set {
            return Ok(ScoreEvent::Game);
        }

        for score in self.score.iter_mut() {
            score.games = 0;
        }
        self.score[idx].sets += 1;
        Ok(ScoreEvent::Set)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

fn next_point(points: u8) -> Option<u8> {
    match points {
        0 => Some(15),
        15 => Some(30),
        30 => Some(40),
        _ => None,
    }
}
