//! The handful of 8x8 characters the game ever prints.
//!
//! Each glyph is a predicate over its local column `i` and row `j`, both in
//! `0..8`, rather than a bitmap table.

use crate::display::Framebuffer;

pub const GLYPH_SIZE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    E,
    /// Also used for the digit 1.
    I,
    N,
    P,
    R,
    S,
    W,
    Two,
}

impl Glyph {
    pub fn from_char(c: char) -> Option<Glyph> {
        match c.to_ascii_uppercase() {
            'E' => Some(Glyph::E),
            'I' | '1' => Some(Glyph::I),
            'N' => Some(Glyph::N),
            'P' => Some(Glyph::P),
            'R' => Some(Glyph::R),
            'S' => Some(Glyph::S),
            'W' => Some(Glyph::W),
            '2' => Some(Glyph::Two),
            _ => None,
        }
    }

    pub fn covers(self, i: u8, j: u8) -> bool {
        if i >= GLYPH_SIZE || j >= GLYPH_SIZE {
            return false;
        }
        match self {
            Glyph::E => e(i, j),
            Glyph::I => i == 3 || i == 4,
            Glyph::N => i == 0 || i == 7 || i == j,
            Glyph::P => p(i, j),
            Glyph::R => r(i, j),
            Glyph::S => s(i, j),
            Glyph::W => w(i, j),
            Glyph::Two => two(i, j),
        }
    }
}

fn stem(i: u8) -> bool {
    i <= 1
}

fn e(i: u8, j: u8) -> bool {
    stem(i) || (i < 4 && (j == 0 || j == 4 || j == 7))
}

fn p(i: u8, j: u8) -> bool {
    stem(i) || (i < 6 && j == 0) || (i == 5 && j < 4) || (i < 4 && j == 4)
}

fn r(i: u8, j: u8) -> bool {
    stem(i) || (i < 4 && (j == 0 || j == 4)) || (i == 3 && j < 4) || (i > 1 && i == j)
}

fn s(i: u8, j: u8) -> bool {
    let bar = i > 0 && i < 6 && (j == 0 || j == 3 || j == 7);
    bar || (stem(i) && j < 4) || ((i == 4 || i == 5) && j >= 4)
}

fn w(i: u8, j: u8) -> bool {
    i == 0
        || i == 7
        || (j == 7 && (i == 1 || i == 6))
        || ((j == 5 || j == 6) && (i == 2 || i == 5))
        || ((j == 3 || j == 4) && (i == 3 || i == 4))
}

fn two(i: u8, j: u8) -> bool {
    j == 0 || j == 7 || (i == 0 && j > 4) || (i == 7 && j < 3) || (j == 3 && i > 0 && i < 7)
}

pub fn draw_glyph(frame: &mut Framebuffer, glyph: Glyph, x: i16, y: i16) {
    for i in 0..GLYPH_SIZE {
        for j in 0..GLYPH_SIZE {
            if glyph.covers(i, j) {
                frame.plot(x + i as i16, y + j as i16);
            }
        }
    }
}

/// Draws `text` left to right from `(x, y)`, one 8-pixel cell per character.
/// Characters without a glyph leave their cell blank.
pub fn draw_text(frame: &mut Framebuffer, text: &str, x: i16, y: i16) {
    let mut cursor = x;
    for c in text.chars() {
        if let Some(glyph) = Glyph::from_char(c) {
            draw_glyph(frame, glyph, cursor, y);
        }
        cursor += GLYPH_SIZE as i16;
    }
}

/// Width in pixels of `text` once drawn.
pub fn text_width(text: &str) -> i16 {
    text.chars().count() as i16 * GLYPH_SIZE as i16
}
