//! Screens composed from the board state and the fixed messages.

use crate::board::{Board, Player};
use crate::config::{FLOOR_Y, NET_HALF_WIDTH, NET_TOP, NET_X, SCREEN_WIDTH};
use crate::display::Framebuffer;
use crate::glyph::{draw_text, text_width, GLYPH_SIZE};

const FLOOR_ROW: u8 = FLOOR_Y as u8 + 1;

pub fn draw_court(frame: &mut Framebuffer, board: &Board) {
    frame.clear();

    for x in 0..SCREEN_WIDTH {
        frame.set_pixel(x, FLOOR_ROW);
    }

    let net_left = (NET_X - NET_HALF_WIDTH) as u8;
    let net_right = (NET_X + NET_HALF_WIDTH) as u8;
    for x in net_left..=net_right {
        for y in NET_TOP as u8..FLOOR_ROW {
            frame.set_pixel(x, y);
        }
    }

    let cx = libm::roundf(board.ball_pos.x) as i16;
    let cy = libm::roundf(board.ball_pos.y) as i16;
    for dx in -1..=1 {
        for dy in -1..=1 {
            frame.plot(cx + dx, cy + dy);
        }
    }
}

const PROMPT_Y: i16 = 8;
const PROMPT_MARGIN: i16 = 2;

/// The court with the serve prompt above it.
pub fn draw_start_screen(frame: &mut Framebuffer, board: &Board) {
    draw_court(frame, board);
    draw_prompt(frame);
}

/// "PRESS" on a blank strip, readable over any background.
pub fn draw_prompt(frame: &mut Framebuffer) {
    let top = PROMPT_Y - PROMPT_MARGIN;
    let bottom = PROMPT_Y + GLYPH_SIZE as i16 + PROMPT_MARGIN;
    for y in top..bottom {
        for x in 0..SCREEN_WIDTH {
            frame.clear_pixel(x, y as u8);
        }
    }
    draw_centered(frame, "PRESS", PROMPT_Y);
}

pub fn draw_win_banner(frame: &mut Framebuffer, winner: Player) {
    frame.clear();
    let text = match winner {
        Player::One => "P1 WINS",
        Player::Two => "P2 WINS",
    };
    draw_centered(frame, text, 28);
}

fn draw_centered(frame: &mut Framebuffer, text: &str, y: i16) {
    let x = (SCREEN_WIDTH as i16 - text_width(text)) / 2;
    draw_text(frame, text, x, y);
}
