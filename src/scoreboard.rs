use crate::board::{Board, Player, Score};
use crate::error::Result;
use crate::lcd::{COLUMNS, LINE_ONE, LINE_TWO};
use crate::peripherals::CharDisplay;

/// One LCD row, e.g. `P1 PTS 40 G2 S1 `.
pub fn score_line(player: Player, score: &Score) -> [u8; COLUMNS] {
    let mut line = *b"P? PTS ?? G? S? ";
    line[1] = match player {
        Player::One => b'1',
        Player::Two => b'2',
    };
    line[7] = if score.points >= 10 {
        digit(score.points / 10)
    } else {
        b' '
    };
    line[8] = digit(score.points % 10);
    line[11] = digit(score.games);
    line[14] = digit(score.sets);
    line
}

fn digit(value: u8) -> u8 {
    b'0' + value.min(9)
}

pub fn write_scoreboard<L>(lcd: &mut L, board: &Board) -> Result<()>
where
    L: CharDisplay + ?Sized,
{
    for (player, address) in [(Player::One, LINE_ONE), (Player::Two, LINE_TWO)] {
        lcd.write_string(address, &score_line(player, &board.score[player.index()]))?;
    }
    Ok(())
}
