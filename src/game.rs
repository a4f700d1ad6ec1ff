//! The match context shared between the scheduler and the button interrupts.

use crate::board::{Board, Player};
use crate::config::MatchConfig;
use crate::peripherals::{Button, ButtonIrq};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GameState {
    PrepareStart,
    Start,
    LaunchBall,
    PlayerTurn,
    ScoreUpdate,
    WinScreen,
    WinDisplay,
}

/// What a button edge did to the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Press {
    Ignored,
    Served,
    Hit,
}

pub struct Match {
    pub board: Board,
    pub state: GameState,
    /// Who has to return the ball next.
    pub player: Option<Player>,
    pub config: MatchConfig,
}

impl Match {
    pub const fn new(config: MatchConfig) -> Self {
        Self {
            board: Board::new(),
            state: GameState::PrepareStart,
            player: None,
            config,
        }
    }

    pub fn enter(&mut self, next: GameState) {
        if self.state != next {
            debug!("{} -> {}", self.state, next);
        }
        self.state = next;
    }

    /// Interrupt-context entry point for a button edge. Never blocks.
    pub fn on_button<B>(&mut self, button: Button, buttons: &mut B) -> Press
    where
        B: ButtonIrq + ?Sized,
    {
        match button {
            Button::Serve => self.on_serve(buttons),
            Button::Paddle(player) => self.on_paddle(player, buttons),
        }
    }

    fn on_serve<B>(&mut self, buttons: &mut B) -> Press
    where
        B: ButtonIrq + ?Sized,
    {
        if self.state != GameState::Start {
            return Press::Ignored;
        }
        buttons.disarm(Button::Serve);
        self.enter(GameState::LaunchBall);
        Press::Served
    }

    fn on_paddle<B>(&mut self, player: Player, buttons: &mut B) -> Press
    where
        B: ButtonIrq + ?Sized,
    {
        if self.state != GameState::PlayerTurn || self.player != Some(player) {
            return Press::Ignored;
        }
        buttons.disarm(Button::Paddle(player));
        self.board.hit_ball();
        self.player = Some(player.opponent());
        Press::Hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Vector2D;
    use crate::testing::FakeButtons;

    fn rally(player: Player) -> Match {
        let mut game = Match::new(MatchConfig::default());
        game.state = GameState::PlayerTurn;
        game.player = Some(player);
        game.board.ball_vel = Vector2D::new(-0.06, 0.02);
        game
    }

    #[test]
    fn serve_only_counts_on_the_start_screen() {
        let mut game = Match::new(MatchConfig::default());
        let mut buttons = FakeButtons::new();
        buttons.arm(Button::Serve);

        assert_eq!(game.on_button(Button::Serve, &mut buttons), Press::Ignored);
        assert!(buttons.is_armed(Button::Serve));

        game.state = GameState::Start;
        assert_eq!(game.on_button(Button::Serve, &mut buttons), Press::Served);
        assert_eq!(game.state, GameState::LaunchBall);
        assert!(!buttons.is_armed(Button::Serve));
    }

    #[test]
    fn live_paddle_hits_and_hands_over() {
        let mut game = rally(Player::One);
        let mut buttons = FakeButtons::new();
        buttons.arm(Button::Paddle(Player::One));

        let press = game.on_button(Button::Paddle(Player::One), &mut buttons);

        assert_eq!(press, Press::Hit);
        assert_eq!(game.player, Some(Player::Two));
        assert!(game.board.ball_vel.x > 0.0);
        assert!(game.board.ball_vel.y < 0.0);
        assert!(!buttons.is_armed(Button::Paddle(Player::One)));
    }

    #[test]
    fn wrong_paddle_is_ignored() {
        let mut game = rally(Player::One);
        let mut buttons = FakeButtons::new();
        let before = game.board;

        let press = game.on_button(Button::Paddle(Player::Two), &mut buttons);

        assert_eq!(press, Press::Ignored);
        assert_eq!(game.player, Some(Player::One));
        assert_eq!(game.board, before);
        assert!(buttons.log.is_empty());
    }

    #[test]
    fn paddle_outside_a_rally_is_ignored() {
        let mut game = rally(Player::Two);
        game.state = GameState::ScoreUpdate;

        let press = game.on_button(Button::Paddle(Player::Two), &mut FakeButtons::new());

        assert_eq!(press, Press::Ignored);
        assert_eq!(game.player, Some(Player::Two));
    }
}
