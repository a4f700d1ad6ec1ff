//! The cooperative main loop. Each [`Scheduler::step`] runs one pass of the
//! match state machine; button interrupts may move the state in between.
//!
//! The shared state is only locked for transitions and physics steps.
//! Drawing and bus transfers work on a copy of the board, so a paddle press
//! is never held off for a whole frame transfer.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::animation::Animation;
use crate::animation_checkerboard::Checkerboard;
use crate::animation_fireworks::Fireworks;
use crate::board::Player;
use crate::config::WIN_DWELL;
use crate::display::Ssd1306;
use crate::error::{Error, Result};
use crate::game::GameState;
use crate::global_state::{IrqCell, SharedState};
use crate::peripherals::{Button, ButtonIrq, CharDisplay, ElapsedTime};
use crate::render::{draw_court, draw_prompt, draw_start_screen, draw_win_banner};
use crate::scoreboard::write_scoreboard;

pub struct Scheduler<'a, B, I, L, C, D> {
    shared: &'a IrqCell<SharedState<B>>,
    oled: Ssd1306<I>,
    lcd: L,
    clock: C,
    delay: D,
    /// Elapsed-time reading at the previous physics step.
    last_tick: u32,
    point_winner: Option<Player>,
    champion: Option<Player>,
    checkerboard: Checkerboard,
    fireworks: Fireworks,
    dropped_frames: u32,
}

impl<'a, B, I, L, C, D> Scheduler<'a, B, I, L, C, D>
where
    B: ButtonIrq,
    I: I2c,
    L: CharDisplay,
    C: ElapsedTime,
    D: DelayNs,
{
    pub fn new(
        shared: &'a IrqCell<SharedState<B>>,
        oled: Ssd1306<I>,
        lcd: L,
        clock: C,
        delay: D,
    ) -> Self {
        Self {
            shared,
            oled,
            lcd,
            clock,
            delay,
            last_tick: 0,
            point_winner: None,
            champion: None,
            checkerboard: Checkerboard::new(),
            fireworks: Fireworks::new(0),
            dropped_frames: 0,
        }
    }

    pub fn run(mut self) -> ! {
        loop {
            if let Err(err) = self.step() {
                error!("step failed: {}", err);
            }
        }
    }

    pub fn dropped_frames(&self) -> u32 {
        self.dropped_frames
    }

    pub fn step(&mut self) -> Result<()> {
        match self.locked(|s| s.game.state)? {
            GameState::PrepareStart => self.prepare_start(),
            GameState::Start => self.start(),
            GameState::LaunchBall => self.launch_ball(),
            GameState::PlayerTurn => self.player_turn(),
            GameState::ScoreUpdate => self.score_update(),
            GameState::WinScreen => self.win_screen(),
            GameState::WinDisplay => self.win_display(),
        }
    }

    fn locked<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut SharedState<B>) -> R,
    {
        self.shared.with(f).ok_or(Error::Uninitialized)
    }

    fn prepare_start(&mut self) -> Result<()> {
        let board = self.locked(|s| {
            s.game.board.reset();
            s.game.player = None;
            disarm_paddles(&mut s.buttons);
            s.buttons.arm(Button::Serve);
            s.game.enter(GameState::Start);
            s.game.board
        })?;
        self.point_winner = None;
        self.champion = None;
        info!("new match, waiting for serve");

        draw_start_screen(self.oled.frame_mut(), &board);
        self.show_frame();
        write_scoreboard(&mut self.lcd, &board)
    }

    fn start(&mut self) -> Result<()> {
        let hold = self.checkerboard.render_frame(self.oled.frame_mut());
        draw_prompt(self.oled.frame_mut());
        self.show_frame();
        self.delay.delay_ms(hold.to_millis());
        Ok(())
    }

    fn launch_ball(&mut self) -> Result<()> {
        let now = self.clock.get_time();
        let receiver = self.locked(|s| {
            s.game.board.reset_ball(now);
            let receiver = s.game.board.heading();
            s.buttons.arm(Button::Paddle(receiver));
            s.game.player = Some(receiver);
            s.game.enter(GameState::PlayerTurn);
            receiver
        })?;
        self.clock.reset_time();
        self.last_tick = 0;
        info!("serve toward {}", receiver);
        Ok(())
    }

    fn player_turn(&mut self) -> Result<()> {
        let now = self.clock.get_time();
        let dt = match now.checked_sub(self.last_tick) {
            Some(dt) => {
                self.last_tick = now;
                Some(dt)
            }
            None => {
                warn!("elapsed time wrapped at {} ms, skipping a step", self.last_tick);
                self.clock.reset_time();
                self.last_tick = 0;
                None
            }
        };

        let board = self.locked(|s| {
            if let Some(dt) = dt {
                s.game.board.update(dt, &mut s.buttons);
            }
            s.game.board
        })?;

        draw_court(self.oled.frame_mut(), &board);
        self.show_frame();

        self.point_winner = self.locked(|s| {
            s.game.enter(GameState::ScoreUpdate);
            s.game.board.check_winner_point()
        })?;
        Ok(())
    }

    fn score_update(&mut self) -> Result<()> {
        let Some(winner) = self.point_winner.take() else {
            return self.locked(|s| s.game.enter(GameState::PlayerTurn));
        };

        let (board, event, champion) = self.locked(|s| {
            disarm_paddles(&mut s.buttons);
            s.game.player = None;
            let event = s.game.board.update_score(Some(winner), s.game.config.games_to_set);
            let champion = s.game.board.check_winner_match(s.game.config.sets_to_win);
            s.game.enter(if champion.is_some() {
                GameState::WinScreen
            } else {
                GameState::LaunchBall
            });
            (s.game.board, event, champion)
        })?;
        let event = event?;
        info!("point to {}: {}", winner, event);
        self.champion = champion;

        write_scoreboard(&mut self.lcd, &board)
    }

    fn win_screen(&mut self) -> Result<()> {
        let champion = self.champion;
        self.locked(|s| {
            s.game.enter(if champion.is_some() {
                GameState::WinDisplay
            } else {
                GameState::PrepareStart
            })
        })?;
        let Some(champion) = champion else {
            return Ok(());
        };
        info!("{} wins the match", champion);

        self.fireworks.reseed(u64::from(self.clock.get_time()));
        self.clock.reset_time();
        draw_win_banner(self.oled.frame_mut(), champion);
        self.show_frame();
        Ok(())
    }

    fn win_display(&mut self) -> Result<()> {
        let elapsed = self.clock.get_time();
        let Some(champion) = self.champion.filter(|_| elapsed < WIN_DWELL.to_millis()) else {
            return self.locked(|s| s.game.enter(GameState::PrepareStart));
        };

        draw_win_banner(self.oled.frame_mut(), champion);
        let hold = self.fireworks.render_frame(self.oled.frame_mut());
        self.show_frame();
        self.delay.delay_ms(hold.to_millis());
        Ok(())
    }

    /// Sends the framebuffer, dropping the frame if the bus stays stuck.
    fn show_frame(&mut self) {
        if let Err(err) = self.oled.flush() {
            self.dropped_frames = self.dropped_frames.wrapping_add(1);
            warn!("dropped frame {}: {}", self.dropped_frames, err);
        }
    }
}

fn disarm_paddles<B: ButtonIrq + ?Sized>(buttons: &mut B) {
    for player in Player::BOTH {
        buttons.disarm(Button::Paddle(player));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Region, Score};
    use crate::config::MatchConfig;
    use crate::display::BYTE_COUNT;
    use crate::game::{Match, Press};
    use crate::testing::{FakeBus, FakeButtons, FakeClock, FakeLcd, NoDelay};

    type Shared = IrqCell<SharedState<FakeButtons>>;
    type TestScheduler<'a> = Scheduler<'a, FakeButtons, FakeBus, FakeLcd, FakeClock, NoDelay>;

    struct Rig {
        bus: FakeBus,
        lcd: FakeLcd,
        clock: FakeClock,
        delay: NoDelay,
    }

    fn shared(config: MatchConfig) -> Shared {
        let shared = IrqCell::new();
        shared.install(SharedState::new(Match::new(config), FakeButtons::new()));
        shared
    }

    fn scheduler(shared: &Shared) -> (TestScheduler<'_>, Rig) {
        let rig = Rig {
            bus: FakeBus::new(),
            lcd: FakeLcd::default(),
            clock: FakeClock::new(),
            delay: NoDelay::default(),
        };
        let scheduler = Scheduler::new(
            shared,
            Ssd1306::new(rig.bus.clone()),
            rig.lcd.clone(),
            rig.clock.clone(),
            rig.delay.clone(),
        );
        (scheduler, rig)
    }

    fn state(shared: &Shared) -> GameState {
        shared.with(|s| s.game.state).unwrap()
    }

    fn press(shared: &Shared, button: Button) -> Press {
        shared
            .with(|s| s.game.on_button(button, &mut s.buttons))
            .unwrap()
    }

    fn board_snapshot(shared: &Shared) -> Option<Board> {
        shared.with(|s| s.game.board)
    }

    fn armed(shared: &Shared, button: Button) -> bool {
        shared.with(|s| s.buttons.is_armed(button)).unwrap()
    }

    /// Runs the loop up to the first physics step of a rally.
    fn serve(scheduler: &mut TestScheduler<'_>, shared: &Shared, rig: &Rig, at_ms: u32) {
        scheduler.step().unwrap(); // PrepareStart
        scheduler.step().unwrap(); // Start
        assert_eq!(press(shared, Button::Serve), Press::Served);
        rig.clock.now.set(at_ms);
        scheduler.step().unwrap(); // LaunchBall
        assert_eq!(state(shared), GameState::PlayerTurn);
    }

    /// Steps until the rally is decided, advancing the clock each physics step.
    fn play_out(scheduler: &mut TestScheduler<'_>, shared: &Shared, rig: &Rig) {
        for _ in 0..200 {
            match state(shared) {
                GameState::PlayerTurn => rig.clock.advance(50),
                GameState::ScoreUpdate => {}
                _ => return,
            }
            scheduler.step().unwrap();
        }
        panic!("rally never ended");
    }

    #[test]
    fn uninstalled_state_is_an_error() {
        let shared: Shared = IrqCell::new();
        let (mut scheduler, _rig) = scheduler(&shared);
        assert_eq!(scheduler.step(), Err(Error::Uninitialized));
    }

    #[test]
    fn prepare_start_arms_only_the_serve_button() {
        let shared = shared(MatchConfig::default());
        shared.with(|s| {
            s.game.board.score[0] = Score { points: 30, games: 1, sets: 1 };
            s.buttons.arm(Button::Paddle(Player::One));
        });
        let (mut scheduler, rig) = scheduler(&shared);

        scheduler.step().unwrap();

        assert_eq!(state(&shared), GameState::Start);
        assert!(armed(&shared, Button::Serve));
        assert!(!armed(&shared, Button::Paddle(Player::One)));
        assert!(!armed(&shared, Button::Paddle(Player::Two)));
        assert_eq!(shared.with(|s| s.game.board.score[0]), Some(Score::default()));

        let writes = rig.lcd.writes.borrow();
        assert_eq!(writes[0].1, b"P1 PTS  0 G0 S0 ");
        let transfers = rig.bus.take();
        assert_eq!(transfers.len(), 3);
        assert_eq!(transfers[2].1.len(), BYTE_COUNT + 1);
    }

    #[test]
    fn start_animates_until_served() {
        let shared = shared(MatchConfig::default());
        let (mut scheduler, rig) = scheduler(&shared);
        scheduler.step().unwrap();

        scheduler.step().unwrap();
        scheduler.step().unwrap();
        assert_eq!(state(&shared), GameState::Start);
        assert_eq!(rig.delay.waited_ns.get(), 2 * 250_000_000);

        // A paddle cannot serve
        assert_eq!(press(&shared, Button::Paddle(Player::One)), Press::Ignored);
        assert_eq!(press(&shared, Button::Serve), Press::Served);
        assert_eq!(state(&shared), GameState::LaunchBall);
    }

    #[test]
    fn launch_arms_the_receiver_from_time_parity() {
        let shared = shared(MatchConfig::default());
        let (mut scheduler, rig) = scheduler(&shared);

        serve(&mut scheduler, &shared, &rig, 1001);

        assert_eq!(shared.with(|s| s.game.player), Some(Some(Player::One)));
        assert!(armed(&shared, Button::Paddle(Player::One)));
        assert!(!armed(&shared, Button::Paddle(Player::Two)));
        assert!(!armed(&shared, Button::Serve));
        // The time reference restarts at the serve
        assert_eq!(rig.clock.get_time(), 0);
    }

    #[test]
    fn unreturned_serve_scores_for_the_server() {
        let shared = shared(MatchConfig::default());
        let (mut scheduler, rig) = scheduler(&shared);
        serve(&mut scheduler, &shared, &rig, 1000);
        assert_eq!(shared.with(|s| s.game.player), Some(Some(Player::Two)));

        play_out(&mut scheduler, &shared, &rig);

        assert_eq!(state(&shared), GameState::LaunchBall);
        let score = shared.with(|s| s.game.board.score).unwrap();
        assert_eq!(score[0].points, 15);
        assert_eq!(score[1].points, 0);
        assert!(!armed(&shared, Button::Paddle(Player::One)));
        assert!(!armed(&shared, Button::Paddle(Player::Two)));
        assert_eq!(shared.with(|s| s.game.player), Some(None));

        let writes = rig.lcd.writes.borrow();
        assert_eq!(writes.last().unwrap().1, b"P2 PTS  0 G0 S0 ");
        assert_eq!(writes[writes.len() - 2].1, b"P1 PTS 15 G0 S0 ");
    }

    #[test]
    fn returned_ball_changes_the_live_paddle() {
        let shared = shared(MatchConfig::default());
        let (mut scheduler, rig) = scheduler(&shared);
        serve(&mut scheduler, &shared, &rig, 1000);

        // Let the ball reach the right half
        for _ in 0..10 {
            rig.clock.advance(50);
            scheduler.step().unwrap(); // PlayerTurn
            scheduler.step().unwrap(); // ScoreUpdate, no winner yet
        }
        assert_eq!(shared.with(|s| s.game.board.region), Some(Region::Right));
        assert_eq!(state(&shared), GameState::PlayerTurn);

        assert_eq!(press(&shared, Button::Paddle(Player::Two)), Press::Hit);
        assert_eq!(shared.with(|s| s.game.player), Some(Some(Player::One)));
        assert!(shared.with(|s| s.game.board.ball_vel.x).unwrap() < 0.0);
        assert!(!armed(&shared, Button::Paddle(Player::Two)));

        // A second press from the same side does nothing
        assert_eq!(press(&shared, Button::Paddle(Player::Two)), Press::Ignored);
    }

    #[test]
    fn clock_wraparound_skips_one_physics_step() {
        let shared = shared(MatchConfig::default());
        let (mut scheduler, rig) = scheduler(&shared);
        serve(&mut scheduler, &shared, &rig, 1000);
        rig.clock.advance(100);
        scheduler.step().unwrap();
        scheduler.step().unwrap();
        let before = board_snapshot(&shared).unwrap();

        rig.clock.now.set(rig.clock.now.get() - 60);
        scheduler.step().unwrap();

        assert_eq!(board_snapshot(&shared).unwrap(), before);
        assert_eq!(state(&shared), GameState::ScoreUpdate);
        assert_eq!(rig.clock.get_time(), 0);

        // Stepping resumes from the fresh reference
        scheduler.step().unwrap();
        rig.clock.advance(20);
        scheduler.step().unwrap();
        assert!(board_snapshot(&shared).unwrap().ball_pos.x > before.ball_pos.x);
    }

    #[test]
    fn stuck_display_drops_frames_but_keeps_playing() {
        let shared = shared(MatchConfig::default());
        let (mut scheduler, rig) = scheduler(&shared);
        serve(&mut scheduler, &shared, &rig, 1000);
        rig.bus.fail_next(usize::MAX);

        rig.clock.advance(50);
        assert_eq!(scheduler.step(), Ok(()));

        assert_eq!(scheduler.dropped_frames(), 1);
        assert_eq!(state(&shared), GameState::ScoreUpdate);
        assert!(board_snapshot(&shared).unwrap().ball_pos.x > 64.0);
    }

    #[test]
    fn dead_lcd_on_prepare_start_still_waits_for_serve() {
        let shared = shared(MatchConfig::default());
        let (mut scheduler, rig) = scheduler(&shared);
        rig.lcd.broken.set(true);

        assert_eq!(scheduler.step(), Err(Error::Pin));

        assert_eq!(state(&shared), GameState::Start);
        assert!(armed(&shared, Button::Serve));
        assert_eq!(rig.bus.take().len(), 3);
        assert!(rig.lcd.writes.borrow().is_empty());

        scheduler.step().unwrap();
        assert_eq!(press(&shared, Button::Serve), Press::Served);
        scheduler.step().unwrap();
        assert_eq!(state(&shared), GameState::PlayerTurn);
    }

    #[test]
    fn dead_lcd_does_not_lose_the_point() {
        let shared = shared(MatchConfig::default());
        let (mut scheduler, rig) = scheduler(&shared);
        serve(&mut scheduler, &shared, &rig, 1000);
        rig.lcd.broken.set(true);

        let mut result = Ok(());
        for _ in 0..200 {
            match state(&shared) {
                GameState::PlayerTurn => rig.clock.advance(50),
                GameState::ScoreUpdate => {}
                _ => break,
            }
            result = scheduler.step();
        }

        assert_eq!(result, Err(Error::Pin));
        assert_eq!(state(&shared), GameState::LaunchBall);
        assert_eq!(shared.with(|s| s.game.board.score[0].points), Some(15));
        assert!(!armed(&shared, Button::Paddle(Player::Two)));

        // The next serve goes out regardless
        rig.clock.advance(7);
        scheduler.step().unwrap();
        assert_eq!(state(&shared), GameState::PlayerTurn);
        assert_eq!(shared.with(|s| s.game.player), Some(Some(Player::One)));
    }

    #[test]
    fn match_point_leads_to_win_screen_then_restart() {
        let shared = shared(MatchConfig::new(1, 1));
        let (mut scheduler, rig) = scheduler(&shared);
        serve(&mut scheduler, &shared, &rig, 1000);
        shared.with(|s| s.game.board.score[0].points = 40);

        play_out(&mut scheduler, &shared, &rig);

        assert_eq!(state(&shared), GameState::WinScreen);
        let score = shared.with(|s| s.game.board.score).unwrap();
        assert_eq!(score[0], Score { points: 0, games: 0, sets: 1 });

        rig.bus.take();
        scheduler.step().unwrap();
        assert_eq!(state(&shared), GameState::WinDisplay);
        let banner = rig.bus.take();
        assert_eq!(banner.len(), 3);
        // Top-left of the "P" in "P1 WINS"
        assert_ne!(banner[2].1[1 + 3 * 128 + 36] & 1 << 4, 0);

        rig.clock.advance(1000);
        scheduler.step().unwrap();
        assert_eq!(state(&shared), GameState::WinDisplay);

        rig.clock.advance(4000);
        scheduler.step().unwrap();
        assert_eq!(state(&shared), GameState::PrepareStart);

        scheduler.step().unwrap();
        assert_eq!(state(&shared), GameState::Start);
        assert_eq!(shared.with(|s| s.game.board.score[0]), Some(Score::default()));
    }
}
