#![no_std]
#![no_main]

use defmt_rtt as _;
use panic_halt as _;

use embedded_hal::pwm::SetDutyCycle;
use fugit::RateExtU32;
use rp_pico::entry;
use rp_pico::hal; // Hardware Abstraction Layer (higher-level drivers)
use rp_pico::hal::gpio::{
    DynPinId, FunctionI2C, FunctionSioInput, Interrupt::EdgeLow, Pin, PullUp,
};
use rp_pico::hal::pac; // Peripheral Access Crate (low-level register access)
use rp_pico::hal::pac::interrupt;
use rp_pico::hal::pwm::{FreeRunning, Pwm0, Slice};

use pico_tennis::config::{MatchConfig, HIT_TONE_HZ};
use pico_tennis::display::Ssd1306;
use pico_tennis::game::{Match, Press};
use pico_tennis::global_state::{IrqCell, SharedState};
use pico_tennis::lcd::Hd44780;
use pico_tennis::peripherals::{Button, ButtonIrq, ElapsedTime, ToneTimer};
use pico_tennis::scheduler::Scheduler;
use pico_tennis::tone::{tone_modulus, HitTone};
use pico_tennis::Error;

const PWM_DIVIDER: u8 = 64;
// System clock as set up by init_clocks_and_plls
const PWM_COUNTER_HZ: u32 = 125_000_000 / PWM_DIVIDER as u32;

static SHARED: IrqCell<SharedState<PicoButtons>> = IrqCell::new();
static TONE: IrqCell<PicoTone> = IrqCell::new();
static HIT_TONE: HitTone = HitTone::new(tone_modulus(PWM_COUNTER_HZ, HIT_TONE_HZ));

type ButtonPin = Pin<DynPinId, FunctionSioInput, PullUp>;

/// Paddle one, paddle two and serve, in `Button::index` order.
struct PicoButtons {
    pins: [ButtonPin; 3],
}

impl PicoButtons {
    /// Acknowledges a pending edge on `button`. Only armed buttons report one.
    fn take_edge(&mut self, button: Button) -> bool {
        let pin = &mut self.pins[button.index()];
        if !pin.interrupt_status(EdgeLow) {
            return false;
        }
        pin.clear_interrupt(EdgeLow);
        true
    }
}

impl ButtonIrq for PicoButtons {
    fn arm(&mut self, button: Button) {
        let pin = &mut self.pins[button.index()];
        pin.clear_interrupt(EdgeLow);
        pin.set_interrupt_enabled(EdgeLow, true);
    }

    fn disarm(&mut self, button: Button) {
        self.pins[button.index()].set_interrupt_enabled(EdgeLow, false);
    }
}

struct PicoTone {
    slice: Slice<Pwm0, FreeRunning>,
}

impl ToneTimer for PicoTone {
    fn enable_overflow_interrupt(&mut self) {
        self.slice.enable_interrupt();
    }

    fn disable_overflow_interrupt(&mut self) {
        self.slice.disable_interrupt();
    }

    fn clear_overflow(&mut self) {
        self.slice.clear_interrupt();
    }

    fn set_modulus(&mut self, modulus: u16) {
        self.slice.set_top(modulus);
    }

    fn set_compare(&mut self, compare: u16) {
        // Infallible on the RP2040
        let _ = self.slice.channel_a.set_duty_cycle(compare);
    }
}

/// Milliseconds since the last reset, from the 1 MHz system timer.
struct PicoClock {
    timer: hal::Timer,
    origin: u64,
}

impl PicoClock {
    fn new(timer: hal::Timer) -> Self {
        let origin = timer.get_counter().ticks();
        Self { timer, origin }
    }
}

impl ElapsedTime for PicoClock {
    fn reset_time(&mut self) {
        self.origin = self.timer.get_counter().ticks();
    }

    fn get_time(&self) -> u32 {
        let micros = self.timer.get_counter().ticks().wrapping_sub(self.origin);
        (micros / 1_000) as u32
    }
}

#[entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();

    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    // Configure the clocks (125 MHz system clock)
    let clocks = hal::clocks::init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let sio = hal::Sio::new(pac.SIO); // single-cycle IO
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );
    let timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // OLED on I2C0
    let sda: Pin<_, FunctionI2C, PullUp> = pins.gpio4.reconfigure();
    let scl: Pin<_, FunctionI2C, PullUp> = pins.gpio5.reconfigure();
    let i2c = hal::I2C::i2c0(
        pac.I2C0,
        sda,
        scl,
        400.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );
    let mut oled = Ssd1306::new(i2c);
    if let Err(err) = oled.init() {
        halt(err);
    }

    // Score LCD in 4-bit mode
    let mut lcd = Hd44780::new(
        pins.gpio6.into_push_pull_output().into_dyn_pin(),
        pins.gpio7.into_push_pull_output().into_dyn_pin(),
        [
            pins.gpio8.into_push_pull_output().into_dyn_pin(),
            pins.gpio9.into_push_pull_output().into_dyn_pin(),
            pins.gpio10.into_push_pull_output().into_dyn_pin(),
            pins.gpio11.into_push_pull_output().into_dyn_pin(),
        ],
        timer,
    );
    if let Err(err) = lcd.init() {
        halt(err);
    }

    // Buzzer on PWM slice 0, silent until the first hit
    let slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let mut pwm0 = slices.pwm0;
    pwm0.set_div_int(PWM_DIVIDER);
    pwm0.set_top(0);
    pwm0.enable();
    let _buzzer = pwm0.channel_a.output_to(pins.gpio0);
    TONE.install(PicoTone { slice: pwm0 });

    let buttons = PicoButtons {
        pins: [
            pins.gpio14.into_pull_up_input().into_dyn_pin(),
            pins.gpio15.into_pull_up_input().into_dyn_pin(),
            pins.gpio16.into_pull_up_input().into_dyn_pin(),
        ],
    };
    SHARED.install(SharedState::new(
        Match::new(MatchConfig::default()),
        buttons,
    ));

    unsafe {
        pac::NVIC::unmask(pac::Interrupt::IO_IRQ_BANK0);
        pac::NVIC::unmask(pac::Interrupt::PWM_IRQ_WRAP);
    }
    defmt::info!("pico-tennis up");

    Scheduler::new(&SHARED, oled, lcd, PicoClock::new(timer), timer).run()
}

fn halt(err: Error) -> ! {
    defmt::error!("startup failed: {}", err);
    loop {
        cortex_m::asm::wfi();
    }
}

#[interrupt]
fn IO_IRQ_BANK0() {
    let hit = SHARED.with(|s| {
        let mut hit = false;
        for button in Button::ALL {
            if s.buttons.take_edge(button) {
                hit |= s.game.on_button(button, &mut s.buttons) == Press::Hit;
            }
        }
        hit
    });
    if hit == Some(true) {
        TONE.with(|tone| HIT_TONE.start(tone));
    }
}

#[interrupt]
fn PWM_IRQ_WRAP() {
    TONE.with(|tone| HIT_TONE.on_overflow(tone));
}
