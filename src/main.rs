#![no_std]
#![no_main]

mod board;
mod tasks;
mod usb;

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_stm32::dma::NoDma;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, Pin, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::pac;
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

use trip_computer::config::{
    TripConfig, CAPTURE_TICK_HZ, CAPTURE_TIMER_MODULUS, NO_SIGNAL_TIMEOUT_MS, TIME_BASE_PERIOD_MS,
    TOUCH_DEBOUNCE_MS,
};
use trip_computer::controller::{TripController, TripIo};
use trip_computer::drivers::xpt2046::Xpt2046;
use trip_computer::edge_capture::EdgeCapture;
use trip_computer::irq::{IrqSource, IrqTable};
use trip_computer::time_base::{TimeBase, Timestamp};
use trip_computer::touch::TouchSampler;

use crate::board::Board;
use crate::tasks::display_task::{ConsoleRenderer, DisplayCommand, DISPLAY_QUEUE};

// ── Interrupt-shared state ────────────────────────────────────────────────────
pub static TIME_BASE: TimeBase = TimeBase::new(TIME_BASE_PERIOD_MS);
pub static EDGE: EdgeCapture = EdgeCapture::new(CAPTURE_TICK_HZ, CAPTURE_TIMER_MODULUS, NO_SIGNAL_TIMEOUT_MS);
pub static TOUCH: TouchSampler = TouchSampler::new(TOUCH_DEBOUNCE_MS / TIME_BASE_PERIOD_MS);

/// Press accepted; wakes the controller.
pub static TOUCH_EVENT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
/// Debounce window closed; the pen interrupt may be awaited again.
pub static TOUCH_REARM: Signal<CriticalSectionRawMutex, ()> = Signal::new();

static DISPLAY_CHAN: Channel<CriticalSectionRawMutex, DisplayCommand, DISPLAY_QUEUE> = Channel::new();

static IRQ_TABLE: Mutex<CriticalSectionRawMutex, RefCell<IrqTable>> = Mutex::new(RefCell::new(IrqTable::new()));

pub fn dispatch(source: IrqSource, payload: u32) -> bool {
    IRQ_TABLE.lock(|t| t.borrow().dispatch(source, payload))
}

fn on_wheel_edge(count: u32) {
    EDGE.on_edge(count);
}

fn on_capture_overflow(_: u32) {
    EDGE.on_overflow();
}

fn on_touch_edge(tick: u32) {
    if TOUCH.on_falling_edge(Timestamp(tick)) {
        TOUCH_EVENT.signal(());
    }
}

fn on_debounce_expired(_: u32) {
    TOUCH_REARM.signal(());
}

// ── Wheel capture timer ───────────────────────────────────────────────────────
#[interrupt]
fn TIM5() {
    let tim = pac::TIM5;
    let sr = tim.sr().read();

    // Flags are rc_w0: write 0 to clear, 1 leaves them alone.
    let mut clear = pac::timer::regs::SrGp(!0);
    clear.set_uif(!sr.uif());
    clear.set_ccif(0, !sr.ccif(0));
    tim.sr().write_value(clear);

    let captured = if sr.ccif(0) { Some(tim.ccr(0).read()) } else { None };
    match captured {
        // Both pending and the capture sits early in the count: the wrap came first.
        Some(count) if sr.uif() && count < CAPTURE_TIMER_MODULUS / 2 => {
            dispatch(IrqSource::CaptureOverflow, 0);
            dispatch(IrqSource::WheelEdge, count);
        }
        Some(count) => {
            dispatch(IrqSource::WheelEdge, count);
            if sr.uif() {
                dispatch(IrqSource::CaptureOverflow, 0);
            }
        }
        None => {
            if sr.uif() {
                dispatch(IrqSource::CaptureOverflow, 0);
            }
        }
    }
}

bind_interrupts!(struct Irqs {
    I2C1_EV  => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER  => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Board init (168 MHz PLL)
    let board = Board::init();
    let p = board.p;
    defmt::info!("trip computer starting");

    // 2. Interrupt routing, before any source is enabled
    IRQ_TABLE.lock(|t| {
        let mut t = t.borrow_mut();
        t.register(IrqSource::WheelEdge, &on_wheel_edge).unwrap();
        t.register(IrqSource::CaptureOverflow, &on_capture_overflow).unwrap();
        t.register(IrqSource::TouchEdge, &on_touch_edge).unwrap();
        t.register(IrqSource::DebounceExpired, &on_debounce_expired).unwrap();
    });

    // 3. USB console (the display stream)
    let (usb_dev, usb_serial) = usb::init(p.USB_OTG_FS, p.PA12, p.PA11);
    spawner.spawn(usb::usb_task(usb_dev)).unwrap();
    spawner
        .spawn(tasks::display_task::display_task(usb_serial, DISPLAY_CHAN.receiver()))
        .unwrap();

    // 4. I2C1 @ 400 kHz: MPU6050 + RTC module EEPROM (SCL=PB8, SDA=PB9)
    let i2c = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        NoDma,
        NoDma,
        TimeHertz(400_000),
        Default::default(),
    );

    // 5. SPI1 @ 2 MHz: XPT2046 touch (SCK=PA5, MOSI=PA7, MISO=PA6, CS=PB12)
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = TimeHertz(2_000_000);
    let spi = Spi::new(p.SPI1, p.PA5, p.PA7, p.PA6, NoDma, NoDma, spi_config);
    let cs_touch = Output::new(p.PB12.degrade(), Level::High, Speed::VeryHigh);
    let touch_panel = Xpt2046::new(spi, cs_touch);

    // 6. Touch PENIRQ on PC4, active low
    let pen_irq = ExtiInput::new(Input::new(p.PC4.degrade(), Pull::Up), p.EXTI4.degrade());

    // 7. Heartbeat LED (PC13), toggled on every cadence tick
    let led = Output::new(p.PC13.degrade(), Level::High, Speed::Low);

    // 8. MPU6050 needs ~100 ms after power-up
    Timer::after(Duration::from_millis(100)).await;

    // 9. Wheel sensor capture (TIM5_CH1 on PA0)
    board::init_wheel_capture(p.PA0, p.TIM5);
    interrupt::TIM5.set_priority(Priority::P2);
    unsafe { interrupt::TIM5.enable() };

    // 10. Spawn
    let controller = TripController::new(
        TripIo::new(i2c, touch_panel),
        ConsoleRenderer::new(DISPLAY_CHAN.sender()),
        TripConfig::default(),
    );

    spawner.spawn(tasks::time_base_task::time_base_task()).unwrap();
    spawner.spawn(tasks::touch_task::touch_task(pen_irq)).unwrap();
    spawner.spawn(tasks::trip_task::trip_task(controller, led)).unwrap();
}
