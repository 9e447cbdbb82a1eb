use embassy_executor::task;
use embassy_futures::select::{select, Either};
use embassy_stm32::dma::NoDma;
use embassy_stm32::gpio::{AnyPin, Output};
use embassy_stm32::i2c::I2c;
use embassy_stm32::peripherals::{I2C1, SPI1};
use embassy_stm32::spi::Spi;
use embassy_time::{Duration, Ticker};

use trip_computer::controller::TripController;
use trip_computer::drivers::xpt2046::Xpt2046;

use crate::tasks::display_task::ConsoleRenderer;
use crate::{EDGE, TIME_BASE, TOUCH, TOUCH_EVENT};

pub type BoardI2c = I2c<'static, I2C1, NoDma, NoDma>;
pub type BoardTouch = Xpt2046<Spi<'static, SPI1, NoDma, NoDma>, Output<'static, AnyPin>>;
pub type Controller = TripController<BoardI2c, BoardTouch, ConsoleRenderer>;

/// Diagnostics summary every 20 cadence ticks (10 s).
const DIAG_EVERY: u32 = 20;

/// Runs the controller: cadence ticks and touch events, one at a time, so
/// bus traffic is serialized.
#[task]
pub async fn trip_task(mut controller: Controller, mut led: Output<'static, AnyPin>) {
    let mut ticker = Ticker::every(Duration::from_millis(controller.config().cadence_ms as u64));
    let mut ticks: u32 = 0;

    controller.start();

    loop {
        match select(ticker.next(), TOUCH_EVENT.wait()).await {
            Either::First(_) => {
                controller.on_cadence(&EDGE, &TIME_BASE);
                led.toggle();

                ticks = ticks.wrapping_add(1);
                if ticks % DIAG_EVERY == 0 {
                    let d = controller.diagnostics();
                    defmt::info!(
                        "diag: imu={} touch={} mem={} nosig={} div0={} clamp={} drop={}",
                        d.imu_errors,
                        d.touch_errors,
                        d.memory_errors,
                        d.no_signal,
                        d.divide_guards,
                        d.stale_touches,
                        controller.renderer().dropped()
                    );
                }
            }
            Either::Second(_) => {
                if let Some(view) = controller.on_touch(&TOUCH) {
                    defmt::info!("view -> {}", view);
                }
            }
        }
    }
}
