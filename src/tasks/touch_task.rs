use embassy_executor::task;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::AnyPin;

use trip_computer::irq::IrqSource;

use crate::{dispatch, TIME_BASE, TOUCH_REARM};

/// PENIRQ watcher. The pin is not awaited again until the debounce window
/// closes, which is what keeps the edge interrupt disarmed in between.
#[task]
pub async fn touch_task(mut pen_irq: ExtiInput<'static, AnyPin>) {
    loop {
        pen_irq.wait_for_falling_edge().await;
        dispatch(IrqSource::TouchEdge, TIME_BASE.now().0);
        TOUCH_REARM.wait().await;
    }
}
