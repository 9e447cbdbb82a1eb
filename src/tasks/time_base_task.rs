use embassy_executor::task;
use embassy_time::{Duration, Ticker};

use trip_computer::config::TIME_BASE_PERIOD_MS;
use trip_computer::irq::IrqSource;

use crate::{dispatch, TIME_BASE, TOUCH};

/// System tick. Advances the TimeBase and fires the touch debounce one-shot.
#[task]
pub async fn time_base_task() {
    let mut ticker = Ticker::every(Duration::from_millis(TIME_BASE_PERIOD_MS as u64));

    loop {
        ticker.next().await;
        let now = TIME_BASE.tick();

        if TOUCH.poll_debounce(now) {
            dispatch(IrqSource::DebounceExpired, now.0);
        }
    }
}
