//! Stop switch handling
//!
//! A push button that ends serving. Pressing it raises the shutdown signal
//! the main loop is raced against.

use defmt::info;
use embassy_rp::gpio::{Input, Level, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

use crate::task::resources::StopSwitchResources;

/// Button debounce delay (ms)
const DEBOUNCE_DURATION: Duration = Duration::from_millis(30);

static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Waits until the stop switch has been pressed
pub async fn wait() {
    SHUTDOWN.wait().await
}

/// Stop switch handler
#[embassy_executor::task]
pub async fn stop_switch(r: StopSwitchResources) {
    let mut button = Input::new(r.pin, Pull::Up);
    while debounce(&mut button).await != Level::Low {}
    info!("Stop switch pressed");
    SHUTDOWN.signal(());
}

/// Ensures stable button state
async fn debounce(button: &mut Input<'static>) -> Level {
    loop {
        let st_level = button.get_level();
        button.wait_for_any_edge().await;
        Timer::after(DEBOUNCE_DURATION).await;
        let end_level = button.get_level();
        if st_level != end_level {
            break end_level;
        }
    }
}
