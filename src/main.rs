//! RC car firmware entry point
//!
//! Brings up the motor driver, the WiFi access point and its DHCP server,
//! then serves the control page until the stop switch is pressed.

#![no_std]
#![no_main]

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_futures::select::select;
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_time::{Duration, Timer};
use rc_car::system::config::{ApConfig, HTTP_PORT, SETTLE_DELAY_MS};
use rc_car::system::motor::MotorControl;
use rc_car::system::server;
use task::dhcp_server::dhcp_server;
use task::http;
use task::resources::{AssignedResources, MotorDriverResources, StopSwitchResources, WifiResources};
use task::stop_switch::{self, stop_switch};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Program information for picotool
#[link_section = ".bi_entries"]
#[used]
pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
    embassy_rp::binary_info::rp_program_name!(c"RC Car"),
    embassy_rp::binary_info::rp_program_description!(c"Two-motor RC car controlled over its own WiFi access point"),
    embassy_rp::binary_info::rp_cargo_version!(),
    embassy_rp::binary_info::rp_program_build_attribute!(),
];

/// Task implementations and hardware glue
mod task;

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());
    let r = split_resources!(p);
    info!("RC car starting");

    // Motors are stopped before the network exists, so nothing can move them early
    let mut motors = task::motor::init(r.motor_driver);
    spawner.spawn(unwrap!(stop_switch(r.stop_switch)));

    let (mut control, stack) = task::wifi::init(spawner, r.wifi).await;
    spawner.spawn(unwrap!(dhcp_server(stack)));

    let ap_config = ApConfig::from_build_env();
    task::access_point::bring_up(&mut control, stack, &ap_config).await;
    control.gpio_set(0, true).await;

    Timer::after(Duration::from_millis(SETTLE_DELAY_MS)).await;

    let mut listener = http::listener(stack, HTTP_PORT);
    // serve never returns; only the stop switch ends this
    select(server::serve(&mut listener, &mut motors), stop_switch::wait()).await;

    info!("Shutting down");
    if let Err(e) = motors.stop_all() {
        warn!("Failed to stop motors: {}", e);
    }
    if let Err(e) = motors.standby() {
        warn!("Failed to enter standby: {}", e);
    }
    control.gpio_set(0, false).await;
    info!("Stopped");
}
