//! Access point bootstrap
//!
//! Starts the car's own WiFi network. The radio call returns once the access
//! point is started; the stack's static address needs no negotiation.

use cyw43::Control;
use defmt::{info, unwrap};
use embassy_net::Stack;
use rc_car::system::config::ApConfig;

/// Starts the access point and returns the car's address
pub async fn bring_up(control: &mut Control<'static>, stack: Stack<'static>, config: &ApConfig) -> [u8; 4] {
    unwrap!(config.validate());

    if config.is_open() {
        info!("Starting open access point \"{}\" on channel {}", config.ssid, config.channel);
        control.start_ap_open(config.ssid, config.channel).await;
    } else {
        info!("Starting WPA2 access point \"{}\" on channel {}", config.ssid, config.channel);
        control.start_ap_wpa2(config.ssid, config.password, config.channel).await;
    }

    stack.wait_config_up().await;

    let address = match stack.config_v4() {
        Some(v4) => v4.address.address().octets(),
        None => defmt::panic!("access point has no IPv4 address"),
    };

    info!("Access point ready, SSID \"{}\"", config.ssid);
    if config.is_open() {
        info!("Network is open (no password)");
    } else {
        info!("Password: {}", config.password);
    }
    info!(
        "Control page at http://{}.{}.{}.{}/",
        address[0], address[1], address[2], address[3]
    );
    address
}
