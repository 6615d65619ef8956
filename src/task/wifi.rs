//! Radio and network stack bring-up
//!
//! Starts the CYW43439 driver and an embassy-net stack with the car's fixed
//! address. Both runners are spawned as tasks and run for the lifetime of the
//! firmware.

use cyw43::{Control, PowerManagementMode};
use cyw43_pio::{PioSpi, RM2_CLOCK_DIVIDER};
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_net::{Config, Ipv4Address, Ipv4Cidr, Stack, StackResources, StaticConfigV4};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_rp::pio::Pio;
use rc_car::system::config::{AP_ADDRESS, AP_PREFIX_LEN};
use static_cell::StaticCell;

use crate::task::resources::{Irqs, WifiResources};

/// Two TCP sockets for HTTP, one UDP socket for DHCP, plus headroom
const SOCKET_COUNT: usize = 4;

const NET_SEED: u64 = 0x5243_2d43_6172_0001;

#[embassy_executor::task]
async fn cyw43_task(runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Brings up the radio and the network stack
///
/// The returned control handle starts the access point; the stack is
/// configured but has no link until then.
pub async fn init(spawner: Spawner, r: WifiResources) -> (Control<'static>, Stack<'static>) {
    let fw = include_bytes!("../../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../../cyw43-firmware/43439A0_clm.bin");

    let pwr = Output::new(r.power_pin, Level::Low);
    let cs = Output::new(r.cs_pin, Level::High);
    let mut pio = Pio::new(r.pio, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        RM2_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        r.dio_pin,
        r.clk_pin,
        r.dma,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    spawner.spawn(unwrap!(cyw43_task(runner)));

    control.init(clm).await;
    control.set_power_management(PowerManagementMode::PowerSave).await;

    let [a, b, c, d] = AP_ADDRESS;
    let config = Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(Ipv4Address::new(a, b, c, d), AP_PREFIX_LEN),
        gateway: None,
        dns_servers: Default::default(),
    });

    static RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(net_device, config, RESOURCES.init(StackResources::new()), NET_SEED);
    spawner.spawn(unwrap!(net_task(runner)));

    info!("Radio initialized");
    (control, stack)
}
