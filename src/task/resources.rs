//! Hardware Resource Management
//!
//! Splits the RP2350 peripherals into one group per owner so each task or
//! driver gets exactly the pins it uses.
//!
//! # Resource Groups
//! - Motor Driver: TB6612FNG direction pins, PWM slices and standby
//! - WiFi: CYW43439 radio power, SPI pins, PIO block and DMA channel
//! - Stop Switch: push button that ends serving

use assign_resources::assign_resources;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, PIO0};
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;
use embassy_rp::Peri;

assign_resources! {
    /// TB6612FNG dual motor driver pins and PWM channels
    motor_driver: MotorDriverResources {
        standby_pin: PIN_6,
        // Drive motor, channel A
        drive_slice: PWM_SLICE1,
        drive_pwm_pin: PIN_2,
        drive_forward_pin: PIN_0,
        drive_backward_pin: PIN_1,
        // Steering motor, channel B
        steering_slice: PWM_SLICE2,
        steering_pwm_pin: PIN_5,
        steering_right_pin: PIN_3,
        steering_left_pin: PIN_4,
    },
    /// CYW43439 radio on the Pico 2 W
    wifi: WifiResources {
        power_pin: PIN_23,
        cs_pin: PIN_25,
        dio_pin: PIN_24,
        clk_pin: PIN_29,
        pio: PIO0,
        dma: DMA_CH0,
    },
    /// Stop switch, active low
    stop_switch: StopSwitchResources {
        pin: PIN_15,
    },
}

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});
