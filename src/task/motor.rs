//! Motor driver setup
//!
//! Builds both TB6612FNG channels on the board pins and hands back a single
//! controller with the motors stopped and the driver out of standby.

use defmt::{info, unwrap};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::pwm::{self, Pwm};
use rc_car::system::config::PWM_FREQUENCY_HZ;
use rc_car::system::motor::{pwm_timing, MotorControl, MotorController};
use tb6612fng::Motor;

use crate::task::resources::MotorDriverResources;

type Pin = Output<'static>;

type Channel = Motor<Pin, Pin, Pwm<'static>>;

/// The car's motor controller on real hardware
pub type RcMotors = MotorController<Pin, Pin, Pwm<'static>, Pin, Pin, Pwm<'static>, Pin>;

pub fn init(r: MotorDriverResources) -> RcMotors {
    let (divider, top) = pwm_timing(embassy_rp::clocks::clk_sys_freq(), PWM_FREQUENCY_HZ);
    let mut pwm_config = pwm::Config::default();
    pwm_config.divider = divider.into();
    pwm_config.top = top;

    let drive = channel(
        Output::new(r.drive_forward_pin, Level::Low),
        Output::new(r.drive_backward_pin, Level::Low),
        Pwm::new_output_a(r.drive_slice, r.drive_pwm_pin, pwm_config.clone()),
    );
    let steering = channel(
        Output::new(r.steering_right_pin, Level::Low),
        Output::new(r.steering_left_pin, Level::Low),
        Pwm::new_output_b(r.steering_slice, r.steering_pwm_pin, pwm_config),
    );
    let standby = Output::new(r.standby_pin, Level::Low);

    let mut motors = unwrap!(MotorController::new(drive, steering, standby));
    unwrap!(motors.stop_all());
    info!("Motor driver ready, PWM divider {} top {}", divider, top);
    motors
}

fn channel(in1: Output<'static>, in2: Output<'static>, pwm: Pwm<'static>) -> Channel {
    match Motor::new(in1, in2, pwm) {
        Ok(motor) => motor,
        Err(_) => defmt::panic!("motor channel setup failed"),
    }
}
