//! Motor control implementation
//!
//! Drives the two channels of a TB6612FNG dual H-bridge: channel A moves the
//! car (drive), channel B turns the front wheels (steering). The driver is a
//! `tb6612fng::Tb6612fng`, kept out of standby for as long as the controller
//! is active.
//!
//! # Pin polarity
//! - Drive: forward asserts the first direction pin, reverse the second
//! - Steering: right asserts the first direction pin, left the second
//! - Stop: duty cycle zero, both direction pins low
//!
//! Any movement runs at full duty cycle.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use tb6612fng::{DriveCommand, Motor, Tb6612fng};

use crate::system::config::FULL_SPEED;
use crate::system::error::Error;

/// The two independently controlled motor outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorChannel {
    /// Propulsion, H-bridge channel A
    Drive,
    /// Steering, H-bridge channel B
    Steering,
}

/// Direction requested for a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Reverse,
    Left,
    Right,
    Stop,
}

impl Direction {
    /// H-bridge command for this direction on the given channel
    ///
    /// Returns `None` for directions that do not belong to the channel's
    /// axis, e.g. `Left` on the drive channel.
    pub fn drive_command(self, channel: MotorChannel) -> Option<DriveCommand> {
        match (channel, self) {
            (_, Direction::Stop) => Some(DriveCommand::Stop),
            (MotorChannel::Drive, Direction::Forward) => Some(DriveCommand::Forward(FULL_SPEED)),
            (MotorChannel::Drive, Direction::Reverse) => Some(DriveCommand::Backward(FULL_SPEED)),
            (MotorChannel::Steering, Direction::Right) => Some(DriveCommand::Forward(FULL_SPEED)),
            (MotorChannel::Steering, Direction::Left) => Some(DriveCommand::Backward(FULL_SPEED)),
            _ => None,
        }
    }
}

/// What the command dispatcher needs from the motors
pub trait MotorControl {
    /// Sets one channel's direction
    fn set_direction(&mut self, channel: MotorChannel, direction: Direction) -> Result<(), Error>;

    /// Stops both channels
    fn stop_all(&mut self) -> Result<(), Error> {
        let drive = self.set_direction(MotorChannel::Drive, Direction::Stop);
        let steering = self.set_direction(MotorChannel::Steering, Direction::Stop);
        drive.and(steering)
    }
}

/// Single owner of the TB6612FNG: drive on channel A, steering on channel B
pub struct MotorController<AIN1, AIN2, PWMA, BIN1, BIN2, PWMB, STBY> {
    driver: Tb6612fng<AIN1, AIN2, PWMA, BIN1, BIN2, PWMB, STBY>,
    drive_direction: Direction,
    steering_direction: Direction,
}

impl<AIN1, AIN2, PWMA, BIN1, BIN2, PWMB, STBY> MotorController<AIN1, AIN2, PWMA, BIN1, BIN2, PWMB, STBY>
where
    AIN1: OutputPin,
    AIN2: OutputPin,
    PWMA: SetDutyCycle,
    BIN1: OutputPin,
    BIN2: OutputPin,
    PWMB: SetDutyCycle,
    STBY: OutputPin,
{
    /// Takes ownership of both channels and pulls the driver out of standby
    ///
    /// The channels are not touched; call [`MotorControl::stop_all`] before
    /// accepting commands.
    pub fn new(
        drive: Motor<AIN1, AIN2, PWMA>,
        steering: Motor<BIN1, BIN2, PWMB>,
        standby: STBY,
    ) -> Result<Self, Error> {
        let mut driver = Tb6612fng::new(drive, steering, standby).map_err(|_| Error::Standby)?;
        driver.disable_standby().map_err(|_| Error::Standby)?;
        Ok(Self {
            driver,
            drive_direction: Direction::Stop,
            steering_direction: Direction::Stop,
        })
    }

    /// Last direction successfully applied to a channel
    pub fn direction(&self, channel: MotorChannel) -> Direction {
        match channel {
            MotorChannel::Drive => self.drive_direction,
            MotorChannel::Steering => self.steering_direction,
        }
    }

    /// Puts the driver IC into low-power standby
    pub fn standby(&mut self) -> Result<(), Error> {
        self.driver.enable_standby().map_err(|_| Error::Standby)
    }

    fn apply(&mut self, channel: MotorChannel, command: DriveCommand) -> Result<(), Error> {
        let result = match channel {
            MotorChannel::Drive => self.driver.motor_a.drive(command).map(|_| ()),
            MotorChannel::Steering => self.driver.motor_b.drive(command).map(|_| ()),
        };
        result.map_err(|_| Error::Motor(channel))
    }

    fn record(&mut self, channel: MotorChannel, direction: Direction) {
        match channel {
            MotorChannel::Drive => self.drive_direction = direction,
            MotorChannel::Steering => self.steering_direction = direction,
        }
    }
}

impl<AIN1, AIN2, PWMA, BIN1, BIN2, PWMB, STBY> MotorControl for MotorController<AIN1, AIN2, PWMA, BIN1, BIN2, PWMB, STBY>
where
    AIN1: OutputPin,
    AIN2: OutputPin,
    PWMA: SetDutyCycle,
    BIN1: OutputPin,
    BIN2: OutputPin,
    PWMB: SetDutyCycle,
    STBY: OutputPin,
{
    fn set_direction(&mut self, channel: MotorChannel, direction: Direction) -> Result<(), Error> {
        let Some(command) = direction.drive_command(channel) else {
            debug!("{} motor has no direction {}", channel, direction);
            return Ok(());
        };

        // The driver raises the new pin before lowering the old one, so a
        // reversal goes through stop to keep both pins from being high at once
        let current = self.direction(channel);
        if direction != Direction::Stop && current != Direction::Stop && current != direction {
            self.apply(channel, DriveCommand::Stop)?;
            self.record(channel, Direction::Stop);
        }

        self.apply(channel, command)?;
        self.record(channel, direction);
        trace!("{} motor -> {}", channel, direction);
        Ok(())
    }
}

/// PWM clock divider and counter top for a carrier frequency
///
/// Picks the smallest integer divider that keeps the period within the
/// 16-bit counter, then the top value for that divider.
pub fn pwm_timing(clock_hz: u32, carrier_hz: u32) -> (u8, u16) {
    let divider = ((clock_hz / carrier_hz) / 65535 + 1) as u8;
    let top = (clock_hz / (carrier_hz * divider as u32)) as u16 - 1;
    (divider, top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing;

    #[test]
    fn new_controller_leaves_standby() {
        let (motors, outputs) = testing::controller();
        assert!(outputs.standby.is_high());
        assert_eq!(motors.direction(MotorChannel::Drive), Direction::Stop);
        assert_eq!(motors.direction(MotorChannel::Steering), Direction::Stop);
    }

    #[test]
    fn forward_asserts_first_pin_at_full_duty() {
        let (mut motors, outputs) = testing::controller();
        motors.set_direction(MotorChannel::Drive, Direction::Forward).unwrap();
        assert_eq!(outputs.drive.pins(), (true, false));
        assert_eq!(outputs.drive.duty(), u16::MAX);
    }

    #[test]
    fn reverse_asserts_second_pin_at_full_duty() {
        let (mut motors, outputs) = testing::controller();
        motors.set_direction(MotorChannel::Drive, Direction::Reverse).unwrap();
        assert_eq!(outputs.drive.pins(), (false, true));
        assert_eq!(outputs.drive.duty(), u16::MAX);
    }

    #[test]
    fn steering_right_and_left_use_first_and_second_pin() {
        let (mut motors, outputs) = testing::controller();
        motors.set_direction(MotorChannel::Steering, Direction::Right).unwrap();
        assert_eq!(outputs.steering.pins(), (true, false));
        motors.set_direction(MotorChannel::Steering, Direction::Left).unwrap();
        assert_eq!(outputs.steering.pins(), (false, true));
        assert_eq!(outputs.steering.duty(), u16::MAX);
    }

    #[test]
    fn stop_clears_pins_and_duty() {
        let (mut motors, outputs) = testing::controller();
        motors.set_direction(MotorChannel::Drive, Direction::Forward).unwrap();
        motors.set_direction(MotorChannel::Drive, Direction::Stop).unwrap();
        assert_eq!(outputs.drive.pins(), (false, false));
        assert_eq!(outputs.drive.duty(), 0);
        assert_eq!(motors.direction(MotorChannel::Drive), Direction::Stop);
    }

    #[test]
    fn direction_from_the_other_axis_is_ignored() {
        let (mut motors, outputs) = testing::controller();
        motors.set_direction(MotorChannel::Drive, Direction::Forward).unwrap();
        motors.set_direction(MotorChannel::Drive, Direction::Left).unwrap();
        motors.set_direction(MotorChannel::Steering, Direction::Reverse).unwrap();
        assert_eq!(outputs.drive.pins(), (true, false));
        assert_eq!(outputs.steering.pins(), (false, false));
        assert_eq!(motors.direction(MotorChannel::Drive), Direction::Forward);
    }

    #[test]
    fn stop_all_stops_both_channels() {
        let (mut motors, outputs) = testing::controller();
        motors.set_direction(MotorChannel::Drive, Direction::Reverse).unwrap();
        motors.set_direction(MotorChannel::Steering, Direction::Left).unwrap();
        motors.stop_all().unwrap();
        assert!(outputs.drive.is_stopped());
        assert!(outputs.steering.is_stopped());
    }

    #[test]
    fn failed_output_keeps_previous_direction() {
        let (mut motors, outputs) = testing::controller();
        outputs.drive.fail_next_writes();
        assert_eq!(
            motors.set_direction(MotorChannel::Drive, Direction::Forward),
            Err(Error::Motor(MotorChannel::Drive))
        );
        assert_eq!(motors.direction(MotorChannel::Drive), Direction::Stop);
    }

    #[test]
    fn stop_all_still_stops_steering_when_drive_fails() {
        let (mut motors, outputs) = testing::controller();
        motors.set_direction(MotorChannel::Steering, Direction::Right).unwrap();
        outputs.drive.fail_next_writes();
        assert_eq!(motors.stop_all(), Err(Error::Motor(MotorChannel::Drive)));
        assert!(outputs.steering.is_stopped());
    }

    #[test]
    fn standby_pulls_pin_low() {
        let (mut motors, outputs) = testing::controller();
        motors.standby().unwrap();
        assert!(!outputs.standby.is_high());
    }

    #[test]
    fn reversing_never_asserts_both_pins() {
        let (mut motors, outputs) = testing::controller();
        motors.set_direction(MotorChannel::Drive, Direction::Reverse).unwrap();
        motors.set_direction(MotorChannel::Drive, Direction::Forward).unwrap();
        motors.set_direction(MotorChannel::Steering, Direction::Left).unwrap();
        motors.set_direction(MotorChannel::Steering, Direction::Right).unwrap();
        motors.set_direction(MotorChannel::Steering, Direction::Left).unwrap();

        assert!(!outputs.drive.pins_ever_overlapped());
        assert!(!outputs.steering.pins_ever_overlapped());
        assert_eq!(outputs.drive.pins(), (true, false));
        assert_eq!(outputs.steering.pins(), (false, true));
        assert_eq!(motors.direction(MotorChannel::Drive), Direction::Forward);
    }

    #[test]
    fn pwm_timing_fits_sixteen_bits() {
        // RP2350 default clk_sys
        assert_eq!(pwm_timing(150_000_000, 1_000), (3, 49_999));
        // RP2040 default clk_sys
        assert_eq!(pwm_timing(125_000_000, 1_000), (2, 62_499));
    }
}
