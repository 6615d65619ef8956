//! Command dispatch
//!
//! Maps each command onto one or two motor channel changes. The page sends a
//! directional command when a button is pressed and the axis' neutral command
//! (`stop` or `center`) when it is released, so a motor only runs while its
//! button is held.

use crate::system::command::Command;
use crate::system::error::Error;
use crate::system::motor::{Direction, MotorChannel, MotorControl};

/// Applies a command to the motors
pub fn dispatch<C: MotorControl>(motors: &mut C, command: Command) -> Result<(), Error> {
    match command {
        Command::Forward => motors.set_direction(MotorChannel::Drive, Direction::Forward),
        Command::Reverse => motors.set_direction(MotorChannel::Drive, Direction::Reverse),
        Command::Left => motors.set_direction(MotorChannel::Steering, Direction::Left),
        Command::Right => motors.set_direction(MotorChannel::Steering, Direction::Right),
        Command::Center => motors.set_direction(MotorChannel::Steering, Direction::Stop),
        Command::Stop => motors.stop_all(),
    }
}

/// Parses and applies a raw token
///
/// Unknown tokens are dropped without touching the motors; the returned
/// option tells the caller whether anything was dispatched.
pub fn dispatch_token<C: MotorControl>(motors: &mut C, token: &str) -> Result<Option<Command>, Error> {
    let Some(command) = Command::parse(token) else {
        debug!("Ignoring unknown command token");
        return Ok(None);
    };
    debug!("Dispatching {}", command);
    dispatch(motors, command)?;
    Ok(Some(command))
}
