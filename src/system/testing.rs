//! Fake H-bridge outputs for host tests.
//!
//! Pins and PWM outputs write into shared cells so a test can keep reading
//! them after they have been moved into a `MotorController`. Direction pins
//! check their sibling on every write, so a moment with both pins high is
//! caught even if a later write clears it.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use tb6612fng::Motor;

use crate::system::motor::MotorController;

#[derive(Clone, Default)]
pub struct Line {
    level: Rc<Cell<u16>>,
    fail: Rc<Cell<bool>>,
}

impl Line {
    pub fn is_high(&self) -> bool {
        self.level.get() != 0
    }
}

pub struct FakePin {
    line: Line,
    sibling: Option<Line>,
    overlapped: Rc<Cell<bool>>,
}

impl FakePin {
    fn standalone(line: Line) -> Self {
        Self {
            line,
            sibling: None,
            overlapped: Rc::default(),
        }
    }
}

impl digital::ErrorType for FakePin {
    type Error = digital::ErrorKind;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.line.fail.get() {
            return Err(digital::ErrorKind::Other);
        }
        self.line.level.set(0);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.line.fail.get() {
            return Err(digital::ErrorKind::Other);
        }
        self.line.level.set(1);
        if self.sibling.as_ref().is_some_and(Line::is_high) {
            self.overlapped.set(true);
        }
        Ok(())
    }
}

pub struct FakePwm(Line);

impl pwm::ErrorType for FakePwm {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for FakePwm {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.0.fail.get() {
            return Err(pwm::ErrorKind::Other);
        }
        self.0.level.set(duty);
        Ok(())
    }
}

/// Read side of one fake channel
#[derive(Clone, Default)]
pub struct ChannelOutputs {
    in1: Line,
    in2: Line,
    pwm: Line,
    overlapped: Rc<Cell<bool>>,
}

impl ChannelOutputs {
    pub fn pins(&self) -> (bool, bool) {
        (self.in1.is_high(), self.in2.is_high())
    }

    pub fn duty(&self) -> u16 {
        self.pwm.level.get()
    }

    pub fn is_stopped(&self) -> bool {
        self.pins() == (false, false) && self.duty() == 0
    }

    /// True if both direction pins were ever high at the same moment
    pub fn pins_ever_overlapped(&self) -> bool {
        self.overlapped.get()
    }

    /// Makes every output of this channel report an error from now on
    pub fn fail_next_writes(&self) {
        self.in1.fail.set(true);
        self.in2.fail.set(true);
        self.pwm.fail.set(true);
    }

    /// Both direction pins were never asserted together, and the duty cycle
    /// is zero exactly when neither is asserted
    pub fn holds_invariant(&self) -> bool {
        let (in1, in2) = self.pins();
        !self.pins_ever_overlapped() && ((self.duty() == 0) == (!in1 && !in2))
    }

    fn pin(&self, line: &Line, sibling: &Line) -> FakePin {
        FakePin {
            line: line.clone(),
            sibling: Some(sibling.clone()),
            overlapped: self.overlapped.clone(),
        }
    }

    fn motor(&self) -> FakeMotor {
        match Motor::new(
            self.pin(&self.in1, &self.in2),
            self.pin(&self.in2, &self.in1),
            FakePwm(self.pwm.clone()),
        ) {
            Ok(motor) => motor,
            Err(_) => panic!("fake motor construction failed"),
        }
    }
}

pub type FakeMotor = Motor<FakePin, FakePin, FakePwm>;

pub type FakeController = MotorController<FakePin, FakePin, FakePwm, FakePin, FakePin, FakePwm, FakePin>;

pub struct Outputs {
    pub drive: ChannelOutputs,
    pub steering: ChannelOutputs,
    pub standby: Line,
}

impl Outputs {
    pub fn snapshot(&self) -> [(bool, bool, u16); 2] {
        [
            (self.drive.pins().0, self.drive.pins().1, self.drive.duty()),
            (self.steering.pins().0, self.steering.pins().1, self.steering.duty()),
        ]
    }
}

/// A controller over fake outputs, plus a handle reading those outputs
pub fn controller() -> (FakeController, Outputs) {
    let outputs = Outputs {
        drive: ChannelOutputs::default(),
        steering: ChannelOutputs::default(),
        standby: Line::default(),
    };
    let motors = match MotorController::new(
        outputs.drive.motor(),
        outputs.steering.motor(),
        FakePin::standalone(outputs.standby.clone()),
    ) {
        Ok(motors) => motors,
        Err(e) => panic!("fake controller construction failed: {e}"),
    };
    (motors, outputs)
}
