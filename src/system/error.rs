//! Error type shared by the control core and the firmware glue.

use core::fmt;

use embedded_io_async::ErrorKind;

use crate::system::motor::MotorChannel;

/// Everything that can end an exchange or abort startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The listening socket failed to accept a connection
    Accept,
    /// Reading the request failed
    Read(ErrorKind),
    /// Writing the response failed
    Write(ErrorKind),
    /// The peer closed the connection without sending anything
    EmptyRequest,
    /// The request bytes are not valid UTF-8
    InvalidUtf8,
    /// An H-bridge channel rejected a command
    Motor(MotorChannel),
    /// The driver could not enter or leave standby
    Standby,
    /// WPA2 passphrases must be 8 to 63 bytes long
    InvalidPassword(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Accept => write!(f, "accept failed"),
            Error::Read(kind) => write!(f, "read failed: {:?}", kind),
            Error::Write(kind) => write!(f, "write failed: {:?}", kind),
            Error::EmptyRequest => write!(f, "connection closed before a request arrived"),
            Error::InvalidUtf8 => write!(f, "request is not valid UTF-8"),
            Error::Motor(channel) => write!(f, "{:?} motor output failed", channel),
            Error::Standby => write!(f, "standby switch failed"),
            Error::InvalidPassword(len) => {
                write!(f, "passphrase has {} bytes, expected 8 to 63", len)
            }
        }
    }
}
