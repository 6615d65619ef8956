//! Command Module
//!
//! The fixed set of tokens the control page sends. Parsing never fails:
//! anything outside the set is simply not a command.

/// Commands accepted from the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Drive motor forward
    Forward,
    /// Drive motor in reverse
    Reverse,
    /// Steering motor to the left
    Left,
    /// Steering motor to the right
    Right,
    /// Steering back to neutral, drive untouched
    Center,
    /// Both motors off
    Stop,
}

impl Command {
    /// Every command, in the order the page lists them
    pub const ALL: [Command; 6] = [
        Command::Forward,
        Command::Reverse,
        Command::Left,
        Command::Right,
        Command::Center,
        Command::Stop,
    ];

    /// Maps a query token to a command; tokens are case-sensitive
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.as_str() == token)
    }

    /// The token the control page sends for this command
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Forward => "forward",
            Command::Reverse => "reverse",
            Command::Left => "left",
            Command::Right => "right",
            Command::Center => "center",
            Command::Stop => "stop",
        }
    }
}
