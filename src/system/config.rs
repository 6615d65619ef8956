//! Fixed configuration
//!
//! Network credentials, addressing and timing constants. Nothing here is
//! editable at runtime; SSID, passphrase and channel can be overridden at
//! build time through `RC_CAR_AP_SSID`, `RC_CAR_AP_PASSWORD` and
//! `RC_CAR_AP_CHANNEL`.

use crate::system::error::Error;

/// Access point name unless overridden at build time
pub const DEFAULT_SSID: &str = "RC-Car";

/// WPA2 passphrase unless overridden at build time
pub const DEFAULT_PASSWORD: &str = "12345678";

/// WiFi channel unless overridden at build time
pub const DEFAULT_CHANNEL: u8 = 6;

/// Address of the car on its own network
pub const AP_ADDRESS: [u8; 4] = [192, 168, 4, 1];

/// Prefix length of the access point subnet
pub const AP_PREFIX_LEN: u8 = 24;

/// Port the control page is served on
pub const HTTP_PORT: u16 = 80;

/// Size of the single read taken from each connection
pub const REQUEST_BUFFER_SIZE: usize = 1024;

/// Pause between the access point coming up and serving
pub const SETTLE_DELAY_MS: u64 = 2_000;

/// PWM carrier frequency for both motor channels
pub const PWM_FREQUENCY_HZ: u32 = 1_000;

/// Duty cycle used for any movement, in percent
pub const FULL_SPEED: u8 = 100;

/// First address handed out to clients
pub const DHCP_POOL_START: [u8; 4] = [192, 168, 4, 2];

/// Number of addresses in the client pool
pub const DHCP_POOL_SIZE: u8 = 8;

/// Lease duration handed to clients
pub const DHCP_LEASE_SECS: u32 = 2 * 60 * 60;

/// Access point credentials and radio channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ApConfig {
    pub ssid: &'static str,
    pub password: &'static str,
    pub channel: u8,
}

impl Default for ApConfig {
    fn default() -> Self {
        Self {
            ssid: DEFAULT_SSID,
            password: DEFAULT_PASSWORD,
            channel: DEFAULT_CHANNEL,
        }
    }
}

impl ApConfig {
    /// Defaults, with any build-time overrides applied
    pub fn from_build_env() -> Self {
        Self {
            ssid: option_env!("RC_CAR_AP_SSID").unwrap_or(DEFAULT_SSID),
            password: option_env!("RC_CAR_AP_PASSWORD").unwrap_or(DEFAULT_PASSWORD),
            channel: parse_channel(option_env!("RC_CAR_AP_CHANNEL")),
        }
    }

    /// An empty passphrase starts an open network
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }

    /// Checks the passphrase length WPA2 accepts
    pub fn validate(&self) -> Result<(), Error> {
        let len = self.password.len();
        if self.is_open() || (8..=63).contains(&len) {
            Ok(())
        } else {
            Err(Error::InvalidPassword(len))
        }
    }
}

/// Parses a channel override, falling back to the default outside 1..=13
pub fn parse_channel(raw: Option<&str>) -> u8 {
    raw.and_then(|raw| raw.trim().parse::<u8>().ok())
        .filter(|channel| (1..=13).contains(channel))
        .unwrap_or(DEFAULT_CHANNEL)
}
