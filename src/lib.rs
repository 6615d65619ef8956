//! RC car control core
//!
//! Hardware-independent half of the firmware: command parsing, motor
//! direction logic, the single-connection HTTP exchange and the DHCP lease
//! logic. Everything here is generic over `embedded-hal` and
//! `embedded-io-async` traits so it can be tested on the host.
//!
//! The firmware binary (`src/main.rs`, feature `firmware`) wires these pieces
//! to the RP2350, the CYW43 radio and embassy-net.

#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

#[macro_use]
mod fmt;

/// Core system components
pub mod system;
