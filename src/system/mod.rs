//! Core system components for the RC car
pub mod command;
pub mod config;
pub mod dhcp;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod motor;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;
