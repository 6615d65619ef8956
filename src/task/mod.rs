pub mod access_point;
pub mod dhcp_server;
pub mod http;
pub mod motor;
pub mod resources;
pub mod stop_switch;
pub mod wifi;
