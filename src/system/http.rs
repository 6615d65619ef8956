//! Minimal HTTP helpers
//!
//! Not a general HTTP implementation: the only thing read from a request is
//! the token after `/?command=`, and every response is a 200 with a fixed
//! preamble and `Connection: close`.

/// Marks a command query in the request line
pub const COMMAND_MARKER: &str = "/?command=";

/// Status line and headers sent ahead of every body
pub const RESPONSE_HEAD: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";

/// Body returned for any command request
pub const ACK_BODY: &str = "OK";

/// The control page served for requests without a command
pub const CONTROL_PAGE: &str = include_str!("control_page.html");

/// Token between the command marker and the next whitespace
///
/// If the request was cut off before any whitespace, the token runs to the
/// end of the buffer.
pub fn command_token(request: &str) -> Option<&str> {
    let (_, rest) = request.split_once(COMMAND_MARKER)?;
    let end = rest
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// The two bodies the server can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Ack,
    ControlPage,
}

impl Response {
    pub fn body(self) -> &'static str {
        match self {
            Response::Ack => ACK_BODY,
            Response::ControlPage => CONTROL_PAGE,
        }
    }
}
