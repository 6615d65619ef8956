//! Connection Handler
//!
//! Serves exactly one request/response exchange per accepted connection,
//! strictly one connection at a time:
//!
//! 1. accept a connection
//! 2. take a single read of up to [`REQUEST_BUFFER_SIZE`] bytes
//! 3. dispatch the `/?command=` token if there is one
//! 4. write the fixed preamble and either the acknowledgement or the page
//! 5. close the connection, whatever happened in 2 to 4
//!
//! A [`QueuedListener`] keeps one more client waiting while an exchange runs.
//! Requests longer than the buffer are truncated, not read further. Each
//! exchange yields a `Result` that [`serve`] logs and drops, so one bad request
//! never stops the loop.

use embedded_io_async::{Error as _, Read, Write};

use crate::system::command::Command;
use crate::system::config::REQUEST_BUFFER_SIZE;
use crate::system::dispatch;
use crate::system::error::Error;
use crate::system::http::{self, Response};
use crate::system::motor::MotorControl;

/// Address and port of a connected peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Endpoint {
    pub address: [u8; 4],
    pub port: u16,
}

/// One accepted connection, used for a single exchange
pub trait Connection: Read + Write {
    /// Peer address, if the transport knows it
    fn remote(&self) -> Option<Endpoint>;

    /// Closes the connection; never fails from the caller's point of view
    async fn close(&mut self);
}

/// Source of connections
pub trait Listener {
    type Connection<'a>: Connection
    where
        Self: 'a;

    /// Waits for the next connection
    async fn accept(&mut self) -> Result<Self::Connection<'_>, Error>;
}

/// One listening socket behind a [`QueuedListener`]
pub trait Slot {
    type Connection<'a>: Connection
    where
        Self: 'a;

    /// Starts listening without waiting for a peer
    async fn listen(&mut self);

    /// Waits until a peer is connected, listening first if needed
    async fn connected(&mut self) -> Result<(), Error>;

    /// The connected peer
    fn connection(&mut self) -> Self::Connection<'_>;
}

/// Listener over two sockets taking turns
///
/// While one socket's connection is served, the other is already listening,
/// so a client arriving mid-exchange is held until the current connection is
/// closed instead of being refused. Connections are handed out strictly in
/// arrival order, one at a time.
pub struct QueuedListener<S> {
    slots: [S; 2],
    next: usize,
}

impl<S: Slot> QueuedListener<S> {
    pub fn new(first: S, second: S) -> Self {
        Self {
            slots: [first, second],
            next: 0,
        }
    }
}

impl<S: Slot> Listener for QueuedListener<S> {
    type Connection<'a>
        = S::Connection<'a>
    where
        Self: 'a;

    async fn accept(&mut self) -> Result<S::Connection<'_>, Error> {
        let current = self.next;
        let queued = 1 - current;
        self.slots[current].connected().await?;
        self.slots[queued].listen().await;
        self.next = queued;
        Ok(self.slots[current].connection())
    }
}

/// How an exchange ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Exchange {
    /// No command in the request; the control page was sent
    Page,
    /// A command was dispatched and acknowledged
    Dispatched(Command),
    /// The command token was unknown; acknowledged anyway
    Ignored,
}

/// Serves connections forever
pub async fn serve<L: Listener, C: MotorControl>(listener: &mut L, motors: &mut C) -> ! {
    info!("Serving control page");
    loop {
        match serve_next(listener, motors).await {
            Ok(exchange) => debug!("Exchange done: {}", exchange),
            Err(e) => warn!("Exchange failed: {}", e),
        }
    }
}

/// Accepts one connection, runs its exchange and closes it
///
/// Only returns once the connection is closed, so the next accept cannot
/// overlap with this exchange.
pub async fn serve_next<L: Listener, C: MotorControl>(listener: &mut L, motors: &mut C) -> Result<Exchange, Error> {
    let mut connection = listener.accept().await?;
    if let Some(peer) = connection.remote() {
        debug!(
            "Client {}.{}.{}.{}:{}",
            peer.address[0],
            peer.address[1],
            peer.address[2],
            peer.address[3],
            peer.port
        );
    }

    let result = exchange(&mut connection, motors).await;
    connection.close().await;
    result
}

async fn exchange<T: Connection, C: MotorControl>(connection: &mut T, motors: &mut C) -> Result<Exchange, Error> {
    let mut buffer = [0u8; REQUEST_BUFFER_SIZE];
    let len = connection
        .read(&mut buffer)
        .await
        .map_err(|e| Error::Read(e.kind()))?;
    if len == 0 {
        return Err(Error::EmptyRequest);
    }
    let request = core::str::from_utf8(&buffer[..len]).map_err(|_| Error::InvalidUtf8)?;

    let (outcome, response) = match http::command_token(request) {
        Some(token) => match dispatch::dispatch_token(motors, token)? {
            Some(command) => (Exchange::Dispatched(command), Response::Ack),
            None => (Exchange::Ignored, Response::Ack),
        },
        None => (Exchange::Page, Response::ControlPage),
    };

    write_response(connection, response).await?;
    Ok(outcome)
}

async fn write_response<T: Write>(connection: &mut T, response: Response) -> Result<(), Error> {
    connection
        .write_all(http::RESPONSE_HEAD.as_bytes())
        .await
        .map_err(|e| Error::Write(e.kind()))?;
    connection
        .write_all(response.body().as_bytes())
        .await
        .map_err(|e| Error::Write(e.kind()))?;
    connection.flush().await.map_err(|e| Error::Write(e.kind()))
}
