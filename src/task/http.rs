//! TCP transport for the control page server
//!
//! Two sockets on the HTTP port take turns: while one serves a connection the
//! other is listening, so a second client waits instead of being reset. Each
//! socket has its own statically allocated buffers and is reused for every
//! connection it takes.

use defmt::{debug, warn};
use embassy_futures::select::{select, Either};
use embassy_net::tcp::{self, State, TcpSocket};
use embassy_net::{IpAddress, Stack};
use embassy_time::{with_timeout, Duration, Timer};
use embedded_io_async::{ErrorType, Read, Write};
use rc_car::system::error::Error;
use rc_car::system::server::{Connection, Endpoint, QueuedListener, Slot};
use static_cell::StaticCell;

/// Pause after a failed accept before trying again
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Poll interval while a handshake is in progress
const HANDSHAKE_POLL: Duration = Duration::from_millis(10);

/// Upper bound on waiting for the peer to acknowledge our FIN
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

const RX_BUFFER_SIZE: usize = 1536;
const TX_BUFFER_SIZE: usize = 2048;

pub struct SocketBuffers {
    rx: [u8; RX_BUFFER_SIZE],
    tx: [u8; TX_BUFFER_SIZE],
}

impl SocketBuffers {
    const fn new() -> Self {
        Self {
            rx: [0; RX_BUFFER_SIZE],
            tx: [0; TX_BUFFER_SIZE],
        }
    }
}

/// The HTTP listener on real hardware
pub type TcpListener = QueuedListener<TcpSlot>;

/// Builds the listener; may only be called once
pub fn listener(stack: Stack<'static>, port: u16) -> TcpListener {
    static BUFFERS: StaticCell<[SocketBuffers; 2]> = StaticCell::new();
    let [first, second] = BUFFERS.init([SocketBuffers::new(), SocketBuffers::new()]);
    QueuedListener::new(TcpSlot::new(stack, port, first), TcpSlot::new(stack, port, second))
}

pub struct TcpSlot {
    socket: TcpSocket<'static>,
    port: u16,
}

impl TcpSlot {
    fn new(stack: Stack<'static>, port: u16, buffers: &'static mut SocketBuffers) -> Self {
        let SocketBuffers { rx, tx } = buffers;
        Self {
            socket: TcpSocket::new(stack, rx, tx),
            port,
        }
    }
}

impl Slot for TcpSlot {
    type Connection<'a> = TcpConnection<'a>;

    async fn listen(&mut self) {
        // Polling accept once puts the socket into Listen; the handshake
        // then completes in the stack without this future
        if let Either::First(Err(e)) = select(self.socket.accept(self.port), core::future::ready(())).await {
            warn!("could not listen for the next client: {:?}", e);
        }
    }

    async fn connected(&mut self) -> Result<(), Error> {
        loop {
            match self.socket.state() {
                State::Closed | State::Listen => {
                    if let Err(e) = self.socket.accept(self.port).await {
                        warn!("accept error: {:?}", e);
                        self.socket.abort();
                        Timer::after(ACCEPT_RETRY_DELAY).await;
                        return Err(Error::Accept);
                    }
                    return Ok(());
                }
                State::SynReceived => Timer::after(HANDSHAKE_POLL).await,
                _ => return Ok(()),
            }
        }
    }

    fn connection(&mut self) -> TcpConnection<'_> {
        TcpConnection {
            socket: &mut self.socket,
        }
    }
}

pub struct TcpConnection<'a> {
    socket: &'a mut TcpSocket<'static>,
}

impl ErrorType for TcpConnection<'_> {
    type Error = tcp::Error;
}

impl Read for TcpConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.socket.read(buf).await
    }
}

impl Write for TcpConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket.flush().await
    }
}

impl Connection for TcpConnection<'_> {
    fn remote(&self) -> Option<Endpoint> {
        let endpoint = self.socket.remote_endpoint()?;
        #[allow(unreachable_patterns)]
        match endpoint.addr {
            IpAddress::Ipv4(address) => Some(Endpoint {
                address: address.octets(),
                port: endpoint.port,
            }),
            _ => None,
        }
    }

    /// Sends FIN and waits briefly for it to be acknowledged, then resets the
    /// socket so it can listen again
    async fn close(&mut self) {
        if let Err(e) = self.socket.flush().await {
            debug!("flush before close failed: {:?}", e);
        }
        self.socket.close();
        if with_timeout(CLOSE_TIMEOUT, self.socket.flush()).await.is_err() {
            debug!("peer did not acknowledge close");
        }
        self.socket.abort();
    }
}
