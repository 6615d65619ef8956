//! DHCP server task
//!
//! Answers DHCP on the access point so clients get an address in the car's
//! subnet. Replies are broadcast since clients have no address yet.

use defmt::{debug, info, trace, unwrap, warn};
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpAddress, Ipv4Address, Stack};
use embassy_time::Instant;
use rc_car::system::config::{AP_ADDRESS, AP_PREFIX_LEN, DHCP_LEASE_SECS, DHCP_POOL_SIZE, DHCP_POOL_START};
use rc_car::system::dhcp::{DhcpServer, Reply, CLIENT_PORT, SERVER_PORT};

const FRAME_SIZE: usize = 768;
const REPLY_SIZE: usize = 576;

#[embassy_executor::task]
pub async fn dhcp_server(stack: Stack<'static>) -> ! {
    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buffer = [0u8; FRAME_SIZE];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buffer = [0u8; FRAME_SIZE];
    let mut socket = UdpSocket::new(stack, &mut rx_meta, &mut rx_buffer, &mut tx_meta, &mut tx_buffer);
    unwrap!(socket.bind(SERVER_PORT));

    let mut server = DhcpServer::new(AP_ADDRESS, AP_PREFIX_LEN, DHCP_POOL_START, DHCP_POOL_SIZE, DHCP_LEASE_SECS);
    info!("DHCP server listening on port {}", SERVER_PORT);

    let mut frame = [0u8; FRAME_SIZE];
    let mut reply = [0u8; REPLY_SIZE];
    loop {
        let (len, meta) = match socket.recv_from(&mut frame).await {
            Ok(received) => received,
            Err(e) => {
                warn!("DHCP receive error: {:?}", e);
                continue;
            }
        };

        let Some((answer, reply_len)) = server.handle(&frame[..len], Instant::now().as_secs(), &mut reply) else {
            trace!("No DHCP reply for frame from {:?}", meta.endpoint);
            continue;
        };

        let destination = (IpAddress::Ipv4(Ipv4Address::BROADCAST), CLIENT_PORT);
        match socket.send_to(&reply[..reply_len], destination).await {
            Ok(()) => match answer {
                Reply::Offer(ip) => debug!("DHCP offer {}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]),
                Reply::Ack(ip) => info!("DHCP lease {}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]),
                Reply::Nak => debug!("DHCP nak"),
            },
            Err(e) => warn!("DHCP send error: {:?}", e),
        }
    }
}
