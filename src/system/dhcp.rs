//! Minimal DHCP server for the access point
//!
//! Hands out addresses from a small pool so phones joining the car's network
//! get an address without manual setup. Only the DISCOVER/OFFER and
//! REQUEST/ACK exchanges are supported; leases are kept in a fixed-size table
//! keyed by client MAC and expire after the configured lease time.

use heapless::Vec;

pub const SERVER_PORT: u16 = 67;
pub const CLIENT_PORT: u16 = 68;

/// Most leases held at once
pub const MAX_LEASES: usize = 8;

const MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];
const OPTIONS_OFFSET: usize = 240;
/// Minimum BOOTP message length
const MIN_REPLY_LEN: usize = 300;

const OP_BOOTREQUEST: u8 = 1;
const OP_BOOTREPLY: u8 = 2;
const HTYPE_ETHERNET: u8 = 1;

const OPT_PAD: u8 = 0;
const OPT_SUBNET_MASK: u8 = 1;
const OPT_ROUTER: u8 = 3;
const OPT_BROADCAST: u8 = 28;
const OPT_REQUESTED_IP: u8 = 50;
const OPT_LEASE_TIME: u8 = 51;
const OPT_MESSAGE_TYPE: u8 = 53;
const OPT_SERVER_ID: u8 = 54;
const OPT_RENEWAL_TIME: u8 = 58;
const OPT_REBINDING_TIME: u8 = 59;
const OPT_END: u8 = 255;

const DHCP_OFFER: u8 = 2;
const DHCP_ACK: u8 = 5;
const DHCP_NAK: u8 = 6;

pub type Ipv4 = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    Discover,
    Request,
    Decline,
    Release,
    Inform,
    Other(u8),
}

impl From<u8> for MessageType {
    fn from(code: u8) -> Self {
        match code {
            1 => MessageType::Discover,
            3 => MessageType::Request,
            4 => MessageType::Decline,
            7 => MessageType::Release,
            8 => MessageType::Inform,
            other => MessageType::Other(other),
        }
    }
}

/// The fields of a BOOTREQUEST the server acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageType,
    pub transaction_id: u32,
    pub flags: u16,
    pub client_mac: [u8; 6],
    pub client_ip: Option<Ipv4>,
    pub requested_ip: Option<Ipv4>,
    pub server_id: Option<Ipv4>,
}

/// Parses a client frame; anything that is not an Ethernet BOOTREQUEST
/// carrying a message type is rejected
pub fn parse(frame: &[u8]) -> Option<Message> {
    if frame.len() < OPTIONS_OFFSET || frame[0] != OP_BOOTREQUEST {
        return None;
    }
    if frame[1] != HTYPE_ETHERNET || frame[2] != 6 {
        return None;
    }
    if frame[236..OPTIONS_OFFSET] != MAGIC_COOKIE {
        return None;
    }

    let mut kind = None;
    let mut requested_ip = None;
    let mut server_id = None;

    let mut idx = OPTIONS_OFFSET;
    while idx < frame.len() {
        let code = frame[idx];
        idx += 1;
        match code {
            OPT_PAD => continue,
            OPT_END => break,
            _ => {
                let len = *frame.get(idx)? as usize;
                idx += 1;
                let data = frame.get(idx..idx + len)?;
                match (code, data) {
                    (OPT_MESSAGE_TYPE, [value]) => kind = Some(MessageType::from(*value)),
                    (OPT_REQUESTED_IP, [a, b, c, d]) => requested_ip = Some([*a, *b, *c, *d]),
                    (OPT_SERVER_ID, [a, b, c, d]) => server_id = Some([*a, *b, *c, *d]),
                    _ => {}
                }
                idx += len;
            }
        }
    }

    let client_ip = [frame[12], frame[13], frame[14], frame[15]];
    let mut client_mac = [0u8; 6];
    client_mac.copy_from_slice(&frame[28..34]);

    Some(Message {
        kind: kind?,
        transaction_id: u32::from_be_bytes([frame[4], frame[5], frame[6], frame[7]]),
        flags: u16::from_be_bytes([frame[10], frame[11]]),
        client_mac,
        client_ip: (client_ip != [0; 4]).then_some(client_ip),
        requested_ip,
        server_id,
    })
}

/// What the server answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    Offer(Ipv4),
    Ack(Ipv4),
    Nak,
}

#[derive(Debug, Clone, Copy)]
struct Lease {
    mac: [u8; 6],
    ip: Ipv4,
    expires_at: u64,
}

pub struct DhcpServer {
    server_ip: Ipv4,
    netmask: Ipv4,
    pool_start: u32,
    pool_size: u8,
    lease_secs: u32,
    leases: Vec<Lease, MAX_LEASES>,
}

impl DhcpServer {
    pub fn new(server_ip: Ipv4, prefix_len: u8, pool_start: Ipv4, pool_size: u8, lease_secs: u32) -> Self {
        let mask = u32::MAX.checked_shl(32 - u32::from(prefix_len.min(32))).unwrap_or(0);
        Self {
            server_ip,
            netmask: mask.to_be_bytes(),
            pool_start: u32::from_be_bytes(pool_start),
            pool_size: pool_size.min(MAX_LEASES as u8),
            lease_secs,
            leases: Vec::new(),
        }
    }

    /// Handles one client frame received at `now_secs`
    ///
    /// Writes the reply into `out` and returns it with its length, or `None`
    /// when the frame needs no answer (malformed, released, addressed to
    /// another server, or the pool is exhausted).
    pub fn handle(&mut self, frame: &[u8], now_secs: u64, out: &mut [u8]) -> Option<(Reply, usize)> {
        let message = parse(frame)?;
        self.leases.retain(|lease| lease.expires_at > now_secs);

        let reply = match message.kind {
            MessageType::Discover => Reply::Offer(self.allocate(&message, now_secs)?),
            MessageType::Request => {
                if message.server_id.is_some_and(|id| id != self.server_ip) {
                    debug!("DHCP request for another server");
                    return None;
                }
                match message.requested_ip.or(message.client_ip) {
                    Some(ip) if !self.is_available(ip, message.client_mac) => Reply::Nak,
                    _ => Reply::Ack(self.allocate(&message, now_secs)?),
                }
            }
            MessageType::Decline | MessageType::Release => {
                self.leases.retain(|lease| lease.mac != message.client_mac);
                return None;
            }
            MessageType::Inform | MessageType::Other(_) => return None,
        };

        let len = self.build_reply(&message, reply, out)?;
        Some((reply, len))
    }

    /// Address currently leased to a client
    #[cfg(test)]
    pub fn lease_for(&self, mac: [u8; 6]) -> Option<Ipv4> {
        self.leases.iter().find(|lease| lease.mac == mac).map(|lease| lease.ip)
    }

    fn in_pool(&self, ip: Ipv4) -> bool {
        let value = u32::from_be_bytes(ip);
        value >= self.pool_start && value < self.pool_start + u32::from(self.pool_size)
    }

    fn is_available(&self, ip: Ipv4, mac: [u8; 6]) -> bool {
        self.in_pool(ip) && self.leases.iter().all(|lease| lease.mac == mac || lease.ip != ip)
    }

    /// Renews the client's lease, or creates one preferring the address it asked for
    fn allocate(&mut self, message: &Message, now_secs: u64) -> Option<Ipv4> {
        let mac = message.client_mac;
        let expires_at = now_secs + u64::from(self.lease_secs);
        let wanted = message
            .requested_ip
            .or(message.client_ip)
            .filter(|ip| self.is_available(*ip, mac));

        if let Some(lease) = self.leases.iter_mut().find(|lease| lease.mac == mac) {
            if let Some(ip) = wanted {
                lease.ip = ip;
            }
            lease.expires_at = expires_at;
            return Some(lease.ip);
        }

        let ip = match wanted {
            Some(ip) => ip,
            None => (0..self.pool_size)
                .map(|offset| (self.pool_start + u32::from(offset)).to_be_bytes())
                .find(|candidate| self.leases.iter().all(|lease| lease.ip != *candidate))?,
        };
        self.leases.push(Lease { mac, ip, expires_at }).ok()?;
        Some(ip)
    }

    fn build_reply(&self, message: &Message, reply: Reply, out: &mut [u8]) -> Option<usize> {
        if out.len() < MIN_REPLY_LEN {
            return None;
        }
        out.fill(0);
        out[0] = OP_BOOTREPLY;
        out[1] = HTYPE_ETHERNET;
        out[2] = 6;
        out[4..8].copy_from_slice(&message.transaction_id.to_be_bytes());
        out[10..12].copy_from_slice(&message.flags.to_be_bytes());
        out[20..24].copy_from_slice(&self.server_ip);
        out[28..34].copy_from_slice(&message.client_mac);
        out[236..OPTIONS_OFFSET].copy_from_slice(&MAGIC_COOKIE);

        let mut idx = OPTIONS_OFFSET;
        let (kind, offered) = match reply {
            Reply::Offer(ip) => (DHCP_OFFER, Some(ip)),
            Reply::Ack(ip) => (DHCP_ACK, Some(ip)),
            Reply::Nak => (DHCP_NAK, None),
        };
        idx += append_option(&mut out[idx..], OPT_MESSAGE_TYPE, &[kind])?;
        idx += append_option(&mut out[idx..], OPT_SERVER_ID, &self.server_ip)?;

        if let Some(ip) = offered {
            out[16..20].copy_from_slice(&ip);
            let renewal = self.lease_secs / 2;
            let rebinding = (u64::from(self.lease_secs) * 7 / 8) as u32;
            let broadcast = (u32::from_be_bytes(self.server_ip) | !u32::from_be_bytes(self.netmask)).to_be_bytes();
            idx += append_option(&mut out[idx..], OPT_LEASE_TIME, &self.lease_secs.to_be_bytes())?;
            idx += append_option(&mut out[idx..], OPT_RENEWAL_TIME, &renewal.to_be_bytes())?;
            idx += append_option(&mut out[idx..], OPT_REBINDING_TIME, &rebinding.to_be_bytes())?;
            idx += append_option(&mut out[idx..], OPT_SUBNET_MASK, &self.netmask)?;
            idx += append_option(&mut out[idx..], OPT_ROUTER, &self.server_ip)?;
            idx += append_option(&mut out[idx..], OPT_BROADCAST, &broadcast)?;
        }

        *out.get_mut(idx)? = OPT_END;
        Some((idx + 1).max(MIN_REPLY_LEN))
    }
}

fn append_option(dest: &mut [u8], code: u8, payload: &[u8]) -> Option<usize> {
    let needed = payload.len() + 2;
    let slot = dest.get_mut(..needed)?;
    slot[0] = code;
    slot[1] = payload.len() as u8;
    slot[2..].copy_from_slice(payload);
    Some(needed)
}
