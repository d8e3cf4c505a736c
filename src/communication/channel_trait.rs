use crate::communication::TransportProtocol;
use crate::error::{Error, Result};
use std::net::SocketAddr;

/// Biggest message sent in a single datagram. Bigger messages must be sent
/// over TCP.
pub const MAX_UDP_PAYLOAD: usize = 1465;

/// Trait implemented by classes which deliver Kerberos messages to a KDC.
/// The connection is kept open between calls, so a message can be sent
/// several times and the response read later.
pub trait KrbChannel {
    /// Sends a message, adding the framing required by the protocol
    fn send(&mut self, raw: &[u8]) -> Result<()>;

    /// Retrieves one message, without the framing
    fn recv(&mut self) -> Result<Vec<u8>>;

    fn protocol(&self) -> TransportProtocol;
    fn peer(&self) -> SocketAddr;
}

/// Datagrams are never split, so a message bigger than the limit is
/// rejected before touching the network.
pub fn check_udp_size(raw: &[u8]) -> Result<()> {
    if raw.len() > MAX_UDP_PAYLOAD {
        return Err(Error::SizeExceeded {
            size: raw.len(),
            max: MAX_UDP_PAYLOAD,
        });
    }
    return Ok(());
}
