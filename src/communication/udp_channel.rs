use crate::communication::{check_udp_size, KrbChannel, TransportProtocol};
use crate::error::{Error, Result};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

/// Size of the buffer used to receive a datagram
const RECV_BUFFER_SIZE: usize = 4096;

/// Send Kerberos messages over UDP, one message per datagram
#[derive(Debug)]
pub struct UdpChannel {
    socket: UdpSocket,
    dst_addr: SocketAddr,
}

impl UdpChannel {
    /// Creates a socket connected to the KDC. The read timeout prevents
    /// waiting forever for a lost response.
    pub fn connect(dst_addr: SocketAddr, read_timeout: Duration) -> Result<Self> {
        let bind_addr = match dst_addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };

        let socket = UdpSocket::bind(SocketAddr::new(bind_addr, 0))
            .map_err(|err| ("Unable to create UDP socket", err))?;
        socket.connect(dst_addr).map_err(|err| {
            (format!("Unable to connect with {} over UDP", dst_addr), err)
        })?;
        socket
            .set_read_timeout(Some(read_timeout))
            .map_err(|err| ("Unable to set UDP read timeout", err))?;

        return Ok(Self { socket, dst_addr });
    }
}

impl KrbChannel for UdpChannel {
    fn send(&mut self, raw: &[u8]) -> Result<()> {
        check_udp_size(raw)?;
        self.socket
            .send(raw)
            .map_err(|err| ("Error sending message over UDP", err))?;
        return Ok(());
    }

    fn recv(&mut self) -> Result<Vec<u8>> {
        let mut raw_response = vec![0; RECV_BUFFER_SIZE];
        let data_length = self.socket.recv(&mut raw_response).map_err(
            |err| match err.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                    Error::Timeout(format!(
                        "No UDP response from {}",
                        self.dst_addr
                    ))
                }
                _ => ("Error receiving UDP response", err).into(),
            },
        )?;

        raw_response.truncate(data_length);
        return Ok(raw_response);
    }

    fn protocol(&self) -> TransportProtocol {
        return TransportProtocol::UDP;
    }

    fn peer(&self) -> SocketAddr {
        return self.dst_addr;
    }
}
