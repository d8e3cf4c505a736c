//! Module to provide means to transport Kerberos messages
//!

mod channel_trait;
pub use channel_trait::{check_udp_size, KrbChannel, MAX_UDP_PAYLOAD};

mod tcp_channel;
pub use tcp_channel::{TcpChannel, MAX_TCP_RESPONSE_SIZE};

mod udp_channel;
pub use udp_channel::UdpChannel;

mod kdccomm;
pub use kdccomm::{KdcComm, KdcLocator, Kdcs, DEFAULT_KDC_PORT};

use std::fmt;

/// Transport protocols available to send Kerberos messages
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum TransportProtocol {
    TCP,
    UDP,
}

impl TransportProtocol {
    /// Label used in the DNS SRV records of the KDCs.
    pub fn srv_label(&self) -> &'static str {
        match self {
            Self::TCP => "_tcp",
            Self::UDP => "_udp",
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TCP => write!(f, "tcp"),
            Self::UDP => write!(f, "udp"),
        }
    }
}
