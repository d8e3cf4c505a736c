use crate::communication::{KrbChannel, TransportProtocol};
use crate::error::{Error, Result};
use std::io;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Largest response accepted from the KDC over TCP
pub const MAX_TCP_RESPONSE_SIZE: usize = 1 << 20;

/// Send Kerberos messages over TCP. Each message is preceded by its
/// length as a 4 bytes big endian integer.
#[derive(Debug)]
pub struct TcpChannel {
    stream: TcpStream,
    dst_addr: SocketAddr,
}

impl TcpChannel {
    pub fn connect(dst_addr: SocketAddr, read_timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect_timeout(&dst_addr, Duration::new(5, 0))
            .map_err(|err| {
                (format!("Unable to connect with {} over TCP", dst_addr), err)
            })?;
        stream
            .set_read_timeout(Some(read_timeout))
            .map_err(|err| ("Unable to set TCP read timeout", err))?;

        return Ok(Self { stream, dst_addr });
    }
}

impl KrbChannel for TcpChannel {
    fn send(&mut self, raw: &[u8]) -> Result<()> {
        let raw_sized_request = set_size_header_to_request(raw);
        self.stream
            .write_all(&raw_sized_request)
            .map_err(|err| ("Error sending message over TCP", err))?;
        return Ok(());
    }

    fn recv(&mut self) -> Result<Vec<u8>> {
        return read_sized_response(&mut self.stream);
    }

    fn protocol(&self) -> TransportProtocol {
        return TransportProtocol::TCP;
    }

    fn peer(&self) -> SocketAddr {
        return self.dst_addr;
    }
}

fn map_recv_error(err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            Error::Timeout(format!("Timeout receiving TCP response: {}", err))
        }
        _ => ("Error receiving TCP response", err).into(),
    }
}

fn set_size_header_to_request(raw_request: &[u8]) -> Vec<u8> {
    let request_length = raw_request.len() as u32;
    let mut raw_sized_request: Vec<u8> = request_length.to_be_bytes().to_vec();
    raw_sized_request.extend_from_slice(raw_request);

    return raw_sized_request;
}

fn read_sized_response<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_data_bytes = [0 as u8; 4];
    reader.read_exact(&mut len_data_bytes).map_err(map_recv_error)?;
    let data_length = u32::from_be_bytes(len_data_bytes) as usize;

    if data_length > MAX_TCP_RESPONSE_SIZE {
        return Err(Error::DataError(format!(
            "TCP response of {} bytes is bigger than the maximum of {}",
            data_length, MAX_TCP_RESPONSE_SIZE
        )));
    }

    let mut raw_response: Vec<u8> = vec![0; data_length];
    reader.read_exact(&mut raw_response).map_err(map_recv_error)?;

    return Ok(raw_response);
}
