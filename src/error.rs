use kerberos_asn1::KrbError;
use kerberos_constants::error_codes;
use std::io;
use std::result;
use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    String(String),

    /// The KDC rejected the request.
    #[error("{}", create_krb_error_msg(.0))]
    KrbError(KrbError),

    /// Inconsistencies between the request and the KDC response, such as
    /// a different nonce or client name.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Errors due to IO, such as failures in network or file operations.
    #[error("{0}: {1}")]
    IOError(String, #[source] io::Error),

    /// No response was received in time from the KDC.
    #[error("{0}")]
    Timeout(String),

    /// The message is too big to be delivered in one datagram.
    #[error("Message of {size} bytes exceeds the UDP limit of {max} bytes")]
    SizeExceeded { size: usize, max: usize },

    /// Errors produced by decryption or wrong keys. They are not transient.
    #[error("{0}")]
    CryptoError(String),

    /// Errors related to handling of raw data, such as parsing, encrypting,
    /// etc.
    #[error("{0}")]
    DataError(String),
}

impl Error {
    pub fn is_not_found_error(&self) -> bool {
        if let Error::IOError(_, ref io_err) = self {
            return io_err.kind() == io::ErrorKind::NotFound;
        }
        return false;
    }

    pub fn is_data_error(&self) -> bool {
        if let Error::DataError(_) = self {
            return true;
        }
        return false;
    }

    /// The error code sent by the KDC, if this is a remote error.
    pub fn remote_error_code(&self) -> Option<i32> {
        if let Error::KrbError(krb_error) = self {
            return Some(krb_error.error_code);
        }
        return None;
    }

    pub fn is_response_too_big(&self) -> bool {
        return self.remote_error_code()
            == Some(error_codes::KRB_ERR_RESPONSE_TOO_BIG);
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        return Self::String(error);
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        return Self::String(error.to_string());
    }
}

impl From<KrbError> for Error {
    fn from(error: KrbError) -> Self {
        return Self::KrbError(error);
    }
}

impl From<(&str, io::Error)> for Error {
    fn from(error: (&str, io::Error)) -> Self {
        return Self::IOError(error.0.into(), error.1);
    }
}

impl From<(String, io::Error)> for Error {
    fn from(error: (String, io::Error)) -> Self {
        return Self::IOError(error.0, error.1);
    }
}

fn create_krb_error_msg(krb_error: &KrbError) -> String {
    let error_string = error_codes::error_code_to_string(krb_error.error_code);
    return format!("Error {}: {}", krb_error.error_code, error_string);
}
