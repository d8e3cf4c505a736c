//! Kerberos client to request tickets from a KDC, over UDP or TCP, and
//! save them in krb or ccache files.

pub mod communication;
pub mod core;
pub mod error;

pub use error::{Error, Result};
