mod cipher;
pub use cipher::{generate_cipher_and_key, Cipher};

pub mod forge;
pub use forge::KrbUser;

mod cred_format;
pub use cred_format::CredFormat;

mod cred_file;
pub use cred_file::{
    load_file_creds, load_file_krb_cred, load_file_ticket_creds,
    save_file_creds,
};

pub mod request;
pub use request::{KdcRequest, RequestBasis, RequestStamp};

pub mod requesters;
pub use requesters::{request_tgs, request_tgt, ExchangeConfig, KdcExchange};

pub mod sequence;
pub use sequence::SequenceGenerator;

mod ticket_cred;
pub use ticket_cred::{TicketCred, TicketCreds};

#[cfg(test)]
pub mod testkdc;
