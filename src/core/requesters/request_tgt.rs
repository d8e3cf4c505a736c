use super::exchange::KdcExchange;
use crate::core::request::KdcRequest;
use crate::core::{Cipher, KrbUser, TicketCred};
use crate::error::Result;
use log::debug;

/// Uses user credentials to request a TGT
pub fn request_tgt(
    user: KrbUser,
    cipher: Cipher,
    exchange: &KdcExchange,
) -> Result<TicketCred> {
    let request = KdcRequest::new_as_req(user, cipher);
    let tgt = exchange.request(&request)?;

    debug!(
        "TGT for {} valid until {}",
        request.user,
        tgt.expiry_time()
    );
    return Ok(tgt);
}
