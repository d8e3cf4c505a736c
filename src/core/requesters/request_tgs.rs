use super::exchange::KdcExchange;
use crate::core::forge::{principal_name_to_string, principal_names_match};
use crate::core::request::KdcRequest;
use crate::core::{KrbUser, TicketCred};
use crate::error::Result;
use kerberos_asn1::PrincipalName;
use log::{debug, warn};

/// Use a TGT to request a TGS for the service. In case the KDC returns a
/// referral ticket for other realm, it is returned as is.
pub fn request_tgs(
    user: KrbUser,
    service: PrincipalName,
    tgt: TicketCred,
    exchange: &KdcExchange,
) -> Result<TicketCred> {
    let request = KdcRequest::new_tgs_req(user, service, tgt);
    let tgs = exchange.request(&request)?;

    if !principal_names_match(tgs.service(), &request.service) {
        warn!(
            "Requested ticket for {} but received {}",
            principal_name_to_string(&request.service),
            tgs.principal()
        );
    } else {
        debug!("{} TGS for {}", tgs.principal(), request.user);
    }

    return Ok(tgs);
}
