use super::kdc_req::{build_req_body, KdcReqBuilder};
use super::pa_data::{new_pa_data_ap_req, new_pa_data_encrypted_timestamp};
use super::principal_name::new_nt_principal;
use crate::core::request::{KdcRequest, RequestBasis, RequestStamp};
use crate::core::{Cipher, TicketCred};
use crate::error::Result;
use kerberos_asn1::{AsReq, Asn1Object, TgsReq};

/// Builds the raw message for the request, AS-REQ or TGS-REQ depending on
/// the credentials of the request.
pub fn build_kdc_req(
    request: &KdcRequest,
    stamp: &RequestStamp,
) -> Result<Vec<u8>> {
    match &request.basis {
        RequestBasis::UserKey(cipher) => {
            return Ok(build_as_req(request, cipher, stamp).build());
        }
        RequestBasis::Tgt(tgt) => {
            return Ok(build_tgs_req(request, tgt, stamp)?.build());
        }
    }
}

fn new_kdc_req_builder(
    request: &KdcRequest,
    stamp: &RequestStamp,
) -> KdcReqBuilder {
    return KdcReqBuilder::new(
        request.service_realm.clone(),
        stamp.nonce,
        request.till,
    )
    .cname(Some(new_nt_principal(&request.user.name)))
    .sname(Some(request.service.clone()))
    .kdc_options(request.kdc_options)
    .etypes(request.etypes.clone())
    .rtime(request.renew_till);
}

/// Helper to craft an AS-REQ message with an encrypted timestamp, so the
/// KDC does not need to ask for preauthentication.
pub fn build_as_req(
    request: &KdcRequest,
    cipher: &Cipher,
    stamp: &RequestStamp,
) -> AsReq {
    return new_kdc_req_builder(request, stamp)
        .push_padata(new_pa_data_encrypted_timestamp(cipher, stamp))
        .build_as_req();
}

/// Helper to craft a TGS-REQ message that includes an AP-REQ with the
/// ticket and an authenticator bound to the request body.
pub fn build_tgs_req(
    request: &KdcRequest,
    tgt: &TicketCred,
    stamp: &RequestStamp,
) -> Result<TgsReq> {
    let mut kdc_req = new_kdc_req_builder(request, stamp).build();
    let raw_req_body = build_req_body(&kdc_req);

    let session_cipher = tgt.session_cipher()?;
    let padata = new_pa_data_ap_req(
        &request.user,
        tgt.ticket_bytes(),
        &session_cipher,
        &raw_req_body,
        stamp,
    )?;
    kdc_req.padata = Some(vec![padata]);

    return Ok(kdc_req.into());
}
