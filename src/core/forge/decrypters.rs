use super::principal_name::{
    new_nt_principal, principal_name_to_string, principal_names_match,
};
use crate::core::request::{KdcRequest, RequestBasis, RequestStamp};
use crate::core::requesters::KdcRepParts;
use crate::core::{Cipher, KrbUser, TicketCred};
use crate::error::{Error, Result};
use kerberos_asn1::{
    Asn1Object, EncAsRepPart, EncKdcRepPart, EncTgsRepPart, EncryptedData,
};
use kerberos_constants::key_usages;
use log::debug;

/// Checks that the response is for the user of the request, decrypts it and
/// returns the ticket with its session key.
pub fn extract_ticket_cred(
    rep: KdcRepParts,
    request: &KdcRequest,
    stamp: &RequestStamp,
) -> Result<TicketCred> {
    check_rep_client(&rep, &request.user)?;

    let raw_enc_part = match &request.basis {
        RequestBasis::UserKey(cipher) => {
            decrypt_as_rep_enc_part(cipher, &rep.enc_part)?
        }
        RequestBasis::Tgt(tgt) => {
            decrypt_tgs_rep_enc_part(&tgt.session_cipher()?, &rep.enc_part)?
        }
    };

    let enc_part = parse_enc_kdc_rep_part(&raw_enc_part)?;
    check_enc_kdc_rep_part(&enc_part, request, stamp)?;

    return TicketCred::from_kdc_rep(&request.user, rep.raw_ticket, enc_part);
}

fn check_rep_client(rep: &KdcRepParts, user: &KrbUser) -> Result<()> {
    if rep.crealm != user.realm {
        return Err(Error::ProtocolError(format!(
            "Response for realm '{}' instead of '{}'",
            rep.crealm, user.realm
        )));
    }

    if !principal_names_match(&rep.cname, &new_nt_principal(&user.name)) {
        return Err(Error::ProtocolError(format!(
            "Response for client '{}' instead of '{}'",
            principal_name_to_string(&rep.cname),
            user.name
        )));
    }

    return Ok(());
}

/// The returned service may be different than the requested one, which
/// happens when the KDC gives a referral TGT for other realm. The caller
/// must handle it.
fn check_enc_kdc_rep_part(
    enc_part: &EncKdcRepPart,
    request: &KdcRequest,
    stamp: &RequestStamp,
) -> Result<()> {
    if enc_part.nonce != stamp.nonce {
        return Err(Error::ProtocolError(format!(
            "Response nonce {} does not match request nonce {}",
            enc_part.nonce, stamp.nonce
        )));
    }

    if enc_part.srealm != request.service_realm {
        return Err(Error::ProtocolError(format!(
            "Response for service realm '{}' instead of '{}'",
            enc_part.srealm, request.service_realm
        )));
    }

    if !principal_names_match(&enc_part.sname, &request.service) {
        debug!(
            "Requested {} but KDC returned {}",
            principal_name_to_string(&request.service),
            principal_name_to_string(&enc_part.sname)
        );
    }

    return Ok(());
}

/// Active Directory uses the EncTgsRepPart tag also in AS-REP, so both
/// are accepted.
fn parse_enc_kdc_rep_part(raw: &[u8]) -> Result<EncKdcRepPart> {
    if let Ok((_, enc_as_rep_part)) = EncAsRepPart::parse(raw) {
        return Ok(enc_as_rep_part.into());
    }

    let (_, enc_tgs_rep_part) = EncTgsRepPart::parse(raw).map_err(|_| {
        Error::DataError(format!("Error parsing EncKdcRepPart"))
    })?;
    return Ok(enc_tgs_rep_part.into());
}

/// Decrypts the AS-REP enc-part by using the user key
pub fn decrypt_as_rep_enc_part(
    cipher: &Cipher,
    enc_part: &EncryptedData,
) -> Result<Vec<u8>> {
    check_etype(cipher, enc_part)?;
    return cipher
        .decrypt(key_usages::KEY_USAGE_AS_REP_ENC_PART, &enc_part.cipher)
        .map_err(|error| {
            Error::CryptoError(format!(
                "Error decrypting KDC response AS-REP: {}",
                error
            ))
        });
}

/// Decrypts the TGS-REP enc-part by using the session key
pub fn decrypt_tgs_rep_enc_part(
    session_cipher: &Cipher,
    enc_part: &EncryptedData,
) -> Result<Vec<u8>> {
    check_etype(session_cipher, enc_part)?;
    return session_cipher
        .decrypt(
            key_usages::KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY,
            &enc_part.cipher,
        )
        .map_err(|error| {
            Error::CryptoError(format!("Error decrypting TGS-REP: {}", error))
        });
}

fn check_etype(cipher: &Cipher, enc_part: &EncryptedData) -> Result<()> {
    if cipher.etype() != enc_part.etype {
        return Err(Error::CryptoError(format!(
            "Unable to decrypt KDC response: mismatch etypes {} and {}",
            enc_part.etype,
            cipher.etype()
        )));
    }
    return Ok(());
}
