use super::der::{replace_context_field, AP_REQ_TICKET_FIELD};
use super::principal_name::new_nt_principal;
use crate::core::request::RequestStamp;
use crate::core::{Cipher, KrbUser};
use crate::error::Result;
use kerberos_asn1::{
    ApReq, Asn1Object, Authenticator, Checksum, EncryptedData, PaData,
    PaEncTsEnc,
};
use kerberos_constants::key_usages::{
    KEY_USAGE_AS_REQ_TIMESTAMP, KEY_USAGE_TGS_REQ_AUTHEN,
    KEY_USAGE_TGS_REQ_AUTHEN_CKSUM,
};
use kerberos_constants::pa_data_types::{PA_ENC_TIMESTAMP, PA_TGS_REQ};

/// Helper to create a PA-DATA that contains a PA-ENC-TS-ENC struct. The
/// microseconds are taken from the sequence number of the stamp.
pub fn new_pa_data_encrypted_timestamp(
    cipher: &Cipher,
    stamp: &RequestStamp,
) -> PaData {
    let mut timestamp = PaEncTsEnc::from(stamp.time);
    timestamp.pausec = Some(stamp.microseconds() as _);

    let encrypted_timestamp = cipher.encrypt_with_preamble(
        KEY_USAGE_AS_REQ_TIMESTAMP,
        &timestamp.build(),
        &stamp.confounder(cipher.preamble_size()),
    );
    let padata = PaData::new(
        PA_ENC_TIMESTAMP,
        EncryptedData::new(cipher.etype(), None, encrypted_timestamp).build(),
    );

    return padata;
}

/// Helper to create a PA-DATA that contains an AP-REQ struct. The
/// authenticator includes a checksum of the request body, so the
/// AP-REQ cannot be used for other request. The ticket is inserted in the
/// AP-REQ as it is, without encoding it again.
pub fn new_pa_data_ap_req(
    user: &KrbUser,
    raw_ticket: &[u8],
    cipher: &Cipher,
    raw_req_body: &[u8],
    stamp: &RequestStamp,
) -> Result<PaData> {
    let authenticator = new_authenticator(user, cipher, raw_req_body, stamp);

    let encrypted_authenticator = cipher.encrypt_with_preamble(
        KEY_USAGE_TGS_REQ_AUTHEN,
        &authenticator.build(),
        &stamp.confounder(cipher.preamble_size()),
    );

    let ap_req = new_ap_req(cipher.etype(), encrypted_authenticator);
    let raw_ap_req =
        replace_context_field(&ap_req.build(), AP_REQ_TICKET_FIELD, raw_ticket)?;
    return Ok(PaData::new(PA_TGS_REQ, raw_ap_req));
}

/// Helper to create an Authenticator struct
fn new_authenticator(
    user: &KrbUser,
    cipher: &Cipher,
    raw_req_body: &[u8],
    stamp: &RequestStamp,
) -> Authenticator {
    let mut authenticator = Authenticator::default();
    authenticator.crealm = user.realm.clone();
    authenticator.cname = new_nt_principal(&user.name);
    authenticator.cusec = stamp.microseconds() as _;
    authenticator.ctime = stamp.time.into();
    authenticator.cksum = Some(Checksum {
        cksumtype: cipher.checksum_type(),
        checksum: cipher.checksum(KEY_USAGE_TGS_REQ_AUTHEN_CKSUM, raw_req_body),
    });
    return authenticator;
}

/// Helper to create an AP-REQ struct. The ticket is left empty.
fn new_ap_req(etype: i32, cipher: Vec<u8>) -> ApReq {
    let mut ap_req = ApReq::default();
    ap_req.authenticator = EncryptedData {
        etype,
        kvno: None,
        cipher,
    };

    return ap_req;
}
