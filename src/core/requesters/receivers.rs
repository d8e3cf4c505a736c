use crate::communication::KrbChannel;
use crate::core::forge::{
    context_field, extract_ticket_cred, KDC_REP_TICKET_FIELD,
};
use crate::core::request::{KdcRequest, RequestStamp};
use crate::core::TicketCred;
use crate::error::{Error, Result};
use kerberos_asn1::{
    AsRep, Asn1Object, EncryptedData, KrbError, PrincipalName, TgsRep,
};
use kerberos_constants::message_types;
use log::debug;

/// Version of the Kerberos protocol
pub const PVNO: i32 = 5;

/// Fields shared by AS-REP and TGS-REP. The ticket is kept as it was
/// encoded by the KDC.
#[derive(Debug)]
pub struct KdcRepParts {
    pub pvno: i32,
    pub msg_type: i32,
    pub crealm: String,
    pub cname: PrincipalName,
    pub raw_ticket: Vec<u8>,
    pub enc_part: EncryptedData,
}

impl From<(AsRep, Vec<u8>)> for KdcRepParts {
    fn from((rep, raw_ticket): (AsRep, Vec<u8>)) -> Self {
        return Self {
            pvno: rep.pvno,
            msg_type: rep.msg_type,
            crealm: rep.crealm,
            cname: rep.cname,
            raw_ticket,
            enc_part: rep.enc_part,
        };
    }
}

impl From<(TgsRep, Vec<u8>)> for KdcRepParts {
    fn from((rep, raw_ticket): (TgsRep, Vec<u8>)) -> Self {
        return Self {
            pvno: rep.pvno,
            msg_type: rep.msg_type,
            crealm: rep.crealm,
            cname: rep.cname,
            raw_ticket,
            enc_part: rep.enc_part,
        };
    }
}

/// Receives the KDC response for the request and retrieves the ticket
pub fn recv_ticket_cred(
    channel: &mut dyn KrbChannel,
    request: &KdcRequest,
    stamp: &RequestStamp,
) -> Result<TicketCred> {
    let raw_rep = channel.recv()?;
    debug!(
        "Received {} bytes from {} over {}",
        raw_rep.len(),
        channel.peer(),
        channel.protocol()
    );

    let rep = parse_kdc_rep(&raw_rep, expected_msg_type(request))?;
    return extract_ticket_cred(rep, request, stamp);
}

fn expected_msg_type(request: &KdcRequest) -> i32 {
    if request.is_tgs_req() {
        return message_types::KRB_TGS_REP;
    }
    return message_types::KRB_AS_REP;
}

/// Parses the KDC response. The application tag of the first byte tells
/// whether it is a KRB-ERROR, which is returned as error without checking
/// anything else.
pub fn parse_kdc_rep(raw: &[u8], expected_msg_type: i32) -> Result<KdcRepParts> {
    let tag = *raw
        .first()
        .ok_or(Error::DataError(format!("Empty response from KDC")))?;
    let msg_type = (tag & 0x1F) as i32;

    if msg_type == message_types::KRB_ERROR {
        let (_, krb_error) = KrbError::parse(raw).map_err(|_| {
            Error::DataError(format!("Error parsing KRB-ERROR"))
        })?;
        debug!("Received KRB-ERROR {}", krb_error.error_code);
        return Err(krb_error)?;
    }

    if msg_type != expected_msg_type {
        return Err(Error::ProtocolError(format!(
            "Unexpected message type {} in response, expected {}",
            msg_type, expected_msg_type
        )));
    }

    let raw_ticket = context_field(raw, KDC_REP_TICKET_FIELD)?.to_vec();
    let rep: KdcRepParts = if msg_type == message_types::KRB_TGS_REP {
        let (_, rep) = TgsRep::parse(raw).map_err(|_| {
            Error::DataError(format!("Error parsing TGS-REP"))
        })?;
        (rep, raw_ticket).into()
    } else {
        let (_, rep) = AsRep::parse(raw).map_err(|_| {
            Error::DataError(format!("Error parsing AS-REP"))
        })?;
        (rep, raw_ticket).into()
    };

    if rep.msg_type != expected_msg_type {
        return Err(Error::ProtocolError(format!(
            "Unexpected msg-type {} in response, expected {}",
            rep.msg_type, expected_msg_type
        )));
    }

    if rep.pvno != PVNO {
        return Err(Error::ProtocolError(format!(
            "Unsupported protocol version {} in response",
            rep.pvno
        )));
    }

    return Ok(rep);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forge::new_nt_principal;
    use crate::core::sequence::SequenceGenerator;
    use crate::core::testkdc::{self, ReplyOptions};
    use crate::core::KrbUser;
    use kerberos_asn1::Ticket;
    use kerberos_constants::error_codes;

    fn new_stamp() -> RequestStamp {
        return RequestStamp::generate(&SequenceGenerator::from_seed(7));
    }

    fn extract_as(
        options: ReplyOptions,
    ) -> (Result<TicketCred>, RequestStamp) {
        let request = testkdc::new_as_request();
        let stamp = new_stamp();
        let raw_rep = testkdc::build_reply(&request, &stamp, &options);
        let result = parse_kdc_rep(&raw_rep, message_types::KRB_AS_REP)
            .and_then(|rep| extract_ticket_cred(rep, &request, &stamp));
        return (result, stamp);
    }

    fn assert_protocol_error(result: Result<TicketCred>) {
        match result {
            Err(Error::ProtocolError(_)) => {}
            other => panic!("Expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_as_rep_to_ticket_cred() {
        let (result, _) = extract_as(ReplyOptions::default());
        let tgt = result.unwrap();

        assert_eq!("krbtgt/KINGDOM.HEARTS", tgt.principal());
        assert_eq!(testkdc::REALM, tgt.realm());
        assert_eq!(testkdc::till(), tgt.expiry_time());
        assert_eq!(Some(testkdc::till()), tgt.renew_till());
        assert_eq!(testkdc::DEFAULT_FLAGS, tgt.flags());
    }

    #[test]
    fn test_tgs_rep_to_ticket_cred() {
        let request = testkdc::new_tgs_request(testkdc::new_tgt());
        let stamp = new_stamp();
        let raw_rep =
            testkdc::build_reply(&request, &stamp, &ReplyOptions::default());

        let rep = parse_kdc_rep(&raw_rep, message_types::KRB_TGS_REP).unwrap();
        let tgs = extract_ticket_cred(rep, &request, &stamp).unwrap();
        assert_eq!(testkdc::SERVICE, tgs.principal());
        assert!(!tgs.is_tgt());
        assert_eq!(
            testkdc::service_session_cipher().key(),
            tgs.session_cipher().unwrap().key()
        );
    }

    #[test]
    fn test_flags_are_the_granted_ones() {
        let (result, _) = extract_as(ReplyOptions {
            flags: Some(0),
            ..Default::default()
        });
        let tgt = result.unwrap();
        assert_eq!(0, tgt.flags());
    }

    #[test]
    fn test_krb_error_is_remote_error() {
        let raw = testkdc::new_krb_error(error_codes::KDC_ERR_PREAUTH_FAILED);
        let err = parse_kdc_rep(&raw, message_types::KRB_AS_REP).unwrap_err();
        assert_eq!(
            Some(error_codes::KDC_ERR_PREAUTH_FAILED),
            err.remote_error_code()
        );
    }

    #[test]
    fn test_truncated_krb_error_is_parse_error() {
        let raw = testkdc::new_krb_error(error_codes::KRB_ERR_RESPONSE_TOO_BIG);
        let truncated = &raw[..raw.len() / 2];
        match parse_kdc_rep(truncated, message_types::KRB_AS_REP) {
            Err(Error::DataError(_)) => {}
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_krb_error_with_trailing_data_is_remote_error() {
        let mut raw =
            testkdc::new_krb_error(error_codes::KRB_ERR_RESPONSE_TOO_BIG);
        raw.extend_from_slice(&[0x00, 0xff, 0x30, 0x03]);

        let err = parse_kdc_rep(&raw, message_types::KRB_AS_REP).unwrap_err();
        assert_eq!(
            Some(error_codes::KRB_ERR_RESPONSE_TOO_BIG),
            err.remote_error_code()
        );
        assert!(err.is_response_too_big());
    }

    #[test]
    fn test_empty_response_is_parse_error() {
        match parse_kdc_rep(&[], message_types::KRB_AS_REP) {
            Err(Error::DataError(_)) => {}
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_message_type() {
        let request = testkdc::new_as_request();
        let stamp = new_stamp();
        let raw_rep =
            testkdc::build_reply(&request, &stamp, &ReplyOptions::default());

        match parse_kdc_rep(&raw_rep, message_types::KRB_TGS_REP) {
            Err(Error::ProtocolError(_)) => {}
            other => panic!("Expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_other_client_is_rejected_before_decrypting() {
        // the wrong key would produce a crypto error if decrypted
        let (result, _) = extract_as(ReplyOptions {
            cname: Some(new_nt_principal("donald")),
            key: Some(vec![0x55; 32]),
            ..Default::default()
        });
        assert_protocol_error(result);

        let (result, _) = extract_as(ReplyOptions {
            crealm: Some("DISNEY.WORLD".into()),
            key: Some(vec![0x55; 32]),
            ..Default::default()
        });
        assert_protocol_error(result);
    }

    #[test]
    fn test_client_with_several_name_parts() {
        let user = KrbUser::new("host/web".into(), testkdc::REALM.into());
        let request = KdcRequest::new_as_req(user, testkdc::user_cipher());
        let stamp = new_stamp();
        let raw_rep = testkdc::build_reply(
            &request,
            &stamp,
            &ReplyOptions {
                cname: Some(new_nt_principal("host/web")),
                ..Default::default()
            },
        );

        let rep = parse_kdc_rep(&raw_rep, message_types::KRB_AS_REP).unwrap();
        let tgt = extract_ticket_cred(rep, &request, &stamp).unwrap();
        assert_eq!("host/web", tgt.client_name());
        assert!(tgt.is_for_user(&request.user));
    }

    #[test]
    fn test_ticket_is_kept_as_encoded_by_kdc() {
        let raw_ticket = testkdc::new_non_canonical_ticket();
        let (_, ticket) = Ticket::parse(&raw_ticket).unwrap();
        assert_ne!(raw_ticket, ticket.build());

        let (result, _) = extract_as(ReplyOptions {
            ticket: Some(raw_ticket.clone()),
            ..Default::default()
        });
        let tgt = result.unwrap();
        assert_eq!(raw_ticket, tgt.ticket_bytes());
        assert_eq!(Some(testkdc::TICKET_KVNO), tgt.session_cipher().unwrap().kvno());
    }

    #[test]
    fn test_wrong_key_is_crypto_error() {
        let (result, _) = extract_as(ReplyOptions {
            key: Some(vec![0x55; 32]),
            ..Default::default()
        });
        match result {
            Err(Error::CryptoError(_)) => {}
            other => panic!("Expected crypto error, got {:?}", other),
        }
    }

    #[test]
    fn test_other_nonce_is_rejected() {
        let request = testkdc::new_as_request();
        let stamp = new_stamp();
        let mut other_stamp = stamp;
        other_stamp.nonce = stamp.nonce ^ 1;

        let raw_rep = testkdc::build_reply(
            &request,
            &other_stamp,
            &ReplyOptions::default(),
        );
        let rep = parse_kdc_rep(&raw_rep, message_types::KRB_AS_REP).unwrap();
        assert_protocol_error(extract_ticket_cred(rep, &request, &stamp));
    }

    #[test]
    fn test_other_service_realm_is_rejected() {
        let (result, _) = extract_as(ReplyOptions {
            srealm: Some("DISNEY.WORLD".into()),
            ..Default::default()
        });
        assert_protocol_error(result);
    }

    #[test]
    fn test_referral_service_is_accepted() {
        let (result, _) = extract_as(ReplyOptions {
            sname: Some(new_nt_principal("krbtgt/DISNEY.WORLD")),
            ..Default::default()
        });
        let tgt = result.unwrap();
        assert_eq!("krbtgt/DISNEY.WORLD", tgt.principal());
        assert_eq!(testkdc::REALM, tgt.realm());
    }
}
