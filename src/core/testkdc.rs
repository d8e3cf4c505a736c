//! KDC that lives in memory, used to test the exchanges. It parses the
//! requests it receives and answers with real encrypted responses.

use crate::communication::{
    check_udp_size, KdcLocator, KrbChannel, TransportProtocol,
};
use crate::core::forge::{
    build_kdc_req, new_krbtgt_principal, new_nt_principal, new_nt_srv_inst,
    replace_context_field, KDC_REP_TICKET_FIELD,
};
use crate::core::request::{KdcRequest, RequestStamp};
use crate::core::{Cipher, KrbUser, TicketCred};
use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use kerberos_asn1::{
    ApReq, AsRep, AsReq, Asn1Object, Authenticator, EncAsRepPart,
    EncKdcRepPart, EncTgsRepPart, EncryptedData, KdcReqBody, KrbCredInfo,
    KrbError, PaData, PaEncTsEnc, PrincipalName, TgsRep, TgsReq, Ticket,
};
use red_asn1::parse_length;
use kerberos_constants::etypes::AES256_CTS_HMAC_SHA1_96;
use kerberos_constants::{key_usages, message_types, ticket_flags};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;

pub const REALM: &str = "KINGDOM.HEARTS";
pub const USERNAME: &str = "mickey";
pub const SERVICE: &str = "cifs/castle.kingdom.hearts";
pub const TICKET_KVNO: u32 = 2;
pub const DEFAULT_FLAGS: u32 = ticket_flags::FORWARDABLE | ticket_flags::RENEWABLE;

const TICKET_SIZE: usize = 64;

pub fn user() -> KrbUser {
    return KrbUser::new(USERNAME.into(), REALM.into());
}

pub fn service() -> PrincipalName {
    return new_nt_srv_inst(SERVICE);
}

fn aes256_cipher(key: &[u8], kvno: Option<u32>) -> Cipher {
    return Cipher::load_key(AES256_CTS_HMAC_SHA1_96, key, kvno).unwrap();
}

/// Long-term key of the user
pub fn user_cipher() -> Cipher {
    return aes256_cipher(&[0x11; 32], None);
}

pub fn tgt_session_cipher() -> Cipher {
    return aes256_cipher(&[0x22; 32], Some(TICKET_KVNO));
}

pub fn service_session_cipher() -> Cipher {
    return aes256_cipher(&[0x33; 32], Some(TICKET_KVNO));
}

pub fn auth_time() -> DateTime<Utc> {
    return Utc.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap();
}

/// Expiration time of the tickets given by the KDC
pub fn till() -> DateTime<Utc> {
    return Utc.with_ymd_and_hms(2099, 1, 1, 10, 0, 0).unwrap();
}

/// Ticket with opaque content, the client never decrypts it
pub fn new_ticket(sname: PrincipalName, size: usize) -> Ticket {
    return Ticket {
        tkt_vno: 5,
        realm: REALM.to_string(),
        sname,
        enc_part: EncryptedData::new(
            AES256_CTS_HMAC_SHA1_96,
            Some(TICKET_KVNO),
            vec![0xAB; size],
        ),
    };
}

pub fn new_tgt() -> TicketCred {
    return new_tgt_with_ticket_size(TICKET_SIZE);
}

/// Ticket encoded with a length in long form of 4 bytes, valid BER that
/// the DER encoder never produces
pub fn new_non_canonical_ticket() -> Vec<u8> {
    let raw_ticket = new_ticket(new_krbtgt_principal(REALM), TICKET_SIZE).build();
    let (value, _) = parse_length(&raw_ticket[1..]).unwrap();

    let mut non_canonical = vec![raw_ticket[0], 0x84];
    non_canonical.extend_from_slice(&(value.len() as u32).to_be_bytes());
    non_canonical.extend_from_slice(value);
    return non_canonical;
}

pub fn new_tgt_with_ticket_size(size: usize) -> TicketCred {
    let raw_ticket = new_ticket(new_krbtgt_principal(REALM), size).build();
    return new_tgt_with_raw_ticket(raw_ticket);
}

pub fn new_tgt_with_raw_ticket(raw_ticket: Vec<u8>) -> TicketCred {
    let sname = new_krbtgt_principal(REALM);
    let info = KrbCredInfo {
        key: tgt_session_cipher().encryption_key(),
        prealm: Some(REALM.to_string()),
        pname: Some(new_nt_principal(USERNAME)),
        flags: Some(DEFAULT_FLAGS.into()),
        authtime: Some(auth_time().into()),
        starttime: Some(auth_time().into()),
        endtime: Some(till().into()),
        renew_till: Some(till().into()),
        srealm: Some(REALM.to_string()),
        sname: Some(sname.clone()),
        caddr: None,
    };

    return TicketCred::from_krb_cred_info(raw_ticket, info).unwrap();
}

pub fn new_as_request() -> KdcRequest {
    return KdcRequest::new_as_req(user(), user_cipher());
}

pub fn new_tgs_request(tgt: TicketCred) -> KdcRequest {
    return KdcRequest::new_tgs_req(user(), service(), tgt);
}

/// Values of the response that differ from the right ones
#[derive(Debug, Clone, Default)]
pub struct ReplyOptions {
    pub crealm: Option<String>,
    pub cname: Option<PrincipalName>,
    pub srealm: Option<String>,
    pub sname: Option<PrincipalName>,
    pub key: Option<Vec<u8>>,
    pub flags: Option<u32>,
    /// Raw ticket to include in the response
    pub ticket: Option<Vec<u8>>,
}

/// Parsed request: whether it is a TGS-REQ, its body and its padata
fn parse_request(raw_req: &[u8]) -> (bool, KdcReqBody, Vec<PaData>) {
    if (raw_req[0] & 0x1F) as i32 == message_types::KRB_TGS_REQ {
        let (_, tgs_req) = TgsReq::parse(raw_req).unwrap();
        return (true, tgs_req.req_body, tgs_req.padata.unwrap_or_default());
    }

    let (_, as_req) = AsReq::parse(raw_req).unwrap();
    return (false, as_req.req_body, as_req.padata.unwrap_or_default());
}

pub fn request_nonce(raw_req: &[u8]) -> u32 {
    let (_, req_body, _) = parse_request(raw_req);
    return req_body.nonce;
}

/// Microseconds of the encrypted timestamp in AS-REQ, or of the
/// authenticator in TGS-REQ
pub fn request_microseconds(raw_req: &[u8]) -> u32 {
    let (is_tgs, _, padatas) = parse_request(raw_req);

    if is_tgs {
        let (_, ap_req) = ApReq::parse(&padatas[0].padata_value).unwrap();
        let raw_authenticator = tgt_session_cipher()
            .decrypt(
                key_usages::KEY_USAGE_TGS_REQ_AUTHEN,
                &ap_req.authenticator.cipher,
            )
            .unwrap();
        let (_, authenticator) =
            Authenticator::parse(&raw_authenticator).unwrap();
        return authenticator.cusec as u32;
    }

    let (_, enc_data) = EncryptedData::parse(&padatas[0].padata_value).unwrap();
    let raw_timestamp = user_cipher()
        .decrypt(key_usages::KEY_USAGE_AS_REQ_TIMESTAMP, &enc_data.cipher)
        .unwrap();
    let (_, timestamp) = PaEncTsEnc::parse(&raw_timestamp).unwrap();
    return timestamp.pausec.unwrap() as u32;
}

macro_rules! new_enc_rep_part {
    ($part:ty, $key:expr, $nonce:expr, $sname:expr, $options:expr) => {{
        let mut enc_part = <$part>::default();
        enc_part.key = $key;
        enc_part.nonce = $nonce;
        enc_part.flags = $options.flags.unwrap_or(DEFAULT_FLAGS).into();
        enc_part.authtime = auth_time().into();
        enc_part.starttime = Some(auth_time().into());
        enc_part.endtime = till().into();
        enc_part.renew_till = Some(till().into());
        enc_part.srealm =
            $options.srealm.clone().unwrap_or(REALM.to_string());
        enc_part.sname = $sname;
        enc_part
    }};
}

/// Decrypted part of a response that gives a TGT to the user
pub fn new_enc_kdc_rep_part() -> EncKdcRepPart {
    let options = ReplyOptions::default();
    return new_enc_rep_part!(
        EncKdcRepPart,
        tgt_session_cipher().encryption_key(),
        0,
        new_krbtgt_principal(REALM),
        options
    );
}

fn set_reply_ticket(raw_rep: Vec<u8>, options: &ReplyOptions) -> Vec<u8> {
    match &options.ticket {
        Some(raw_ticket) => {
            replace_context_field(&raw_rep, KDC_REP_TICKET_FIELD, raw_ticket)
                .unwrap()
        }
        None => raw_rep,
    }
}

/// Builds the response the KDC gives to the request
pub fn answer(raw_req: &[u8], options: &ReplyOptions) -> Vec<u8> {
    let (is_tgs, req_body, _) = parse_request(raw_req);
    let sname = options
        .sname
        .clone()
        .or(req_body.sname)
        .unwrap_or(new_krbtgt_principal(REALM));
    let crealm = options.crealm.clone().unwrap_or(REALM.to_string());
    let cname = options
        .cname
        .clone()
        .unwrap_or(new_nt_principal(USERNAME));
    let ticket = new_ticket(sname.clone(), TICKET_SIZE);

    let (reply_cipher, session_cipher) = if is_tgs {
        (tgt_session_cipher(), service_session_cipher())
    } else {
        (user_cipher(), tgt_session_cipher())
    };
    let reply_cipher = match &options.key {
        Some(key) => aes256_cipher(key, None),
        None => reply_cipher,
    };
    let session_key = session_cipher.encryption_key();

    if is_tgs {
        let enc_part: EncTgsRepPart = new_enc_rep_part!(
            EncTgsRepPart,
            session_key,
            req_body.nonce,
            sname,
            options
        );
        let mut rep = TgsRep::default();
        rep.pvno = 5;
        rep.msg_type = message_types::KRB_TGS_REP;
        rep.crealm = crealm;
        rep.cname = cname;
        rep.ticket = ticket;
        rep.enc_part = EncryptedData::new(
            reply_cipher.etype(),
            None,
            reply_cipher.encrypt(
                key_usages::KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY,
                &enc_part.build(),
            ),
        );
        return set_reply_ticket(rep.build(), options);
    }

    let enc_part: EncAsRepPart = new_enc_rep_part!(
        EncAsRepPart,
        session_key,
        req_body.nonce,
        sname,
        options
    );
    let mut rep = AsRep::default();
    rep.pvno = 5;
    rep.msg_type = message_types::KRB_AS_REP;
    rep.crealm = crealm;
    rep.cname = cname;
    rep.ticket = ticket;
    rep.enc_part = EncryptedData::new(
        reply_cipher.etype(),
        None,
        reply_cipher.encrypt(
            key_usages::KEY_USAGE_AS_REP_ENC_PART,
            &enc_part.build(),
        ),
    );
    return set_reply_ticket(rep.build(), options);
}

/// Response of the KDC to the request built with the given stamp
pub fn build_reply(
    request: &KdcRequest,
    stamp: &RequestStamp,
    options: &ReplyOptions,
) -> Vec<u8> {
    return answer(&build_kdc_req(request, stamp).unwrap(), options);
}

pub fn new_krb_error(error_code: i32) -> Vec<u8> {
    let mut krb_error = KrbError::default();
    krb_error.error_code = error_code;
    krb_error.stime = auth_time().into();
    krb_error.realm = REALM.to_string();
    krb_error.sname = new_krbtgt_principal(REALM);
    return krb_error.build();
}

/// What the KDC does with each message it receives
#[derive(Debug, Clone)]
pub enum Response {
    Answer(ReplyOptions),
    KrbErrorCode(i32),
    Timeout,
}

#[derive(Default)]
struct KdcState {
    responses: VecDeque<Response>,
    sent: Vec<(TransportProtocol, Vec<u8>)>,
    located: Vec<TransportProtocol>,
    open_channels: usize,
    unreachable: bool,
}

pub struct TestKdc {
    state: Rc<RefCell<KdcState>>,
}

impl TestKdc {
    /// KDC that answers the received messages in order. Once the responses
    /// are exhausted, it does not respond anymore.
    pub fn new(responses: Vec<Response>) -> Self {
        let state = KdcState {
            responses: responses.into(),
            ..Default::default()
        };
        return Self {
            state: Rc::new(RefCell::new(state)),
        };
    }

    pub fn unreachable() -> Self {
        let kdc = Self::new(Vec::new());
        kdc.state.borrow_mut().unreachable = true;
        return kdc;
    }

    /// Messages that reached the KDC
    pub fn sent(&self) -> Vec<(TransportProtocol, Vec<u8>)> {
        return self.state.borrow().sent.clone();
    }

    pub fn located(&self) -> Vec<TransportProtocol> {
        return self.state.borrow().located.clone();
    }

    pub fn open_channels(&self) -> usize {
        return self.state.borrow().open_channels;
    }
}

impl KdcLocator for TestKdc {
    fn locate(
        &self,
        _realm: &str,
        protocol: TransportProtocol,
    ) -> Result<Box<dyn KrbChannel>> {
        let mut state = self.state.borrow_mut();
        state.located.push(protocol);

        if state.unreachable {
            let error = io::Error::from(io::ErrorKind::ConnectionRefused);
            return Err(Error::from(("Unable to connect with the KDC", error)));
        }

        state.open_channels += 1;
        return Ok(Box::new(TestChannel {
            state: self.state.clone(),
            protocol,
            reply: None,
        }));
    }
}

struct TestChannel {
    state: Rc<RefCell<KdcState>>,
    protocol: TransportProtocol,
    reply: Option<Vec<u8>>,
}

impl KrbChannel for TestChannel {
    fn send(&mut self, raw: &[u8]) -> Result<()> {
        if self.protocol == TransportProtocol::UDP {
            check_udp_size(raw)?;
        }

        let mut state = self.state.borrow_mut();
        state.sent.push((self.protocol, raw.to_vec()));

        self.reply = match state.responses.pop_front() {
            Some(Response::Answer(options)) => Some(answer(raw, &options)),
            Some(Response::KrbErrorCode(code)) => Some(new_krb_error(code)),
            Some(Response::Timeout) | None => None,
        };
        return Ok(());
    }

    fn recv(&mut self) -> Result<Vec<u8>> {
        let peer = self.peer();
        return self.reply.take().ok_or_else(|| {
            Error::Timeout(format!("No response from {}", peer))
        });
    }

    fn protocol(&self) -> TransportProtocol {
        return self.protocol;
    }

    fn peer(&self) -> SocketAddr {
        return SocketAddr::from(([127, 0, 0, 1], 88));
    }
}

impl Drop for TestChannel {
    fn drop(&mut self) {
        self.state.borrow_mut().open_channels -= 1;
    }
}
