//! Structs to handle the tickets retrieved from the KDC together with
//! their session keys

use crate::core::forge::{
    new_nt_principal, principal_name_to_string, principal_names_match,
    new_krbtgt_principal,
};
use crate::core::{Cipher, KrbUser};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use kerberos_asn1::{
    Asn1Object, EncKdcRepPart, EncKrbCredPart, EncryptedData, EncryptionKey,
    KerberosTime, KrbCred, KrbCredInfo, PrincipalName, Ticket,
};
use kerberos_constants::etypes::NO_ENCRYPTION;
use kerberos_constants::{kdc_options, ticket_flags};
use std::convert::TryFrom;
use std::slice::Iter;

/// Options that can be requested to the KDC with the ticket flag that the
/// KDC sets when the option is granted.
const GRANTABLE_OPTIONS: [(u32, u32); 3] = [
    (kdc_options::FORWARDABLE, ticket_flags::FORWARDABLE),
    (kdc_options::PROXIABLE, ticket_flags::PROXIABLE),
    (kdc_options::RENEWABLE, ticket_flags::RENEWABLE),
];

/// A ticket and the information required to use it. The ticket is kept as
/// it was sent by the KDC, to be sent back in following requests.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketCred {
    ticket: Vec<u8>,
    client: PrincipalName,
    client_realm: String,
    service: PrincipalName,
    service_realm: String,
    key: EncryptionKey,
    kvno: Option<u32>,
    authtime: DateTime<Utc>,
    starttime: Option<DateTime<Utc>>,
    till: DateTime<Utc>,
    renew_till: Option<DateTime<Utc>>,
    flags: u32,
}

impl TicketCred {
    /// Creates the credential from the raw ticket and the decrypted part of
    /// an AS-REP or TGS-REP. The flags are the ones granted by the KDC.
    pub fn from_kdc_rep(
        user: &KrbUser,
        raw_ticket: Vec<u8>,
        enc_part: EncKdcRepPart,
    ) -> Result<Self> {
        let kvno = ticket_kvno(&raw_ticket)?;
        Cipher::load_key(enc_part.key.keytype, &enc_part.key.keyvalue, kvno)?;

        return Ok(Self {
            ticket: raw_ticket,
            client: new_nt_principal(&user.name),
            client_realm: user.realm.clone(),
            service: enc_part.sname,
            service_realm: enc_part.srealm,
            key: enc_part.key,
            kvno,
            authtime: to_utc(&enc_part.authtime),
            starttime: enc_part.starttime.as_ref().map(to_utc),
            till: to_utc(&enc_part.endtime),
            renew_till: enc_part.renew_till.as_ref().map(to_utc),
            flags: enc_part.flags.flags,
        });
    }

    /// Creates the credential from the raw ticket and its information, as
    /// they are stored in credential files.
    pub fn from_krb_cred_info(
        raw_ticket: Vec<u8>,
        info: KrbCredInfo,
    ) -> Result<Self> {
        let till = info.endtime.as_ref().ok_or(missing_field("endtime"))?;
        let authtime = info
            .authtime
            .as_ref()
            .or(info.starttime.as_ref())
            .ok_or(missing_field("authtime"))?;

        return Ok(Self {
            kvno: ticket_kvno(&raw_ticket)?,
            ticket: raw_ticket,
            client: info.pname.ok_or(missing_field("pname"))?,
            client_realm: info.prealm.ok_or(missing_field("prealm"))?,
            service: info.sname.ok_or(missing_field("sname"))?,
            service_realm: info.srealm.ok_or(missing_field("srealm"))?,
            key: info.key,
            authtime: to_utc(authtime),
            starttime: info.starttime.as_ref().map(to_utc),
            till: to_utc(till),
            renew_till: info.renew_till.as_ref().map(to_utc),
            flags: info.flags.map(|flags| flags.flags).unwrap_or(0),
        });
    }

    /// Name of the service the ticket is for
    pub fn principal(&self) -> String {
        return principal_name_to_string(&self.service);
    }

    pub fn service(&self) -> &PrincipalName {
        return &self.service;
    }

    /// Realm of the service
    pub fn realm(&self) -> &str {
        return &self.service_realm;
    }

    pub fn client_name(&self) -> String {
        return principal_name_to_string(&self.client);
    }

    pub fn client_realm(&self) -> &str {
        return &self.client_realm;
    }

    pub fn auth_time(&self) -> DateTime<Utc> {
        return self.authtime;
    }

    /// Time since the ticket is valid. If the KDC did not specify it, the
    /// ticket is valid since its issuance.
    pub fn start_time(&self) -> DateTime<Utc> {
        return self.starttime.unwrap_or(self.authtime);
    }

    pub fn expiry_time(&self) -> DateTime<Utc> {
        return self.till;
    }

    pub fn renew_till(&self) -> Option<DateTime<Utc>> {
        return self.renew_till;
    }

    pub fn flags(&self) -> u32 {
        return self.flags;
    }

    pub fn etype(&self) -> i32 {
        return self.key.keytype;
    }

    /// Ticket as it was encoded by the KDC
    pub fn ticket_bytes(&self) -> &[u8] {
        return &self.ticket;
    }

    pub fn ticket(&self) -> Result<Ticket> {
        let (_, ticket) = Ticket::parse(&self.ticket).map_err(|_| {
            Error::DataError(format!("Error parsing ticket"))
        })?;
        return Ok(ticket);
    }

    /// Cipher with the session key, used to talk with the service
    pub fn session_cipher(&self) -> Result<Cipher> {
        return Cipher::load_key(self.key.keytype, &self.key.keyvalue, self.kvno);
    }

    pub fn is_tgt(&self) -> bool {
        return self
            .service
            .name_string
            .first()
            .map(|name| name == "krbtgt")
            .unwrap_or(false);
    }

    pub fn is_tgt_of(&self, realm: &str) -> bool {
        return principal_names_match(&self.service, &new_krbtgt_principal(realm));
    }

    pub fn is_for_user(&self, user: &KrbUser) -> bool {
        return self.client_realm.to_lowercase() == user.realm.to_lowercase()
            && principal_names_match(&self.client, &new_nt_principal(&user.name));
    }

    /// Whether the ticket can be used at the given time
    pub fn is_valid_at(&self, time: DateTime<Utc>) -> bool {
        return self.start_time() <= time && time < self.till;
    }

    /// Returns the requested KDC options that were not granted in the
    /// ticket flags.
    pub fn refused_options(&self, requested_options: u32) -> u32 {
        let mut refused = 0;
        for (option, flag) in GRANTABLE_OPTIONS.iter() {
            if requested_options & option != 0 && self.flags & flag == 0 {
                refused |= option;
            }
        }
        return refused;
    }

    fn to_krb_cred_info(&self) -> KrbCredInfo {
        return KrbCredInfo {
            key: self.key.clone(),
            prealm: Some(self.client_realm.clone()),
            pname: Some(self.client.clone()),
            flags: Some(self.flags.into()),
            authtime: Some(self.authtime.into()),
            starttime: self.starttime.map(|time| time.into()),
            endtime: Some(self.till.into()),
            renew_till: self.renew_till.map(|time| time.into()),
            srealm: Some(self.service_realm.clone()),
            sname: Some(self.service.clone()),
            caddr: None,
        };
    }
}

fn to_utc(time: &KerberosTime) -> DateTime<Utc> {
    return time.with_timezone(&Utc);
}

/// Key version of the ticket, the rest of the ticket is opaque
fn ticket_kvno(raw_ticket: &[u8]) -> Result<Option<u32>> {
    let (_, ticket) = Ticket::parse(raw_ticket)
        .map_err(|_| Error::DataError(format!("Error parsing ticket")))?;
    return Ok(ticket.enc_part.kvno);
}

fn missing_field(field: &str) -> Error {
    return Error::DataError(format!("Missing {} in KrbCredInfo", field));
}

impl TryFrom<(Ticket, KrbCredInfo)> for TicketCred {
    type Error = Error;

    fn try_from((ticket, info): (Ticket, KrbCredInfo)) -> Result<Self> {
        return Self::from_krb_cred_info(ticket.build(), info);
    }
}


/// Group of tickets, as they are stored in credential files
#[derive(Debug, Clone, Default)]
pub struct TicketCreds {
    pub ticket_creds: Vec<TicketCred>,
}

impl TicketCreds {
    pub fn new(ticket_creds: Vec<TicketCred>) -> Self {
        return Self { ticket_creds };
    }

    pub fn empty() -> Self {
        return Self::default();
    }

    pub fn push(&mut self, ticket_cred: TicketCred) {
        self.ticket_creds.push(ticket_cred);
    }

    pub fn iter(&self) -> Iter<TicketCred> {
        return self.ticket_creds.iter();
    }

    pub fn len(&self) -> usize {
        return self.ticket_creds.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.ticket_creds.is_empty();
    }

    /// Looks for a TGT of the user for its own realm that is valid now
    pub fn look_for_tgt(&self, user: &KrbUser) -> Option<TicketCred> {
        let now = Utc::now();
        return self
            .iter()
            .find(|tc| {
                tc.is_for_user(user)
                    && tc.is_tgt_of(&user.realm)
                    && tc.is_valid_at(now)
            })
            .cloned();
    }
}

impl From<Vec<TicketCred>> for TicketCreds {
    fn from(v: Vec<TicketCred>) -> Self {
        return Self::new(v);
    }
}

impl TryFrom<&TicketCreds> for KrbCred {
    type Error = Error;

    fn try_from(creds: &TicketCreds) -> Result<Self> {
        let mut krb_cred = KrbCred::default();
        let mut cred_part = EncKrbCredPart::default();

        for ticket_cred in creds.iter() {
            krb_cred.tickets.push(ticket_cred.ticket()?);
            cred_part.ticket_info.push(ticket_cred.to_krb_cred_info());
        }

        krb_cred.enc_part =
            EncryptedData::new(NO_ENCRYPTION, None, cred_part.build());
        return Ok(krb_cred);
    }
}

/// Convert from Kerberos credentials in plain text, the usual way of storing
/// them in machines. In case the credentials are encrypted this will fail.
impl TryFrom<KrbCred> for TicketCreds {
    type Error = Error;

    fn try_from(krb_cred: KrbCred) -> Result<Self> {
        if krb_cred.enc_part.etype != NO_ENCRYPTION {
            return Err(Error::DataError(format!(
                "Unable to decrypt the credentials"
            )));
        }

        let (_, cred_part) = EncKrbCredPart::parse(&krb_cred.enc_part.cipher)
            .map_err(|_| {
                Error::DataError(format!(
                    "Error parsing credentials: EncKrbCredPart"
                ))
            })?;

        let mut ticket_creds = Vec::with_capacity(krb_cred.tickets.len());
        for pair in krb_cred
            .tickets
            .into_iter()
            .zip(cred_part.ticket_info.into_iter())
        {
            ticket_creds.push(TicketCred::try_from(pair)?);
        }

        return Ok(Self::new(ticket_creds));
    }
}
