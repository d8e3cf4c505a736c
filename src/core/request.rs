//! Data of a ticket request, shared by all the attempts to deliver it

use crate::core::forge::new_krbtgt_principal;
use crate::core::sequence::{seqnum_to_microseconds, SequenceGenerator};
use crate::core::{Cipher, KrbUser, TicketCred};
use chrono::{DateTime, Duration, Utc};
use kerberos_asn1::PrincipalName;
use kerberos_constants::kdc_options;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Credentials used to prove the user identity in a request
#[derive(Debug)]
pub enum RequestBasis {
    /// Long-term key of the user, used in AS-REQ
    UserKey(Cipher),

    /// Previous ticket (usually a TGT), used in TGS-REQ
    Tgt(TicketCred),
}

/// The request for a ticket, independent of the transport used to send it
#[derive(Debug)]
pub struct KdcRequest {
    pub user: KrbUser,
    pub service: PrincipalName,
    pub service_realm: String,
    pub basis: RequestBasis,
    pub till: DateTime<Utc>,
    pub renew_till: Option<DateTime<Utc>>,
    pub kdc_options: u32,
    pub etypes: Vec<i32>,
}

impl KdcRequest {
    /// Request of a TGT by using the user key
    pub fn new_as_req(user: KrbUser, cipher: Cipher) -> Self {
        let service = new_krbtgt_principal(&user.realm);
        let service_realm = user.realm.clone();
        let etypes = vec![cipher.etype()];
        return Self::new(
            user,
            service,
            service_realm,
            RequestBasis::UserKey(cipher),
            etypes,
        );
    }

    /// Request of a ticket for a service by using a TGT. The request is sent
    /// to the realm of the TGT.
    pub fn new_tgs_req(
        user: KrbUser,
        service: PrincipalName,
        tgt: TicketCred,
    ) -> Self {
        let service_realm = tgt.realm().to_string();
        let etypes = kerberos_crypto::supported_etypes();
        return Self::new(
            user,
            service,
            service_realm,
            RequestBasis::Tgt(tgt),
            etypes,
        );
    }

    fn new(
        user: KrbUser,
        service: PrincipalName,
        service_realm: String,
        basis: RequestBasis,
        etypes: Vec<i32>,
    ) -> Self {
        let till = Utc::now()
            .checked_add_signed(Duration::weeks(20 * 52))
            .unwrap_or(Utc::now());

        return Self {
            user,
            service,
            service_realm,
            basis,
            till,
            renew_till: Some(till),
            kdc_options: kdc_options::FORWARDABLE
                | kdc_options::RENEWABLE
                | kdc_options::RENEWABLE_OK,
            etypes,
        };
    }

    pub fn is_tgs_req(&self) -> bool {
        if let RequestBasis::Tgt(_) = self.basis {
            return true;
        }
        return false;
    }
}

/// Values that identify one logical attempt of a request. They are reused
/// when the same request is sent again over UDP, so the KDC detects the
/// copies as replays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestStamp {
    pub nonce: u32,
    pub time: DateTime<Utc>,
    pub seqnum: u32,
}

impl RequestStamp {
    pub fn generate(sequence: &SequenceGenerator) -> Self {
        return Self {
            nonce: new_nonce(),
            time: Utc::now(),
            seqnum: sequence.next(),
        };
    }

    pub fn microseconds(&self) -> u32 {
        return seqnum_to_microseconds(self.seqnum);
    }

    /// Confounder for the encrypted parts of the request. It is derived
    /// from the stamp, so a resent request is identical to the original.
    pub fn confounder(&self, size: usize) -> Vec<u8> {
        let seed = (((self.nonce as u64) << 32) | self.seqnum as u64)
            ^ (self.time.timestamp() as u64).rotate_left(20)
            ^ self.time.timestamp_subsec_nanos() as u64;

        let mut confounder = vec![0; size];
        StdRng::seed_from_u64(seed).fill_bytes(&mut confounder);
        return confounder;
    }
}

/// Random nonce of 31 bits, so it fits in a 4 bytes ASN1 integer. Active
/// Directory requires it.
pub fn new_nonce() -> u32 {
    return rand::thread_rng().gen::<u32>() >> 1;
}
