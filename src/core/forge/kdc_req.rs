use chrono::{DateTime, Utc};
use kerberos_asn1::{
    AsReq, Asn1Object, KdcReq, KerberosTime, PaData, PrincipalName, TgsReq,
};
use kerberos_crypto::supported_etypes;

/// Builder of the messages that request tickets to the KDC. It does not
/// generate random values, so building twice with the same parameters
/// produces the same message.
pub struct KdcReqBuilder {
    realm: String,
    sname: Option<PrincipalName>,
    etypes: Vec<i32>,
    kdc_options: u32,
    cname: Option<PrincipalName>,
    padatas: Vec<PaData>,
    nonce: u32,
    till: KerberosTime,
    rtime: Option<KerberosTime>,
}

impl KdcReqBuilder {
    pub fn new(realm: String, nonce: u32, till: DateTime<Utc>) -> Self {
        return Self {
            realm,
            sname: None,
            etypes: supported_etypes(),
            kdc_options: 0,
            cname: None,
            padatas: Vec::new(),
            nonce,
            till: till.into(),
            rtime: None,
        };
    }

    pub fn kdc_options(mut self, kdc_options: u32) -> Self {
        self.kdc_options = kdc_options;
        self
    }

    pub fn etypes(mut self, etypes: Vec<i32>) -> Self {
        self.etypes = etypes;
        self
    }

    pub fn cname(mut self, cname: Option<PrincipalName>) -> Self {
        self.cname = cname;
        self
    }

    pub fn sname(mut self, sname: Option<PrincipalName>) -> Self {
        self.sname = sname;
        self
    }

    pub fn rtime(mut self, rtime: Option<DateTime<Utc>>) -> Self {
        self.rtime = rtime.map(|rtime| rtime.into());
        self
    }

    pub fn push_padata(mut self, padata: PaData) -> Self {
        self.padatas.push(padata);
        self
    }

    pub fn build(self) -> KdcReq {
        let mut req = KdcReq::default();

        req.req_body.kdc_options = self.kdc_options.into();
        req.req_body.cname = self.cname;
        req.req_body.realm = self.realm;
        req.req_body.sname = self.sname;
        req.req_body.till = self.till;
        req.req_body.rtime = self.rtime;
        req.req_body.nonce = self.nonce;
        req.req_body.etypes = self.etypes;

        if self.padatas.len() > 0 {
            req.padata = Some(self.padatas);
        }

        return req;
    }

    pub fn build_as_req(self) -> AsReq {
        self.build().into()
    }

    pub fn build_tgs_req(self) -> TgsReq {
        self.build().into()
    }
}

/// DER bytes of the request body. These bytes are the ones protected by the
/// checksum of the authenticator in TGS-REQ.
pub fn build_req_body(req: &KdcReq) -> Vec<u8> {
    return req.req_body.build();
}
