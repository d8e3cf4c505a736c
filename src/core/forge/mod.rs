//! This module provide functionalities to create/parse kerberos structs

mod kdc_req;
pub use kdc_req::{build_req_body, KdcReqBuilder};

mod krb_user;
pub use krb_user::KrbUser;

mod principal_name;
pub use principal_name::{
    new_krbtgt_principal, new_nt_principal, new_nt_srv_inst,
    new_principal_name, principal_name_to_string, principal_names_match,
    spn_to_service_parts,
};

mod der;
pub use der::{
    context_field, replace_context_field, AP_REQ_TICKET_FIELD,
    KDC_REP_TICKET_FIELD,
};

mod pa_data;
pub use pa_data::{new_pa_data_ap_req, new_pa_data_encrypted_timestamp};

mod build_req;
pub use build_req::{build_as_req, build_kdc_req, build_tgs_req};

mod decrypters;
pub use decrypters::{
    decrypt_as_rep_enc_part, decrypt_tgs_rep_enc_part, extract_ticket_cred,
};
