use krbticket::core::forge::new_nt_srv_inst;
use krbticket::core::{
    load_file_creds, request_tgs, request_tgt, save_file_creds, Cipher,
    CredFormat, KdcExchange, KrbUser, TicketCred, TicketCreds,
};
use krbticket::error::Result;
use kerberos_crypto::Key;
use log::{info, warn};

/// Main function to ask a TGT, or a TGS in case a service is given. The
/// retrieved ticket is added to the credentials file.
pub fn ask(
    user: KrbUser,
    user_key: Option<Key>,
    service: Option<String>,
    cred_format: CredFormat,
    creds_file: &str,
    exchange: &KdcExchange,
) -> Result<()> {
    let mut creds = load_file_creds(creds_file)?;

    match service {
        Some(service) => {
            let tgt =
                get_user_tgt(&user, &mut creds, user_key.as_ref(), exchange)?;

            info!("Request {} TGS for {}", service, user);
            let tgs = request_tgs(
                user.clone(),
                new_nt_srv_inst(&service),
                tgt,
                exchange,
            )?;

            info!("Save {} TGS for {} in {}", service, user, creds_file);
            creds.push(tgs);
        }
        None => {
            let user_key =
                user_key.ok_or("Required credentials to request a TGT")?;
            let tgt = ask_tgt(&user, &user_key, exchange)?;

            info!("Save {} TGT in {}", user, creds_file);
            creds.push(tgt);
        }
    }

    return save_file_creds(creds_file, &creds, cred_format);
}

fn ask_tgt(
    user: &KrbUser,
    user_key: &Key,
    exchange: &KdcExchange,
) -> Result<TicketCred> {
    let cipher = Cipher::generate(user_key, user, None)?;

    info!("Request TGT for {}", user);
    return request_tgt(user.clone(), cipher, exchange);
}

/// Gets the TGT of the user from the credentials, or requests it to the
/// KDC if there is none.
fn get_user_tgt(
    user: &KrbUser,
    creds: &mut TicketCreds,
    user_key: Option<&Key>,
    exchange: &KdcExchange,
) -> Result<TicketCred> {
    if let Some(tgt) = creds.look_for_tgt(user) {
        info!("Using TGT of {} found in credentials", user);
        return Ok(tgt);
    }
    warn!("No TGT found for {}", user);

    let user_key =
        user_key.ok_or("Unable to request TGT without user credentials")?;
    let tgt = ask_tgt(user, user_key, exchange)?;
    creds.push(tgt.clone());

    return Ok(tgt);
}
