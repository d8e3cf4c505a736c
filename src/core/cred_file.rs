//! Load and save tickets in files, in ccache or krb format

use crate::core::{CredFormat, TicketCreds};
use crate::error::{Error, Result};
use kerberos_asn1::{Asn1Object, KrbCred};
use kerberos_ccache::CCache;
use std::convert::{TryFrom, TryInto};
use std::fs;

/// Loads the tickets of a file. A missing or unparsable file is
/// considered empty.
pub fn load_file_creds(creds_file: &str) -> Result<TicketCreds> {
    match load_file_ticket_creds(creds_file) {
        Ok((ticket_creds, _)) => return Ok(ticket_creds),
        Err(err) => {
            if err.is_not_found_error() || err.is_data_error() {
                return Ok(TicketCreds::empty());
            }
            return Err(err);
        }
    }
}

/// Load the Ticket credentials from a file
pub fn load_file_ticket_creds(
    creds_file: &str,
) -> Result<(TicketCreds, CredFormat)> {
    let (krb_cred, format) = load_file_krb_cred(creds_file)?;

    // Kerberos credentials are usually stored in plain text so this
    // should work.
    let ticket_creds = TicketCreds::try_from(krb_cred)?;
    return Ok((ticket_creds, format));
}

/// Load the Kerberos credentials from a file.
pub fn load_file_krb_cred(creds_file: &str) -> Result<(KrbCred, CredFormat)> {
    let data = fs::read(creds_file).map_err(|err| {
        let message = format!("Unable to read the file '{}'", creds_file);
        (message, err)
    })?;

    match CCache::parse(&data) {
        Ok((_, ccache)) => {
            let krb_cred = ccache.try_into().map_err(|_| {
                Error::DataError(format!(
                    "Error parsing ccache data content of file '{}'",
                    creds_file
                ))
            })?;

            return Ok((krb_cred, CredFormat::Ccache));
        }
        Err(_) => {
            let (_, krb_cred) = KrbCred::parse(&data).map_err(|_| {
                Error::DataError(format!(
                    "Error parsing content of ccache/krb file '{}'",
                    creds_file
                ))
            })?;
            return Ok((krb_cred, CredFormat::Krb));
        }
    }
}

/// Save the tickets in the file with the specified format. The previous
/// content of the file is replaced.
pub fn save_file_creds(
    creds_file: &str,
    creds: &TicketCreds,
    cred_format: CredFormat,
) -> Result<()> {
    let krb_cred = KrbCred::try_from(creds)?;

    let raw_cred = match cred_format {
        CredFormat::Krb => krb_cred.build(),
        CredFormat::Ccache => {
            let ccache: CCache = krb_cred.try_into().map_err(|_| {
                Error::DataError(format!("Error converting KrbCred to CCache"))
            })?;
            ccache.build()
        }
    };

    fs::write(creds_file, raw_cred).map_err(|err| {
        let message =
            format!("Unable to write credentials in file {}", creds_file);
        (message, err)
    })?;

    return Ok(());
}
