use krbticket::core::CredFormat;
use std::env;

/// File to save the tickets: the one given by the user, the one of the
/// KRB5CCNAME environment variable, or one named after the user.
pub fn get_ticket_file(
    args_file: Option<String>,
    username: &String,
    cred_format: &CredFormat,
) -> String {
    if let Some(file) = args_file {
        return file;
    }

    if let Some(file) = get_env_ticket_file() {
        return file;
    }

    return format!("{}.{}", username, cred_format);
}

/// Format to save the tickets: the one given by the user, the one of the
/// file extension, or ccache.
pub fn get_cred_format(
    args_format: Option<CredFormat>,
    args_file: Option<&String>,
) -> CredFormat {
    if let Some(format) = args_format {
        return format;
    }

    return args_file
        .and_then(|file| CredFormat::from_file_extension(file))
        .unwrap_or(CredFormat::Ccache);
}

pub fn get_env_ticket_file() -> Option<String> {
    return env::var("KRB5CCNAME").ok();
}
