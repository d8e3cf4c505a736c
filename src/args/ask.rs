use super::validators;
use clap::{App, Arg, ArgGroup, ArgMatches, SubCommand};
use kerberos_crypto::Key;
use krbticket::communication::{Kdcs, TransportProtocol};
use krbticket::core::{CredFormat, KrbUser};
use std::net::SocketAddr;
use std::time::Duration;

pub const COMMAND_NAME: &str = "ask";

pub fn command() -> App<'static, 'static> {
    SubCommand::with_name(COMMAND_NAME)
        .about("Ask for tickets")
        .arg(
            Arg::with_name("realm")
                .long("realm")
                .alias("domain")
                .short("d")
                .takes_value(true)
                .help("Domain/Realm for request the ticket")
                .required(true),
        )
        .arg(
            Arg::with_name("user")
                .long("user")
                .short("u")
                .takes_value(true)
                .help("Username for request the ticket")
                .required(true),
        )
        .arg(
            Arg::with_name("password")
                .long("password")
                .short("p")
                .takes_value(true)
                .help("Password of user"),
        )
        .arg(
            Arg::with_name("rc4")
                .long("rc4")
                .alias("ntlm")
                .takes_value(true)
                .help("RC4 Kerberos key (NTLM hash of user)")
                .validator(validators::is_rc4_key),
        )
        .arg(
            Arg::with_name("aes")
                .long("aes")
                .takes_value(true)
                .help("AES Kerberos key of user")
                .validator(validators::is_aes_key),
        )
        .group(
            ArgGroup::with_name("user_key")
                .args(&["password", "rc4", "aes"])
                .multiple(false),
        )
        .arg(
            Arg::with_name("service")
                .long("service")
                .alias("spn")
                .takes_value(true)
                .value_name("spn")
                .help("SPN of the desired service"),
        )
        .arg(
            Arg::with_name("kdc")
                .long("kdc")
                .visible_alias("dc")
                .short("k")
                .value_name("[domain:]ip")
                .takes_value(true)
                .multiple(true)
                .use_delimiter(true)
                .help("The address of the KDC (usually the Domain Controller)")
                .validator(validators::is_kdc_domain_ip),
        )
        .arg(
            Arg::with_name("dns")
                .long("dns")
                .value_name("ip")
                .takes_value(true)
                .multiple(true)
                .use_delimiter(true)
                .help("DNS servers to resolve the KDC of the realm")
                .validator(validators::is_ip),
        )
        .arg(
            Arg::with_name("tcp")
                .long("tcp")
                .help("Use tcp as transport protocol from the beginning"),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .takes_value(true)
                .value_name("seconds")
                .help("Seconds to wait for a KDC response over udp")
                .default_value("3")
                .validator(validators::is_u32),
        )
        .arg(
            Arg::with_name("cred-format")
                .long("cred-format")
                .alias("ticket-format")
                .takes_value(true)
                .possible_values(&["krb", "ccache"])
                .help("Format to save retrieved tickets (default: ccache)"),
        )
        .arg(
            Arg::with_name("cred-file")
                .long("cred-file")
                .alias("ticket-file")
                .takes_value(true)
                .value_name("file")
                .help("File to load/save tickets"),
        )
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .help("Increase message verbosity"),
        )
}

#[derive(Debug)]
pub struct Arguments {
    pub user: KrbUser,
    pub user_key: Option<Key>,
    pub service: Option<String>,
    pub kdcs: Kdcs,
    pub dns_servers: Vec<SocketAddr>,
    pub transport_protocol: TransportProtocol,
    pub udp_timeout: Duration,
    pub credential_format: Option<CredFormat>,
    pub creds_file: Option<String>,
    pub verbosity: usize,
}

pub struct ArgumentsParser<'a> {
    matches: &'a ArgMatches<'a>,
}

impl<'a> ArgumentsParser<'a> {
    pub fn parse(matches: &'a ArgMatches) -> Arguments {
        let parser = Self { matches: matches };
        return parser._parse();
    }

    fn _parse(&self) -> Arguments {
        let realm: String = self.matches.value_of("realm").unwrap().into();
        let username: String = self.matches.value_of("user").unwrap().into();
        let kdcs = validators::parse_kdcs(&self.matches, &realm);

        return Arguments {
            user: KrbUser::new(username, realm),
            user_key: self.parse_user_key(),
            service: self.parse_service(),
            kdcs,
            dns_servers: validators::parse_dns_servers(&self.matches),
            transport_protocol: self.parse_transport_protocol(),
            udp_timeout: self.parse_timeout(),
            credential_format: self.parse_ticket_format(),
            creds_file: self.parse_credentials_file(),
            verbosity: self.matches.occurrences_of("verbosity") as usize,
        };
    }

    fn parse_user_key(&self) -> Option<Key> {
        if let Some(password) = self.matches.value_of("password") {
            return Some(Key::Secret(password.to_string()));
        } else if let Some(ntlm) = self.matches.value_of("rc4") {
            return Some(Key::from_rc4_key_string(ntlm).unwrap());
        } else if let Some(aes_key) = self.matches.value_of("aes") {
            if let Ok(key) = Key::from_aes_128_key_string(aes_key) {
                return Some(key);
            }
            return Some(Key::from_aes_256_key_string(aes_key).unwrap());
        }

        return None;
    }

    fn parse_service(&self) -> Option<String> {
        return self.matches.value_of("service").map(|s| s.into());
    }

    fn parse_transport_protocol(&self) -> TransportProtocol {
        if self.matches.is_present("tcp") {
            return TransportProtocol::TCP;
        }

        return TransportProtocol::UDP;
    }

    fn parse_timeout(&self) -> Duration {
        let seconds = self
            .matches
            .value_of("timeout")
            .unwrap()
            .parse::<u64>()
            .unwrap();
        return Duration::from_secs(seconds);
    }

    fn parse_ticket_format(&self) -> Option<CredFormat> {
        let format = self.matches.value_of("cred-format")?;

        if format == "krb" {
            return Some(CredFormat::Krb);
        }

        return Some(CredFormat::Ccache);
    }

    fn parse_credentials_file(&self) -> Option<String> {
        return self.matches.value_of("cred-file").map(|s| s.into());
    }
}
