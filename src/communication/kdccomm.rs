use crate::communication::{
    KrbChannel, TcpChannel, TransportProtocol, UdpChannel,
};
use crate::error::Result;
use log::{debug, warn};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use trust_dns_resolver::config::{
    NameServerConfig, Protocol, ResolverConfig, ResolverOpts,
};
use trust_dns_resolver::proto::rr::{RData, RecordType};
use trust_dns_resolver::Resolver;

pub const DEFAULT_KDC_PORT: u16 = 88;

/// Service names of the KDC SRV records, in lookup order
const KDC_SERVICE_NAMES: [&str; 2] = ["_kerberos", "_kerberos-master"];

/// Trait implemented by the ones that know how to reach the KDC of a realm
pub trait KdcLocator {
    /// Creates a connection with a KDC of the realm
    fn locate(
        &self,
        realm: &str,
        protocol: TransportProtocol,
    ) -> Result<Box<dyn KrbChannel>>;
}

/// KDC addresses given by the user, indexed by realm (in lowercase)
#[derive(Debug, Clone, Default)]
pub struct Kdcs {
    kdcs: HashMap<String, IpAddr>,
}

impl Kdcs {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn insert(&mut self, realm: String, ip: IpAddr) {
        self.kdcs.insert(realm.to_lowercase(), ip);
    }

    pub fn get(&self, realm: &str) -> Option<&IpAddr> {
        return self.kdcs.get(&realm.to_lowercase());
    }
}

/// Time to wait for a reply over TCP before giving up
const TCP_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves the KDCs of the realms, by using the addresses given by the
/// user or the DNS SRV records of the realm.
#[derive(Debug, Clone)]
pub struct KdcComm {
    kdcs: Kdcs,
    dns_servers: Vec<SocketAddr>,
    port: u16,
    udp_timeout: Duration,
}

impl KdcComm {
    pub fn new(kdcs: Kdcs, dns_servers: Vec<SocketAddr>) -> Self {
        return Self {
            kdcs,
            dns_servers,
            port: DEFAULT_KDC_PORT,
            udp_timeout: Duration::from_secs(3),
        };
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn udp_timeout(mut self, udp_timeout: Duration) -> Self {
        self.udp_timeout = udp_timeout;
        self
    }

    /// Addresses of the KDCs of the realm, in the order they should be
    /// tried.
    pub fn kdc_addresses(
        &self,
        realm: &str,
        protocol: TransportProtocol,
    ) -> Result<Vec<SocketAddr>> {
        if let Some(ip) = self.kdcs.get(realm) {
            return Ok(vec![SocketAddr::new(*ip, self.port)]);
        }

        return self.resolve_srv(realm, protocol);
    }

    fn resolve_srv(
        &self,
        realm: &str,
        protocol: TransportProtocol,
    ) -> Result<Vec<SocketAddr>> {
        let resolver = self.new_resolver()?;
        let mut last_error = format!("No KDC found for '{}'", realm);

        for service in KDC_SERVICE_NAMES.iter() {
            let srv_name = srv_record_name(service, protocol, realm);
            debug!("Lookup {} SRV records", srv_name);

            let lookup = match resolver.lookup(srv_name.as_str(), RecordType::SRV) {
                Ok(lookup) => lookup,
                Err(err) => {
                    last_error =
                        format!("Error resolving '{}': {}", srv_name, err);
                    continue;
                }
            };

            let mut srvs: Vec<(u16, String, u16)> = lookup
                .iter()
                .filter_map(|rdata| match rdata {
                    RData::SRV(srv) => Some((
                        srv.priority(),
                        srv.target().to_utf8(),
                        srv.port(),
                    )),
                    _ => None,
                })
                .collect();
            srvs.sort_by_key(|(priority, _, _)| *priority);

            let mut addresses = Vec::new();
            for (_, target, port) in srvs {
                match resolver.lookup_ip(target.as_str()) {
                    Ok(ips) => {
                        for ip in ips.iter() {
                            addresses.push(SocketAddr::new(ip, port));
                        }
                    }
                    Err(err) => {
                        warn!("Error resolving '{}': {}", target, err);
                    }
                }
            }

            if !addresses.is_empty() {
                return Ok(addresses);
            }
        }

        return Err(last_error)?;
    }

    fn new_resolver(&self) -> Result<Resolver> {
        if self.dns_servers.is_empty() {
            return Ok(Resolver::from_system_conf().map_err(|err| {
                format!("Unable to use dns system configuration: {}", err)
            })?);
        }

        let mut resolver_config = ResolverConfig::new();
        for server in self.dns_servers.iter() {
            resolver_config.add_name_server(NameServerConfig {
                socket_addr: *server,
                protocol: Protocol::Tcp,
                tls_dns_name: None,
                trust_nx_responses: false,
            });
        }

        return Ok(Resolver::new(resolver_config, ResolverOpts::default())
            .map_err(|err| format!("Unable to create resolver: {}", err))?);
    }

    fn connect(
        &self,
        address: SocketAddr,
        protocol: TransportProtocol,
    ) -> Result<Box<dyn KrbChannel>> {
        match protocol {
            TransportProtocol::TCP => {
                return Ok(Box::new(TcpChannel::connect(
                    address,
                    TCP_READ_TIMEOUT,
                )?));
            }
            TransportProtocol::UDP => {
                return Ok(Box::new(UdpChannel::connect(
                    address,
                    self.udp_timeout,
                )?));
            }
        }
    }
}

impl KdcLocator for KdcComm {
    fn locate(
        &self,
        realm: &str,
        protocol: TransportProtocol,
    ) -> Result<Box<dyn KrbChannel>> {
        let addresses = self.kdc_addresses(realm, protocol)?;
        let mut last_error = None;

        for address in addresses {
            match self.connect(address, protocol) {
                Ok(channel) => {
                    debug!("Connected with {} KDC {}", realm, address);
                    return Ok(channel);
                }
                Err(err) => {
                    warn!("Unable to connect with {}: {}", address, err);
                    last_error = Some(err);
                }
            }
        }

        return Err(last_error
            .unwrap_or(format!("No KDC address for '{}'", realm).into()));
    }
}

fn srv_record_name(
    service: &str,
    protocol: TransportProtocol,
    realm: &str,
) -> String {
    return format!("{}.{}.{}", service, protocol.srv_label(), realm);
}
