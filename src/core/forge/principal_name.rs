use kerberos_asn1::PrincipalName;
use kerberos_constants::principal_names;

pub fn new_nt_principal(name: &str) -> PrincipalName {
    return new_principal_name(name, principal_names::NT_PRINCIPAL);
}

pub fn new_nt_srv_inst(service: &str) -> PrincipalName {
    return new_principal_name(service, principal_names::NT_SRV_INST);
}

/// Name of the ticket granting service of a realm
pub fn new_krbtgt_principal(realm: &str) -> PrincipalName {
    return new_nt_srv_inst(&format!("krbtgt/{}", realm));
}

pub fn new_principal_name(name: &str, name_type: i32) -> PrincipalName {
    return PrincipalName {
        name_type: name_type,
        name_string: spn_to_service_parts(name),
    };
}

pub fn spn_to_service_parts(spn: &str) -> Vec<String> {
    spn.split("/").map(|s| s.to_string()).collect()
}

/// Compose the principal name as it is usually displayed,
/// e.g: krbtgt/KINGDOM.HEARTS
pub fn principal_name_to_string(name: &PrincipalName) -> String {
    return name.name_string.join("/");
}

/// Compares the name components, since the KDC may change the name type
/// of the principal in the response.
pub fn principal_names_match(a: &PrincipalName, b: &PrincipalName) -> bool {
    return a.name_string == b.name_string;
}
