//! Domain types for Cobbler provisioning records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::xmlrpc::Value;

/// A kickstart file, addressed on the server by name alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickstartFile {
    pub name: String,
    pub body: String,
}

/// A reusable template fragment stored under the snippets directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub name: String,
    pub body: String,
}

/// Network settings for the `eth0` interface of a system record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub mac: String,
    pub ip: String,
    pub dns_name: String,
    pub netmask: String,
    pub gateway: String,
}

impl NetworkConfig {
    /// The `modify_interface` payload, members in the order the server expects.
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("macaddress-eth0".to_string(), Value::from(self.mac.as_str())),
            ("ipaddress-eth0".to_string(), Value::from(self.ip.as_str())),
            ("dnsname-eth0".to_string(), Value::from(self.dns_name.as_str())),
            ("subnetmask-eth0".to_string(), Value::from(self.netmask.as_str())),
            ("if-gateway-eth0".to_string(), Value::from(self.gateway.as_str())),
        ])
    }
}

/// Everything `CobblerClient::create_system` writes into a new record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct System {
    pub name: String,
    pub profile: String,
    pub hostname: String,
    /// Space-separated, as Cobbler stores it.
    pub name_servers: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkConfig>,
}

/// An authenticated session, obtained from `CobblerClient::login`.
///
/// The token is opaque and never refreshed; when the server expires it,
/// calls start failing with `ApiError::Fault` and the caller logs in again.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_members_are_ordered() {
        let config = NetworkConfig {
            mac: "aa:bb:cc:dd:ee:ff".to_string(),
            ip: "10.0.0.5".to_string(),
            dns_name: "node1.example.com".to_string(),
            netmask: "255.255.255.0".to_string(),
            gateway: "10.0.0.1".to_string(),
        };
        let Value::Struct(members) = config.to_value() else {
            panic!("expected a struct");
        };
        let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            ["macaddress-eth0", "ipaddress-eth0", "dnsname-eth0", "subnetmask-eth0", "if-gateway-eth0"]
        );
        assert_eq!(members[4].1, Value::from("10.0.0.1"));
    }

    #[test]
    fn session_debug_hides_token() {
        let session = Session::new("s3cr3t-token");
        let shown = format!("{session:?}");
        assert!(!shown.contains("s3cr3t"));
        assert_eq!(session.token(), "s3cr3t-token");
    }

    #[test]
    fn system_network_is_optional_in_json() {
        let system: System = serde_json::from_str(
            r#"{"name":"web1","profile":"centos7","hostname":"web1.lan","name_servers":"8.8.8.8"}"#,
        )
        .unwrap();
        assert!(system.network.is_none());
        assert_eq!(system.profile, "centos7");
    }
}
