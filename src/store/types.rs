//! Connection Profile Types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Suffix appended to the name of a duplicated profile
pub const COPY_SUFFIX: &str = " (Copy)";

/// Stable identifier of a saved profile, independent of list position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Placeholder for records stored without an id; replaced on load
    pub(crate) fn unassigned() -> Self {
        Self(String::new())
    }

    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Protocol {
    #[default]
    #[serde(rename = "SSH")]
    Ssh,
    #[serde(rename = "Telnet")]
    Telnet,
}

/// Effective authentication of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAuth<'a> {
    Password(&'a str),
    IdentityFile(&'a str),
    /// Telnet, or SSH with nothing saved (agent / interactive prompt)
    None,
}

/// One saved SSH/Telnet destination
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Assigned on creation; files written before ids existed get one on load
    #[serde(default = "ProfileId::unassigned")]
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub username: String,
    /// Hostname or IP
    pub domain: String,
    #[serde(default)]
    pub protocol: Protocol,
    /// Request X11 forwarding (SSH only)
    #[serde(default)]
    pub x11: bool,
    #[serde(default)]
    pub use_identity_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
    /// Plaintext; encrypted only as part of the whole store
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl ConnectionProfile {
    fn base(
        name: impl Into<String>,
        username: impl Into<String>,
        domain: impl Into<String>,
        protocol: Protocol,
    ) -> Self {
        Self {
            id: ProfileId::new(),
            name: name.into(),
            username: username.into(),
            domain: domain.into(),
            protocol,
            x11: false,
            use_identity_file: false,
            identity_file: None,
            password: None,
            description: String::new(),
        }
    }

    /// SSH profile authenticating with a saved password
    pub fn ssh_with_password(
        name: impl Into<String>,
        username: impl Into<String>,
        domain: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            password: Some(password.into()),
            ..Self::base(name, username, domain, Protocol::Ssh)
        }
    }

    /// SSH profile authenticating with an identity file
    pub fn ssh_with_identity_file(
        name: impl Into<String>,
        username: impl Into<String>,
        domain: impl Into<String>,
        identity_file: impl Into<String>,
    ) -> Self {
        Self {
            use_identity_file: true,
            identity_file: Some(identity_file.into()),
            ..Self::base(name, username, domain, Protocol::Ssh)
        }
    }

    pub fn telnet(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self::base(name, "", domain, Protocol::Telnet)
    }

    pub fn with_x11(mut self, enabled: bool) -> Self {
        self.x11 = enabled;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Authentication the launcher should use.
    ///
    /// Telnet ignores saved credentials; SSH uses the identity file when
    /// `use_identity_file` is set and the saved password otherwise.
    pub fn auth(&self) -> ProfileAuth<'_> {
        if self.protocol == Protocol::Telnet {
            return ProfileAuth::None;
        }

        if self.use_identity_file {
            return match self.identity_file.as_deref() {
                Some(path) if !path.is_empty() => ProfileAuth::IdentityFile(path),
                _ => ProfileAuth::None,
            };
        }

        match self.password.as_deref() {
            Some(password) if !password.is_empty() => ProfileAuth::Password(password),
            _ => ProfileAuth::None,
        }
    }

    /// Copy with a fresh id and the copy suffix on the name
    pub fn duplicate(&self) -> Self {
        Self {
            id: ProfileId::new(),
            name: format!("{}{}", self.name, COPY_SUFFIX),
            ..self.clone()
        }
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("domain", &self.domain)
            .field("protocol", &self.protocol)
            .field("x11", &self.x11)
            .field("use_identity_file", &self.use_identity_file)
            .field("identity_file", &self.identity_file)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_wire_names() {
        assert_eq!(serde_json::to_string(&Protocol::Ssh).unwrap(), "\"SSH\"");
        assert_eq!(serde_json::to_string(&Protocol::Telnet).unwrap(), "\"Telnet\"");
    }

    #[test]
    fn test_legacy_record_without_id() {
        let json = r#"{
            "name": "box1",
            "username": "alice",
            "domain": "10.0.0.5",
            "protocol": "SSH",
            "x11": false,
            "description": ""
        }"#;
        let profile: ConnectionProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.name, "box1");
        assert!(profile.id.is_unassigned());
        assert!(profile.password.is_none());
        assert!(profile.identity_file.is_none());
    }

    #[test]
    fn test_password_serialized_as_null_when_absent() {
        let profile = ConnectionProfile::telnet("router", "192.168.1.1");
        let value = serde_json::to_value(&profile).unwrap();

        assert!(value["password"].is_null());
        assert!(value.get("identity_file").is_none());
        assert_eq!(value["protocol"], "Telnet");
    }

    #[test]
    fn test_auth_selection() {
        let pw = ConnectionProfile::ssh_with_password("a", "u", "h", "secret");
        assert_eq!(pw.auth(), ProfileAuth::Password("secret"));

        let key = ConnectionProfile::ssh_with_identity_file("b", "u", "h", "/home/u/.ssh/id");
        assert_eq!(key.auth(), ProfileAuth::IdentityFile("/home/u/.ssh/id"));

        // Identity file takes precedence even when a stale password lingers
        let mut mixed = key.clone();
        mixed.password = Some("stale".to_string());
        assert_eq!(mixed.auth(), ProfileAuth::IdentityFile("/home/u/.ssh/id"));

        // Telnet carries credentials but ignores them
        let mut telnet = ConnectionProfile::telnet("c", "h");
        telnet.password = Some("ignored".to_string());
        assert_eq!(telnet.auth(), ProfileAuth::None);
    }

    #[test]
    fn test_duplicate() {
        let original = ConnectionProfile::ssh_with_password("box1", "alice", "10.0.0.5", "pw")
            .with_x11(true)
            .with_description("lab");
        let copy = original.duplicate();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, "box1 (Copy)");
        assert_eq!(
            ConnectionProfile {
                id: original.id.clone(),
                name: original.name.clone(),
                ..copy
            },
            original
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let profile = ConnectionProfile::ssh_with_password("a", "u", "h", "hunter2");
        let debug = format!("{:?}", profile);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }
}
