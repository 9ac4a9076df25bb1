use crate::utils::error::Result;
use crate::utils::validation::validate_host;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

pub const ROOT_CERT_NAME: &str = "rootCA.pem";
pub const ROOT_KEY_NAME: &str = "rootCA-key.pem";

/// A name a certificate can be requested for, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Host {
    Dns(String),
    Ip(IpAddr),
}

impl Host {
    pub fn parse(name: &str) -> Result<Host> {
        validate_host(name)?;
        match name.parse::<IpAddr>() {
            Ok(ip) => Ok(Host::Ip(ip)),
            Err(_) => Ok(Host::Dns(name.to_string())),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Host::Dns(name) if name.starts_with("*."))
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Dns(name) => f.write_str(name),
            Host::Ip(ip) => write!(f, "{ip}"),
        }
    }
}

/// The local root CA, as loaded from the CAROOT directory.
///
/// The key is optional: a CAROOT holding only `rootCA.pem` still supports
/// installing and uninstalling the CA, just not issuing certificates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateAuthority {
    caroot: PathBuf,
    cert_pem: String,
    cert_der: Vec<u8>,
    serial: String,
    key_pem: Option<String>,
}

impl CertificateAuthority {
    pub(crate) fn new(
        caroot: PathBuf,
        cert_pem: String,
        cert_der: Vec<u8>,
        serial: String,
        key_pem: Option<String>,
    ) -> Self {
        Self {
            caroot,
            cert_pem,
            cert_der,
            serial,
            key_pem,
        }
    }

    pub fn caroot(&self) -> &Path {
        &self.caroot
    }

    pub fn root_cert_path(&self) -> PathBuf {
        self.caroot.join(ROOT_CERT_NAME)
    }

    pub fn root_key_path(&self) -> PathBuf {
        self.caroot.join(ROOT_KEY_NAME)
    }

    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    pub fn cert_der(&self) -> &[u8] {
        &self.cert_der
    }

    pub fn key_pem(&self) -> Option<&str> {
        self.key_pem.as_deref()
    }

    pub fn has_key(&self) -> bool {
        self.key_pem.is_some()
    }

    /// Nickname registered in trust stores. The serial number makes it
    /// unique, so CAs from different machines don't collide.
    pub fn unique_name(&self) -> String {
        format!("mkcert development CA {}", self.serial)
    }
}

/// Where an issued certificate and its key ended up on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateFiles {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// What a trust store did with an install request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    NotSupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_parse() {
        assert_eq!(
            Host::parse("example.com").unwrap(),
            Host::Dns("example.com".to_string())
        );
        assert_eq!(
            Host::parse("127.0.0.1").unwrap(),
            Host::Ip("127.0.0.1".parse().unwrap())
        );
        assert_eq!(Host::parse("::1").unwrap(), Host::Ip("::1".parse().unwrap()));
        assert!(Host::parse("bad host").is_err());
    }

    #[test]
    fn test_host_wildcard() {
        assert!(Host::parse("*.example.com").unwrap().is_wildcard());
        assert!(!Host::parse("example.com").unwrap().is_wildcard());
        assert!(!Host::parse("127.0.0.1").unwrap().is_wildcard());
    }

    #[test]
    fn test_unique_name_includes_serial() {
        let ca = CertificateAuthority::new(
            PathBuf::from("/tmp/caroot"),
            String::new(),
            Vec::new(),
            "123456789".to_string(),
            None,
        );
        assert_eq!(ca.unique_name(), "mkcert development CA 123456789");
        assert!(!ca.has_key());
        assert_eq!(ca.root_cert_path(), PathBuf::from("/tmp/caroot/rootCA.pem"));
        assert_eq!(
            ca.root_key_path(),
            PathBuf::from("/tmp/caroot/rootCA-key.pem")
        );
    }
}
