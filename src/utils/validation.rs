use crate::utils::error::{MkcertError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

static HOSTNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\*\.)?[0-9A-Za-z._-]+$").expect("hostname pattern"));

static SECOND_LEVEL_WILDCARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\*\.[0-9a-z_-]+$").expect("second-level wildcard pattern"));

/// Accepts anything that can go into a certificate SAN: IP addresses and
/// DNS names, including one-level wildcards like `*.example.com`.
pub fn validate_host(name: &str) -> Result<()> {
    if name.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    if HOSTNAME_RE.is_match(name) {
        return Ok(());
    }
    Err(MkcertError::InvalidHostError {
        name: name.to_string(),
    })
}

/// Wildcards directly under a TLD, like `*.dev`, are rejected by most
/// browsers regardless of what the certificate says.
pub fn is_second_level_wildcard(name: &str) -> bool {
    SECOND_LEVEL_WILDCARD_RE.is_match(name)
}
