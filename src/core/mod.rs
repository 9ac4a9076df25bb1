pub mod authority;
pub mod certificate;
pub mod engine;

pub use crate::domain::model::{CertificateAuthority, CertificateFiles, Host, InstallOutcome};
pub use crate::domain::ports::TrustStore;
pub use crate::utils::error::Result;

use crate::utils::error::MkcertError;
use rcgen::SerialNumber;
use ring::rand::{SecureRandom, SystemRandom};
use std::path::Path;

/// Certificates are valid for ten years, both the root CA and the leaves.
pub(crate) const VALIDITY_DAYS: i64 = 3650;

/// Subject OrganizationalUnit recorded in every certificate, so a stray
/// development certificate can be traced back to the machine that minted it.
pub(crate) fn user_and_hostname() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{user}@{host}")
}

/// 128-bit random serial number, the same size real CAs use.
pub(crate) fn random_serial() -> Result<SerialNumber> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| MkcertError::SerialError)?;
    Ok(SerialNumber::from(bytes.to_vec()))
}

#[cfg(unix)]
pub(crate) fn write_file_with_mode(path: &Path, data: &[u8], mode: u32) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)?;
    file.write_all(data)?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn write_file_with_mode(path: &Path, data: &[u8], _mode: u32) -> Result<()> {
    std::fs::write(path, data)?;
    Ok(())
}
