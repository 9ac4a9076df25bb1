use crate::domain::model::{CertificateAuthority, InstallOutcome};
use crate::utils::error::Result;

/// A certificate store the local CA can be registered in.
///
/// Implementations print their own progress and warnings; the engine only
/// reports the "already installed" case and aggregates outcomes.
pub trait TrustStore {
    /// Human-readable name used in status messages, e.g. "the system trust store".
    fn description(&self) -> String;

    /// Whether this store exists on the current machine at all.
    fn is_available(&self) -> bool;

    /// Whether the CA is currently trusted by this store.
    fn check(&self, ca: &CertificateAuthority) -> Result<bool>;

    fn install(&self, ca: &CertificateAuthority) -> Result<InstallOutcome>;

    fn uninstall(&self, ca: &CertificateAuthority) -> Result<()>;
}
