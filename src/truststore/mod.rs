mod java;
mod nss;
mod platform;

pub use java::JavaStore;
pub use nss::NssStore;
pub use platform::{is_platform_trusted, PlatformStore};

use crate::domain::ports::TrustStore;

/// The browsers reachable through NSS databases on this platform, as named
/// in user-facing messages.
#[cfg(target_os = "macos")]
pub(crate) const NSS_BROWSERS: &str = "Firefox";
#[cfg(target_os = "openbsd")]
pub(crate) const NSS_BROWSERS: &str = "Firefox and/or Chromium";
#[cfg(not(any(target_os = "macos", target_os = "openbsd")))]
pub(crate) const NSS_BROWSERS: &str = "Firefox and/or Chrome/Chromium";

/// Every trust store this build knows how to talk to, in install order.
pub fn detect_stores() -> Vec<Box<dyn TrustStore>> {
    vec![
        Box::new(PlatformStore::new()),
        Box::new(NssStore::detect()),
        Box::new(JavaStore::detect()),
    ]
}
