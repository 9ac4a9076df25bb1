use crate::domain::model::{CertificateAuthority, InstallOutcome};
use crate::domain::ports::TrustStore;
use crate::utils::error::Result;

#[cfg(any(target_os = "linux", target_os = "freebsd", target_os = "macos"))]
use crate::utils::error::MkcertError;
#[cfg(any(target_os = "linux", target_os = "freebsd", target_os = "macos"))]
use crate::utils::exec::{command_with_sudo, run_capture};
#[cfg(any(target_os = "linux", target_os = "freebsd", target_os = "macos"))]
use std::ffi::OsStr;
#[cfg(any(target_os = "linux", target_os = "freebsd"))]
use std::path::{Path, PathBuf};

/// The operating system trust store, reached through whatever mechanism the
/// platform provides for adding root certificates.
pub struct PlatformStore {
    kind: PlatformKind,
}

enum PlatformKind {
    /// A directory the certificate gets dropped into, followed by a refresh
    /// command that rebuilds the system bundle.
    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    AnchorDir {
        dir: PathBuf,
        suffix: &'static str,
        refresh: &'static [&'static str],
        ensure_dir: bool,
    },
    /// The macOS system keychain, driven through the security tool.
    #[cfg(target_os = "macos")]
    Keychain,
    #[cfg(not(any(target_os = "macos", target_os = "freebsd")))]
    Unsupported,
}

#[cfg(target_os = "linux")]
fn detect_platform() -> PlatformKind {
    use crate::utils::exec::binary_exists;

    let (dir, suffix, refresh): (&str, &'static str, &'static [&'static str]) =
        if Path::new("/etc/pki/ca-trust/source/anchors/").is_dir() {
            (
                "/etc/pki/ca-trust/source/anchors",
                "pem",
                &["update-ca-trust", "extract"],
            )
        } else if Path::new("/usr/local/share/ca-certificates/").is_dir() {
            (
                "/usr/local/share/ca-certificates",
                "crt",
                &["update-ca-certificates"],
            )
        } else {
            return PlatformKind::Unsupported;
        };
    if !binary_exists(refresh[0]) {
        return PlatformKind::Unsupported;
    }
    PlatformKind::AnchorDir {
        dir: PathBuf::from(dir),
        suffix,
        refresh,
        ensure_dir: false,
    }
}

#[cfg(target_os = "freebsd")]
fn detect_platform() -> PlatformKind {
    PlatformKind::AnchorDir {
        dir: PathBuf::from("/usr/local/etc/ssl/certs"),
        suffix: "pem",
        refresh: &["certctl", "rehash"],
        ensure_dir: true,
    }
}

#[cfg(target_os = "macos")]
fn detect_platform() -> PlatformKind {
    PlatformKind::Keychain
}

#[cfg(not(any(target_os = "linux", target_os = "freebsd", target_os = "macos")))]
fn detect_platform() -> PlatformKind {
    PlatformKind::Unsupported
}

impl PlatformStore {
    pub fn new() -> Self {
        Self {
            kind: detect_platform(),
        }
    }
}

impl TrustStore for PlatformStore {
    fn description(&self) -> String {
        "the system trust store".to_string()
    }

    fn is_available(&self) -> bool {
        true
    }

    fn check(&self, ca: &CertificateAuthority) -> Result<bool> {
        Ok(is_platform_trusted(ca))
    }

    fn install(&self, ca: &CertificateAuthority) -> Result<InstallOutcome> {
        match &self.kind {
            #[cfg(any(target_os = "linux", target_os = "freebsd"))]
            PlatformKind::AnchorDir {
                dir,
                suffix,
                refresh,
                ensure_dir,
            } => install_anchor(ca, dir, suffix, refresh, *ensure_dir),
            #[cfg(target_os = "macos")]
            PlatformKind::Keychain => install_keychain(ca),
            #[cfg(not(any(target_os = "macos", target_os = "freebsd")))]
            PlatformKind::Unsupported => {
                print_unsupported(ca);
                Ok(InstallOutcome::NotSupported)
            }
        }
    }

    fn uninstall(&self, ca: &CertificateAuthority) -> Result<()> {
        match &self.kind {
            #[cfg(any(target_os = "linux", target_os = "freebsd"))]
            PlatformKind::AnchorDir {
                dir,
                suffix,
                refresh,
                ..
            } => uninstall_anchor(ca, dir, suffix, refresh),
            #[cfg(target_os = "macos")]
            PlatformKind::Keychain => uninstall_keychain(ca),
            #[cfg(not(any(target_os = "macos", target_os = "freebsd")))]
            PlatformKind::Unsupported => {
                tracing::debug!("no system trust store to remove {} from", ca.unique_name());
                Ok(())
            }
        }
    }
}

/// Whether the CA certificate shows up in the certificates the platform
/// itself hands to TLS clients.
pub fn is_platform_trusted(ca: &CertificateAuthority) -> bool {
    let result = rustls_native_certs::load_native_certs();
    if !result.errors.is_empty() {
        tracing::debug!("native trust store scan reported errors: {:?}", result.errors);
    }
    result.certs.iter().any(|cert| cert.as_ref() == ca.cert_der())
}

#[cfg(any(target_os = "linux", target_os = "freebsd"))]
fn anchor_path(ca: &CertificateAuthority, dir: &Path, suffix: &str) -> PathBuf {
    dir.join(format!("{}.{}", ca.unique_name().replace(' ', "_"), suffix))
}

#[cfg(any(target_os = "linux", target_os = "freebsd"))]
fn install_anchor(
    ca: &CertificateAuthority,
    dir: &Path,
    suffix: &str,
    refresh: &[&str],
    ensure_dir: bool,
) -> Result<InstallOutcome> {
    use std::io::Write;
    use std::process::Stdio;

    if ensure_dir {
        let out = run_capture(&mut command_with_sudo(
            "mkdir",
            &[OsStr::new("-p"), dir.as_os_str()],
        ))?;
        if !out.success {
            return Err(MkcertError::CommandError {
                command: "mkdir -p".to_string(),
                output: out.text().into_owned(),
            });
        }
    }

    let cert = std::fs::read(ca.root_cert_path())?;
    let anchor = anchor_path(ca, dir, suffix);

    // tee runs under the privilege helper, so mkcert itself never needs to
    // be root to write into the anchors directory.
    let mut cmd = command_with_sudo("tee", &[anchor.as_os_str()]);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    tracing::debug!("Executing: {:?}", cmd);
    let mut child = cmd.spawn()?;
    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(&cert)?;
    }
    let out = child.wait_with_output()?;
    if !out.status.success() {
        return Err(MkcertError::CommandError {
            command: "tee".to_string(),
            output: String::from_utf8_lossy(&out.stderr).into_owned(),
        });
    }

    run_refresh(refresh)?;
    println!("The local CA is now installed in the system trust store! ⚡️");
    Ok(InstallOutcome::Installed)
}

#[cfg(any(target_os = "linux", target_os = "freebsd"))]
fn uninstall_anchor(
    ca: &CertificateAuthority,
    dir: &Path,
    suffix: &str,
    refresh: &[&str],
) -> Result<()> {
    let anchor = anchor_path(ca, dir, suffix);
    let out = run_capture(&mut command_with_sudo(
        "rm",
        &[OsStr::new("-f"), anchor.as_os_str()],
    ))?;
    if !out.success {
        return Err(MkcertError::CommandError {
            command: "rm".to_string(),
            output: out.text().into_owned(),
        });
    }
    run_refresh(refresh)
}

#[cfg(any(target_os = "linux", target_os = "freebsd"))]
fn run_refresh(refresh: &[&str]) -> Result<()> {
    let out = run_capture(&mut command_with_sudo(refresh[0], &refresh[1..]))?;
    if !out.success {
        return Err(MkcertError::CommandError {
            command: refresh.join(" "),
            output: out.text().into_owned(),
        });
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn install_keychain(ca: &CertificateAuthority) -> Result<InstallOutcome> {
    let root = ca.root_cert_path();
    let out = run_capture(&mut command_with_sudo(
        "security",
        &[
            OsStr::new("add-trusted-cert"),
            OsStr::new("-d"),
            OsStr::new("-k"),
            OsStr::new("/Library/Keychains/System.keychain"),
            root.as_os_str(),
        ],
    ))?;
    if !out.success {
        return Err(MkcertError::CommandError {
            command: "security add-trusted-cert".to_string(),
            output: out.text().into_owned(),
        });
    }
    println!("The local CA is now installed in the system trust store! ⚡️");
    Ok(InstallOutcome::Installed)
}

#[cfg(target_os = "macos")]
fn uninstall_keychain(ca: &CertificateAuthority) -> Result<()> {
    let root = ca.root_cert_path();
    let out = run_capture(&mut command_with_sudo(
        "security",
        &[
            OsStr::new("remove-trusted-cert"),
            OsStr::new("-d"),
            root.as_os_str(),
        ],
    ))?;
    if !out.success {
        return Err(MkcertError::CommandError {
            command: "security remove-trusted-cert".to_string(),
            output: out.text().into_owned(),
        });
    }
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "freebsd")))]
fn print_unsupported(ca: &CertificateAuthority) {
    #[cfg(target_os = "linux")]
    println!(
        "Installing to the system store is not yet supported on this Linux 😣 but {} will still work.",
        super::NSS_BROWSERS
    );
    #[cfg(target_os = "openbsd")]
    println!(
        "Installing to the system store is not yet supported on OpenBSD 😣 but {} will still work.",
        super::NSS_BROWSERS
    );
    #[cfg(not(any(target_os = "linux", target_os = "openbsd")))]
    println!("Installing to the system store is not available on your platform 👎");
    println!(
        "You can also manually install the root certificate at \"{}\".",
        ca.root_cert_path().display()
    );
}
