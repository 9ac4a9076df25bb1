use super::NSS_BROWSERS;
use crate::domain::model::{CertificateAuthority, InstallOutcome};
use crate::domain::ports::TrustStore;
use crate::utils::error::{MkcertError, Result};
use crate::utils::exec::{command_with_sudo, lookup_path, run_capture, CommandOutput};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg(target_os = "macos")]
const CERTUTIL_INSTALL_HELP: Option<&str> = Some("brew install nss");
#[cfg(target_os = "linux")]
const CERTUTIL_INSTALL_HELP: Option<&str> =
    Some(r#"apt install libnss3-tools" or "yum install nss-tools"#);
#[cfg(target_os = "openbsd")]
const CERTUTIL_INSTALL_HELP: Option<&str> = Some("pkg_add nss");
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "openbsd")))]
const CERTUTIL_INSTALL_HELP: Option<&str> = None;

/// Locations a Firefox or Chromium install leaves traces in. Any of these
/// existing is enough to consider NSS present on the machine.
const FIREFOX_PATHS: &[&str] = &[
    "/usr/bin/firefox",
    "/usr/bin/firefox-nightly",
    "/usr/bin/firefox-developer-edition",
    "/Applications/Firefox.app",
    "/Applications/Firefox Developer Edition.app",
    "/Applications/Firefox Nightly.app",
    "C:\\Program Files\\Mozilla Firefox",
];

fn nss_db_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = env::var_os("HOME") {
        let home = PathBuf::from(home);
        paths.push(home.join(".pki/nssdb"));
        paths.push(home.join("snap/chromium/current/.pki/nssdb"));
    }
    paths.push(PathBuf::from("/etc/pki/nssdb"));
    paths
}

#[cfg(target_os = "macos")]
fn firefox_profiles_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(|home| PathBuf::from(home).join("Library/Application Support/Firefox/Profiles"))
}

#[cfg(not(target_os = "macos"))]
fn firefox_profiles_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(".mozilla/firefox"))
}

#[cfg(target_os = "macos")]
fn find_certutil() -> Option<PathBuf> {
    if let Some(path) = lookup_path("certutil") {
        return Some(path);
    }
    let legacy = PathBuf::from("/usr/local/opt/nss/bin/certutil");
    if legacy.exists() {
        return Some(legacy);
    }
    // Homebrew keeps kegs under a prefix only brew itself knows.
    let out = run_capture(&mut Command::new("brew").args(["--prefix", "nss"])).ok()?;
    if !out.success {
        return None;
    }
    let candidate = PathBuf::from(out.text().trim()).join("bin/certutil");
    candidate.exists().then_some(candidate)
}

#[cfg(not(target_os = "macos"))]
fn find_certutil() -> Option<PathBuf> {
    lookup_path("certutil")
}

/// One NSS certificate database, either the modern SQLite layout or the
/// legacy Berkeley DB one.
struct NssProfile {
    scheme: &'static str,
    dir: PathBuf,
}

impl NssProfile {
    fn db_arg(&self) -> OsString {
        let mut arg = OsString::from(self.scheme);
        arg.push(":");
        arg.push(&self.dir);
        arg
    }
}

fn classify_profiles(candidates: &[PathBuf]) -> Vec<NssProfile> {
    let mut profiles = Vec::new();
    for dir in candidates {
        if dir.join("cert9.db").exists() {
            profiles.push(NssProfile {
                scheme: "sql",
                dir: dir.clone(),
            });
        } else if dir.join("cert8.db").exists() {
            profiles.push(NssProfile {
                scheme: "dbm",
                dir: dir.clone(),
            });
        }
    }
    profiles
}

fn profiles() -> Vec<NssProfile> {
    let mut candidates = Vec::new();
    if let Some(dir) = firefox_profiles_dir() {
        if let Ok(entries) = fs::read_dir(&dir) {
            for entry in entries.flatten() {
                candidates.push(entry.path());
            }
        }
    }
    candidates.extend(nss_db_paths());
    classify_profiles(&candidates)
}

/// The NSS trust store shared by Firefox and Chromium, driven through the
/// certutil tool.
pub struct NssStore {
    certutil: Option<PathBuf>,
    has_nss: bool,
}

impl NssStore {
    pub fn detect() -> Self {
        let has_nss = nss_db_paths().iter().any(|path| path.exists())
            || FIREFOX_PATHS.iter().any(|path| Path::new(path).exists());
        Self {
            certutil: find_certutil(),
            has_nss,
        }
    }

    fn exec_certutil(&self, certutil: &Path, args: &[OsString]) -> Result<CommandOutput> {
        let mut cmd = Command::new(certutil);
        cmd.args(args);
        let out = run_capture(&mut cmd)?;
        // NSS databases in system locations are read-only for regular
        // users; retry through the privilege helper.
        if !out.success && out.text().contains("SEC_ERROR_READ_ONLY") && cfg!(not(windows)) {
            return run_capture(&mut command_with_sudo(certutil, args));
        }
        Ok(out)
    }

    fn contains(&self, certutil: &Path, profile: &NssProfile, ca: &CertificateAuthority) -> Result<bool> {
        let mut cmd = Command::new(certutil);
        cmd.arg("-V")
            .arg("-d")
            .arg(profile.db_arg())
            .args(["-u", "L", "-n"])
            .arg(ca.unique_name());
        let out = run_capture(&mut cmd)?;
        Ok(out.success)
    }
}

impl TrustStore for NssStore {
    fn description(&self) -> String {
        format!("the {NSS_BROWSERS} trust store")
    }

    fn is_available(&self) -> bool {
        self.has_nss
    }

    fn check(&self, ca: &CertificateAuthority) -> Result<bool> {
        let Some(certutil) = &self.certutil else {
            return Ok(false);
        };
        let profiles = profiles();
        if profiles.is_empty() {
            return Ok(false);
        }
        for profile in &profiles {
            if !self.contains(certutil, profile, ca)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn install(&self, ca: &CertificateAuthority) -> Result<InstallOutcome> {
        let Some(certutil) = &self.certutil else {
            match CERTUTIL_INSTALL_HELP {
                Some(help) => {
                    println!(
                        "Warning: \"certutil\" is not available, so the CA can't be automatically installed in {NSS_BROWSERS}! ⚠️"
                    );
                    println!(
                        "Install \"certutil\" with \"{help}\" and re-run \"mkcert --install\" 👈"
                    );
                }
                None => {
                    println!("Note: {NSS_BROWSERS} support is not available on your platform. ℹ️");
                }
            }
            return Ok(InstallOutcome::NotSupported);
        };

        let root = ca.root_cert_path();
        let profiles = profiles();
        for profile in &profiles {
            let args: Vec<OsString> = vec![
                "-A".into(),
                "-d".into(),
                profile.db_arg(),
                "-t".into(),
                "C,,".into(),
                "-n".into(),
                ca.unique_name().into(),
                "-i".into(),
                root.clone().into_os_string(),
            ];
            let out = self.exec_certutil(certutil, &args)?;
            if !out.success {
                return Err(MkcertError::CommandError {
                    command: format!("certutil -A -d {}", profile.db_arg().to_string_lossy()),
                    output: out.text().into_owned(),
                });
            }
        }

        if profiles.is_empty() {
            println!("ERROR: no {NSS_BROWSERS} security databases found");
            return Ok(InstallOutcome::NotSupported);
        }
        if !self.check(ca)? {
            println!(
                "Installing in {NSS_BROWSERS} failed. Please report the issue with details about your environment at https://github.com/FiloSottile/mkcert/issues/new 👎"
            );
            println!(
                "Note that if you never started {NSS_BROWSERS}, you need to do that at least once."
            );
            return Ok(InstallOutcome::NotSupported);
        }
        println!(
            "The local CA is now installed in the {NSS_BROWSERS} trust store (requires browser restart)! 🦊"
        );
        Ok(InstallOutcome::Installed)
    }

    fn uninstall(&self, ca: &CertificateAuthority) -> Result<()> {
        let Some(certutil) = &self.certutil else {
            return Ok(());
        };
        for profile in &profiles() {
            // Only touch databases that actually hold the CA.
            if !self.contains(certutil, profile, ca)? {
                continue;
            }
            let args: Vec<OsString> = vec![
                "-D".into(),
                "-d".into(),
                profile.db_arg(),
                "-n".into(),
                ca.unique_name().into(),
            ];
            let out = self.exec_certutil(certutil, &args)?;
            if !out.success {
                return Err(MkcertError::CommandError {
                    command: format!("certutil -D -d {}", profile.db_arg().to_string_lossy()),
                    output: out.text().into_owned(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let modern = dir.path().join("modern");
        let legacy = dir.path().join("legacy");
        let empty = dir.path().join("empty");
        for profile in [&modern, &legacy, &empty] {
            fs::create_dir_all(profile).unwrap();
        }
        fs::write(modern.join("cert9.db"), b"").unwrap();
        fs::write(legacy.join("cert8.db"), b"").unwrap();

        let profiles = classify_profiles(&[modern.clone(), legacy.clone(), empty]);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].scheme, "sql");
        assert_eq!(profiles[0].dir, modern);
        assert_eq!(profiles[1].scheme, "dbm");
        assert_eq!(profiles[1].dir, legacy);
    }

    #[test]
    fn test_db_arg_format() {
        let profile = NssProfile {
            scheme: "sql",
            dir: PathBuf::from("/home/dev/.pki/nssdb"),
        };
        assert_eq!(
            profile.db_arg().to_string_lossy(),
            "sql:/home/dev/.pki/nssdb"
        );
    }

    #[test]
    fn test_missing_certutil_is_not_checked() {
        let store = NssStore {
            certutil: None,
            has_nss: true,
        };
        let ca = CertificateAuthority::new(
            PathBuf::from("/nonexistent/caroot"),
            String::new(),
            Vec::new(),
            "7".to_string(),
            None,
        );
        assert!(!store.check(&ca).unwrap());
    }
}
