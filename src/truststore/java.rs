use crate::domain::model::{CertificateAuthority, InstallOutcome};
use crate::domain::ports::TrustStore;
use crate::utils::error::{MkcertError, Result};
use crate::utils::exec::{lookup_path, run_capture, CommandOutput, SUDO_PROGRAM};
use ring::digest;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default password of the JRE cacerts keystore.
const STORE_PASS: &str = "changeit";

/// The Java cacerts keystore of the JRE that JAVA_HOME points at, driven
/// through keytool.
pub struct JavaStore {
    java_home: Option<PathBuf>,
    keytool: Option<PathBuf>,
    cacerts: Option<PathBuf>,
}

impl JavaStore {
    pub fn detect() -> Self {
        let Some(home) = env::var_os("JAVA_HOME") else {
            return Self {
                java_home: None,
                keytool: None,
                cacerts: None,
            };
        };
        let home = PathBuf::from(home);
        let keytool = {
            let candidate = home.join("bin/keytool");
            candidate.exists().then_some(candidate)
        };
        // JDK 9+ keeps cacerts under lib/, older JREs under jre/lib/.
        let cacerts = [
            home.join("lib/security/cacerts"),
            home.join("jre/lib/security/cacerts"),
        ]
        .into_iter()
        .find(|path| path.exists());
        Self {
            java_home: Some(home),
            keytool,
            cacerts,
        }
    }

    fn exec_keytool(&self, keytool: &Path, args: &[OsString]) -> Result<CommandOutput> {
        let mut cmd = Command::new(keytool);
        cmd.args(args);
        let out = run_capture(&mut cmd)?;
        // A system-wide cacerts is only writable by root. keytool reports
        // that as a FileNotFoundException with a permission denied cause.
        if !out.success && out.text().contains("java.io.FileNotFoundException") {
            if let (Some(sudo), Some(java_home)) = (lookup_path(SUDO_PROGRAM), &self.java_home) {
                let mut cmd = Command::new(sudo);
                cmd.arg(keytool)
                    .args(args)
                    .env_clear()
                    .env("JAVA_HOME", java_home);
                return run_capture(&mut cmd);
            }
        }
        Ok(out)
    }
}

/// Whether a keytool listing contains the certificate, by SHA-256 or SHA-1
/// fingerprint depending on the keytool vintage.
fn output_lists_fingerprint(listing: &str, der: &[u8]) -> bool {
    let listing = listing.replace(':', "");
    let sha256 = hex::encode(digest::digest(&digest::SHA256, der)).to_uppercase();
    let sha1 = hex::encode(digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, der)).to_uppercase();
    listing.contains(&sha256) || listing.contains(&sha1)
}

impl TrustStore for JavaStore {
    fn description(&self) -> String {
        "Java's trust store".to_string()
    }

    fn is_available(&self) -> bool {
        self.java_home.is_some()
    }

    fn check(&self, ca: &CertificateAuthority) -> Result<bool> {
        let (Some(keytool), Some(cacerts)) = (&self.keytool, &self.cacerts) else {
            return Ok(false);
        };
        let mut cmd = Command::new(keytool);
        cmd.args(["-list", "-keystore"])
            .arg(cacerts)
            .args(["-storepass", STORE_PASS]);
        let out = run_capture(&mut cmd)?;
        if !out.success {
            return Err(MkcertError::CommandError {
                command: "keytool -list".to_string(),
                output: out.text().into_owned(),
            });
        }
        Ok(output_lists_fingerprint(&out.text(), ca.cert_der()))
    }

    fn install(&self, ca: &CertificateAuthority) -> Result<InstallOutcome> {
        let (Some(keytool), Some(cacerts)) = (&self.keytool, &self.cacerts) else {
            println!(
                "Warning: \"keytool\" is not available, so the CA can't be automatically installed in Java's trust store! ⚠️"
            );
            return Ok(InstallOutcome::NotSupported);
        };
        let args: Vec<OsString> = vec![
            "-importcert".into(),
            "-noprompt".into(),
            "-keystore".into(),
            cacerts.clone().into_os_string(),
            "-storepass".into(),
            STORE_PASS.into(),
            "-file".into(),
            ca.root_cert_path().into_os_string(),
            "-alias".into(),
            ca.unique_name().into(),
        ];
        let out = self.exec_keytool(keytool, &args)?;
        if !out.success {
            return Err(MkcertError::CommandError {
                command: "keytool -importcert".to_string(),
                output: out.text().into_owned(),
            });
        }
        println!("The local CA is now installed in Java's trust store! ☕️");
        Ok(InstallOutcome::Installed)
    }

    fn uninstall(&self, ca: &CertificateAuthority) -> Result<()> {
        let (Some(keytool), Some(cacerts)) = (&self.keytool, &self.cacerts) else {
            return Ok(());
        };
        let args: Vec<OsString> = vec![
            "-delete".into(),
            "-alias".into(),
            ca.unique_name().into(),
            "-keystore".into(),
            cacerts.clone().into_os_string(),
            "-storepass".into(),
            STORE_PASS.into(),
        ];
        let out = self.exec_keytool(keytool, &args)?;
        if out.text().contains("does not exist") {
            return Ok(());
        }
        if !out.success {
            return Err(MkcertError::CommandError {
                command: "keytool -delete".to_string(),
                output: out.text().into_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_ca() -> CertificateAuthority {
        CertificateAuthority::new(
            PathBuf::from("/nonexistent/caroot"),
            String::new(),
            b"certificate bytes".to_vec(),
            "7".to_string(),
            None,
        )
    }

    #[test]
    fn test_fingerprint_matching() {
        let der = b"certificate bytes";
        let sha256 = hex::encode(digest::digest(&digest::SHA256, der)).to_uppercase();
        let with_colons = sha256
            .as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).unwrap())
            .collect::<Vec<_>>()
            .join(":");
        let listing = format!("mkcert, Jan 1, 2026, trustedCertEntry,\nCertificate fingerprint (SHA-256): {with_colons}");
        assert!(output_lists_fingerprint(&listing, der));
        assert!(!output_lists_fingerprint("no fingerprints here", der));
    }

    #[test]
    fn test_unavailable_without_java_home() {
        let store = JavaStore {
            java_home: None,
            keytool: None,
            cacerts: None,
        };
        assert!(!store.is_available());
        assert!(!store.check(&dummy_ca()).unwrap());
    }
}
