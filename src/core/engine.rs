use crate::config::{caroot::resolve_caroot, CliConfig};
use crate::core::{authority, certificate};
use crate::domain::model::{CertificateAuthority, CertificateFiles, Host};
use crate::domain::ports::TrustStore;
use crate::truststore;
use crate::utils::error::{MkcertError, Result};
use std::fs;

/// Ties the CLI configuration, the local CA and the trust stores together
/// into the install / uninstall / issue flows.
pub struct MkcertEngine {
    config: CliConfig,
    ca: CertificateAuthority,
    stores: Vec<Box<dyn TrustStore>>,
    install_ran: bool,
}

impl MkcertEngine {
    /// Resolves the CAROOT, loading or creating the CA inside it.
    pub fn new(config: CliConfig) -> Result<Self> {
        let caroot = resolve_caroot().ok_or(MkcertError::CaRootError)?;
        tracing::debug!("CAROOT is {}", caroot.display());
        fs::create_dir_all(&caroot)?;
        let ca = authority::load_or_create(&caroot)?;
        let stores = truststore::detect_stores();
        Ok(Self {
            config,
            ca,
            stores,
            install_ran: false,
        })
    }

    pub fn ca(&self) -> &CertificateAuthority {
        &self.ca
    }

    pub fn run(&mut self) -> Result<()> {
        if self.config.install {
            self.install()?;
            if self.config.hosts.is_empty() {
                return Ok(());
            }
        } else if self.config.uninstall {
            return self.uninstall();
        } else if !self.is_trusted_by_platform() {
            eprintln!("Warning: the local CA is not installed in the system trust store! ⚠️");
            eprintln!("Run \"mkcert --install\" to avoid verification errors ‼️");
        }

        if self.config.hosts.is_empty() {
            print_usage();
            return Ok(());
        }

        self.make_cert(&self.config.hosts)?;
        Ok(())
    }

    pub fn install(&mut self) -> Result<()> {
        for store in &self.stores {
            if !store.is_available() {
                continue;
            }
            if store.check(&self.ca)? {
                println!(
                    "The local CA is already installed in {}! 👍",
                    store.description()
                );
                continue;
            }
            store.install(&self.ca)?;
        }
        self.install_ran = true;
        println!();
        Ok(())
    }

    pub fn uninstall(&self) -> Result<()> {
        for store in &self.stores {
            if !store.is_available() {
                continue;
            }
            store.uninstall(&self.ca)?;
        }
        println!("The local CA is now uninstalled from the system trust store! 👋");
        println!();
        Ok(())
    }

    pub fn make_cert(&self, names: &[String]) -> Result<CertificateFiles> {
        let hosts = names
            .iter()
            .map(|name| Host::parse(name))
            .collect::<Result<Vec<_>>>()?;
        certificate::issue(
            &self.ca,
            &hosts,
            self.config.cert_file.as_deref(),
            self.config.key_file.as_deref(),
        )
    }

    fn is_trusted_by_platform(&self) -> bool {
        // Right after an install the native bundle may not have caught up
        // yet; don't warn about what we just did.
        self.install_ran || truststore::is_platform_trusted(&self.ca)
    }
}

fn print_usage() {
    println!(
        r#"Usage:

	$ mkcert --install
	Install the local CA in the system trust store.

	$ mkcert example.org
	Generate "example.org.pem" and "example.org-key.pem".

	$ mkcert example.com myapp.dev localhost 127.0.0.1 ::1
	Generate "example.com+4.pem" and "example.com+4-key.pem".

	$ mkcert "*.example.com"
	Generate "_wildcard.example.com.pem" and "_wildcard.example.com-key.pem".

	$ mkcert --uninstall
	Uninstall the local CA (but do not delete it).

Change the CA certificate and key storage location by setting $CAROOT."#
    );
}
