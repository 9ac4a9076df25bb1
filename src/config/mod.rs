pub mod caroot;

use crate::utils::error::{MkcertError, Result};
use crate::utils::validation::{validate_host, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "mkcert")]
#[command(about = "Simple tool to make locally trusted development certificates")]
pub struct CliConfig {
    #[arg(long, help = "Install the local root CA in the system trust store")]
    pub install: bool,

    #[arg(
        long,
        conflicts_with = "install",
        help = "Uninstall the local root CA from the system trust store"
    )]
    pub uninstall: bool,

    #[arg(long, value_name = "FILE", help = "Customize the certificate output path")]
    pub cert_file: Option<String>,

    #[arg(long, value_name = "FILE", help = "Customize the key output path")]
    pub key_file: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(value_name = "HOST", help = "Hostnames and IPs to include in the certificate")]
    pub hosts: Vec<String>,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.install && self.uninstall {
            return Err(MkcertError::ConfigError {
                message: "you can't set --install and --uninstall at the same time".to_string(),
            });
        }
        for host in &self.hosts {
            validate_host(host)?;
        }
        Ok(())
    }
}
