pub mod config;
pub mod core;
pub mod domain;
pub mod truststore;
pub mod utils;

pub use config::CliConfig;
pub use core::engine::MkcertEngine;
pub use domain::model::{CertificateAuthority, CertificateFiles, Host};
pub use utils::error::{MkcertError, Result};
