use thiserror::Error;

#[derive(Error, Debug)]
pub enum MkcertError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("certificate generation failed: {0}")]
    CertError(#[from] rcgen::Error),

    #[error("PEM decoding failed: {0}")]
    PemError(#[from] pem::PemError),

    #[error("failed to parse the CA certificate: {message}")]
    CertParseError { message: String },

    #[error("failed to read the CA {file}: unexpected content")]
    UnexpectedPemError { file: &'static str },

    #[error("failed to generate serial number")]
    SerialError,

    #[error("failed to find the default CA location, set one as the CAROOT env var")]
    CaRootError,

    #[error("can't create new certificates because the CA key (rootCA-key.pem) is missing")]
    MissingCaKeyError,

    #[error("\"{name}\" is not a valid hostname or IP")]
    InvalidHostError { name: String },

    #[error("failed to execute \"{command}\"\n\n{output}")]
    CommandError { command: String, output: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

pub type Result<T> = std::result::Result<T, MkcertError>;
