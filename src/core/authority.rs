use crate::core::{random_serial, user_and_hostname, write_file_with_mode, VALIDITY_DAYS};
use crate::domain::model::{CertificateAuthority, ROOT_CERT_NAME, ROOT_KEY_NAME};
use crate::utils::error::{MkcertError, Result};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose};
use std::fs;
use std::path::Path;
use ::time::{Duration, OffsetDateTime};
use x509_parser::prelude::*;

/// Loads the root CA from the CAROOT directory, generating a fresh one on
/// first run.
pub fn load_or_create(caroot: &Path) -> Result<CertificateAuthority> {
    if !caroot.join(ROOT_CERT_NAME).exists() {
        create_ca(caroot)?;
    } else {
        println!("Using the local CA at \"{}\" ✨", caroot.display());
    }
    load_ca(caroot)
}

fn create_ca(caroot: &Path) -> Result<()> {
    let key_pair = KeyPair::generate()?;

    let mut params = CertificateParams::new(Vec::new())?;
    let ou = user_and_hostname();
    params
        .distinguished_name
        .push(DnType::OrganizationName, "mkcert development CA");
    params
        .distinguished_name
        .push(DnType::OrganizationalUnitName, ou.as_str());
    // Some trust store UIs only show the CommonName, so it has to carry
    // enough to identify the machine the CA came from.
    params
        .distinguished_name
        .push(DnType::CommonName, format!("mkcert {ou}"));

    params.serial_number = Some(random_serial()?);
    let now = OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + Duration::days(VALIDITY_DAYS);

    params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign];

    let cert = params.self_signed(&key_pair)?;

    write_file_with_mode(
        &caroot.join(ROOT_KEY_NAME),
        key_pair.serialize_pem().as_bytes(),
        0o400,
    )?;
    write_file_with_mode(&caroot.join(ROOT_CERT_NAME), cert.pem().as_bytes(), 0o644)?;

    println!("Created a new local CA at \"{}\" 💥", caroot.display());
    Ok(())
}

fn load_ca(caroot: &Path) -> Result<CertificateAuthority> {
    let cert_pem = fs::read_to_string(caroot.join(ROOT_CERT_NAME))?;
    let block = ::pem::parse(cert_pem.as_bytes())?;
    if block.tag() != "CERTIFICATE" {
        return Err(MkcertError::UnexpectedPemError {
            file: "certificate",
        });
    }
    let cert_der = block.contents().to_vec();

    let (_, cert) = X509Certificate::from_der(&cert_der).map_err(|e| {
        MkcertError::CertParseError {
            message: e.to_string(),
        }
    })?;
    let serial = cert.tbs_certificate.serial.to_string();

    // A missing key is not an error: a CAROOT holding only the certificate
    // can still be installed, and issuance reports the problem on use.
    let key_path = caroot.join(ROOT_KEY_NAME);
    let key_pem = if key_path.exists() {
        let text = fs::read_to_string(&key_path)?;
        let block = ::pem::parse(text.as_bytes())?;
        if block.tag() != "PRIVATE KEY" {
            return Err(MkcertError::UnexpectedPemError { file: "key" });
        }
        KeyPair::from_pem(&text)?;
        Some(text)
    } else {
        None
    };

    Ok(CertificateAuthority::new(
        caroot.to_path_buf(),
        cert_pem,
        cert_der,
        serial,
        key_pem,
    ))
}
