use crate::core::{random_serial, user_and_hostname, write_file_with_mode, VALIDITY_DAYS};
use crate::domain::model::{CertificateAuthority, CertificateFiles, Host};
use crate::utils::error::{MkcertError, Result};
use crate::utils::validation::is_second_level_wildcard;
use rcgen::string::Ia5String;
use rcgen::{
    CertificateParams, DnType, ExtendedKeyUsagePurpose, Issuer, KeyPair, KeyUsagePurpose, SanType,
};
use std::path::{Path, PathBuf};
use time::{Duration, OffsetDateTime};

/// Issues a certificate for the given hosts, signed by the local CA, and
/// writes the certificate and key where the configuration asks for them.
pub fn issue(
    ca: &CertificateAuthority,
    hosts: &[Host],
    cert_file: Option<&str>,
    key_file: Option<&str>,
) -> Result<CertificateFiles> {
    let ca_key_pem = ca.key_pem().ok_or(MkcertError::MissingCaKeyError)?;
    let ca_key = KeyPair::from_pem(ca_key_pem)?;
    let issuer = Issuer::from_ca_cert_pem(ca.cert_pem(), ca_key)?;

    let key_pair = KeyPair::generate()?;

    let mut params = CertificateParams::new(Vec::new())?;
    params
        .distinguished_name
        .push(DnType::OrganizationName, "mkcert development certificate");
    params
        .distinguished_name
        .push(DnType::OrganizationalUnitName, user_and_hostname().as_str());

    params.serial_number = Some(random_serial()?);
    let now = OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + Duration::days(VALIDITY_DAYS);

    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    params.subject_alt_names = hosts.iter().map(san_for).collect::<Result<Vec<_>>>()?;

    let cert = params.signed_by(&key_pair, &issuer)?;

    let stem = file_stem(hosts);
    let cert_path = output_path(cert_file, &stem, ".pem");
    let key_path = output_path(key_file, &stem, "-key.pem");

    write_file_with_mode(&key_path, key_pair.serialize_pem().as_bytes(), 0o600)?;
    write_file_with_mode(&cert_path, cert.pem().as_bytes(), 0o644)?;

    print_report(hosts, &cert_path, &key_path);

    Ok(CertificateFiles {
        cert_path,
        key_path,
    })
}

fn san_for(host: &Host) -> Result<SanType> {
    match host {
        Host::Ip(ip) => Ok(SanType::IpAddress(*ip)),
        Host::Dns(name) => Ok(SanType::DnsName(Ia5String::try_from(name.as_str())?)),
    }
}

/// Output filename stem derived from the first host, with the characters
/// that don't belong in a filename replaced.
fn file_stem(hosts: &[Host]) -> String {
    let mut stem = hosts[0]
        .to_string()
        .replace(':', "_")
        .replace('*', "_wildcard");
    if hosts.len() > 1 {
        stem.push_str(&format!("+{}", hosts.len() - 1));
    }
    stem
}

fn output_path(explicit: Option<&str>, stem: &str, suffix: &str) -> PathBuf {
    match explicit {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(format!("{stem}{suffix}")),
    }
}

fn print_report(hosts: &[Host], cert_path: &Path, key_path: &Path) {
    println!();
    println!("Created a new certificate valid for the following names 📜");
    for host in hosts {
        let name = host.to_string();
        println!(" - {name:?}");
        if is_second_level_wildcard(&name) {
            println!("   Warning: many browsers don't support second-level wildcards like {name:?} ⚠️");
        }
    }

    for host in hosts {
        if let Host::Dns(name) = host {
            if let Some(rest) = name.strip_prefix("*.") {
                println!();
                println!(
                    "Reminder: X.509 wildcards only go one level deep, so this won't match a.b.{rest} ℹ️"
                );
                break;
            }
        }
    }

    println!();
    println!(
        "The certificate is at \"{}\" and the key at \"{}\" ✅",
        cert_path.display(),
        key_path.display()
    );
    println!();
}
