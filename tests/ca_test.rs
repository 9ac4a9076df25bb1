use mkcert::core::authority;
use mkcert::MkcertError;
use std::fs;
use tempfile::TempDir;
use x509_parser::prelude::*;

#[test]
fn test_create_and_reload_ca() {
    let caroot = TempDir::new().unwrap();

    let ca = authority::load_or_create(caroot.path()).unwrap();
    assert!(ca.has_key());
    assert!(caroot.path().join("rootCA.pem").exists());
    assert!(caroot.path().join("rootCA-key.pem").exists());

    // Reloading picks up the same CA instead of regenerating it.
    let reloaded = authority::load_or_create(caroot.path()).unwrap();
    assert_eq!(ca.unique_name(), reloaded.unique_name());
    assert_eq!(ca.cert_der(), reloaded.cert_der());
}

#[test]
fn test_ca_certificate_shape() {
    let caroot = TempDir::new().unwrap();
    let ca = authority::load_or_create(caroot.path()).unwrap();

    let (_, cert) = X509Certificate::from_der(ca.cert_der()).unwrap();

    let constraints = cert.tbs_certificate.basic_constraints().unwrap().unwrap();
    assert!(constraints.value.ca);
    assert_eq!(constraints.value.path_len_constraint, Some(0));

    let key_usage = cert.tbs_certificate.key_usage().unwrap().unwrap();
    assert!(key_usage.value.key_cert_sign());

    let subject = cert.tbs_certificate.subject.to_string();
    assert!(subject.contains("mkcert development CA"));

    // The serial number ties the trust store nickname to this exact CA.
    assert_eq!(
        ca.unique_name(),
        format!("mkcert development CA {}", cert.tbs_certificate.serial)
    );

    let validity = &cert.tbs_certificate.validity;
    let lifetime_days =
        (validity.not_after.timestamp() - validity.not_before.timestamp()) / 86_400;
    assert_eq!(lifetime_days, 3650);
}

#[cfg(unix)]
#[test]
fn test_ca_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let caroot = TempDir::new().unwrap();
    authority::load_or_create(caroot.path()).unwrap();

    let key_mode = fs::metadata(caroot.path().join("rootCA-key.pem"))
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(key_mode, 0o400);

    let cert_mode = fs::metadata(caroot.path().join("rootCA.pem"))
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(cert_mode & 0o600, 0o600);
}

#[test]
fn test_keyless_caroot_loads_without_key() {
    let caroot = TempDir::new().unwrap();
    authority::load_or_create(caroot.path()).unwrap();
    fs::remove_file(caroot.path().join("rootCA-key.pem")).unwrap();

    let ca = authority::load_or_create(caroot.path()).unwrap();
    assert!(!ca.has_key());
    assert!(ca.key_pem().is_none());
}

#[test]
fn test_rejects_garbage_certificate() {
    let caroot = TempDir::new().unwrap();
    fs::write(caroot.path().join("rootCA.pem"), "not pem at all").unwrap();

    let err = authority::load_or_create(caroot.path()).unwrap_err();
    assert!(matches!(err, MkcertError::PemError(_)));
}

#[test]
fn test_rejects_certificate_with_wrong_pem_type() {
    let caroot = TempDir::new().unwrap();
    authority::load_or_create(caroot.path()).unwrap();

    // A private key where the certificate should be.
    let key = fs::read(caroot.path().join("rootCA-key.pem")).unwrap();
    fs::remove_file(caroot.path().join("rootCA.pem")).unwrap();
    fs::write(caroot.path().join("rootCA.pem"), &key).unwrap();

    let err = authority::load_or_create(caroot.path()).unwrap_err();
    assert!(matches!(
        err,
        MkcertError::UnexpectedPemError {
            file: "certificate"
        }
    ));
    assert!(err.to_string().contains("unexpected content"));
}

#[test]
fn test_rejects_key_with_wrong_pem_type() {
    let caroot = TempDir::new().unwrap();
    authority::load_or_create(caroot.path()).unwrap();

    let cert = fs::read(caroot.path().join("rootCA.pem")).unwrap();
    fs::remove_file(caroot.path().join("rootCA-key.pem")).unwrap();
    fs::write(caroot.path().join("rootCA-key.pem"), &cert).unwrap();

    let err = authority::load_or_create(caroot.path()).unwrap_err();
    assert!(matches!(err, MkcertError::UnexpectedPemError { file: "key" }));
}
