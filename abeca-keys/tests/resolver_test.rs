mod common;

use abeca_keys::error::KeyError;
use abeca_keys::{
    load_certificate_chain, CertificateRequest, Key, KeyImportOpts, KeyRequest, KeyStore,
    ResolverConfig, SignatureAlgorithm, SigningPolicy, TlsPrivateKey,
};
use anyhow::Result;
use common::{harness, write_ca};
use openssl::pkey::PKey;
use openssl::rsa::{Padding, Rsa};
use p256::ecdsa::signature::Verifier;
use std::fs;

#[test]
fn signer_resolves_from_store_and_verifies() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "root", vec![])?;
    let h = harness();
    h.store.key_import(
        &ca.key_der,
        &KeyImportOpts::EcdsaPrivateKey { temporary: false },
    )?;

    let (key, signer, cert) = h.resolver.signer_from_cert_file(&ca.cert_file)?;
    assert!(key.private());
    assert!(cert.subject().contains("root"));
    assert_eq!(signer.default_sig_algo()?, SignatureAlgorithm::EcdsaWithSha256);

    let message = b"tbs certificate bytes";
    let der_sig = signer.sign_message(message, SignatureAlgorithm::EcdsaWithSha256)?;
    let Key::EcdsaPublic(public) = signer.public_key() else {
        panic!("expected an ECDSA public key");
    };
    let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(&public.point_bytes()?)?;
    let signature = p256::ecdsa::Signature::from_der(&der_sig)?;
    verifying_key.verify(message, &signature)?;
    Ok(())
}

#[test]
fn public_only_key_reports_missing_private_key() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "public-only", vec![])?;
    let h = harness();
    let cert = abeca_keys::Certificate::load(&ca.cert_file)?;
    let public = h.store.key_import(
        cert.der_bytes(),
        &KeyImportOpts::X509PublicKey { temporary: false },
    )?;

    let err = h.resolver.signer_from_cert(&cert).unwrap_err();
    match &err {
        KeyError::PrivateKeyNotFound { ski } => assert_eq!(ski, &hex::encode(public.ski()?)),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with(
        "The private key associated with the certificate with SKI"
    ));
    assert!(err.is_not_found());
    Ok(())
}

#[test]
fn backed_signer_falls_back_to_key_file_once() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "fallback", vec![])?;
    let h = harness();
    assert!(h.resolver.signer_from_cert_file(&ca.cert_file).is_err());

    let policy = SigningPolicy {
        expiry_hours: 24,
        ..Default::default()
    };
    let local = h
        .resolver
        .backed_signer(&ca.cert_file, Some(ca.key_file.as_path()), policy.clone())?;
    assert_eq!(local.sig_algo(), SignatureAlgorithm::EcdsaWithSha256);
    assert_eq!(local.policy(), &policy);
    assert!(local.ca_certificate().subject().contains("fallback"));
    assert!(!local.sign(b"payload")?.is_empty());

    // the imported key is persisted, so the store resolves it directly now
    let (key, _, _) = h.resolver.signer_from_cert_file(&ca.cert_file)?;
    assert!(key.private());
    Ok(())
}

#[test]
fn backed_signer_without_key_file_keeps_store_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "nokey", vec![])?;
    let h = harness();
    let err = h
        .resolver
        .backed_signer(&ca.cert_file, None, SigningPolicy::default())
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[test]
fn broken_ca_file_fails_before_key_file_is_imported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "broken", vec![])?;
    fs::write(&ca.cert_file, "not a certificate")?;

    let h = harness();
    let err = h
        .resolver
        .backed_signer(&ca.cert_file, Some(ca.key_file.as_path()), SigningPolicy::default())
        .unwrap_err();
    assert!(err.to_string().starts_with("Failed parsing certificate"));
    assert!(!err.is_not_found());
    assert_eq!(h.store.len()?, (0, 0));

    let missing = dir.path().join("missing-cert.pem");
    let err = h
        .resolver
        .backed_signer(&missing, Some(ca.key_file.as_path()), SigningPolicy::default())
        .unwrap_err();
    assert!(matches!(err, KeyError::Io { .. }));
    assert_eq!(h.store.len()?, (0, 0));
    Ok(())
}

#[test]
fn key_file_for_another_certificate_is_not_imported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "ca", vec![])?;
    let other = write_ca(dir.path(), "unrelated", vec![])?;

    let h = harness();
    let err = h
        .resolver
        .backed_signer(&ca.cert_file, Some(other.key_file.as_path()), SigningPolicy::default())
        .unwrap_err();
    assert!(matches!(err.root_cause(), KeyError::InvalidKey(_)));
    assert_eq!(h.store.len()?, (0, 0));
    Ok(())
}

#[test]
fn rsa_key_files_are_unsupported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "rsa-fallback", vec![])?;
    let rsa = Rsa::generate(2048)?;
    let pkcs1 = dir.path().join("rsa-pkcs1.pem");
    let pkcs8 = dir.path().join("rsa-pkcs8.pem");
    fs::write(&pkcs1, rsa.private_key_to_pem()?)?;
    fs::write(&pkcs8, PKey::from_rsa(rsa)?.private_key_to_pem_pkcs8()?)?;

    let h = harness();
    for key_file in [&pkcs1, &pkcs8] {
        let err = h
            .resolver
            .backed_signer(&ca.cert_file, Some(key_file.as_path()), SigningPolicy::default())
            .unwrap_err();
        assert!(err.is_unsupported(), "{err}");
        assert!(err
            .to_string()
            .starts_with("Could not find the private key in key store nor in keyfile"));

        let direct = h.resolver.import_key_from_pem(key_file, true).unwrap_err();
        assert!(matches!(direct, KeyError::Unsupported(_)));
    }
    assert_eq!(h.store.len()?, (0, 0));
    Ok(())
}

#[test]
fn missing_key_file_names_the_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("absent-key.pem");
    let err = harness()
        .resolver
        .import_key_from_pem(&missing, false)
        .unwrap_err();
    assert!(matches!(err, KeyError::Io { .. }));
    assert!(err.to_string().contains("absent-key.pem"));
    Ok(())
}

#[test]
fn backed_signer_from_config_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "configured", vec![])?;
    let config_path = dir.path().join("abeca.json");
    fs::write(
        &config_path,
        r#"{"ca_file":"configured-cert.pem","key_file":"configured-key.pem","signing":{"expiry_hours":48},"logging":{"level":"debug","is_test":true}}"#,
    )?;
    let config = ResolverConfig::from_json_file(&config_path)?;
    assert_eq!(config.ca_file, ca.cert_file);
    assert!(config.logging.is_test);

    let local = harness().resolver.backed_signer_from_config(&config)?;
    assert_eq!(local.policy().expiry_hours, 48);
    Ok(())
}

#[test]
fn key_request_generation() -> Result<()> {
    let h = harness();
    let request = CertificateRequest {
        common_name: "issuer".to_string(),
        hosts: vec![],
        key_request: Some(KeyRequest::new("rsa", 2048)),
    };
    let (key, signer) = h.resolver.key_request_generate(&request)?;
    assert!(matches!(key, Key::RsaPrivate(_)));
    assert_eq!(signer.default_sig_algo()?, SignatureAlgorithm::Sha256WithRsa);
    assert!(h.store.get_key(&key.ski()?)?.private());

    let (default_key, _) = h.resolver.key_request_generate(&CertificateRequest::default())?;
    assert!(matches!(default_key, Key::EcdsaPrivate(_)));

    let err = h
        .resolver
        .key_request_generate(&CertificateRequest {
            key_request: Some(KeyRequest::new("ecdsa", 521)),
            ..Default::default()
        })
        .unwrap_err();
    assert!(err.is_unsupported());
    Ok(())
}

#[test]
fn chain_loader_reads_leaf_first_and_skips_keys() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let leaf = write_ca(dir.path(), "leaf", vec![])?;
    let issuer = write_ca(dir.path(), "issuer", vec![])?;
    let bundle = dir.path().join("bundle.pem");
    fs::write(
        &bundle,
        format!("{}{}{}", leaf.cert_pem, leaf.key_pem, issuer.cert_pem),
    )?;

    let chain = load_certificate_chain(&bundle)?;
    assert_eq!(chain.len(), 2);
    let first = abeca_keys::Certificate::from_der(chain[0].to_vec())?;
    assert!(first.subject().contains("leaf"));
    Ok(())
}

#[test]
fn chain_loader_detects_swapped_inputs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "swapped", vec![])?;
    let err = load_certificate_chain(&ca.key_file).unwrap_err();
    assert!(err.to_string().contains("PEM inputs may have been switched"));
    Ok(())
}

#[test]
fn chain_loader_names_skipped_blocks() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("public.pem");
    let spki = Rsa::generate(2048)?.public_key_to_der()?;
    fs::write(&path, pem::encode(&pem::Pem::new("PUBLIC KEY", spki)))?;
    let err = load_certificate_chain(&path).unwrap_err();
    assert!(err
        .to_string()
        .contains("after skipping PEM blocks of the following types: [PUBLIC KEY]"));

    let empty = dir.path().join("empty.pem");
    fs::write(&empty, "no pem here\n")?;
    let err = load_certificate_chain(&empty).unwrap_err();
    assert!(err.to_string().contains("Failed to find PEM block in file"));
    Ok(())
}

#[test]
fn key_pair_prefers_store_then_key_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "tls", vec![])?;

    let from_file = harness()
        .resolver
        .load_x509_key_pair(&ca.cert_file, Some(ca.key_file.as_path()))?;
    assert_eq!(from_file.chain.len(), 1);
    assert!(matches!(from_file.private_key, TlsPrivateKey::File(_)));

    let h = harness();
    h.store.key_import(
        &ca.key_der,
        &KeyImportOpts::EcdsaPrivateKey { temporary: false },
    )?;
    let from_store = h.resolver.load_x509_key_pair(&ca.cert_file, None)?;
    assert!(matches!(from_store.private_key, TlsPrivateKey::Store(_)));
    Ok(())
}

#[test]
fn key_pair_rejects_mismatched_key_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "mismatch", vec![])?;
    let other = write_ca(dir.path(), "other", vec![])?;
    let err = harness()
        .resolver
        .load_x509_key_pair(&ca.cert_file, Some(other.key_file.as_path()))
        .unwrap_err();
    assert!(matches!(err, KeyError::InvalidKey(_)));
    Ok(())
}

#[test]
fn encrypt_data_for_rsa_public_key() -> Result<()> {
    let rsa = Rsa::generate(2048)?;
    let spki = rsa.public_key_to_der()?;
    let h = harness();
    let ciphertext = h.resolver.encrypt_data(&spki, b"session secret")?;

    let mut plaintext = vec![0u8; rsa.size() as usize];
    let len = rsa.private_decrypt(&ciphertext, &mut plaintext, Padding::PKCS1_OAEP)?;
    assert_eq!(&plaintext[..len], b"session secret");
    // temporary import
    assert_eq!(h.store.len()?, (0, 0));
    Ok(())
}

#[test]
fn encrypt_data_with_ecdsa_key_is_unsupported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let ca = write_ca(dir.path(), "ec-encrypt", vec![])?;
    let spki = PKey::private_key_from_pem(ca.key_pem.as_bytes())?.public_key_to_der()?;
    let err = harness().resolver.encrypt_data(&spki, b"data").unwrap_err();
    assert!(err.is_unsupported());
    Ok(())
}
