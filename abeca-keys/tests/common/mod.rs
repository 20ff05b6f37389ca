//! Shared fixtures for the integration tests
#![allow(dead_code)]

use abeca_common::logging::{Component, LogLevel, Logger, LoggingConfig};
use abeca_keys::cpabe::{pb, AbeEngine, AttributeId, MasterKey, Params, PrivateKey};
use abeca_keys::{KeyResolver, KeyStore, SoftwareKeyStore};
use rand::RngCore;
use rcgen::{BasicConstraints, CertificateParams, CustomExtension, DnType, IsCa};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PARAMS_OID_ARCS: &[u64] = &[1, 2, 3, 4, 5, 6, 7, 8, 9];
pub const ATTRIBUTES_OID_ARCS: &[u64] = &[1, 2, 3, 4, 5, 6, 7, 8, 1];

pub fn create_test_logger() -> Arc<Logger> {
    LoggingConfig {
        level: LogLevel::Debug,
        is_test: true,
    }
    .apply();
    Arc::new(Logger::new_root(Component::Ca, "abeca-test"))
}

/// Stand-in ABE engine: random material, XOR "encryption"
pub struct TestEngine;

fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

impl AbeEngine for TestEngine {
    fn setup(&self) -> abeca_keys::Result<MasterKey> {
        Ok(MasterKey::new(pb::MasterKey {
            param: Some(pb::Params {
                scheme: "test-bsw07".to_string(),
                public_elements: random_bytes(64),
            }),
            secret: random_bytes(32),
        }))
    }

    fn keygen(
        &self,
        master: &MasterKey,
        attribute_ids: &[AttributeId],
    ) -> abeca_keys::Result<PrivateKey> {
        Ok(PrivateKey::new(pb::Key {
            param: master.params().inner().cloned(),
            attribute_ids: attribute_ids.to_vec(),
            material: random_bytes(32),
        }))
    }

    fn encrypt(&self, params: &Params, plaintext: &[u8]) -> abeca_keys::Result<Vec<u8>> {
        let pad = params
            .inner()
            .map(|p| p.public_elements.clone())
            .unwrap_or_default();
        Ok(plaintext
            .iter()
            .zip(pad.iter().cycle())
            .map(|(b, k)| b ^ k)
            .collect())
    }
}

pub struct Harness {
    pub store: Arc<SoftwareKeyStore>,
    pub resolver: KeyResolver,
}

pub fn harness() -> Harness {
    let logger = create_test_logger();
    let store = Arc::new(SoftwareKeyStore::with_engine(
        logger.clone(),
        Arc::new(TestEngine),
    ));
    let dyn_store: Arc<dyn KeyStore> = store.clone();
    Harness {
        resolver: KeyResolver::new(dyn_store, logger),
        store,
    }
}

/// A self-signed CA written to disk as PEM
pub struct CaFixture {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub cert_pem: String,
    pub key_pem: String,
    /// PKCS#8 DER of the CA key
    pub key_der: Vec<u8>,
}

pub fn write_ca(
    dir: &Path,
    name: &str,
    extensions: Vec<CustomExtension>,
) -> anyhow::Result<CaFixture> {
    let mut params = CertificateParams::new(vec![format!("{name}.abeca.test")]);
    params.distinguished_name.push(DnType::CommonName, name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.alg = &rcgen::PKCS_ECDSA_P256_SHA256;
    params.custom_extensions = extensions;
    let cert = rcgen::Certificate::from_params(params)?;

    let cert_pem = cert.serialize_pem()?;
    let key_pem = cert.serialize_private_key_pem();
    let cert_file = dir.join(format!("{name}-cert.pem"));
    let key_file = dir.join(format!("{name}-key.pem"));
    fs::write(&cert_file, &cert_pem)?;
    fs::write(&key_file, &key_pem)?;
    Ok(CaFixture {
        cert_file,
        key_file,
        cert_pem,
        key_pem,
        key_der: cert.serialize_private_key_der(),
    })
}

pub fn params_extension(params_bytes: &[u8]) -> CustomExtension {
    CustomExtension::from_oid_content(PARAMS_OID_ARCS, params_bytes.to_vec())
}

pub fn attributes_extension(json: &str) -> CustomExtension {
    CustomExtension::from_oid_content(ATTRIBUTES_OID_ARCS, json.as_bytes().to_vec())
}
