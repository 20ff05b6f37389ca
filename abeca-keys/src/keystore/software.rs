//! In-memory software key store.
//!
//! Private keys are indexed by the SKI of their public half, CP-ABE master
//! keys by the SKI of their params and CP-ABE private keys by the
//! attribute-derived identifier a certificate lookup computes. Public keys
//! live in a separate index so that a lookup can report "public only".

use super::{KeyGenOpts, KeyImportOpts, KeyStore};
use crate::asymmetric::{EcdsaCurve, EcdsaPrivateKey, RsaPrivateKey};
use crate::cpabe::{AbeEngine, AttributeSet, CpabeKey, MasterKey, Params, PrivateKey};
use crate::error::{KeyError, Result};
use crate::key::Key;
use abeca_common::logging::{Component, Logger};
use abeca_common::{log_debug, log_info};
use openssl::pkey::PKey;
use openssl::x509::X509;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub struct SoftwareKeyStore {
    private_keys: RwLock<HashMap<Vec<u8>, Key>>,
    public_keys: RwLock<HashMap<Vec<u8>, Key>>,
    engine: Option<Arc<dyn AbeEngine>>,
    logger: Arc<Logger>,
}

fn poisoned() -> KeyError {
    KeyError::InvalidOperation("key store lock poisoned".to_string())
}

impl SoftwareKeyStore {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            private_keys: RwLock::new(HashMap::new()),
            public_keys: RwLock::new(HashMap::new()),
            engine: None,
            logger: Arc::new(logger.with_component(Component::KeyStore)),
        }
    }

    /// Store with CP-ABE support backed by `engine`
    pub fn with_engine(logger: Arc<Logger>, engine: Arc<dyn AbeEngine>) -> Self {
        let mut store = Self::new(logger);
        store.engine = Some(engine);
        store
    }

    fn engine(&self) -> Result<&Arc<dyn AbeEngine>> {
        self.engine
            .as_ref()
            .ok_or_else(|| KeyError::Unsupported("no CP-ABE engine configured".to_string()))
    }

    /// Identifier under which `key` is indexed
    fn index_ski(key: &Key) -> Result<Vec<u8>> {
        match key {
            Key::Cpabe(CpabeKey::MasterKey(k)) => k.params().ski(),
            Key::Cpabe(CpabeKey::PrivateKey(k)) => k.attribute_ski(),
            other => other.ski(),
        }
    }

    fn store_key(&self, key: &Key) -> Result<()> {
        let ski = Self::index_ski(key)?;
        if ski.is_empty() {
            return Err(KeyError::InvalidKey(
                "cannot store a key with an empty identifier".to_string(),
            ));
        }
        let map = if key.private() {
            &self.private_keys
        } else {
            &self.public_keys
        };
        map.write()
            .map_err(|_| poisoned())?
            .insert(ski.clone(), key.clone());
        log_debug!(self.logger, "stored {} key {}", key.kind(), hex::encode(&ski));
        Ok(())
    }

    fn finish(&self, key: Key, temporary: bool) -> Result<Key> {
        if !temporary {
            self.store_key(&key)?;
        }
        Ok(key)
    }

    /// Generate and store the private key for `attributes` under `master`.
    ///
    /// Attribute ids are passed to the engine in canonical order, which is the
    /// order a certificate lookup hashes them in.
    pub fn derive_cpabe_private_key(
        &self,
        master: &Key,
        attributes: &AttributeSet,
        temporary: bool,
    ) -> Result<Key> {
        let master = master.as_cpabe_master().ok_or_else(|| {
            KeyError::InvalidKey("CP-ABE key derivation requires a master key".to_string())
        })?;
        let ids = attributes.attribute_ids();
        let private = self.engine()?.keygen(master, &ids)?;
        if private.params() != master.params() || private.attribute_ids() != ids.as_slice() {
            return Err(KeyError::CryptoError(
                "ABE engine returned a key for different params or attributes".to_string(),
            ));
        }
        log_info!(
            self.logger,
            "derived cpabe private key for {} attribute(s)",
            ids.len()
        );
        self.finish(Key::Cpabe(CpabeKey::PrivateKey(private)), temporary)
    }

    /// Number of stored private and public keys
    pub fn len(&self) -> Result<(usize, usize)> {
        let private = self.private_keys.read().map_err(|_| poisoned())?.len();
        let public = self.public_keys.read().map_err(|_| poisoned())?.len();
        Ok((private, public))
    }
}

impl KeyStore for SoftwareKeyStore {
    fn key_gen(&self, opts: &KeyGenOpts) -> Result<Key> {
        log_debug!(self.logger, "generating {} key", opts.algorithm());
        let key = match opts {
            KeyGenOpts::Ecdsa { .. } | KeyGenOpts::EcdsaP256 { .. } => {
                Key::EcdsaPrivate(EcdsaPrivateKey::generate(EcdsaCurve::P256)?)
            }
            KeyGenOpts::EcdsaP384 { .. } => {
                Key::EcdsaPrivate(EcdsaPrivateKey::generate(EcdsaCurve::P384)?)
            }
            KeyGenOpts::Rsa2048 { .. } => Key::RsaPrivate(RsaPrivateKey::generate(2048)?),
            KeyGenOpts::Rsa3072 { .. } => Key::RsaPrivate(RsaPrivateKey::generate(3072)?),
            KeyGenOpts::Rsa4096 { .. } => Key::RsaPrivate(RsaPrivateKey::generate(4096)?),
            KeyGenOpts::CpabeMaster { .. } => {
                let master = self.engine()?.setup()?;
                if master.params().inner().is_none() {
                    return Err(KeyError::CryptoError(
                        "ABE engine returned a master key without params".to_string(),
                    ));
                }
                Key::Cpabe(CpabeKey::MasterKey(master))
            }
        };
        self.finish(key, opts.temporary())
    }

    fn key_import(&self, raw: &[u8], opts: &KeyImportOpts) -> Result<Key> {
        if raw.is_empty() {
            return Err(KeyError::InvalidKey(
                "Invalid raw material. It must not be empty.".to_string(),
            ));
        }
        let key = match opts {
            KeyImportOpts::X509PublicKey { .. } => {
                let cert = X509::from_der(raw).map_err(|e| {
                    KeyError::CertificateError(format!("Failed parsing certificate: {e}"))
                })?;
                Key::from_public_pkey(cert.public_key()?)?
            }
            KeyImportOpts::PublicKey { .. } => {
                let pkey = PKey::public_key_from_der(raw).map_err(|e| {
                    KeyError::InvalidKeyFormat(format!("Failed parsing public key: {e}"))
                })?;
                Key::from_public_pkey(pkey)?
            }
            KeyImportOpts::EcdsaPrivateKey { .. } => {
                Key::EcdsaPrivate(EcdsaPrivateKey::from_der(raw)?)
            }
            KeyImportOpts::CpabeParams { .. } => {
                Key::Cpabe(CpabeKey::Params(Params::from_bytes(raw)?))
            }
            KeyImportOpts::CpabeMasterKey { .. } => {
                Key::Cpabe(CpabeKey::MasterKey(MasterKey::from_bytes(raw)?))
            }
            KeyImportOpts::CpabePrivateKey { .. } => {
                Key::Cpabe(CpabeKey::PrivateKey(PrivateKey::from_bytes(raw)?))
            }
        };
        self.finish(key, opts.temporary())
    }

    fn get_key(&self, ski: &[u8]) -> Result<Key> {
        if ski.is_empty() {
            return Err(KeyError::InvalidKey(
                "Invalid SKI. Cannot be empty.".to_string(),
            ));
        }
        if let Some(key) = self
            .private_keys
            .read()
            .map_err(|_| poisoned())?
            .get(ski)
        {
            return Ok(key.clone());
        }
        if let Some(key) = self.public_keys.read().map_err(|_| poisoned())?.get(ski) {
            return Ok(key.clone());
        }
        Err(KeyError::KeyNotFound(format!(
            "no key with SKI '{}'",
            hex::encode(ski)
        )))
    }

    fn sign(&self, key: &Key, digest: &[u8]) -> Result<Vec<u8>> {
        if digest.is_empty() {
            return Err(KeyError::SignatureError(
                "Invalid digest. Cannot be empty.".to_string(),
            ));
        }
        match key {
            Key::EcdsaPrivate(k) => k.sign_digest(digest),
            Key::RsaPrivate(k) => k.sign_digest(digest),
            other => Err(KeyError::InvalidKey(format!(
                "{} keys cannot sign",
                other.kind()
            ))),
        }
    }

    fn encrypt(&self, key: &Key, plaintext: &[u8]) -> Result<Vec<u8>> {
        match key {
            Key::RsaPublic(k) => k.encrypt(plaintext),
            Key::Cpabe(CpabeKey::Params(params)) => self.engine()?.encrypt(params, plaintext),
            other => Err(KeyError::Unsupported(format!(
                "encryption with {} keys",
                other.kind()
            ))),
        }
    }
}
