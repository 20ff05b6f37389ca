//! Signer and key resolution against a key store.
//!
//! The CA never holds key material itself. Certificates name their key by
//! SKI; the resolver asks the store for it and, when the store only knows the
//! public half, falls back once to a PEM key file.

use crate::certificate::{load_certificate_chain, Certificate};
use crate::config::ResolverConfig;
use crate::error::{KeyError, Result, ResultExt};
use crate::key::Key;
use crate::keystore::{KeyImportOpts, KeyStore};
use crate::request::{key_gen_opts, CertificateRequest};
use crate::signer::{CspSigner, LocalSigner, SigningPolicy};
use abeca_common::logging::{Component, Logger};
use abeca_common::{log_debug, log_info, log_warn};
use openssl::pkey::{Id, PKey};
use openssl::x509::X509;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Private half of a TLS key pair
pub enum TlsPrivateKey {
    /// Key held by the store, reachable only through its signer
    Store(CspSigner),
    /// Key read from a PEM file
    File(PrivateKeyDer<'static>),
}

impl fmt::Debug for TlsPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsPrivateKey::Store(signer) => f.debug_tuple("Store").field(signer).finish(),
            TlsPrivateKey::File(_) => f.write_str("File(..)"),
        }
    }
}

/// Leaf-first certificate chain with its private key
#[derive(Debug)]
pub struct TlsCertificate {
    pub chain: Vec<CertificateDer<'static>>,
    pub private_key: TlsPrivateKey,
}

pub struct KeyResolver {
    store: Arc<dyn KeyStore>,
    pub(crate) logger: Arc<Logger>,
}

impl KeyResolver {
    pub fn new(store: Arc<dyn KeyStore>, logger: Arc<Logger>) -> Self {
        Self {
            store,
            logger: Arc::new(logger.with_component(Component::Keys)),
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyStore> {
        &self.store
    }

    /// Resolve the signer for the private key matching `cert`'s public key
    pub fn signer_from_cert(&self, cert: &Certificate) -> Result<(Key, CspSigner)> {
        let cert_pub = self
            .store
            .key_import(
                cert.der_bytes(),
                &KeyImportOpts::X509PublicKey { temporary: true },
            )
            .context_with(|| "Failed to import certificate public key")?;
        let ski = cert_pub.ski()?;
        log_debug!(
            self.logger,
            "resolving private key for '{}' (SKI {})",
            cert.subject(),
            hex::encode(&ski)
        );

        let key = self
            .store
            .get_key(&ski)
            .context_with(|| "Could not find matching private key for SKI")?;
        if !key.private() {
            return Err(KeyError::PrivateKeyNotFound {
                ski: hex::encode(&ski),
            });
        }

        let signer = CspSigner::new(self.store.clone(), key.clone())
            .context_with(|| "Failed to load SKI")?;
        Ok((key, signer))
    }

    /// Load a certificate file and resolve its signer
    pub fn signer_from_cert_file(&self, cert_file: &Path) -> Result<(Key, CspSigner, Certificate)> {
        let cert = Certificate::load(cert_file)?;
        let (key, signer) = self.signer_from_cert(&cert)?;
        Ok((key, signer, cert))
    }

    /// Build the CA signer, preferring the store over `key_file`.
    ///
    /// The key file is only consulted when the store has no private key for
    /// the CA certificate; unreadable or malformed certificates fail first.
    pub fn backed_signer(
        &self,
        ca_file: &Path,
        key_file: Option<&Path>,
        policy: SigningPolicy,
    ) -> Result<LocalSigner> {
        let cert = Certificate::load(ca_file)?;
        let signer = match self.signer_from_cert(&cert) {
            Ok((_, signer)) => signer,
            Err(err) if err.is_not_found() => {
                let Some(key_file) = key_file else {
                    return Err(err);
                };
                log_debug!(
                    self.logger,
                    "No key found in key store ({err}), trying key file '{}'",
                    key_file.display()
                );
                let key = self.key_file_for_cert(&cert, key_file).context_with(|| {
                    format!(
                        "Could not find the private key in key store nor in keyfile '{}'",
                        key_file.display()
                    )
                })?;
                CspSigner::new(self.store.clone(), key)?
            }
            Err(err) => return Err(err),
        };

        let sig_algo = signer.default_sig_algo()?;
        log_info!(
            self.logger,
            "CA signer ready for '{}' using {}",
            cert.subject(),
            sig_algo.as_str()
        );
        Ok(LocalSigner::new(signer, cert, sig_algo, policy))
    }

    /// Import `key_file` into the store, but only if it belongs to `cert`
    fn key_file_for_cert(&self, cert: &Certificate, key_file: &Path) -> Result<Key> {
        let candidate = self.import_key_from_pem(key_file, true)?;
        let cert_pub = self.store.key_import(
            cert.der_bytes(),
            &KeyImportOpts::X509PublicKey { temporary: true },
        )?;
        if candidate.ski()? != cert_pub.ski()? {
            return Err(KeyError::InvalidKey(format!(
                "private key in {} does not match certificate '{}'",
                key_file.display(),
                cert.subject()
            )));
        }
        self.import_key_from_pem(key_file, false)
    }

    /// Build the CA signer described by `config`, installing its logging
    /// backend first.
    pub fn backed_signer_from_config(&self, config: &ResolverConfig) -> Result<LocalSigner> {
        config.logging.apply();
        self.backed_signer(
            &config.ca_file,
            config.key_file.as_deref(),
            config.signing.clone(),
        )
    }

    /// Import an ECDSA private key from a PEM file into the store.
    ///
    /// RSA keys are rejected: the store only imports ECDSA private keys.
    pub fn import_key_from_pem(&self, key_file: &Path, temporary: bool) -> Result<Key> {
        let raw = fs::read(key_file).map_err(|e| KeyError::io(key_file, e))?;
        let pkey = PKey::private_key_from_pem(&raw).map_err(|e| {
            KeyError::PemError(format!(
                "Failed parsing private key from {}: {e}",
                key_file.display()
            ))
        })?;

        match pkey.id() {
            Id::EC => {
                let der = pkey.private_key_to_pkcs8()?;
                self.store
                    .key_import(&der, &KeyImportOpts::EcdsaPrivateKey { temporary })
                    .context_with(|| {
                        format!("Failed to import EC private key from {}", key_file.display())
                    })
            }
            Id::RSA => Err(KeyError::Unsupported(format!(
                "Failed to import RSA key from {}; RSA private key import is not supported",
                key_file.display()
            ))),
            _ => Err(KeyError::InvalidKey("invalid secret key type".to_string())),
        }
    }

    /// Generate and store a key as described by `request`
    pub fn key_request_generate(&self, request: &CertificateRequest) -> Result<(Key, CspSigner)> {
        let opts = key_gen_opts(request.key_request.as_ref(), false)?;
        log_debug!(
            self.logger,
            "generating {} key for '{}'",
            opts.algorithm(),
            request.common_name
        );
        let key = self.store.key_gen(&opts)?;
        let signer = CspSigner::new(self.store.clone(), key.clone())?;
        Ok((key, signer))
    }

    /// Load a certificate chain and its private key.
    ///
    /// The store is tried first. When it lacks the key and `key_file` is
    /// given, the key file is read directly and must match the leaf.
    pub fn load_x509_key_pair(
        &self,
        cert_file: &Path,
        key_file: Option<&Path>,
    ) -> Result<TlsCertificate> {
        let chain = load_certificate_chain(cert_file)?;
        let leaf = Certificate::from_der(chain[0].to_vec())?;

        let err = match self.signer_from_cert(&leaf) {
            Ok((_, signer)) => {
                return Ok(TlsCertificate {
                    chain,
                    private_key: TlsPrivateKey::Store(signer),
                })
            }
            Err(err) => err,
        };
        let Some(key_file) = key_file else {
            return Err(err);
        };
        log_warn!(
            self.logger,
            "key for '{}' not in key store ({err}), loading '{}'",
            leaf.subject(),
            key_file.display()
        );

        let raw = fs::read(key_file).map_err(|e| KeyError::io(key_file, e))?;
        let pkey = PKey::private_key_from_pem(&raw).map_err(|e| {
            KeyError::PemError(format!(
                "Failed parsing private key from {}: {e}",
                key_file.display()
            ))
        })?;
        let leaf_pub = X509::from_der(leaf.der_bytes())?.public_key()?;
        if !pkey.public_eq(&leaf_pub) {
            return Err(KeyError::InvalidKey(format!(
                "private key in {} does not match public key in {}",
                key_file.display(),
                cert_file.display()
            )));
        }
        let der = PrivatePkcs8KeyDer::from(pkey.private_key_to_pkcs8()?);
        Ok(TlsCertificate {
            chain,
            private_key: TlsPrivateKey::File(PrivateKeyDer::Pkcs8(der)),
        })
    }

    /// Encrypt `data` for the holder of a DER public key
    pub fn encrypt_data(&self, public_key_der: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let key = self
            .store
            .key_import(public_key_der, &KeyImportOpts::PublicKey { temporary: true })
            .context_with(|| "Failed to import public key")?;
        self.store
            .encrypt(&key, data)
            .context_with(|| "Failed to encrypt data")
    }
}
