//! Signers backed by the key store.

use crate::asymmetric::EcdsaCurve;
use crate::certificate::Certificate;
use crate::error::{KeyError, Result};
use crate::key::Key;
use crate::keystore::KeyStore;
use openssl::hash::{hash, MessageDigest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    EcdsaWithSha256,
    EcdsaWithSha384,
    EcdsaWithSha512,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
}

impl SignatureAlgorithm {
    pub fn digest(&self) -> MessageDigest {
        match self {
            SignatureAlgorithm::EcdsaWithSha256 | SignatureAlgorithm::Sha256WithRsa => {
                MessageDigest::sha256()
            }
            SignatureAlgorithm::EcdsaWithSha384 | SignatureAlgorithm::Sha384WithRsa => {
                MessageDigest::sha384()
            }
            SignatureAlgorithm::EcdsaWithSha512 | SignatureAlgorithm::Sha512WithRsa => {
                MessageDigest::sha512()
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaWithSha256 => "ECDSA-SHA256",
            SignatureAlgorithm::EcdsaWithSha384 => "ECDSA-SHA384",
            SignatureAlgorithm::EcdsaWithSha512 => "ECDSA-SHA512",
            SignatureAlgorithm::Sha256WithRsa => "SHA256-RSA",
            SignatureAlgorithm::Sha384WithRsa => "SHA384-RSA",
            SignatureAlgorithm::Sha512WithRsa => "SHA512-RSA",
        }
    }
}

/// Signature algorithm matching the strength of a public key
pub fn default_sig_algo(public_key: &Key) -> Result<SignatureAlgorithm> {
    match public_key {
        Key::EcdsaPublic(k) => Ok(match k.curve()? {
            EcdsaCurve::P256 => SignatureAlgorithm::EcdsaWithSha256,
            EcdsaCurve::P384 => SignatureAlgorithm::EcdsaWithSha384,
            EcdsaCurve::P521 => SignatureAlgorithm::EcdsaWithSha512,
        }),
        Key::RsaPublic(k) => Ok(match k.bits() {
            bits if bits < 3072 => SignatureAlgorithm::Sha256WithRsa,
            bits if bits < 4096 => SignatureAlgorithm::Sha384WithRsa,
            _ => SignatureAlgorithm::Sha512WithRsa,
        }),
        other => Err(KeyError::Unsupported(format!(
            "no signature algorithm for {} keys",
            other.kind()
        ))),
    }
}

/// A private key in the store, usable as a signer
#[derive(Clone)]
pub struct CspSigner {
    store: Arc<dyn KeyStore>,
    key: Key,
    public_key: Key,
}

impl CspSigner {
    pub fn new(store: Arc<dyn KeyStore>, key: Key) -> Result<Self> {
        if !key.private() {
            return Err(KeyError::InvalidKey(
                "key must be a private key".to_string(),
            ));
        }
        let public_key = key
            .public_key()
            .map_err(|e| e.context("failed getting public key"))?;
        if !matches!(public_key, Key::EcdsaPublic(_) | Key::RsaPublic(_)) {
            return Err(KeyError::Unsupported(format!(
                "{} keys cannot back a certificate signer",
                key.kind()
            )));
        }
        Ok(Self {
            store,
            key,
            public_key,
        })
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn public_key(&self) -> &Key {
        &self.public_key
    }

    pub fn default_sig_algo(&self) -> Result<SignatureAlgorithm> {
        default_sig_algo(&self.public_key)
    }

    /// Sign a precomputed digest
    pub fn sign(&self, digest: &[u8]) -> Result<Vec<u8>> {
        self.store.sign(&self.key, digest)
    }

    /// Hash `message` with `algorithm`'s digest and sign the result
    pub fn sign_message(&self, message: &[u8], algorithm: SignatureAlgorithm) -> Result<Vec<u8>> {
        let digest = hash(algorithm.digest(), message)?;
        self.sign(&digest)
    }
}

impl fmt::Debug for CspSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CspSigner")
            .field("key", &self.key.kind())
            .finish_non_exhaustive()
    }
}

/// Issuance policy handed to the certificate toolkit alongside a signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPolicy {
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
    #[serde(default = "default_usages")]
    pub usages: Vec<String>,
}

fn default_expiry_hours() -> u64 {
    8760
}

fn default_usages() -> Vec<String> {
    vec!["signing".to_string(), "key encipherment".to_string()]
}

impl Default for SigningPolicy {
    fn default() -> Self {
        Self {
            expiry_hours: default_expiry_hours(),
            usages: default_usages(),
        }
    }
}

/// Signer bound to a CA certificate and issuance policy
#[derive(Debug, Clone)]
pub struct LocalSigner {
    signer: CspSigner,
    ca_certificate: Certificate,
    sig_algo: SignatureAlgorithm,
    policy: SigningPolicy,
}

impl LocalSigner {
    pub fn new(
        signer: CspSigner,
        ca_certificate: Certificate,
        sig_algo: SignatureAlgorithm,
        policy: SigningPolicy,
    ) -> Self {
        Self {
            signer,
            ca_certificate,
            sig_algo,
            policy,
        }
    }

    pub fn signer(&self) -> &CspSigner {
        &self.signer
    }

    pub fn ca_certificate(&self) -> &Certificate {
        &self.ca_certificate
    }

    pub fn sig_algo(&self) -> SignatureAlgorithm {
        self.sig_algo
    }

    pub fn policy(&self) -> &SigningPolicy {
        &self.policy
    }

    /// Sign `message` with the configured signature algorithm
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.signer.sign_message(message, self.sig_algo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asymmetric::{EcdsaPrivateKey, RsaPrivateKey};

    #[test]
    fn sig_algo_follows_key_strength() {
        let p384 = Key::EcdsaPrivate(EcdsaPrivateKey::generate(EcdsaCurve::P384).unwrap());
        assert_eq!(
            default_sig_algo(&p384.public_key().unwrap()).unwrap(),
            SignatureAlgorithm::EcdsaWithSha384
        );
        let rsa = Key::RsaPrivate(RsaPrivateKey::generate(3072).unwrap());
        assert_eq!(
            default_sig_algo(&rsa.public_key().unwrap()).unwrap(),
            SignatureAlgorithm::Sha384WithRsa
        );
    }

    #[test]
    fn policy_defaults_fill_missing_fields() {
        let policy: SigningPolicy = serde_json::from_str(r#"{"expiry_hours": 24}"#).unwrap();
        assert_eq!(policy.expiry_hours, 24);
        assert_eq!(policy.usages, SigningPolicy::default().usages);
    }
}
