//! Uniform key handle.
//!
//! Everything the key store hands out is a [`Key`]: classical ECDSA/RSA keys
//! and the three CP-ABE shapes share one capability set (serialize, identify,
//! classify, derive the public half).

use crate::asymmetric::{EcdsaPrivateKey, EcdsaPublicKey, RsaPrivateKey, RsaPublicKey};
use crate::cpabe::{CpabeKey, MasterKey, Params, PrivateKey};
use crate::error::{KeyError, Result};
use openssl::pkey::{Id, PKey, Public};

#[derive(Debug, Clone)]
pub enum Key {
    EcdsaPrivate(EcdsaPrivateKey),
    EcdsaPublic(EcdsaPublicKey),
    RsaPrivate(RsaPrivateKey),
    RsaPublic(RsaPublicKey),
    Cpabe(CpabeKey),
}

impl Key {
    /// Wrap a parsed public key of a supported type
    pub fn from_public_pkey(pkey: PKey<Public>) -> Result<Self> {
        match pkey.id() {
            Id::EC => Ok(Key::EcdsaPublic(EcdsaPublicKey::from_pkey(pkey)?)),
            Id::RSA => Ok(Key::RsaPublic(RsaPublicKey::from_pkey(pkey)?)),
            _ => Err(KeyError::Unsupported(
                "public key type is neither ECDSA nor RSA".to_string(),
            )),
        }
    }

    /// Serialized form of the key. Classical private keys never leave the store.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        match self {
            Key::EcdsaPrivate(_) | Key::RsaPrivate(_) => Err(KeyError::InvalidOperation(
                "Not supported: private key export".to_string(),
            )),
            Key::EcdsaPublic(k) => k.bytes(),
            Key::RsaPublic(k) => k.bytes(),
            Key::Cpabe(k) => k.bytes(),
        }
    }

    /// Subject key identifier. Empty for an unset CP-ABE value.
    pub fn ski(&self) -> Result<Vec<u8>> {
        match self {
            Key::EcdsaPrivate(k) => k.ski(),
            Key::EcdsaPublic(k) => k.ski(),
            Key::RsaPrivate(k) => k.ski(),
            Key::RsaPublic(k) => k.ski(),
            Key::Cpabe(k) => k.ski(),
        }
    }

    pub fn symmetric(&self) -> bool {
        match self {
            Key::Cpabe(k) => k.symmetric(),
            _ => false,
        }
    }

    pub fn private(&self) -> bool {
        match self {
            Key::EcdsaPrivate(_) | Key::RsaPrivate(_) => true,
            Key::EcdsaPublic(_) | Key::RsaPublic(_) => false,
            Key::Cpabe(k) => k.private(),
        }
    }

    pub fn public_key(&self) -> Result<Key> {
        if self.symmetric() {
            return Err(KeyError::InvalidOperation(
                "Cannot call this method on a symmetric key".to_string(),
            ));
        }
        match self {
            Key::EcdsaPrivate(k) => Ok(Key::EcdsaPublic(k.public_key()?)),
            Key::RsaPrivate(k) => Ok(Key::RsaPublic(k.public_key()?)),
            Key::EcdsaPublic(_) | Key::RsaPublic(_) => Ok(self.clone()),
            Key::Cpabe(k) => Ok(Key::Cpabe(CpabeKey::Params(k.public_key()))),
        }
    }

    pub fn as_cpabe(&self) -> Option<&CpabeKey> {
        match self {
            Key::Cpabe(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_cpabe_master(&self) -> Option<&MasterKey> {
        match self {
            Key::Cpabe(CpabeKey::MasterKey(k)) => Some(k),
            _ => None,
        }
    }

    pub fn as_cpabe_private(&self) -> Option<&PrivateKey> {
        match self {
            Key::Cpabe(CpabeKey::PrivateKey(k)) => Some(k),
            _ => None,
        }
    }

    pub fn as_cpabe_params(&self) -> Option<&Params> {
        match self {
            Key::Cpabe(CpabeKey::Params(p)) => Some(p),
            _ => None,
        }
    }

    /// Short label for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Key::EcdsaPrivate(_) => "ecdsa-private",
            Key::EcdsaPublic(_) => "ecdsa-public",
            Key::RsaPrivate(_) => "rsa-private",
            Key::RsaPublic(_) => "rsa-public",
            Key::Cpabe(CpabeKey::MasterKey(_)) => "cpabe-master",
            Key::Cpabe(CpabeKey::PrivateKey(_)) => "cpabe-private",
            Key::Cpabe(CpabeKey::Params(_)) => "cpabe-params",
        }
    }
}

impl From<CpabeKey> for Key {
    fn from(k: CpabeKey) -> Self {
        Key::Cpabe(k)
    }
}
