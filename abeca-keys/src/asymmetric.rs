//! ECDSA and RSA key wrappers used by the software key store.
//!
//! Identifiers follow the usual CSP convention: ECDSA keys hash the
//! uncompressed public point, RSA keys hash the PKCS#1 public key. A private
//! key shares the identifier of its public half.

use crate::error::{KeyError, Result};
use openssl::bn::BigNumContext;
use openssl::ec::{EcGroup, EcKey, PointConversionForm};
use openssl::ecdsa::EcdsaSig;
use openssl::md::Md;
use openssl::nid::Nid;
use openssl::pkey::{HasParams, HasPublic, Id, PKey, Private, Public};
use openssl::pkey_ctx::PkeyCtx;
use openssl::rsa::{Padding, Rsa};
use sha2::{Digest, Sha256};
use std::fmt;

/// NIST curves understood by the key model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcdsaCurve {
    P256,
    P384,
    P521,
}

impl EcdsaCurve {
    pub fn nid(self) -> Nid {
        match self {
            EcdsaCurve::P256 => Nid::X9_62_PRIME256V1,
            EcdsaCurve::P384 => Nid::SECP384R1,
            EcdsaCurve::P521 => Nid::SECP521R1,
        }
    }

    pub fn from_nid(nid: Nid) -> Result<Self> {
        match nid {
            Nid::X9_62_PRIME256V1 => Ok(EcdsaCurve::P256),
            Nid::SECP384R1 => Ok(EcdsaCurve::P384),
            Nid::SECP521R1 => Ok(EcdsaCurve::P521),
            other => Err(KeyError::Unsupported(format!(
                "ECDSA curve {}",
                other.short_name().unwrap_or("unknown")
            ))),
        }
    }

    pub fn bits(self) -> usize {
        match self {
            EcdsaCurve::P256 => 256,
            EcdsaCurve::P384 => 384,
            EcdsaCurve::P521 => 521,
        }
    }
}

fn curve_of<T: HasParams>(key: &EcKey<T>) -> Result<EcdsaCurve> {
    let nid = key
        .group()
        .curve_name()
        .ok_or_else(|| KeyError::InvalidKey("ECDSA key on an unnamed curve".to_string()))?;
    EcdsaCurve::from_nid(nid)
}

fn ec_point_ski<T: HasPublic + HasParams>(key: &EcKey<T>) -> Result<Vec<u8>> {
    let mut ctx = BigNumContext::new()?;
    let point = key
        .public_key()
        .to_bytes(key.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)?;
    Ok(Sha256::digest(&point).to_vec())
}

/* ------------------------------- ECDSA ----------------------------------- */

#[derive(Clone)]
pub struct EcdsaPrivateKey {
    key: EcKey<Private>,
}

impl EcdsaPrivateKey {
    pub fn generate(curve: EcdsaCurve) -> Result<Self> {
        let group = EcGroup::from_curve_name(curve.nid())?;
        Ok(Self {
            key: EcKey::generate(&group)?,
        })
    }

    /// Accepts PKCS#8 or SEC1 DER
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let pkey = PKey::private_key_from_der(der)
            .map_err(|e| KeyError::InvalidKeyFormat(format!("Failed parsing ECDSA private key: {e}")))?;
        Self::from_pkey(pkey)
    }

    pub fn from_pkey(pkey: PKey<Private>) -> Result<Self> {
        if pkey.id() != Id::EC {
            return Err(KeyError::InvalidKey(
                "expected an ECDSA private key".to_string(),
            ));
        }
        let key = pkey.ec_key()?;
        curve_of(&key)?;
        Ok(Self { key })
    }

    pub fn curve(&self) -> Result<EcdsaCurve> {
        curve_of(&self.key)
    }

    pub fn public_key(&self) -> Result<EcdsaPublicKey> {
        let key = EcKey::from_public_key(self.key.group(), self.key.public_key())?;
        Ok(EcdsaPublicKey { key })
    }

    pub fn ski(&self) -> Result<Vec<u8>> {
        ec_point_ski(&self.key)
    }

    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        Ok(PKey::from_ec_key(self.key.clone())?.private_key_to_pkcs8()?)
    }

    /// Sign a precomputed digest, returning an ASN.1 DER signature
    pub fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>> {
        let sig = EcdsaSig::sign(digest, &self.key)
            .map_err(|e| KeyError::SignatureError(format!("ECDSA signing failed: {e}")))?;
        Ok(sig.to_der()?)
    }
}

impl fmt::Debug for EcdsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaPrivateKey")
            .field("curve", &self.curve().ok())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct EcdsaPublicKey {
    key: EcKey<Public>,
}

impl EcdsaPublicKey {
    pub fn from_pkey(pkey: PKey<Public>) -> Result<Self> {
        if pkey.id() != Id::EC {
            return Err(KeyError::InvalidKey("expected an ECDSA public key".to_string()));
        }
        let key = pkey.ec_key()?;
        curve_of(&key)?;
        Ok(Self { key })
    }

    pub fn curve(&self) -> Result<EcdsaCurve> {
        curve_of(&self.key)
    }

    /// SubjectPublicKeyInfo DER
    pub fn bytes(&self) -> Result<Vec<u8>> {
        Ok(self.key.public_key_to_der()?)
    }

    pub fn ski(&self) -> Result<Vec<u8>> {
        ec_point_ski(&self.key)
    }

    /// Uncompressed SEC1 point
    pub fn point_bytes(&self) -> Result<Vec<u8>> {
        let mut ctx = BigNumContext::new()?;
        Ok(self
            .key
            .public_key()
            .to_bytes(self.key.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)?)
    }
}

impl fmt::Debug for EcdsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaPublicKey")
            .field("curve", &self.curve().ok())
            .finish_non_exhaustive()
    }
}

/* -------------------------------- RSA ------------------------------------ */

#[derive(Clone)]
pub struct RsaPrivateKey {
    key: Rsa<Private>,
}

impl RsaPrivateKey {
    pub fn generate(bits: u32) -> Result<Self> {
        Ok(Self {
            key: Rsa::generate(bits)?,
        })
    }

    pub fn bits(&self) -> usize {
        self.key.size() as usize * 8
    }

    pub fn public_key(&self) -> Result<RsaPublicKey> {
        let key = Rsa::from_public_components(self.key.n().to_owned()?, self.key.e().to_owned()?)?;
        Ok(RsaPublicKey { key })
    }

    pub fn ski(&self) -> Result<Vec<u8>> {
        self.public_key()?.ski()
    }

    /// PKCS#1 v1.5 signature over a SHA-256/384/512 digest
    pub fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>> {
        let md = match digest.len() {
            32 => Md::sha256(),
            48 => Md::sha384(),
            64 => Md::sha512(),
            n => {
                return Err(KeyError::SignatureError(format!(
                    "unsupported digest length {n} for RSA signing"
                )))
            }
        };
        let pkey = PKey::from_rsa(self.key.clone())?;
        let mut ctx = PkeyCtx::new(&pkey)?;
        ctx.sign_init()?;
        ctx.set_rsa_padding(Padding::PKCS1)?;
        ctx.set_signature_md(md)?;
        let mut signature = Vec::new();
        ctx.sign_to_vec(digest, &mut signature)
            .map_err(|e| KeyError::SignatureError(format!("RSA signing failed: {e}")))?;
        Ok(signature)
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct RsaPublicKey {
    key: Rsa<Public>,
}

impl RsaPublicKey {
    pub fn from_pkey(pkey: PKey<Public>) -> Result<Self> {
        if pkey.id() != Id::RSA {
            return Err(KeyError::InvalidKey("expected an RSA public key".to_string()));
        }
        Ok(Self { key: pkey.rsa()? })
    }

    pub fn bits(&self) -> usize {
        self.key.size() as usize * 8
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        Ok(self.key.public_key_to_der()?)
    }

    pub fn ski(&self) -> Result<Vec<u8>> {
        let raw = self.key.public_key_to_der_pkcs1()?;
        Ok(Sha256::digest(&raw).to_vec())
    }

    /// RSA-OAEP (SHA-1 MGF) encryption
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.key.size() as usize];
        let len = self
            .key
            .public_encrypt(plaintext, &mut out, Padding::PKCS1_OAEP)
            .map_err(|e| KeyError::CryptoError(format!("RSA-OAEP encryption failed: {e}")))?;
        out.truncate(len);
        Ok(out)
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPublicKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}
