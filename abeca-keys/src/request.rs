//! Key requests and the key generation option table.

use crate::error::{KeyError, Result};
use crate::keystore::KeyGenOpts;
use serde::{Deserialize, Serialize};

/// Algorithm and size requested for a new key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRequest {
    pub algo: String,
    pub size: usize,
}

impl KeyRequest {
    pub fn new(algo: impl Into<String>, size: usize) -> Self {
        Self {
            algo: algo.into(),
            size,
        }
    }
}

/// Subset of a certificate request relevant to key generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    #[serde(rename = "CN", default)]
    pub common_name: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(rename = "key", default)]
    pub key_request: Option<KeyRequest>,
}

/// Map a key request onto generation options.
///
/// No request means a default-curve ECDSA key. P-521 is a known size that the
/// store cannot generate, reported as unsupported rather than invalid.
pub fn key_gen_opts(request: Option<&KeyRequest>, ephemeral: bool) -> Result<KeyGenOpts> {
    let Some(request) = request else {
        return Ok(KeyGenOpts::Ecdsa {
            temporary: ephemeral,
        });
    };
    let temporary = ephemeral;
    match request.algo.as_str() {
        "rsa" => match request.size {
            2048 => Ok(KeyGenOpts::Rsa2048 { temporary }),
            3072 => Ok(KeyGenOpts::Rsa3072 { temporary }),
            4096 => Ok(KeyGenOpts::Rsa4096 { temporary }),
            size => Err(KeyError::InvalidKeySize {
                algorithm: "RSA",
                size,
            }),
        },
        "ecdsa" => match request.size {
            256 => Ok(KeyGenOpts::EcdsaP256 { temporary }),
            384 => Ok(KeyGenOpts::EcdsaP384 { temporary }),
            521 => Err(KeyError::Unsupported(
                "Unsupported ECDSA key size: 521".to_string(),
            )),
            size => Err(KeyError::InvalidKeySize {
                algorithm: "ECDSA",
                size,
            }),
        },
        other => Err(KeyError::InvalidAlgorithm(other.to_string())),
    }
}
