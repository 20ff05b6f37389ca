//! CP-ABE key variants.
//!
//! Master keys, attribute-bound private keys and public parameters all behave
//! like ordinary keys: they serialize to a canonical protobuf encoding and
//! their subject key identifier is the SHA-256 of that encoding. The
//! cryptography itself lives behind [`engine::AbeEngine`].

pub mod attributes;
pub mod engine;

use crate::error::{KeyError, Result};
use prost::Message;
use sha2::{Digest, Sha256};

pub use attributes::{attribute_id, private_key_ski, AttributeId, AttributeSet};
pub use engine::AbeEngine;

/// Object identifier of the certificate extension carrying marshaled params
pub const PARAMS_OID: &str = "1.2.3.4.5.6.7.8.9";

/// Object identifier of the attribute-manager extension (JSON attribute map)
pub const ATTRIBUTES_OID: &str = "1.2.3.4.5.6.7.8.1";

/// Wire messages for CP-ABE material. The field layout is part of the key
/// identifier contract: changing a tag changes every SKI.
pub mod pb {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Params {
        #[prost(string, tag = "1")]
        pub scheme: String,
        #[prost(bytes = "vec", tag = "2")]
        pub public_elements: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MasterKey {
        #[prost(message, optional, tag = "1")]
        pub param: Option<Params>,
        #[prost(bytes = "vec", tag = "2")]
        pub secret: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Key {
        #[prost(message, optional, tag = "1")]
        pub param: Option<Params>,
        #[prost(int32, repeated, tag = "2")]
        pub attribute_ids: Vec<i32>,
        #[prost(bytes = "vec", tag = "3")]
        pub material: Vec<u8>,
    }
}

fn marshal<M: Message>(message: &M, what: &str) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(message.encoded_len());
    message
        .encode(&mut raw)
        .map_err(|e| KeyError::SerializationError(format!("Failed marshalling {what} [{e}]")))?;
    Ok(raw)
}

fn sha256(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

fn unset(what: &str) -> KeyError {
    KeyError::SerializationError(format!("Failed marshalling {what} [value not set]"))
}

/* --------------------------------- Params -------------------------------- */

/// Public parameters of a CP-ABE instance
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Params {
    params: Option<pb::Params>,
}

impl Params {
    pub fn new(params: pb::Params) -> Self {
        Self {
            params: Some(params),
        }
    }

    pub fn unset() -> Self {
        Self { params: None }
    }

    /// Decode params previously produced by [`Params::bytes`]
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let params = pb::Params::decode(raw)
            .map_err(|e| KeyError::SerializationError(format!("Failed unmarshalling params [{e}]")))?;
        Ok(Self::new(params))
    }

    pub fn inner(&self) -> Option<&pb::Params> {
        self.params.as_ref()
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        let params = self.params.as_ref().ok_or_else(|| unset("params"))?;
        marshal(params, "params")
    }

    /// SHA-256 of the serialized params, empty when unset.
    pub fn ski(&self) -> Result<Vec<u8>> {
        match &self.params {
            None => Ok(Vec::new()),
            Some(params) => Ok(sha256(&[&marshal(params, "params")?])),
        }
    }
}

/* ------------------------------- Master Key ------------------------------ */

/// CP-ABE master secret together with the params it was set up with
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MasterKey {
    key: Option<pb::MasterKey>,
}

impl MasterKey {
    pub fn new(key: pb::MasterKey) -> Self {
        Self { key: Some(key) }
    }

    pub fn unset() -> Self {
        Self { key: None }
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let key = pb::MasterKey::decode(raw).map_err(|e| {
            KeyError::SerializationError(format!("Failed unmarshalling cpabe master key [{e}]"))
        })?;
        Ok(Self::new(key))
    }

    pub fn inner(&self) -> Option<&pb::MasterKey> {
        self.key.as_ref()
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        let key = self.key.as_ref().ok_or_else(|| unset("cpabe master key"))?;
        marshal(key, "cpabe master key")
    }

    pub fn ski(&self) -> Result<Vec<u8>> {
        match &self.key {
            None => Ok(Vec::new()),
            Some(key) => Ok(sha256(&[&marshal(key, "cpabe master key")?])),
        }
    }

    /// Params embedded in the master key
    pub fn params(&self) -> Params {
        Params {
            params: self.key.as_ref().and_then(|k| k.param.clone()),
        }
    }
}

/* ------------------------------ Private Key ------------------------------ */

/// Private key bound to an ordered sequence of attribute ids
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrivateKey {
    key: Option<pb::Key>,
}

impl PrivateKey {
    pub fn new(key: pb::Key) -> Self {
        Self { key: Some(key) }
    }

    pub fn unset() -> Self {
        Self { key: None }
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let key = pb::Key::decode(raw)
            .map_err(|e| KeyError::SerializationError(format!("Failed unmarshalling cpabe key [{e}]")))?;
        Ok(Self::new(key))
    }

    pub fn inner(&self) -> Option<&pb::Key> {
        self.key.as_ref()
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        let key = self.key.as_ref().ok_or_else(|| unset("cpabe key"))?;
        marshal(key, "cpabe key")
    }

    pub fn ski(&self) -> Result<Vec<u8>> {
        match &self.key {
            None => Ok(Vec::new()),
            Some(key) => Ok(sha256(&[&marshal(key, "cpabe key")?])),
        }
    }

    pub fn params(&self) -> Params {
        Params {
            params: self.key.as_ref().and_then(|k| k.param.clone()),
        }
    }

    pub fn attribute_ids(&self) -> &[AttributeId] {
        self.key
            .as_ref()
            .map(|k| k.attribute_ids.as_slice())
            .unwrap_or(&[])
    }

    /// Identifier a certificate carrying this key's params and attributes
    /// resolves to. Empty when the key or its params are unset.
    pub fn attribute_ski(&self) -> Result<Vec<u8>> {
        let params = self.params();
        if params.inner().is_none() {
            return Ok(Vec::new());
        }
        Ok(private_key_ski(&params.bytes()?, self.attribute_ids()))
    }
}

/* ------------------------------- Variants -------------------------------- */

/// The three CP-ABE key shapes
#[derive(Debug, Clone, PartialEq)]
pub enum CpabeKey {
    MasterKey(MasterKey),
    PrivateKey(PrivateKey),
    Params(Params),
}

impl CpabeKey {
    pub fn bytes(&self) -> Result<Vec<u8>> {
        match self {
            CpabeKey::MasterKey(k) => k.bytes(),
            CpabeKey::PrivateKey(k) => k.bytes(),
            CpabeKey::Params(p) => p.bytes(),
        }
    }

    pub fn ski(&self) -> Result<Vec<u8>> {
        match self {
            CpabeKey::MasterKey(k) => k.ski(),
            CpabeKey::PrivateKey(k) => k.ski(),
            CpabeKey::Params(p) => p.ski(),
        }
    }

    pub fn symmetric(&self) -> bool {
        false
    }

    pub fn private(&self) -> bool {
        !matches!(self, CpabeKey::Params(_))
    }

    /// Params are their own public counterpart.
    pub fn public_key(&self) -> Params {
        match self {
            CpabeKey::MasterKey(k) => k.params(),
            CpabeKey::PrivateKey(k) => k.params(),
            CpabeKey::Params(p) => p.clone(),
        }
    }
}
