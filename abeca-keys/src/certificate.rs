//! X.509 certificate loading and extension scanning.
//!
//! Certificates arrive as PEM files written by the issuing CA. This module
//! decodes them, exposes their extensions as plain (OID, bytes) records and
//! loads leaf-plus-chain bundles for TLS use.

use crate::cpabe::{ATTRIBUTES_OID, PARAMS_OID};
use crate::error::{KeyError, Result};
use rustls_pki_types::CertificateDer;
use std::fs;
use std::path::Path;
use x509_parser::prelude::*;

pub const PEM_CERTIFICATE: &str = "CERTIFICATE";

/// Standard X.509 certificate wrapper
#[derive(Debug, Clone)]
pub struct Certificate {
    /// DER-encoded certificate bytes
    der_bytes: Vec<u8>,
    subject: String,
    issuer: String,
}

/// One certificate extension: dotted OID, criticality and raw value bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRecord {
    pub oid: String,
    pub critical: bool,
    pub value: Vec<u8>,
}

/// Raw CP-ABE related extension payloads of a certificate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpabeExtensions {
    /// Marshaled params (`PARAMS_OID`)
    pub params: Option<Vec<u8>>,
    /// JSON attribute map (`ATTRIBUTES_OID`)
    pub attributes: Option<Vec<u8>>,
}

impl Certificate {
    /// Create from DER-encoded bytes
    pub fn from_der(der_bytes: Vec<u8>) -> Result<Self> {
        let (_, parsed) = X509Certificate::from_der(&der_bytes).map_err(|e| {
            KeyError::CertificateError(format!("Failed to parse certificate: {e}"))
        })?;
        let subject = parsed.subject().to_string();
        let issuer = parsed.issuer().to_string();
        Ok(Self {
            der_bytes,
            subject,
            issuer,
        })
    }

    /// Parse a PEM document holding exactly one certificate
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self> {
        let blocks = ::pem::parse_many(pem_bytes)
            .map_err(|e| KeyError::PemError(format!("Failed to decode PEM: {e}")))?;
        let mut blocks = blocks.into_iter();
        let block = blocks
            .next()
            .ok_or_else(|| KeyError::PemError("Failed to decode certificate PEM".to_string()))?;
        if blocks.next().is_some() {
            return Err(KeyError::PemError(
                "the PEM file should contain only one object".to_string(),
            ));
        }
        if block.tag() != PEM_CERTIFICATE {
            return Err(KeyError::PemError(format!(
                "expected a {PEM_CERTIFICATE} PEM block, found {}",
                block.tag()
            )));
        }
        Self::from_der(block.into_contents())
    }

    /// Read and parse a single-certificate PEM file
    pub fn load(path: &Path) -> Result<Self> {
        let pem_bytes = fs::read(path).map_err(|e| KeyError::io(path, e))?;
        Self::from_pem(&pem_bytes).map_err(|e| {
            e.context(format!("Failed parsing certificate '{}'", path.display()))
        })
    }

    pub fn der_bytes(&self) -> &[u8] {
        &self.der_bytes
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn to_rustls_certificate(&self) -> CertificateDer<'static> {
        CertificateDer::from(self.der_bytes.clone())
    }

    pub fn parsed(&self) -> Result<X509Certificate<'_>> {
        let (_, cert) = X509Certificate::from_der(&self.der_bytes).map_err(|e| {
            KeyError::CertificateError(format!("Failed to parse certificate: {e}"))
        })?;
        Ok(cert)
    }

    pub fn extensions(&self) -> Result<Vec<ExtensionRecord>> {
        let parsed = self.parsed()?;
        Ok(parsed
            .extensions()
            .iter()
            .map(|ext| ExtensionRecord {
                oid: ext.oid.to_id_string(),
                critical: ext.critical,
                value: ext.value.to_vec(),
            })
            .collect())
    }

    pub fn cpabe_extensions(&self) -> Result<CpabeExtensions> {
        Ok(extract_cpabe_extensions(&self.extensions()?))
    }
}

/// Pick the params and attribute payloads out of an extension list. A later
/// duplicate wins.
pub fn extract_cpabe_extensions(extensions: &[ExtensionRecord]) -> CpabeExtensions {
    let mut found = CpabeExtensions::default();
    for ext in extensions {
        if ext.oid == PARAMS_OID {
            found.params = Some(ext.value.clone());
        } else if ext.oid == ATTRIBUTES_OID {
            found.attributes = Some(ext.value.clone());
        }
    }
    found
}

/// Load a PEM bundle of a leaf certificate followed by its chain.
///
/// Non-certificate blocks are skipped; when nothing else is found the error
/// names what was skipped, and a lone private key is reported as likely
/// swapped certificate/key inputs.
pub fn load_certificate_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let pem_bytes = fs::read(path).map_err(|e| KeyError::io(path, e))?;
    let blocks = ::pem::parse_many(&pem_bytes).map_err(|e| {
        KeyError::PemError(format!("Failed to decode PEM file {}: {e}", path.display()))
    })?;

    let mut chain = Vec::new();
    let mut skipped_block_types = Vec::new();
    for block in blocks {
        if block.tag() == PEM_CERTIFICATE {
            chain.push(CertificateDer::from(block.into_contents()));
        } else {
            skipped_block_types.push(block.tag().to_string());
        }
    }

    if chain.is_empty() {
        if skipped_block_types.is_empty() {
            return Err(KeyError::PemError(format!(
                "Failed to find PEM block in file {}",
                path.display()
            )));
        }
        if skipped_block_types.len() == 1 && skipped_block_types[0].ends_with("PRIVATE KEY") {
            return Err(KeyError::PemError(format!(
                "Failed to find certificate PEM data in file {}, but did find a private key; PEM inputs may have been switched",
                path.display()
            )));
        }
        return Err(KeyError::PemError(format!(
            "Failed to find \"{PEM_CERTIFICATE}\" PEM block in file {} after skipping PEM blocks of the following types: [{}]",
            path.display(),
            skipped_block_types.join(" ")
        )));
    }
    Ok(chain)
}
