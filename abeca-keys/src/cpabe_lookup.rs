//! CP-ABE key lookup from certificate extensions, and master key export.
//!
//! A certificate that carries no params extension is not an error: the
//! lookups return `Ok(None)` and the caller issues without CP-ABE material.

use crate::certificate::Certificate;
use crate::cpabe::{private_key_ski, AttributeSet};
use crate::error::{Result, ResultExt};
use crate::key::Key;
use crate::keystore::{KeyGenOpts, KeyImportOpts};
use crate::resolver::KeyResolver;
use abeca_common::{log_debug, log_info, log_warn};
use std::path::Path;

impl KeyResolver {
    /// Import the params a certificate carries, without storing them
    pub fn cpabe_params_from_cert(&self, cert: &Certificate) -> Result<Option<Key>> {
        let Some(params) = cert.cpabe_extensions()?.params else {
            log_warn!(
                self.logger,
                "certificate '{}' carries no cpabe params, cpabe not supported",
                cert.subject()
            );
            return Ok(None);
        };
        let key = self
            .store()
            .key_import(&params, &KeyImportOpts::CpabeParams { temporary: true })
            .context_with(|| "Failed to import cpabe params from certificate")?;
        Ok(Some(key))
    }

    pub fn cpabe_params_from_cert_file(&self, cert_file: &Path) -> Result<Option<Key>> {
        let cert = Certificate::load(cert_file)?;
        self.cpabe_params_from_cert(&cert)
    }

    /// Identifier of the private key bound to `cert`'s params and attributes.
    ///
    /// Attributes are hashed in canonical order, so the identifier does not
    /// depend on how the certificate's attribute map happened to be encoded.
    pub fn cpabe_private_key_ski(&self, cert: &Certificate) -> Result<Option<Vec<u8>>> {
        let extensions = cert.cpabe_extensions()?;
        let Some(params) = extensions.params else {
            log_warn!(
                self.logger,
                "certificate '{}' carries no cpabe params, cpabe not supported",
                cert.subject()
            );
            return Ok(None);
        };
        let attributes = match extensions.attributes {
            Some(raw) => AttributeSet::from_json(&raw).context_with(|| {
                format!("Invalid attributes in certificate '{}'", cert.subject())
            })?,
            None => AttributeSet::empty(),
        };
        let ski = private_key_ski(&params, &attributes.attribute_ids());
        log_debug!(
            self.logger,
            "cpabe private key for '{}' over {} attribute(s) has SKI {}",
            cert.subject(),
            attributes.len(),
            hex::encode(&ski)
        );
        Ok(Some(ski))
    }

    pub fn cpabe_private_key_from_cert_file(&self, cert_file: &Path) -> Result<Option<Key>> {
        let cert = Certificate::load(cert_file)?;
        let Some(ski) = self.cpabe_private_key_ski(&cert)? else {
            return Ok(None);
        };
        let key = self
            .store()
            .get_key(&ski)
            .context_with(|| "Failed to get cpabe private key from key store")?;
        Ok(Some(key))
    }

    /// Master key whose params the certificate carries
    pub fn cpabe_master_key_from_cert_file(&self, cert_file: &Path) -> Result<Option<Key>> {
        let Some(params) = self.cpabe_params_from_cert_file(cert_file)? else {
            return Ok(None);
        };
        let key = self
            .store()
            .get_key(&params.ski()?)
            .context_with(|| "Failed to get cpabe master key from key store")?;
        Ok(Some(key))
    }

    /// Generate and store a master key; returns it with its hex-encoded params
    pub fn cpabe_master_key_generate(&self) -> Result<(Key, String)> {
        let master = self
            .store()
            .key_gen(&KeyGenOpts::CpabeMaster { temporary: false })
            .context_with(|| "generate cpabe master key error")?;
        let params = master
            .public_key()
            .context_with(|| "get the cpabe params from master key error")?;
        let raw = params
            .bytes()
            .context_with(|| "marshal cpabe params error")?;
        log_info!(
            self.logger,
            "generated cpabe master key {}",
            hex::encode(params.ski()?)
        );
        Ok((master, hex::encode(raw)))
    }
}
