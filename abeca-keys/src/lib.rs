//! Abeca Keys – key resolution for the certificate authority
//!
//! Resolves the signer behind a CA certificate from a key store, derives
//! CP-ABE key identifiers from certificate extensions and exports CP-ABE
//! master key params.

pub mod asymmetric;
pub mod certificate;
pub mod config;
pub mod cpabe;
mod cpabe_lookup;
pub mod error;
pub mod key;
pub mod keystore;
pub mod request;
pub mod resolver;
pub mod signer;

pub use error::{KeyError, Result};

pub use certificate::{load_certificate_chain, Certificate, CpabeExtensions};

pub use config::{make_file_abs, ResolverConfig};

pub use cpabe::{AbeEngine, AttributeSet, CpabeKey, ATTRIBUTES_OID, PARAMS_OID};

pub use key::Key;

pub use keystore::{KeyGenOpts, KeyImportOpts, KeyStore, SoftwareKeyStore};

pub use request::{key_gen_opts, CertificateRequest, KeyRequest};

pub use resolver::{KeyResolver, TlsCertificate, TlsPrivateKey};

pub use signer::{default_sig_algo, CspSigner, LocalSigner, SignatureAlgorithm, SigningPolicy};
