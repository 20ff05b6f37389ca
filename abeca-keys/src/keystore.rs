//! Key store abstraction.
//!
//! The key store owns every persisted key. This crate only asks it to
//! generate, import, look up, sign and encrypt; it never holds key material
//! beyond a single call.

use crate::error::Result;
use crate::key::Key;

pub mod software;

pub use software::SoftwareKeyStore;

/// Key generation options. `temporary` keys are returned but never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGenOpts {
    /// ECDSA on the store's default curve (P-256)
    Ecdsa { temporary: bool },
    EcdsaP256 { temporary: bool },
    EcdsaP384 { temporary: bool },
    Rsa2048 { temporary: bool },
    Rsa3072 { temporary: bool },
    Rsa4096 { temporary: bool },
    CpabeMaster { temporary: bool },
}

impl KeyGenOpts {
    pub fn temporary(&self) -> bool {
        match *self {
            KeyGenOpts::Ecdsa { temporary }
            | KeyGenOpts::EcdsaP256 { temporary }
            | KeyGenOpts::EcdsaP384 { temporary }
            | KeyGenOpts::Rsa2048 { temporary }
            | KeyGenOpts::Rsa3072 { temporary }
            | KeyGenOpts::Rsa4096 { temporary }
            | KeyGenOpts::CpabeMaster { temporary } => temporary,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            KeyGenOpts::Ecdsa { .. } => "ECDSA",
            KeyGenOpts::EcdsaP256 { .. } => "ECDSAP256",
            KeyGenOpts::EcdsaP384 { .. } => "ECDSAP384",
            KeyGenOpts::Rsa2048 { .. } => "RSA2048",
            KeyGenOpts::Rsa3072 { .. } => "RSA3072",
            KeyGenOpts::Rsa4096 { .. } => "RSA4096",
            KeyGenOpts::CpabeMaster { .. } => "CPABE",
        }
    }
}

/// Key import options, naming how the raw bytes are to be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyImportOpts {
    /// DER certificate; the subject public key is imported
    X509PublicKey { temporary: bool },
    /// PKCS#8 or SEC1 DER
    EcdsaPrivateKey { temporary: bool },
    /// SubjectPublicKeyInfo DER (ECDSA or RSA)
    PublicKey { temporary: bool },
    /// Protobuf params as written into certificates
    CpabeParams { temporary: bool },
    CpabeMasterKey { temporary: bool },
    CpabePrivateKey { temporary: bool },
}

impl KeyImportOpts {
    pub fn temporary(&self) -> bool {
        match *self {
            KeyImportOpts::X509PublicKey { temporary }
            | KeyImportOpts::EcdsaPrivateKey { temporary }
            | KeyImportOpts::PublicKey { temporary }
            | KeyImportOpts::CpabeParams { temporary }
            | KeyImportOpts::CpabeMasterKey { temporary }
            | KeyImportOpts::CpabePrivateKey { temporary } => temporary,
        }
    }
}

/// Crypto service provider as seen by the CA.
///
/// Implementations must be safe to share between concurrent callers; the
/// resolution code performs no locking of its own.
pub trait KeyStore: Send + Sync {
    fn key_gen(&self, opts: &KeyGenOpts) -> Result<Key>;

    fn key_import(&self, raw: &[u8], opts: &KeyImportOpts) -> Result<Key>;

    /// Look up a key by SKI. When only the public half of a key pair is known
    /// the public key is returned; callers needing a private key must check
    /// [`Key::private`].
    fn get_key(&self, ski: &[u8]) -> Result<Key>;

    fn sign(&self, key: &Key, digest: &[u8]) -> Result<Vec<u8>>;

    fn encrypt(&self, key: &Key, plaintext: &[u8]) -> Result<Vec<u8>>;
}
