use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for the abeca-keys crate
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Could not read file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Certificate error: {0}")]
    CertificateError(String),

    #[error("PEM error: {0}")]
    PemError(String),

    #[error("Crypto error: {0}")]
    CryptoError(String),

    #[error("Signature error: {0}")]
    SignatureError(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("The private key associated with the certificate with SKI '{ski}' was not found")]
    PrivateKeyNotFound { ski: String },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid {algorithm} key size: {size}")]
    InvalidKeySize { algorithm: &'static str, size: usize },

    #[error("Invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<KeyError>,
    },
}

impl KeyError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        KeyError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wrap this error with a message describing the failing operation
    pub fn context(self, context: impl Into<String>) -> Self {
        KeyError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping every context layer
    pub fn root_cause(&self) -> &KeyError {
        match self {
            KeyError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.root_cause(), KeyError::Unsupported(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root_cause(),
            KeyError::KeyNotFound(_) | KeyError::PrivateKeyNotFound { .. }
        )
    }
}

/// Attach context to a failing result without allocating on success
pub trait ResultExt<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

impl From<openssl::error::ErrorStack> for KeyError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        KeyError::CryptoError(err.to_string())
    }
}

impl From<hex::FromHexError> for KeyError {
    fn from(err: hex::FromHexError) -> Self {
        KeyError::SerializationError(format!("hex decoding error: {err}"))
    }
}

impl From<prost::EncodeError> for KeyError {
    fn from(err: prost::EncodeError) -> Self {
        KeyError::SerializationError(format!("protobuf encoding error: {err}"))
    }
}

impl From<prost::DecodeError> for KeyError {
    fn from(err: prost::DecodeError) -> Self {
        KeyError::SerializationError(format!("protobuf decoding error: {err}"))
    }
}

/// Result type for abeca-keys operations
pub type Result<T> = std::result::Result<T, KeyError>;
