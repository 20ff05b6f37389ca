use super::{AttributeId, MasterKey, Params, PrivateKey};
use crate::error::Result;

/// Attribute-based encryption engine.
///
/// The scheme's math lives outside this crate; key stores call into an engine
/// for setup, per-attribute-set key generation and encryption.
pub trait AbeEngine: Send + Sync {
    /// Create a fresh master key; its params must be embedded in it.
    fn setup(&self) -> Result<MasterKey>;

    /// Derive a private key for `attribute_ids`, in the order given. The
    /// returned key must embed the master key's params unchanged.
    ///
    /// Ids come from [`attribute_id`](super::attribute_id); engines that hash
    /// attributes themselves must use the same function.
    fn keygen(&self, master: &MasterKey, attribute_ids: &[AttributeId]) -> Result<PrivateKey>;

    fn encrypt(&self, params: &Params, plaintext: &[u8]) -> Result<Vec<u8>>;
}
