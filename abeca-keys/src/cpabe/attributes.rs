//! Attribute canonicalization and CP-ABE private key identifiers.
//!
//! A certificate carries its attributes as a JSON map. Map iteration order is
//! not stable, so attributes are sorted by name before they are hashed; the
//! resulting id sequence is what key generation consumes and what the
//! private-key identifier is derived from.

use crate::error::{KeyError, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// 32-bit attribute identifier fed to the ABE engine
pub type AttributeId = i32;

#[derive(Deserialize)]
#[serde(untagged)]
enum AttributeDocument {
    // attribute-manager layout: {"attrs": {"name": "value"}}
    Wrapped { attrs: HashMap<String, String> },
    Flat(HashMap<String, String>),
}

/// Attribute name/value pairs in canonical (name-sorted) order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeSet {
    pairs: Vec<(String, String)>,
}

impl AttributeSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from unordered pairs. Names are expected to be unique.
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(n, v)| (n.into(), v.into()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Self { pairs }
    }

    /// Decode the attribute extension payload
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let doc: AttributeDocument = serde_json::from_slice(raw)
            .map_err(|e| KeyError::SerializationError(format!("unmarshal Attributes error, {e}")))?;
        let map = match doc {
            AttributeDocument::Wrapped { attrs } => attrs,
            AttributeDocument::Flat(map) => map,
        };
        Ok(Self::from_pairs(map))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn attribute_ids(&self) -> Vec<AttributeId> {
        self.pairs
            .iter()
            .map(|(name, value)| attribute_id(name, value))
            .collect()
    }
}

/// Hash of `"name.value"`: the first four bytes of its SHA-256, big endian.
///
/// Private keys are found by the identifiers derived from these ids, so this
/// must agree with the attribute hash of the engine that issued the keys. An
/// [`AbeEngine`](super::AbeEngine) with a different hash cannot share a store
/// with certificate lookup.
pub fn attribute_id(name: &str, value: &str) -> AttributeId {
    let digest = Sha256::digest(format!("{name}.{value}").as_bytes());
    i32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// SHA-256(params ‖ BE32(id₀) ‖ BE32(id₁) ‖ …)
pub fn private_key_ski(params_bytes: &[u8], attribute_ids: &[AttributeId]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(params_bytes);
    for id in attribute_ids {
        hasher.update(id.to_be_bytes());
    }
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_sorted_by_name() {
        let set = AttributeSet::from_json(br#"{"role":"admin","dept":"eng"}"#).unwrap();
        assert_eq!(
            set.pairs(),
            &[
                ("dept".to_string(), "eng".to_string()),
                ("role".to_string(), "admin".to_string())
            ]
        );
    }

    #[test]
    fn wrapped_layout_is_accepted() {
        let flat = AttributeSet::from_json(br#"{"role":"admin","dept":"eng"}"#).unwrap();
        let wrapped =
            AttributeSet::from_json(br#"{"attrs":{"dept":"eng","role":"admin"}}"#).unwrap();
        assert_eq!(flat, wrapped);
    }

    #[test]
    fn order_of_presentation_does_not_matter() {
        let a = AttributeSet::from_pairs([("role", "admin"), ("dept", "eng"), ("site", "ber")]);
        let b = AttributeSet::from_pairs([("site", "ber"), ("dept", "eng"), ("role", "admin")]);
        assert_eq!(a.attribute_ids(), b.attribute_ids());
        let params = b"params";
        assert_eq!(
            private_key_ski(params, &a.attribute_ids()),
            private_key_ski(params, &b.attribute_ids())
        );
    }

    #[test]
    fn reordered_ids_change_the_identifier() {
        let ids = AttributeSet::from_pairs([("a", "1"), ("b", "2")]).attribute_ids();
        let reversed: Vec<_> = ids.iter().rev().copied().collect();
        assert_ne!(private_key_ski(b"p", &ids), private_key_ski(b"p", &reversed));
    }

    #[test]
    fn identifier_layout_is_params_then_big_endian_ids() {
        let mut expected = Sha256::new();
        expected.update(b"pp");
        expected.update([0x00, 0x00, 0x01, 0x02]);
        expected.update([0xff, 0xff, 0xff, 0xff]);
        assert_eq!(
            private_key_ski(b"pp", &[0x0102, -1]),
            expected.finalize().to_vec()
        );
    }

    #[test]
    fn attribute_id_hashes_name_dot_value() {
        let digest = Sha256::digest(b"dept.eng");
        let expected = i32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        assert_eq!(attribute_id("dept", "eng"), expected);
        assert_ne!(attribute_id("dept", "eng"), attribute_id("dept", "ops"));
    }

    #[test]
    fn attribute_id_is_stable() {
        assert_eq!(attribute_id("role", "admin"), 0xb656_4100_u32 as i32);
        assert_eq!(attribute_id("role", "admin"), -1_235_861_248);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = AttributeSet::from_json(b"{not json").unwrap_err();
        assert!(matches!(err, KeyError::SerializationError(_)));
    }

    #[test]
    fn empty_set_has_no_ids() {
        assert!(AttributeSet::empty().attribute_ids().is_empty());
        assert!(AttributeSet::from_json(b"{}").unwrap().is_empty());
    }
}
