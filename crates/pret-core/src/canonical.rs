//! # Canonical Bytes
//!
//! RFC 8785 (JCS) serialization for anything that gets hashed: sorted keys,
//! compact separators, integers only. The mock proving backend hashes its
//! statement through [`CanonicalBytes`], so a proof verifies in any process
//! that agrees on the statement's value.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// JCS bytes of a value. Only constructed by [`CanonicalBytes::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize `obj`.
    ///
    /// # Errors
    ///
    /// [`CanonicalizationError::FloatRejected`] names the path of the first
    /// non-integer number.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        ensure_integers(&value, &mut String::from("$"))?;
        Ok(Self(serde_jcs::to_vec(&value)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Walk `value` and fail on the first non-integer number, naming its path.
fn ensure_integers(value: &Value, path: &mut String) -> Result<(), CanonicalizationError> {
    match value {
        Value::Number(n) if !(n.is_i64() || n.is_u64()) => Err(
            CanonicalizationError::FloatRejected(n.as_f64().unwrap_or(f64::NAN), path.clone()),
        ),
        Value::Array(items) => items.iter().enumerate().try_for_each(|(i, item)| {
            let len = path.len();
            path.push_str(&format!("[{i}]"));
            let res = ensure_integers(item, path);
            path.truncate(len);
            res
        }),
        Value::Object(map) => map.iter().try_for_each(|(key, item)| {
            let len = path.len();
            path.push('.');
            path.push_str(key);
            let res = ensure_integers(item, path);
            path.truncate(len);
            res
        }),
        _ => Ok(()),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn canonical_bytes_deterministic(
            entries in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8)
        ) {
            let a = CanonicalBytes::new(&entries).unwrap();
            let b = CanonicalBytes::new(&entries).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
            let parsed: Result<Value, _> = serde_json::from_slice(a.as_bytes());
            prop_assert!(parsed.is_ok());
        }
    }
}
