//! Canonical JSON serialization — the only serialization permitted as input
//! to hashing, so any two replicas holding structurally-equal values produce
//! byte-identical output.
//!
//! `serde_json::Value`'s object representation is a `BTreeMap` (the
//! `preserve_order` feature is intentionally not enabled anywhere in this
//! workspace), so routing a value through `Value` before serializing already
//! gives lexicographic key order and declaration-order arrays; `serde_json`'s
//! float formatter is `ryu`-based, which is shortest-round-trip by
//! construction. Together that is exactly the canonical form this contract
//! asks for, with no insignificant whitespace from `to_vec`.

use serde::Serialize;

use crate::error::CryptoError;

/// Serialize `value` to its canonical byte form.
///
/// # Examples
///
/// ```
/// use serde::Serialize;
/// use synapse_crypto::canonical_serialize;
///
/// #[derive(Serialize)]
/// struct Point { y: i32, x: i32 }
///
/// let bytes = canonical_serialize(&Point { y: 2, x: 1 }).unwrap();
/// assert_eq!(bytes, br#"{"x":1,"y":2}"#);
/// ```
pub fn canonical_serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, CryptoError> {
    let as_value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&as_value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_come_out_sorted() {
        let value = json!({"b": 1, "a": 2});
        let bytes = canonical_serialize(&value).unwrap();
        assert_eq!(bytes, br#"{"a":2,"b":1}"#);
    }

    #[test]
    fn structurally_equal_values_serialize_identically() {
        let a = json!({"x": 1, "y": [1, 2, 3]});
        let b = json!({"y": [1, 2, 3], "x": 1});
        assert_eq!(canonical_serialize(&a).unwrap(), canonical_serialize(&b).unwrap());
    }

    #[test]
    fn has_no_insignificant_whitespace() {
        let value = json!({"a": [1, 2]});
        let bytes = canonical_serialize(&value).unwrap();
        assert!(!bytes.iter().any(|b| *b == b' ' || *b == b'\n'));
    }
}
