//! # Core
//!
//! Serde helpers for JSON-LD values that may take more than one shape.

use serde::{Deserialize, Serialize};

/// `Kind` allows serde to serialize/deserialize a string or an object.
///
/// Used for verification relationships (a reference or an embedded method),
/// service endpoints (a URI or a structured value) and credential issuers (a
/// DID or an object carrying an `id`).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Kind<T> {
    /// Simple string value
    String(String),

    /// Complex object value
    Object(T),
}

impl<T: Default> Default for Kind<T> {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl<T> From<String> for Kind<T> {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T> From<&str> for Kind<T> {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// `OneMany` allows serde to serialize/deserialize a single object or a set of
/// objects.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneMany<T> {
    /// Single object
    One(T),

    /// Set of objects
    Many(Vec<T>),
}

impl<T: Default> Default for OneMany<T> {
    fn default() -> Self {
        Self::One(T::default())
    }
}

#[cfg(test)]
mod test {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn kind_shapes() {
        let s: Kind<Value> = serde_json::from_value(json!("did:idblock:z1")).expect("should parse");
        assert_eq!(s, Kind::from("did:idblock:z1"));

        let o: Kind<Value> =
            serde_json::from_value(json!({"id": "did:idblock:z1"})).expect("should parse");
        assert_eq!(o, Kind::Object(json!({"id": "did:idblock:z1"})));
        assert_eq!(serde_json::to_value(&o).expect("should serialize"), json!({"id": "did:idblock:z1"}));
    }

    #[test]
    fn one_many_shapes() {
        let one: OneMany<String> = serde_json::from_value(json!("a")).expect("should parse");
        assert_eq!(one, OneMany::One("a".to_string()));

        let many: OneMany<String> = serde_json::from_value(json!(["a", "b"])).expect("should parse");
        assert_eq!(serde_json::to_value(&many).expect("should serialize"), json!(["a", "b"]));
    }
}
