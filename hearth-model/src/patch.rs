//! Patch documents and the patch contract.
//!
//! The realtime transport delivers either a full snapshot of an entity or a
//! partial document carrying only the fields that changed. Both go through the
//! same [`Patchable::patch`] path: keys present in the document overwrite the
//! matching field, absent keys leave the field untouched, and unknown keys are
//! ignored so that protocol additions never break older clients.

use crate::error::{ModelError, ModelResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::warn;

/// A snapshot or partial update payload for one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchDocument(Map<String, Value>);

impl PatchDocument {
    /// Wraps an already-parsed JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON value, which must be an object.
    pub fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            Value::Null => Err(ModelError::NotAnObject("null")),
            Value::Bool(_) => Err(ModelError::NotAnObject("bool")),
            Value::Number(_) => Err(ModelError::NotAnObject("number")),
            Value::String(_) => Err(ModelError::NotAnObject("string")),
            Value::Array(_) => Err(ModelError::NotAnObject("array")),
        }
    }

    /// Returns true if the document carries `key`, even with a null value.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Raw access to a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of keys in the document.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads and decodes the identity field of a snapshot.
    pub fn identity<T: DeserializeOwned>(&self, key: &'static str) -> ModelResult<T> {
        let value = self.0.get(key).ok_or(ModelError::MissingIdentity(key))?;
        T::deserialize(value).map_err(|source| ModelError::InvalidIdentity { key, source })
    }

    /// Overwrites `target` with the decoded value of `key` if the key is present.
    ///
    /// Returns true when `target` was written. A present but undecodable value
    /// leaves `target` untouched and is logged, never raised. Null decodes to
    /// `None` for optional targets.
    pub fn apply<T: DeserializeOwned>(&self, key: &str, target: &mut T) -> bool {
        let Some(value) = self.0.get(key) else {
            return false;
        };
        match T::deserialize(value) {
            Ok(decoded) => {
                *target = decoded;
                true
            }
            Err(e) => {
                warn!(key, error = %e, "Ignoring malformed patch field");
                false
            }
        }
    }

    /// Like [`apply`](Self::apply), but maps the decoded value before writing.
    pub fn apply_with<T, U, M>(&self, key: &str, target: &mut U, map: M) -> bool
    where
        T: DeserializeOwned,
        M: FnOnce(T) -> U,
    {
        let mut decoded: Option<T> = None;
        if self.apply(key, &mut decoded) {
            if let Some(decoded) = decoded {
                *target = map(decoded);
                return true;
            }
        }
        false
    }
}

impl From<Map<String, Value>> for PatchDocument {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for PatchDocument {
    type Error = ModelError;

    fn try_from(value: Value) -> ModelResult<Self> {
        Self::from_value(value)
    }
}

/// Contract for an entity kept in sync by patch documents.
///
/// An implementor defines its identity and which document keys map onto which
/// fields. Identity is fixed at construction: [`patch`](Self::patch) never
/// changes what [`id`](Self::id) returns.
pub trait Patchable: Clone + Send + Sync + 'static {
    /// Identity type, decoded from [`ID_KEY`](Self::ID_KEY) of a snapshot.
    type Id: Clone + Eq + Hash + Debug + DeserializeOwned + Send + Sync;

    /// Key holding the identity in snapshot documents.
    const ID_KEY: &'static str;

    /// Returns the identity.
    fn id(&self) -> Self::Id;

    /// A blank entity carrying only its identity.
    fn with_id(id: Self::Id) -> Self;

    /// Applies every recognized key present in `doc`.
    fn patch(&mut self, doc: &PatchDocument);

    /// Builds an entity from its first snapshot, through the same patch path
    /// used for updates.
    fn from_snapshot(doc: &PatchDocument) -> ModelResult<Self> {
        let mut entity = Self::with_id(doc.identity(Self::ID_KEY)?);
        entity.patch(doc);
        Ok(entity)
    }

    /// Applies `doc` and returns the state from before the patch.
    fn update(&mut self, doc: &PatchDocument) -> Self {
        let previous = self.clone();
        self.patch(doc);
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> PatchDocument {
        PatchDocument::from_value(value).unwrap()
    }

    #[test]
    fn apply_skips_absent_keys() {
        let mut region = Some("us-east".to_string());
        assert!(!doc(json!({})).apply("region", &mut region));
        assert_eq!(region.as_deref(), Some("us-east"));
    }

    #[test]
    fn apply_null_clears_optional() {
        let mut region = Some("us-east".to_string());
        assert!(doc(json!({"region": null})).apply("region", &mut region));
        assert_eq!(region, None);
    }

    #[test]
    fn apply_ignores_malformed_values() {
        let mut uses = 7u64;
        assert!(!doc(json!({"uses": "many"})).apply("uses", &mut uses));
        assert_eq!(uses, 7);
    }

    #[test]
    fn apply_with_maps_value() {
        let mut len = 0usize;
        assert!(doc(json!({"name": "abcd"})).apply_with("name", &mut len, |s: String| s.len()));
        assert_eq!(len, 4);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(matches!(
            PatchDocument::from_value(json!([1, 2])),
            Err(ModelError::NotAnObject("array"))
        ));
    }

    #[test]
    fn identity_reports_missing_key() {
        let err = doc(json!({"name": "x"})).identity::<String>("id").unwrap_err();
        assert!(matches!(err, ModelError::MissingIdentity("id")));
    }
}
