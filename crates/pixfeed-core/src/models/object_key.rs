use crate::error::RelayError;
use crate::validation::validate_object_key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied identifier of a stored object.
///
/// Always valid once constructed: `parse` is the only way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn parse(key: impl Into<String>) -> Result<Self, RelayError> {
        let key = key.into();
        validate_object_key(&key).map_err(RelayError::InvalidKey)?;
        Ok(ObjectKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectKey::parse(value)
    }
}

impl From<ObjectKey> for String {
    fn from(key: ObjectKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            ObjectKey::parse(""),
            Err(RelayError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_parse_accepts_nested_key() {
        let key = ObjectKey::parse("raw/42.jpg").unwrap();
        assert_eq!(key.as_str(), "raw/42.jpg");
        assert_eq!(key.to_string(), "raw/42.jpg");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ObjectKey = serde_json::from_str("\"raw/42.jpg\"").unwrap();
        assert_eq!(ok.as_str(), "raw/42.jpg");
        assert!(serde_json::from_str::<ObjectKey>("\"../escape\"").is_err());
        assert!(serde_json::from_str::<ObjectKey>("\"\"").is_err());
    }
}
