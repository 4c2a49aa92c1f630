//! Model defaults
//!
//! A descriptor may override a closed set of global defaults. Keys are
//! matched case-insensitively and checked once, when the default is built;
//! everything downstream works with [`DefaultKey`] and never compares raw
//! strings.
//!
//! | key | built-in value |
//! |---|---|
//! | `package` | `model` |
//! | `java.util.List` | `new java.util.ArrayList<?>()` |
//! | `java.util.Set` | `new java.util.HashSet<?>()` |
//! | `java.util.Map` | `new java.util.HashMap()` |
//! | `java.util.Properties` | `new java.util.Properties()` |
//! | `strictXmlAttributes` | `true` |
//! | `checkDeprecation` | `false` |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::CollectionKind;
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::{ModelError, Result};

/// One of the recognized default keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DefaultKey {
    Package,
    List,
    Set,
    Map,
    Properties,
    StrictXmlAttributes,
    CheckDeprecation,
}

impl DefaultKey {
    pub const ALL: [DefaultKey; 7] = [
        DefaultKey::Package,
        DefaultKey::List,
        DefaultKey::Set,
        DefaultKey::Map,
        DefaultKey::Properties,
        DefaultKey::StrictXmlAttributes,
        DefaultKey::CheckDeprecation,
    ];

    /// Canonical spelling of the key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::List => "java.util.List",
            Self::Set => "java.util.Set",
            Self::Map => "java.util.Map",
            Self::Properties => "java.util.Properties",
            Self::StrictXmlAttributes => "strictXmlAttributes",
            Self::CheckDeprecation => "checkDeprecation",
        }
    }

    /// Value used when the descriptor supplies no override
    pub fn builtin_value(&self) -> &'static str {
        match self {
            Self::Package => "model",
            Self::List => "new java.util.ArrayList<?>()",
            Self::Set => "new java.util.HashSet<?>()",
            Self::Map => "new java.util.HashMap()",
            Self::Properties => "new java.util.Properties()",
            Self::StrictXmlAttributes => "true",
            Self::CheckDeprecation => "false",
        }
    }

    /// Case-insensitive lookup; anything outside the closed set is rejected
    pub fn parse(key: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| ModelError::InvalidKey { key: key.to_string() })
    }

    /// Key holding the initializer for a collection kind
    pub fn for_collection(kind: CollectionKind) -> Self {
        match kind {
            CollectionKind::List => Self::List,
            CollectionKind::Set => Self::Set,
            CollectionKind::Map => Self::Map,
            CollectionKind::Properties => Self::Properties,
        }
    }
}

impl fmt::Display for DefaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DefaultKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DefaultKey {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DefaultKey> for String {
    fn from(value: DefaultKey) -> Self {
        value.as_str().to_string()
    }
}

/// A single `key = value` default element, as written in a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefault {
    pub key: String,
    pub value: String,
}

impl ModelDefault {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The built-in default for `key`.
    ///
    /// The key keeps the caller's spelling; the value is the built-in.
    pub fn get_default(key: &str) -> Result<Self> {
        let parsed = DefaultKey::parse(key)?;
        Ok(Self::new(key, parsed.builtin_value()))
    }

    /// Check a user-supplied element: key and value must be non-blank and
    /// the key recognized.
    pub fn validate_element(&self) -> Result<DefaultKey> {
        let entity = format!("defaults.{}", self.key);
        let mut diagnostics = Diagnostics::new();

        if self.key.trim().is_empty() {
            diagnostics.report(
                "defaults",
                DiagnosticCode::InvalidDefault,
                "You must define the key of default element.",
            );
        }
        if self.value.trim().is_empty() {
            diagnostics.report(
                entity.clone(),
                DiagnosticCode::InvalidDefault,
                "You must define the value of default element.",
            );
        }
        if !diagnostics.is_empty() {
            return Err(ModelError::Validation(diagnostics));
        }

        DefaultKey::parse(&self.key).map_err(|e| {
            diagnostics.report(entity, DiagnosticCode::InvalidDefault, e.to_string());
            ModelError::Validation(diagnostics)
        })
    }

    /// `true` only for the literal "true" in any case. Every other value,
    /// malformed ones included, reads as `false`.
    pub fn as_boolean(&self) -> bool {
        parse_flag(&self.value)
    }
}

/// Permissive boolean reading shared by defaults and generation options
pub(crate) fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Validated default overrides for one model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ModelDefault>", into = "Vec<ModelDefault>")]
pub struct ModelDefaults {
    overrides: BTreeMap<DefaultKey, String>,
}

impl ModelDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from descriptor elements, validating each one.
    ///
    /// Later duplicates replace earlier ones.
    pub fn from_elements(elements: impl IntoIterator<Item = ModelDefault>) -> Result<Self> {
        let mut overrides = BTreeMap::new();
        let mut diagnostics = Diagnostics::new();

        for element in elements {
            match element.validate_element() {
                Ok(key) => {
                    if let Some(previous) = overrides.insert(key, element.value.clone()) {
                        warn!(key = %key, previous = %previous, "duplicate default element, last one wins");
                    }
                }
                Err(ModelError::Validation(items)) => diagnostics.merge(items),
                Err(other) => return Err(other),
            }
        }

        if !diagnostics.is_empty() {
            return Err(ModelError::Validation(diagnostics));
        }
        Ok(Self { overrides })
    }

    /// Override `key` with `value`
    pub fn with(mut self, key: DefaultKey, value: impl Into<String>) -> Self {
        self.overrides.insert(key, value.into());
        self
    }

    /// Effective value: the override if present, else the built-in
    pub fn get(&self, key: DefaultKey) -> &str {
        self.overrides
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.builtin_value())
    }

    pub fn is_overridden(&self, key: DefaultKey) -> bool {
        self.overrides.contains_key(&key)
    }

    pub fn package(&self) -> &str {
        self.get(DefaultKey::Package)
    }

    pub fn check_deprecation(&self) -> bool {
        parse_flag(self.get(DefaultKey::CheckDeprecation))
    }

    pub fn strict_xml_attributes(&self) -> bool {
        parse_flag(self.get(DefaultKey::StrictXmlAttributes))
    }

    /// Initializer expression for a collection kind
    pub fn collection_initializer(&self, kind: CollectionKind) -> &str {
        self.get(DefaultKey::for_collection(kind))
    }

    /// Every key with its effective value, in key order
    pub fn effective(&self) -> Vec<(DefaultKey, &str)> {
        DefaultKey::ALL.iter().map(|k| (*k, self.get(*k))).collect()
    }
}

impl TryFrom<Vec<ModelDefault>> for ModelDefaults {
    type Error = ModelError;

    fn try_from(value: Vec<ModelDefault>) -> Result<Self> {
        Self::from_elements(value)
    }
}

impl From<ModelDefaults> for Vec<ModelDefault> {
    fn from(value: ModelDefaults) -> Self {
        value
            .overrides
            .into_iter()
            .map(|(k, v)| ModelDefault::new(k.as_str(), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_for_every_key_is_stable() {
        for key in DefaultKey::ALL {
            let first = ModelDefault::get_default(key.as_str()).unwrap();
            let second = ModelDefault::get_default(key.as_str()).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.value, key.builtin_value());
        }
    }

    #[test]
    fn test_get_default_builtin_values() {
        assert_eq!(ModelDefault::get_default("package").unwrap().value, "model");
        assert_eq!(
            ModelDefault::get_default("java.util.List").unwrap().value,
            "new java.util.ArrayList<?>()"
        );
        assert_eq!(
            ModelDefault::get_default("java.util.Map").unwrap().value,
            "new java.util.HashMap()"
        );
        assert_eq!(ModelDefault::get_default("strictXmlAttributes").unwrap().value, "true");
        assert_eq!(ModelDefault::get_default("checkDeprecation").unwrap().value, "false");
    }

    #[test]
    fn test_get_default_is_case_insensitive() {
        let d = ModelDefault::get_default("JAVA.UTIL.SET").unwrap();
        assert_eq!(d.key, "JAVA.UTIL.SET");
        assert_eq!(d.value, "new java.util.HashSet<?>()");
    }

    #[test]
    fn test_get_default_rejects_unknown_keys_in_any_case() {
        for key in ["bogus", "BOGUS", "Bogus", "java.util.Vector", ""] {
            match ModelDefault::get_default(key) {
                Err(ModelError::InvalidKey { key: k }) => assert_eq!(k, key),
                other => panic!("expected InvalidKey for {:?}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_validate_element_blank_key_or_value() {
        let cases = [
            ModelDefault::new("", "true"),
            ModelDefault::new("   ", "true"),
            ModelDefault::new("checkDeprecation", ""),
            ModelDefault::new("checkDeprecation", "  "),
            ModelDefault::new("", ""),
            ModelDefault::new("bogus", ""),
        ];
        for case in cases {
            assert!(
                matches!(case.validate_element(), Err(ModelError::Validation(_))),
                "{:?} should fail",
                case
            );
        }
    }

    #[test]
    fn test_validate_element_unknown_key() {
        let err = ModelDefault::new("bogus", "x").validate_element().unwrap_err();
        let diags = err.diagnostics().unwrap();
        assert_eq!(diags.with_code(DiagnosticCode::InvalidDefault).count(), 1);
    }

    #[test]
    fn test_validate_element_accepts_known_key() {
        let key = ModelDefault::new("CheckDeprecation", "true").validate_element().unwrap();
        assert_eq!(key, DefaultKey::CheckDeprecation);
    }

    #[test]
    fn test_as_boolean_is_permissive() {
        for truthy in ["true", "TRUE", "True", "tRuE"] {
            assert!(ModelDefault::new("checkDeprecation", truthy).as_boolean());
        }
        for falsy in ["false", "yes", "1", "on", " true", "true ", "truee", "garbage"] {
            assert!(!ModelDefault::new("checkDeprecation", falsy).as_boolean(), "{:?}", falsy);
        }
    }

    #[test]
    fn test_defaults_override_and_fallback() {
        let defaults = ModelDefaults::from_elements([
            ModelDefault::new("java.util.list", "new java.util.LinkedList<?>()"),
            ModelDefault::new("checkDeprecation", "TRUE"),
        ])
        .unwrap();

        assert_eq!(
            defaults.collection_initializer(CollectionKind::List),
            "new java.util.LinkedList<?>()"
        );
        assert!(defaults.is_overridden(DefaultKey::List));
        assert_eq!(
            defaults.collection_initializer(CollectionKind::Set),
            "new java.util.HashSet<?>()"
        );
        assert!(defaults.check_deprecation());
        assert!(defaults.strict_xml_attributes());
        assert_eq!(defaults.package(), "model");
    }

    #[test]
    fn test_defaults_collect_every_bad_element() {
        let err = ModelDefaults::from_elements([
            ModelDefault::new("bogus", "x"),
            ModelDefault::new("package", ""),
            ModelDefault::new("package", "org.example"),
        ])
        .unwrap_err();
        assert_eq!(err.diagnostics().unwrap().len(), 2);
    }

    #[test]
    fn test_defaults_last_duplicate_wins() {
        let defaults = ModelDefaults::from_elements([
            ModelDefault::new("package", "first"),
            ModelDefault::new("PACKAGE", "second"),
        ])
        .unwrap();
        assert_eq!(defaults.package(), "second");
    }

    #[test]
    fn test_defaults_deserialize_rejects_unknown_key() {
        let result: std::result::Result<ModelDefaults, _> =
            serde_json::from_str(r#"[{"key": "bogus", "value": "x"}]"#);
        assert!(result.is_err());
    }
}
