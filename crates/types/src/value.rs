//! Configuration object model
//!
//! A configuration object is a string-keyed mapping of heterogeneous values.
//! Values carry no identity beyond their structure, so equality is structural.

use crate::plugin::{PluginDescriptor, PLUGIN_KEY};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

/// A single value inside a configuration object
///
/// Only a mapping carrying the `$plugin` marker key is read as a plugin
/// descriptor; sequences are always sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Any non-integer number, including the non-finite YAML floats
    Float(f64),
    String(String),
    Plugin(PluginDescriptor),
    Sequence(Vec<ConfigValue>),
    Mapping(ConfigObject),
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Null => serializer.serialize_unit(),
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Integer(i) => serializer.serialize_i64(*i),
            ConfigValue::Float(f) => serializer.serialize_f64(*f),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::Plugin(p) => p.serialize(serializer),
            ConfigValue::Sequence(seq) => serializer.collect_seq(seq),
            ConfigValue::Mapping(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ConfigValueVisitor)
    }
}

struct ConfigValueVisitor;

impl<'de> Visitor<'de> for ConfigValueVisitor {
    type Value = ConfigValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration value")
    }

    fn visit_unit<E>(self) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Null)
    }

    fn visit_none<E>(self) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<ConfigValue, D::Error> {
        ConfigValue::deserialize(deserializer)
    }

    fn visit_bool<E>(self, v: bool) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Integer(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<ConfigValue, E> {
        // Integers beyond i64 keep their magnitude as a float
        Ok(i64::try_from(v).map_or(ConfigValue::Float(v as f64), ConfigValue::Integer))
    }

    fn visit_f64<E>(self, v: f64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ConfigValue, A::Error> {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element()? {
            values.push(value);
        }
        Ok(ConfigValue::Sequence(values))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ConfigValue, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, ConfigValue>()? {
            entries.insert(key, value);
        }
        let object = ConfigObject(entries);

        if object.contains_key(PLUGIN_KEY) {
            PluginDescriptor::from_mapping(object)
                .map(ConfigValue::Plugin)
                .map_err(de::Error::custom)
        } else {
            Ok(ConfigValue::Mapping(object))
        }
    }
}

/// Coarse classification of a value, used for logging and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Plugin,
    Sequence,
    Mapping,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Plugin => "plugin",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

impl ConfigValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Null => ValueKind::Null,
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Integer(_) | ConfigValue::Float(_) => ValueKind::Number,
            ConfigValue::String(_) => ValueKind::String,
            ConfigValue::Plugin(_) => ValueKind::Plugin,
            ConfigValue::Sequence(_) => ValueKind::Sequence,
            ConfigValue::Mapping(_) => ValueKind::Mapping,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&ConfigObject> {
        match self {
            ConfigValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_plugin(&self) -> Option<&PluginDescriptor> {
        match self {
            ConfigValue::Plugin(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<PluginDescriptor> for ConfigValue {
    fn from(value: PluginDescriptor) -> Self {
        ConfigValue::Plugin(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        ConfigValue::Sequence(value)
    }
}

impl From<ConfigObject> for ConfigValue {
    fn from(value: ConfigObject) -> Self {
        ConfigValue::Mapping(value)
    }
}

/// String-keyed mapping of configuration values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigObject(BTreeMap<String, ConfigValue>);

impl ConfigObject {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Option<ConfigValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    /// Look up a value by dotted path, descending through nested mappings
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, ConfigValue> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ConfigValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, ConfigValue>> for ConfigObject {
    fn from(map: BTreeMap<String, ConfigValue>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigObject {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ConfigObject {
    type Item = (String, ConfigValue);
    type IntoIter = btree_map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConfigObject {
    type Item = (&'a String, &'a ConfigValue);
    type IntoIter = btree_map::Iter<'a, String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_heterogeneous_values() {
        let yaml = r#"
devtool: "source-map"
bail: false
parallelism: 4
cache: ~
output:
  filename: "[name].[hash].js"
entry:
  - "./src/index.js"
"#;
        let object: ConfigObject = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(object.get("devtool").and_then(|v| v.as_str()), Some("source-map"));
        assert_eq!(object.get("bail").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(object.get("parallelism").map(|v| v.kind()), Some(ValueKind::Number));
        assert!(object.get("cache").unwrap().is_null());
        assert_eq!(
            object.get_path("output.filename").and_then(|v| v.as_str()),
            Some("[name].[hash].js")
        );
        assert_eq!(object.get("entry").and_then(|v| v.as_sequence()).map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_marked_mapping_is_plugin() {
        let yaml = r#"
plugins:
  - $plugin: "LoaderOptionsPlugin"
    options:
      debug: true
  - $plugin: "HotModuleReplacementPlugin"
"#;
        let object: ConfigObject = serde_yaml::from_str(yaml).unwrap();
        let plugins = object.get("plugins").and_then(|v| v.as_sequence()).unwrap();

        let first = plugins[0].as_plugin().unwrap();
        assert_eq!(first.name, "LoaderOptionsPlugin");
        assert_eq!(first.options.get("debug").and_then(|v| v.as_bool()), Some(true));
        assert!(plugins[1].as_plugin().unwrap().options.is_empty());
    }

    #[test]
    fn test_single_string_sequence_stays_sequence() {
        let object: ConfigObject = serde_yaml::from_str("entry: [\"a.js\"]\nuse: [\"babel-loader\", {loader: \"css-loader\"}]\n").unwrap();

        assert_eq!(object.get("entry").map(|v| v.kind()), Some(ValueKind::Sequence));
        assert_eq!(object.get("use").and_then(|v| v.as_sequence()).map(|s| s.len()), Some(2));

        let json = serde_json::to_string(&object).unwrap();
        assert_eq!(json, r#"{"entry":["a.js"],"use":["babel-loader",{"loader":"css-loader"}]}"#);
    }

    #[test]
    fn test_plain_plugin_key_is_ordinary_mapping() {
        let object: ConfigObject =
            serde_yaml::from_str("alias:\n  plugin: \"./src/plugin.js\"\n").unwrap();
        let alias = object.get("alias").and_then(|v| v.as_mapping()).unwrap();
        assert_eq!(alias.get("plugin").and_then(|v| v.as_str()), Some("./src/plugin.js"));
    }

    #[test]
    fn test_malformed_plugin_is_rejected() {
        let result = serde_yaml::from_str::<ConfigObject>("p:\n  $plugin: \"A\"\n  extra: 1\n");
        assert!(result.is_err());

        let result = serde_yaml::from_str::<ConfigObject>("p:\n  $plugin: 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_non_finite_floats() {
        let object: ConfigObject =
            serde_yaml::from_str("maxAssetSize: .inf\nratio: .nan\nhints: 0.5\nbig: 18446744073709551615\n").unwrap();

        assert_eq!(object.get("maxAssetSize"), Some(&ConfigValue::Float(f64::INFINITY)));
        assert!(matches!(object.get("ratio"), Some(ConfigValue::Float(f)) if f.is_nan()));
        assert_eq!(object.get("hints"), Some(&ConfigValue::Float(0.5)));
        assert_eq!(object.get("big"), Some(&ConfigValue::Float(u64::MAX as f64)));
    }

    #[test]
    fn test_get_path_through_non_mapping() {
        let object = ConfigObject::new().with("devtool", "eval");
        assert!(object.get_path("devtool.inner").is_none());
        assert!(object.get_path("missing").is_none());
    }

    #[test]
    fn test_json_serialization() {
        let object = ConfigObject::new()
            .with("devtool", "source-map")
            .with("output", ConfigObject::new().with("filename", "[name].js"));

        let json = serde_json::to_string(&object).unwrap();
        assert_eq!(json, r#"{"devtool":"source-map","output":{"filename":"[name].js"}}"#);
    }
}
