//! Deep merge engine

use crate::options::MergeOptions;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace};
use types::utils::{join_path, truncate_for_logging};
use types::{ArrayStrategy, ConfigObject, ConfigValue};

/// Keys that identify a loader rule; rules agreeing on all of them are merged
const RULE_MATCH_KEYS: [&str; 3] = ["test", "include", "exclude"];

/// Loader lists inside a rule, combined by loader name
const LOADER_LIST_KEYS: [&str; 2] = ["use", "loaders"];

/// Merge `overrides` into `base` with default options
///
/// Neither input is modified; the result is a new object.
pub fn merge(base: &ConfigObject, overrides: &ConfigObject) -> ConfigObject {
    ConfigComposer::new().merge(base, overrides)
}

/// Left fold of [`merge`] over any number of objects
pub fn merge_all<'a, I>(configs: I) -> ConfigObject
where
    I: IntoIterator<Item = &'a ConfigObject>,
{
    ConfigComposer::new().merge_all(configs)
}

/// Counters describing what a merge did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Fields whose base value was replaced by the override value
    pub replaced: usize,
    /// Nested mappings merged recursively
    pub merged: usize,
    /// Sequences combined by an array strategy
    pub combined: usize,
    /// Fields only present in the override
    pub added: usize,
    /// Fields only present in the base
    pub kept: usize,
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} replaced, {} merged, {} combined, {} added, {} kept",
            self.replaced, self.merged, self.combined, self.added, self.kept
        )
    }
}

/// Structural recursive merger for configuration objects
#[derive(Debug, Clone, Default)]
pub struct ConfigComposer {
    options: MergeOptions,
}

impl ConfigComposer {
    /// Create a composer that appends every sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a composer with per-path array strategies
    pub fn with_options(options: MergeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge `overrides` into `base`
    pub fn merge(&self, base: &ConfigObject, overrides: &ConfigObject) -> ConfigObject {
        self.merge_with_summary(base, overrides).0
    }

    /// Merge `overrides` into `base`, also returning what changed
    pub fn merge_with_summary(
        &self,
        base: &ConfigObject,
        overrides: &ConfigObject,
    ) -> (ConfigObject, MergeSummary) {
        let mut summary = MergeSummary::default();
        let merged = self.merge_objects("", base, overrides, &mut summary);
        debug!(%summary, "Merged configuration objects");
        (merged, summary)
    }

    /// Fold every object into the first, left to right
    pub fn merge_all<'a, I>(&self, configs: I) -> ConfigObject
    where
        I: IntoIterator<Item = &'a ConfigObject>,
    {
        configs
            .into_iter()
            .fold(ConfigObject::new(), |acc, next| self.merge(&acc, next))
    }

    fn merge_objects(
        &self,
        path: &str,
        base: &ConfigObject,
        overrides: &ConfigObject,
        summary: &mut MergeSummary,
    ) -> ConfigObject {
        let mut merged = base.clone();

        summary.kept += base.keys().filter(|key| !overrides.contains_key(key)).count();

        for (key, override_value) in overrides {
            let field_path = join_path(path, key);
            let value = match base.get(key) {
                Some(base_value) => self.merge_values(&field_path, base_value, override_value, summary),
                None => {
                    summary.added += 1;
                    trace!(path = %field_path, kind = %override_value.kind(), "Adding field");
                    override_value.clone()
                }
            };
            merged.insert(key.clone(), value);
        }

        merged
    }

    fn merge_values(
        &self,
        path: &str,
        base: &ConfigValue,
        overrides: &ConfigValue,
        summary: &mut MergeSummary,
    ) -> ConfigValue {
        match (base, overrides) {
            (ConfigValue::Mapping(base_map), ConfigValue::Mapping(override_map)) => {
                summary.merged += 1;
                ConfigValue::Mapping(self.merge_objects(path, base_map, override_map, summary))
            }
            (ConfigValue::Sequence(base_seq), ConfigValue::Sequence(override_seq)) => {
                summary.combined += 1;
                ConfigValue::Sequence(self.merge_sequences(path, base_seq, override_seq, summary))
            }
            (_, value) => {
                summary.replaced += 1;
                if let ConfigValue::String(s) = value {
                    trace!(path, from = %base.kind(), to = %truncate_for_logging(s, 40), "Replacing field");
                } else {
                    trace!(path, from = %base.kind(), to = %value.kind(), "Replacing field");
                }
                value.clone()
            }
        }
    }

    fn merge_sequences(
        &self,
        path: &str,
        base: &[ConfigValue],
        overrides: &[ConfigValue],
        summary: &mut MergeSummary,
    ) -> Vec<ConfigValue> {
        let strategy = self.options.strategy_for(path);
        trace!(
            path,
            %strategy,
            base_len = base.len(),
            override_len = overrides.len(),
            "Combining sequences"
        );

        match strategy {
            ArrayStrategy::Append => base.iter().chain(overrides).cloned().collect(),
            ArrayStrategy::Prepend => overrides.iter().chain(base).cloned().collect(),
            ArrayStrategy::Replace => overrides.to_vec(),
            ArrayStrategy::UniquePlugins => {
                let redefined: HashSet<&str> = overrides
                    .iter()
                    .filter_map(ConfigValue::as_plugin)
                    .map(|plugin| plugin.name.as_str())
                    .collect();

                base.iter()
                    .filter(|value| {
                        value
                            .as_plugin()
                            .map_or(true, |plugin| !redefined.contains(plugin.name.as_str()))
                    })
                    .chain(overrides)
                    .cloned()
                    .collect()
            }
            ArrayStrategy::Smart => self.merge_rule_lists(path, base, overrides, summary),
        }
    }

    /// Override rules matching a base rule are merged into it; the rest are appended
    fn merge_rule_lists(
        &self,
        path: &str,
        base: &[ConfigValue],
        overrides: &[ConfigValue],
        summary: &mut MergeSummary,
    ) -> Vec<ConfigValue> {
        let mut merged = base.to_vec();

        for rule in overrides {
            let matched = rule_identity(rule)
                .and_then(|identity| merged.iter().position(|existing| rule_identity(existing) == Some(identity)));

            match (matched, rule) {
                (Some(index), ConfigValue::Mapping(override_rule)) => {
                    if let ConfigValue::Mapping(base_rule) = &merged[index] {
                        summary.merged += 1;
                        trace!(path, index, "Merging matching rule");
                        let next = self.merge_rule(path, base_rule, override_rule, summary);
                        merged[index] = ConfigValue::Mapping(next);
                    }
                }
                _ => merged.push(rule.clone()),
            }
        }

        merged
    }

    fn merge_rule(
        &self,
        path: &str,
        base: &ConfigObject,
        overrides: &ConfigObject,
        summary: &mut MergeSummary,
    ) -> ConfigObject {
        let mut merged = base.clone();

        summary.kept += base.keys().filter(|key| !overrides.contains_key(key)).count();

        for (key, override_value) in overrides {
            let field_path = join_path(path, key);
            let value = match (base.get(key), override_value) {
                (Some(ConfigValue::Sequence(base_loaders)), ConfigValue::Sequence(override_loaders))
                    if LOADER_LIST_KEYS.contains(&key.as_str()) =>
                {
                    summary.combined += 1;
                    ConfigValue::Sequence(merge_loaders(base_loaders, override_loaders))
                }
                (Some(base_value), _) => self.merge_values(&field_path, base_value, override_value, summary),
                (None, _) => {
                    summary.added += 1;
                    override_value.clone()
                }
            };
            merged.insert(key.clone(), value);
        }

        merged
    }
}

/// `test`, `include` and `exclude` of a rule; rules without `test` never match
fn rule_identity(rule: &ConfigValue) -> Option<[Option<&ConfigValue>; 3]> {
    let rule = rule.as_mapping()?;
    rule.get(RULE_MATCH_KEYS[0])?;
    Some(RULE_MATCH_KEYS.map(|key| rule.get(key)))
}

/// Loader name of a `use` entry, ignoring any `?query` suffix
fn loader_name(entry: &ConfigValue) -> Option<&str> {
    let name = match entry {
        ConfigValue::String(name) => name.as_str(),
        ConfigValue::Mapping(loader) => loader.get("loader")?.as_str()?,
        _ => return None,
    };
    name.split('?').next()
}

/// Loaders run last to first, so new override loaders go in front of the base
/// ones. An override loader already in the base list replaces it in place.
fn merge_loaders(base: &[ConfigValue], overrides: &[ConfigValue]) -> Vec<ConfigValue> {
    let mut merged = base.to_vec();
    let mut prepended = Vec::new();

    for loader in overrides {
        let existing = loader_name(loader)
            .and_then(|name| merged.iter().position(|entry| loader_name(entry) == Some(name)));
        match existing {
            Some(index) => merged[index] = loader.clone(),
            None => prepended.push(loader.clone()),
        }
    }

    prepended.extend(merged);
    prepended
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::PluginDescriptor;

    fn parse(yaml: &str) -> ConfigObject {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn plugin_names(object: &ConfigObject, path: &str) -> Vec<String> {
        object
            .get_path(path)
            .and_then(|v| v.as_sequence())
            .unwrap()
            .iter()
            .map(|v| v.as_plugin().unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_output_filename_and_plugins() {
        let base = parse(
            r#"
output:
  filename: "[name].[hash].js"
plugins:
  - $plugin: "PluginA"
"#,
        );
        let overrides = parse(
            r#"
output:
  filename: "[name].js"
plugins:
  - $plugin: "PluginB"
"#,
        );

        let merged = merge(&base, &overrides);
        let expected = ConfigObject::new()
            .with("output", ConfigObject::new().with("filename", "[name].js"))
            .with(
                "plugins",
                vec![
                    ConfigValue::from(PluginDescriptor::new("PluginA")),
                    ConfigValue::from(PluginDescriptor::new("PluginB")),
                ],
            );
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_base_is_not_modified() {
        let base = parse(
            r#"
devtool: "eval"
output:
  path: "/dist"
  filename: "[name].[hash].js"
plugins:
  - $plugin: "PluginA"
"#,
        );
        let snapshot = base.clone();
        let overrides = parse(
            r#"
devtool: "source-map"
output:
  filename: "[name].js"
plugins:
  - $plugin: "PluginB"
"#,
        );

        let _ = merge(&base, &overrides);
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_scalar_override_wins() {
        let base = parse("devtool: \"eval\"\nmode: \"production\"\n");
        let overrides = parse("devtool: \"source-map\"\n");

        let merged = merge(&base, &overrides);
        assert_eq!(merged.get("devtool").and_then(|v| v.as_str()), Some("source-map"));
        assert_eq!(merged.get("mode").and_then(|v| v.as_str()), Some("production"));
    }

    #[test]
    fn test_sequence_concatenation_length() {
        let base = parse("entry: [\"a.js\", \"b.js\"]\n");
        let overrides = parse("entry: [\"c.js\"]\n");

        let merged = merge(&base, &overrides);
        let entry: Vec<&str> = merged
            .get("entry")
            .and_then(|v| v.as_sequence())
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(entry, vec!["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_empty_override_is_identity() {
        let base = parse(
            r#"
output:
  filename: "[name].[hash].js"
plugins:
  - $plugin: "PluginA"
"#,
        );

        let (merged, summary) = ConfigComposer::new().merge_with_summary(&base, &ConfigObject::new());
        assert_eq!(merged, base);
        assert_eq!(summary.kept, 2);
        assert_eq!(summary.replaced, 0);
    }

    #[test]
    fn test_nested_mappings_merge_recursively() {
        let base = parse(
            r#"
resolve:
  alias:
    vendor: "./vendor"
  extensions: [".js"]
"#,
        );
        let overrides = parse(
            r#"
resolve:
  alias:
    common: "./common"
  extensions: [".jsx"]
"#,
        );

        let merged = merge(&base, &overrides);
        assert_eq!(
            merged.get_path("resolve.alias.vendor").and_then(|v| v.as_str()),
            Some("./vendor")
        );
        assert_eq!(
            merged.get_path("resolve.alias.common").and_then(|v| v.as_str()),
            Some("./common")
        );
        assert_eq!(
            merged.get_path("resolve.extensions").and_then(|v| v.as_sequence()).map(|s| s.len()),
            Some(2)
        );
    }

    #[test]
    fn test_kind_mismatch_override_replaces() {
        let base = parse("devtool:\n  kind: \"eval\"\nexternals: [\"jquery\"]\n");
        let overrides = parse("devtool: \"source-map\"\nexternals: \"jquery\"\n");

        let (merged, summary) = ConfigComposer::new().merge_with_summary(&base, &overrides);
        assert_eq!(merged.get("devtool").and_then(|v| v.as_str()), Some("source-map"));
        assert_eq!(merged.get("externals").and_then(|v| v.as_str()), Some("jquery"));
        assert_eq!(summary.replaced, 2);
    }

    #[test]
    fn test_plugins_are_atomic() {
        let base = parse(
            r#"
optimization:
  minimizer:
    $plugin: "TerserPlugin"
    options:
      parallel: true
      sourceMap: false
"#,
        );
        let overrides = parse(
            r#"
optimization:
  minimizer:
    $plugin: "TerserPlugin"
    options:
      sourceMap: true
"#,
        );

        let merged = merge(&base, &overrides);
        let plugin = merged.get_path("optimization.minimizer").and_then(|v| v.as_plugin()).unwrap();
        assert_eq!(plugin.options.len(), 1);
        assert_eq!(plugin.options.get("sourceMap").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_null_override_replaces() {
        let base = parse("devtool: \"eval\"\n");
        let overrides = parse("devtool: ~\n");

        let merged = merge(&base, &overrides);
        assert!(merged.get("devtool").unwrap().is_null());
    }

    #[test]
    fn test_array_strategies() {
        let base = parse(
            r#"
plugins:
  - $plugin: "DefinePlugin"
    options:
      DEBUG: "false"
  - $plugin: "ProvidePlugin"
entry: ["base.js"]
module:
  rules: ["base-rule"]
"#,
        );
        let overrides = parse(
            r#"
plugins:
  - $plugin: "DefinePlugin"
    options:
      DEBUG: "true"
entry: ["dev.js"]
module:
  rules: ["dev-rule"]
"#,
        );

        let options = MergeOptions::new()
            .with_rule("plugins", ArrayStrategy::UniquePlugins)
            .with_rule("entry", ArrayStrategy::Replace)
            .with_rule("module.rules", ArrayStrategy::Prepend);
        let merged = ConfigComposer::with_options(options).merge(&base, &overrides);

        assert_eq!(plugin_names(&merged, "plugins"), vec!["ProvidePlugin", "DefinePlugin"]);
        let define = merged.get("plugins").and_then(|v| v.as_sequence()).unwrap()[1]
            .as_plugin()
            .unwrap();
        assert_eq!(define.options.get("DEBUG").and_then(|v| v.as_str()), Some("true"));

        assert_eq!(merged.get("entry"), Some(&ConfigValue::from(vec![ConfigValue::from("dev.js")])));

        let rules: Vec<&str> = merged
            .get_path("module.rules")
            .and_then(|v| v.as_sequence())
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(rules, vec!["dev-rule", "base-rule"]);
    }

    #[test]
    fn test_merge_all_folds_left() {
        let common = parse("devtool: \"eval\"\nplugins:\n  - $plugin: \"A\"\n");
        let dev = parse("devtool: \"source-map\"\nplugins:\n  - $plugin: \"B\"\n");
        let local = parse("plugins:\n  - $plugin: \"C\"\n");

        let merged = merge_all([&common, &dev, &local]);
        assert_eq!(merged.get("devtool").and_then(|v| v.as_str()), Some("source-map"));
        assert_eq!(plugin_names(&merged, "plugins"), vec!["A", "B", "C"]);

        assert!(merge_all(std::iter::empty::<&ConfigObject>()).is_empty());
    }

    #[test]
    fn test_single_entry_sequences_concatenate() {
        let base = parse("entry: [\"a.js\"]\n");
        let overrides = parse("entry: [\"b.js\"]\n");

        let merged = merge(&base, &overrides);
        assert_eq!(
            merged.get("entry"),
            Some(&ConfigValue::from(vec![ConfigValue::from("a.js"), ConfigValue::from("b.js")]))
        );
    }

    #[test]
    fn test_plugin_named_key_merges_recursively() {
        let base = parse("resolve:\n  alias:\n    plugin: \"./src/plugin.js\"\n");
        let overrides = parse("resolve:\n  alias:\n    vendor: \"./vendor\"\n");

        let merged = merge(&base, &overrides);
        assert_eq!(
            merged.get_path("resolve.alias.plugin").and_then(|v| v.as_str()),
            Some("./src/plugin.js")
        );
        assert_eq!(merged.get_path("resolve.alias.vendor").and_then(|v| v.as_str()), Some("./vendor"));
    }

    #[test]
    fn test_smart_rules_merge_by_test() {
        let base = parse(
            r#"
module:
  rules:
    - test: "\\.js$"
      exclude: "node_modules"
      use: ["babel-loader"]
    - test: "\\.css$"
      use: ["style-loader", "css-loader"]
"#,
        );
        let overrides = parse(
            r#"
module:
  rules:
    - test: "\\.js$"
      exclude: "node_modules"
      use:
        - loader: "babel-loader"
          options:
            cacheDirectory: true
        - "eslint-loader"
    - test: "\\.js$"
      include: "src"
      use: ["coffee-loader"]
    - test: "\\.svg$"
      use: ["file-loader"]
"#,
        );

        let options = MergeOptions::new().with_rule("module.rules", ArrayStrategy::Smart);
        let merged = ConfigComposer::with_options(options).merge(&base, &overrides);
        let rules = merged.get_path("module.rules").and_then(|v| v.as_sequence()).unwrap();

        // The second `\.js$` rule has a different `include`, so it is a new rule
        assert_eq!(rules.len(), 4);

        let js = rules[0].as_mapping().unwrap();
        assert_eq!(js.get("exclude").and_then(|v| v.as_str()), Some("node_modules"));
        let loaders = js.get("use").and_then(|v| v.as_sequence()).unwrap();
        assert_eq!(loaders.len(), 2);
        assert_eq!(loaders[0].as_str(), Some("eslint-loader"));
        assert_eq!(
            loaders[1].as_mapping().and_then(|l| l.get_path("options.cacheDirectory")),
            Some(&ConfigValue::Bool(true))
        );

        assert_eq!(rules[1].as_mapping().and_then(|r| r.get("test")).and_then(|v| v.as_str()), Some("\\.css$"));
        assert_eq!(rules[2].as_mapping().and_then(|r| r.get("include")).and_then(|v| v.as_str()), Some("src"));
        assert_eq!(rules[3].as_mapping().and_then(|r| r.get("test")).and_then(|v| v.as_str()), Some("\\.svg$"));
    }

    #[test]
    fn test_smart_without_rule_mappings_appends() {
        let base = parse("module:\n  rules: [\"a\"]\n");
        let overrides = parse("module:\n  rules: [\"a\", {use: [\"x\"]}]\n");

        let options = MergeOptions::new().with_rule("module.rules", ArrayStrategy::Smart);
        let merged = ConfigComposer::with_options(options).merge(&base, &overrides);
        assert_eq!(merged.get_path("module.rules").and_then(|v| v.as_sequence()).map(|s| s.len()), Some(3));
    }

    #[test]
    fn test_summary_counts() {
        let base = parse("a: 1\nb:\n  c: 2\nd: [1]\ne: \"kept\"\n");
        let overrides = parse("a: 2\nb:\n  c: 3\nd: [2]\nf: \"new\"\n");

        let (_, summary) = ConfigComposer::new().merge_with_summary(&base, &overrides);
        assert_eq!(
            summary,
            MergeSummary {
                replaced: 2,
                merged: 1,
                combined: 1,
                added: 1,
                kept: 1,
            }
        );
    }
}
