//! Merge strategy types

use crate::error::ComposerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How two sequences at the same path are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayStrategy {
    /// Base entries followed by override entries
    #[default]
    Append,
    /// Override entries followed by base entries
    Prepend,
    /// Override entries only
    Replace,
    /// Base plugins redefined by the override are dropped, then override entries are appended
    UniquePlugins,
    /// Loader rules sharing `test`, `include` and `exclude` are merged into one rule
    Smart,
}

impl ArrayStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrayStrategy::Append => "append",
            ArrayStrategy::Prepend => "prepend",
            ArrayStrategy::Replace => "replace",
            ArrayStrategy::UniquePlugins => "unique_plugins",
            ArrayStrategy::Smart => "smart",
        }
    }
}

impl fmt::Display for ArrayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrayStrategy {
    type Err = ComposerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "append" => Ok(ArrayStrategy::Append),
            "prepend" => Ok(ArrayStrategy::Prepend),
            "replace" => Ok(ArrayStrategy::Replace),
            "unique_plugins" | "unique-plugins" => Ok(ArrayStrategy::UniquePlugins),
            "smart" => Ok(ArrayStrategy::Smart),
            other => Err(ComposerError::InvalidStrategy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strategy() {
        assert_eq!("append".parse::<ArrayStrategy>().unwrap(), ArrayStrategy::Append);
        assert_eq!("Replace".parse::<ArrayStrategy>().unwrap(), ArrayStrategy::Replace);
        assert_eq!(
            "unique-plugins".parse::<ArrayStrategy>().unwrap(),
            ArrayStrategy::UniquePlugins
        );
        assert_eq!("smart".parse::<ArrayStrategy>().unwrap(), ArrayStrategy::Smart);
        assert_eq!(ArrayStrategy::Smart.to_string(), "smart");
        assert!("merge".parse::<ArrayStrategy>().is_err());
    }

    #[test]
    fn test_default_is_append() {
        assert_eq!(ArrayStrategy::default(), ArrayStrategy::Append);
    }
}
