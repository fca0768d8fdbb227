//! Configuration validation utilities

use crate::document::DocumentFormat;
use crate::schema::{ArrayRuleConfig, Config};
use composer::{BuildMode, Preset, SMART_RULE_PATHS};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use types::{ArrayStrategy, Result};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &Config) -> Result<ValidationReport> {
        let mut report = ValidationReport::new();

        Self::validate_build(config, &mut report);
        Self::validate_merge(config, &mut report);
        Self::validate_logging(config, &mut report);

        Ok(report)
    }

    fn validate_build(config: &Config, report: &mut ValidationReport) {
        let build = &config.build;

        match build.base_path {
            Some(ref base_path) if base_path.trim().is_empty() => {
                report.add_error("build.base_path", "Base path cannot be empty");
            }
            Some(ref base_path) if !Path::new(base_path).exists() => {
                report.add_error("build.base_path", &format!("Base document does not exist: {}", base_path));
            }
            Some(_) => {}
            None => {
                report.add_warning("build.base_path", "No base document configured, it must be given on the command line");
            }
        }

        for overrides_path in &build.overrides_paths {
            if !Path::new(overrides_path).exists() {
                report.add_error(
                    "build.overrides_paths",
                    &format!("Override document does not exist: {}", overrides_path),
                );
            }
        }

        if build.overrides_paths.is_empty() && build.preset.is_none() {
            report.add_warning("build", "No overrides or preset configured, the base will be emitted unchanged");
        }

        if build.preset == Some(Preset::Development) && build.mode == BuildMode::Production {
            report.add_warning("build.mode", "Development preset combined with production mode");
        }

        if let Some(ref output_path) = build.output_path {
            let path = Path::new(output_path);
            if path.extension().is_some() && DocumentFormat::from_path(path) != build.output_format {
                report.add_warning(
                    "build.output_path",
                    &format!("Output path extension does not match format {}", build.output_format),
                );
            }

            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    report.add_error("build.output_path", "Output directory does not exist");
                }
            }
        }
    }

    fn validate_merge(config: &Config, report: &mut ValidationReport) {
        let mut paths = HashSet::new();
        for rule in &config.merge.rules {
            let path = rule.path.as_str();

            if !ArrayRuleConfig::is_valid_path(path) {
                report.add_rule_error("merge.rules.path", path, "Malformed rule path");
            }

            if !paths.insert(path) {
                report.add_rule_error("merge.rules", path, "Duplicate rule for this path");
            }

            // Under `smart`, an explicit append on a rule list switches smart merging off there
            let overrides_smart = config.merge.smart && SMART_RULE_PATHS.contains(&path);
            if rule.strategy == ArrayStrategy::Append && !overrides_smart {
                report.add_rule_warning(
                    "merge.rules.strategy",
                    path,
                    "Rule uses the default strategy and has no effect",
                );
            }

            if rule.strategy == ArrayStrategy::UniquePlugins && !path.ends_with("plugins") {
                report.add_rule_warning(
                    "merge.rules.strategy",
                    path,
                    "unique_plugins only affects plugin descriptors",
                );
            }

            if rule.strategy == ArrayStrategy::Smart && !(path.ends_with("rules") || path.ends_with("loaders")) {
                report.add_rule_warning(
                    "merge.rules.strategy",
                    path,
                    "smart only merges loader rules carrying a test",
                );
            }
        }
    }

    fn validate_logging(config: &Config, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            report.add_error(
                "logging.level",
                &format!("Invalid log level: {}. Valid levels: {:?}", config.logging.level, valid_levels),
            );
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            report.add_error(
                "logging.format",
                &format!("Invalid log format: {}. Valid formats: {:?}", config.logging.format, valid_formats),
            );
        }
    }
}

/// How serious a validation issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The composition would fail or produce the wrong document
    Error,
    /// Allowed, but probably not what was meant
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One finding about the settings
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Settings field the issue is about, e.g. `merge.rules.strategy`
    pub field: String,
    /// Dotted document path of the merge rule involved, if any
    pub rule_path: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule_path {
            Some(ref rule_path) => write!(f, "{} {} [{}]: {}", self.severity, self.field, rule_path, self.message),
            None => write!(f, "{} {}: {}", self.severity, self.field, self.message),
        }
    }
}

/// Every issue found in the settings, in the order checks ran
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.push(Severity::Error, field, None, message);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.push(Severity::Warning, field, None, message);
    }

    /// Record an error about the merge rule for `rule_path`
    pub fn add_rule_error(&mut self, field: &str, rule_path: &str, message: &str) {
        self.push(Severity::Error, field, Some(rule_path), message);
    }

    /// Record a warning about the merge rule for `rule_path`
    pub fn add_rule_warning(&mut self, field: &str, rule_path: &str, message: &str) {
        self.push(Severity::Warning, field, Some(rule_path), message);
    }

    fn push(&mut self, severity: Severity, field: &str, rule_path: Option<&str>, message: &str) {
        self.issues.push(ValidationIssue {
            severity,
            field: field.to_string(),
            rule_path: rule_path.map(str::to_string),
            message: message.to_string(),
        });
    }

    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!(
            "Validation: {} errors, {} warnings",
            self.errors().count(),
            self.warnings().count()
        )
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
