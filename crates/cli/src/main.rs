//! Config Composer - Command Line Entry Point

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use composer::{BuildMode, Preset};
use config::{
    ArrayRuleConfig, Config, ConfigLoader, ConfigValidator, DocumentFormat, LoggingConfig, Severity,
};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use types::ArrayStrategy;

mod app;

use app::Application;

/// Settings file picked up when `--config` and `CONFIG_PATH` are absent
const DEFAULT_CONFIG_PATH: &str = "composer.yaml";

#[derive(Debug, Parser)]
#[command(
    name = "config-composer",
    version,
    about = "Compose bundler configuration from a shared base and environment overrides"
)]
struct Cli {
    /// Settings file (defaults to $CONFIG_PATH, then ./composer.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge the base document with overrides and print the result
    Compose(ComposeArgs),
    /// Check the settings file and report problems
    Validate,
    /// Write an example settings file
    Init {
        /// Destination of the example file
        #[arg(default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ComposeArgs {
    /// Shared base document
    #[arg(short, long)]
    base: Option<String>,

    /// Override document, repeatable; applied in order
    #[arg(short, long = "overrides")]
    overrides: Vec<String>,

    /// Built-in preset applied after the override documents
    #[arg(short, long)]
    preset: Option<Preset>,

    /// Build mode injected by the preset
    #[arg(short, long)]
    mode: Option<BuildMode>,

    /// Output format (json, yaml)
    #[arg(short, long)]
    format: Option<DocumentFormat>,

    /// Output file; stdout when omitted
    #[arg(long)]
    output: Option<String>,

    /// Array strategy for a path, as PATH=STRATEGY; repeatable
    #[arg(long = "rule", value_parser = parse_rule)]
    rules: Vec<(String, ArrayStrategy)>,

    /// Merge loader rules that share a `test` under module.rules and module.loaders
    #[arg(long)]
    smart: bool,
}

impl ComposeArgs {
    /// Command-line values take precedence over the settings file
    fn apply(self, config: &mut Config) {
        let build = &mut config.build;

        if let Some(base) = self.base {
            build.base_path = Some(base);
        }
        if !self.overrides.is_empty() {
            build.overrides_paths = self.overrides;
        }
        if self.preset.is_some() {
            build.preset = self.preset;
        }
        if let Some(mode) = self.mode {
            build.mode = mode;
        }
        if let Some(format) = self.format {
            build.output_format = format;
        }
        if self.output.is_some() {
            build.output_path = self.output;
        }

        if self.smart {
            config.merge.smart = true;
        }

        for (path, strategy) in self.rules {
            config.merge.rules.retain(|rule| rule.path != path);
            config.merge.rules.push(ArrayRuleConfig { path, strategy });
        }
    }
}

fn parse_rule(s: &str) -> std::result::Result<(String, ArrayStrategy), String> {
    let (path, strategy) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=STRATEGY, got '{}'", s))?;
    let path = path.trim();
    if !ArrayRuleConfig::is_valid_path(path) {
        return Err(format!("malformed rule path '{}'", path));
    }
    let strategy = strategy.parse::<ArrayStrategy>().map_err(|e| e.to_string())?;
    Ok((path.to_string(), strategy))
}

fn main() -> Result<()> {
    // Load .env file if it exists
    let dotenv_result = dotenv::dotenv();

    let cli = Cli::parse();

    // `validate` reports every problem instead of stopping at the first one
    let config = match cli.command {
        Command::Init { .. } => ConfigLoader::default(),
        Command::Validate => load_settings(cli.config.as_deref(), false)?,
        Command::Compose(_) => load_settings(cli.config.as_deref(), true)?,
    };

    // Initialize logging
    init_logging(&config.logging)?;

    match dotenv_result {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(e) if !e.not_found() => warn!("Could not load .env file: {}", e),
        Err(_) => {}
    }

    match cli.command {
        Command::Compose(args) => {
            let mut config = config;
            args.apply(&mut config);
            ConfigLoader::validate(&config).context("Invalid command-line settings")?;

            info!(
                base = ?config.build.base_path,
                overrides = config.build.overrides_paths.len(),
                preset = ?config.build.preset,
                mode = %config.build.mode,
                "Composing configuration"
            );

            Application::new(config).run()?;
        }
        Command::Validate => {
            let report = ConfigValidator::validate(&config)?;

            for issue in report.issues() {
                let rule = issue.rule_path.as_deref().unwrap_or_default();
                match issue.severity {
                    Severity::Warning => warn!(field = %issue.field, rule, "{}", issue.message),
                    Severity::Error => error!(field = %issue.field, rule, "{}", issue.message),
                }
            }
            info!("{}", report.summary());

            if !report.is_valid() {
                anyhow::bail!("Configuration is invalid: {}", report.summary());
            }
        }
        Command::Init { path } => {
            ConfigLoader::create_example(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            info!("Example configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Resolve and load the settings file, falling back to environment variables
///
/// With `checked` unset the settings are returned even when they are invalid.
fn load_settings(explicit: Option<&Path>, checked: bool) -> Result<Config> {
    let config_path = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var("CONFIG_PATH").ok().map(PathBuf::from))
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|path| path.exists()));

    match config_path {
        Some(path) => {
            let loaded = if checked {
                ConfigLoader::load(&path)
            } else {
                ConfigLoader::load_unchecked(&path)
            };
            loaded.with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None if checked => ConfigLoader::load_from_env().context("Failed to load configuration"),
        None => ConfigLoader::load_from_env_unchecked().context("Failed to load configuration"),
    }
}

/// Initialize logging from settings; RUST_LOG wins over the configured level
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout carries the merged document
    match logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
    }

    if logging.level == "trace" || logging.level == "debug" {
        warn!("Debug/trace logging enabled - merge decisions will be logged per field");
    }

    Ok(())
}
