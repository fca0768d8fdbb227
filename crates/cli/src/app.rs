//! Composition run: load documents, merge layers, emit the result

use anyhow::{Context, Result};
use composer::ConfigComposer;
use config::{load_document, render_document, write_document, Config};
use std::io::Write;
use tracing::{debug, info};
use types::{ConfigError, ConfigObject};

/// One input to the merge, with a name for logging
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub object: ConfigObject,
}

/// Application that composes the configured layers
pub struct Application {
    config: Config,
    composer: ConfigComposer,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        let composer = ConfigComposer::with_options(config.merge_options());
        Self { config, composer }
    }

    /// Base document, override documents, then the preset
    pub fn layers(&self) -> Result<Vec<Layer>> {
        let build = &self.config.build;

        let base_path = build.base_path.as_ref().ok_or_else(|| ConfigError::MissingField {
            field: "build.base_path".to_string(),
        })?;

        let mut layers = vec![Layer {
            name: base_path.clone(),
            object: load_document(base_path)
                .with_context(|| format!("Failed to load base document {}", base_path))?,
        }];

        for overrides_path in &build.overrides_paths {
            layers.push(Layer {
                name: overrides_path.clone(),
                object: load_document(overrides_path)
                    .with_context(|| format!("Failed to load override document {}", overrides_path))?,
            });
        }

        if let Some(preset) = build.preset {
            layers.push(Layer {
                name: format!("preset:{}", preset.as_str()),
                object: preset.overrides(build.mode),
            });
        }

        Ok(layers)
    }

    /// Merge every layer into the base, in order
    pub fn compose(&self) -> Result<ConfigObject> {
        let mut layers = self.layers()?.into_iter();
        let base = layers
            .next()
            .context("No configuration layers to compose")?;

        debug!(layer = %base.name, fields = base.object.len(), "Loaded base layer");

        let merged = layers.fold(base.object, |merged, layer| {
            let (next, summary) = self.composer.merge_with_summary(&merged, &layer.object);
            info!(layer = %layer.name, %summary, "Applied overrides");
            next
        });

        Ok(merged)
    }

    /// Compose and write the result to the configured destination
    pub fn run(&self) -> Result<()> {
        let merged = self.compose()?;
        let build = &self.config.build;

        match build.output_path {
            Some(ref output_path) => {
                write_document(&merged, build.output_format, output_path)
                    .with_context(|| format!("Failed to write {}", output_path))?;
                info!(path = %output_path, format = %build.output_format, "Wrote merged configuration");
            }
            None => {
                let rendered = render_document(&merged, build.output_format)
                    .context("Failed to render merged configuration")?;
                std::io::stdout()
                    .lock()
                    .write_all(rendered.as_bytes())
                    .context("Failed to write merged configuration to stdout")?;
            }
        }

        Ok(())
    }
}
