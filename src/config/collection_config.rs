use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::collectors::event_log::EventLogExporter;
use crate::config::categories::{Category, CategoryRegistry, SourceEntry};
use crate::error::RegistryError;
use crate::config::exclusion::ExclusionPolicy;
use crate::constants::{
    BYTES_PER_MB, DEFAULT_ARCHIVE_PREFIX, DEFAULT_EVENT_LOG_ARGS, DEFAULT_EVENT_LOG_CHANNELS,
    DEFAULT_EVENT_LOG_EXTENSION, DEFAULT_EVENT_LOG_UTILITY, DEFAULT_EXCLUDED_EXTENSIONS,
    DEFAULT_EXPORT_TIMEOUT_SECS, DEFAULT_MAX_FILE_SIZE_MB,
};

/// Serializable form of a source entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Path { path: String },
    EventLogs,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CategoryConfig {
    pub name: String,
    pub sources: Vec<SourceConfig>,
    #[serde(default = "default_true")]
    pub size_limited: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExclusionConfig {
    pub extensions: Vec<String>,
    #[serde(default)]
    pub max_file_size_mb: Option<u64>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        ExclusionConfig {
            extensions: DEFAULT_EXCLUDED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            max_file_size_mb: Some(DEFAULT_MAX_FILE_SIZE_MB),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EventLogConfig {
    pub utility: String,
    /// Arguments with `{channel}` and `{output}` placeholders.
    pub args: Vec<String>,
    pub channels: Vec<String>,
    pub extension: String,
    pub timeout_secs: u64,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        EventLogConfig {
            utility: DEFAULT_EVENT_LOG_UTILITY.to_string(),
            args: DEFAULT_EVENT_LOG_ARGS.iter().map(|s| s.to_string()).collect(),
            channels: DEFAULT_EVENT_LOG_CHANNELS.iter().map(|s| s.to_string()).collect(),
            extension: DEFAULT_EVENT_LOG_EXTENSION.to_string(),
            timeout_secs: DEFAULT_EXPORT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CollectionConfig {
    pub version: String,
    pub description: String,
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,
    #[serde(default)]
    pub exclusions: ExclusionConfig,
    #[serde(default)]
    pub event_log: EventLogConfig,
    pub categories: Vec<CategoryConfig>,
}

fn default_true() -> bool {
    true
}

fn default_archive_prefix() -> String {
    DEFAULT_ARCHIVE_PREFIX.to_string()
}

impl CollectionConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: CollectionConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?;
        config
            .build_registry()
            .context(format!("Invalid categories in {}", path.display()))?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml).context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Write the compiled-in defaults as YAML
    pub fn create_default_config_file(path: &Path) -> Result<()> {
        CollectionConfig::default().save_to_yaml_file(path)
    }

    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        ExclusionPolicy::new(
            &self.exclusions.extensions,
            self.exclusions.max_file_size_mb.map(|mb| mb * BYTES_PER_MB),
        )
    }

    pub fn event_log_exporter(&self) -> EventLogExporter {
        EventLogExporter::new(
            &self.event_log.utility,
            self.event_log.args.clone(),
            self.event_log.channels.clone(),
        )
        .with_extension(&self.event_log.extension)
        .with_timeout(Duration::from_secs(self.event_log.timeout_secs))
    }

    /// Build the category registry described by this configuration.
    ///
    /// Fails if two categories share a name or a staging directory.
    pub fn build_registry(&self) -> Result<CategoryRegistry, RegistryError> {
        let categories = self
            .categories
            .iter()
            .map(|cat| {
                let sources = cat
                    .sources
                    .iter()
                    .map(|source| match source {
                        SourceConfig::Path { path } => SourceEntry::path(path.clone()),
                        SourceConfig::EventLogs => SourceEntry::exporter(self.event_log_exporter()),
                    })
                    .collect();
                Category::new(cat.name.clone(), sources).with_size_limit(cat.size_limited)
            })
            .collect();

        CategoryRegistry::new(categories)
    }
}

/// Load the configuration at `config_path`, or the compiled-in defaults.
pub fn load_config(config_path: Option<&Path>) -> Result<CollectionConfig> {
    match config_path {
        Some(path) => CollectionConfig::from_yaml_file(path),
        None => {
            debug!("Using built-in configuration");
            Ok(CollectionConfig::default())
        }
    }
}
