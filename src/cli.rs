use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Category, CategoryRegistry, CollectionConfig, ExclusionPolicy};
use crate::constants::BYTES_PER_MB;
use crate::error::RegistryError;

/// Command-line arguments for the diagnostic collector.
///
/// Without a subcommand the selected categories are collected, archived and
/// the process exits with 0 (archive created), 1 (archive failed),
/// 2 (nothing collected) or 130 (cancelled).
#[derive(Parser, Debug)]
#[clap(
    name = "diag-collector",
    version,
    about = "Collects N-able agent diagnostics into a single archive"
)]
pub struct Args {
    /// Directory for the archive (default: C:\Windows\Temp, C:\Temp, then the system temp dir)
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Path to configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Categories to collect (comma-separated, default: all)
    #[clap(short = 'k', long, value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    /// Collect one category at a time in configuration order
    #[clap(long)]
    pub sequential: bool,

    /// Size ceiling for collected files in MB
    #[clap(long, conflicts_with = "no_size_limit")]
    pub max_file_size_mb: Option<u64>,

    /// Collect files of any size
    #[clap(long)]
    pub no_size_limit: bool,

    /// Maximum number of collection threads
    #[clap(short = 'j', long)]
    pub threads: Option<usize>,

    /// Write a JSON summary beside the archive
    #[clap(long)]
    pub summary: bool,

    /// Also append log output to this file
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the collector.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default configuration file
    InitConfig {
        /// Path to output configuration file
        #[clap(default_value = "config.yaml")]
        path: PathBuf,
    },

    /// Print the configured categories and their sources
    ListCategories,
}

impl Args {
    /// Exclusion policy from the configuration with command-line overrides.
    pub fn exclusion_policy(&self, config: &CollectionConfig) -> ExclusionPolicy {
        let policy = config.exclusion_policy();
        if self.no_size_limit {
            policy.without_size_limit()
        } else if let Some(mb) = self.max_file_size_mb {
            ExclusionPolicy::new(policy.excluded_suffixes(), Some(mb.saturating_mul(BYTES_PER_MB)))
        } else {
            policy
        }
    }

    /// Categories named with `--categories`, or every registered one.
    pub fn select_categories(&self, registry: &CategoryRegistry) -> Result<Vec<Category>, RegistryError> {
        match &self.categories {
            Some(names) => {
                let names: Vec<&str> = names
                    .iter()
                    .map(|n| n.trim())
                    .filter(|n| !n.is_empty())
                    .collect();
                registry.select(&names)
            }
            None => Ok(registry.all_categories().to_vec()),
        }
    }
}
