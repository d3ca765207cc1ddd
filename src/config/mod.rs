// Re-export all items from the submodules
mod categories;
mod collection_config;
mod default_configs;
mod env_vars;
mod exclusion;

// Re-export registry types
pub use categories::{check_distinct, Category, CategoryRegistry, Exporter, SourceEntry};

// Re-export collection config
pub use collection_config::{
    load_config, CategoryConfig, CollectionConfig, EventLogConfig, ExclusionConfig, SourceConfig,
};

// Re-export exclusion policy
pub use exclusion::ExclusionPolicy;

// Re-export path resolution functions
pub use env_vars::{expand_env_vars, expand_with, resolve_source_path};
