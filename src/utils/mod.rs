//! Utility functions for the finished collection.
//!
//! ## Components
//!
//! - **Compression**: ZIP archive of the staging tree, rooted at the hostname
//! - **Destination**: choice of a writable output directory
//! - **Summary**: JSON report written beside the archive
//!
//! ### Creating an Archive
//!
//! ```no_run
//! use diag_collector::config::ExclusionPolicy;
//! use diag_collector::utils::compress::{archive_name, create_archive};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let staging = Path::new("/tmp/diag-staging");
//! let name = archive_name("N-Able_Logs", "HOST01", "20240101_120000");
//! let dest = Path::new("/tmp").join(name);
//!
//! let outcome = create_archive(staging, &dest, &ExclusionPolicy::default(), "HOST01")?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

/// Collection summary generation and reporting
pub mod summary;

/// ZIP archive creation
pub mod compress;

/// Output directory resolution
pub mod destination;
