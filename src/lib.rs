//! # relic-unpack
//!
//! Format resolution and extraction orchestration for legacy archives.
//!
//! ## Design Philosophy
//!
//! relic-unpack gives ARC, ARJ, LHA, RAR, 7-Zip, PKZIP (including the Shrunk,
//! Reduced and Imploded methods), gzip, tar and Cabinet files one contract:
//! classify the bytes, pick a strategy, run external archivers until one
//! succeeds.
//!
//! - **No decompression code** - every legacy format is handled by an external program
//! - **Modern output** - [`rezip`] re-packs unpacked content as Deflate ZIPs
//! - **Fallback chains** - ZIP archives fall back from `unzip` to `hwzip` to `bsdtar`
//! - **Scoped artifacts** - copies and extension links never outlive a request
//! - **Explicit configuration** - program paths and timeouts live in [`Config`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use relic_unpack::{Config, Extractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = Extractor::new(Config::default());
//!
//!     let extraction = extractor.extract_all("GAME.ARJ", "/tmp/game").await?;
//!     println!("{} extracted by {}", extraction.format, extraction.adapter);
//!
//!     if let Some(readme) = extractor.readme("GAME.ARJ").await? {
//!         println!("readme: {readme}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// External program adapters and the copy/link shim
pub mod adapters;
/// Configuration types
pub mod config;
/// Format to adapter strategy table
pub mod dispatch;
/// Error types
pub mod error;
/// Request orchestration
pub mod extractor;
/// List output parsing
mod listing;
/// ZIP entry introspection and exit status diagnostics
pub mod pkzip;
/// Readme selection
pub mod readme;
/// Deflate ZIP writing
pub mod rezip;
/// Signature classification
pub mod signature;
/// Core types
pub mod types;

pub use adapters::{Adapter, AdapterDescriptor, ExtensionLink, ScopedCopy};
pub use config::Config;
pub use dispatch::{OnFailure, Step, strategy_for};
pub use error::{Error, Result, StepFailure};
pub use extractor::{Extraction, Extractor};
pub use pkzip::{CompressionMethod, ExitDiagnostic, ZipEntryRecord};
pub use types::{ArchiveRequest, Format};
