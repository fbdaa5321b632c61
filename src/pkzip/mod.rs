//! PKZIP container introspection
//!
//! Reads entry headers directly to learn each entry's compression method, so
//! archives using Shrunk, Reduced or Imploded can be routed away from
//! deflate-only tools. Also classifies Info-ZIP exit statuses and runs
//! integrity tests.

mod entries;
mod exit_status;
mod integrity;
mod method;

pub use entries::{ZipEntryRecord, entries, is_usable_by_standard_tooling, methods};
pub use exit_status::ExitDiagnostic;
pub use integrity::test_archive;
pub use method::CompressionMethod;
