//! Strategy table: which adapters handle a format, and in what order

use crate::adapters::Adapter;
use crate::error::{Error, Result};
use crate::types::Format;
use std::path::Path;

/// What to do when a step fails
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnFailure {
    /// Try the next step
    Continue,
    /// Stop the chain and report
    Abort,
}

/// One adapter attempt in a strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// The adapter to run
    pub adapter: Adapter,
    /// Chain behaviour after a failure
    pub on_failure: OnFailure,
}

const fn last(adapter: Adapter) -> Step {
    Step {
        adapter,
        on_failure: OnFailure::Abort,
    }
}

const fn then(adapter: Adapter) -> Step {
    Step {
        adapter,
        on_failure: OnFailure::Continue,
    }
}

// deflate-only unzip first, hwzip for the PKZIP 1.x methods, bsdtar as last resort
const ZIP: &[Step] = &[then(Adapter::Unzip), then(Adapter::HwZip), last(Adapter::BsdTar)];
const ZIP_LEGACY: &[Step] = &[then(Adapter::HwZip), last(Adapter::BsdTar)];
const SEVEN_ZIP: &[Step] = &[last(Adapter::SevenZip)];
const ARC: &[Step] = &[last(Adapter::Arc)];
const ARJ: &[Step] = &[last(Adapter::Arj)];
const LHA: &[Step] = &[last(Adapter::Lha)];
const RAR: &[Step] = &[last(Adapter::Unrar)];
const TAR: &[Step] = &[last(Adapter::BsdTar)];
const GZIP: &[Step] = &[last(Adapter::Gzip)];

/// The ordered steps for a format
///
/// Fails with [`Error::NotAnArchive`] for [`Format::Unknown`] and with
/// [`Error::FormatNotImplemented`] for self-extracting and multi-volume
/// archives. `path` only labels the error.
pub fn strategy_for(format: Format, path: &Path) -> Result<&'static [Step]> {
    let steps = match format {
        Format::Zip => ZIP,
        Format::ZipLegacyMethod => ZIP_LEGACY,
        Format::SevenZip => SEVEN_ZIP,
        Format::Arc => ARC,
        Format::Arj => ARJ,
        Format::Lha => LHA,
        Format::Rar => RAR,
        Format::Tar
        | Format::GzipWrappedTar
        | Format::Bzip2
        | Format::Xz
        | Format::Zstd
        | Format::Cabinet => TAR,
        Format::Gzip => GZIP,
        Format::MultiVolumeZip | Format::SelfExtracting => {
            return Err(Error::FormatNotImplemented {
                path: path.to_path_buf(),
                format,
            });
        }
        Format::Unknown => {
            return Err(Error::NotAnArchive {
                path: path.to_path_buf(),
            });
        }
    };
    Ok(steps)
}
