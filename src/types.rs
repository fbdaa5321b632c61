//! Core types shared by the classifier, the strategy table and the orchestrator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Archive container format resolved from a file's signature
///
/// Classification is total: every byte stream resolves to exactly one variant,
/// falling back to [`Format::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// PKZIP archive whose leading entry uses Stored, Imploded or Deflated
    Zip,
    /// PKZIP archive whose leading entry uses Shrunk or Reduced
    ZipLegacyMethod,
    /// 7-Zip archive
    SevenZip,
    /// ARC by System Enhancement Associates
    Arc,
    /// ARJ by Robert Jung
    Arj,
    /// LHA/LZH by Haruyasu Yoshizaki
    Lha,
    /// Roshal ARchive, v1.5 through v5
    Rar,
    /// POSIX tape archive
    Tar,
    /// Single gzip compressed stream
    Gzip,
    /// Gzip compressed tarball
    GzipWrappedTar,
    /// bzip2 compressed stream
    Bzip2,
    /// XZ Utils compressed stream
    Xz,
    /// Zstandard compressed stream
    Zstd,
    /// Microsoft Cabinet
    Cabinet,
    /// Split or spanned PKZIP volume
    MultiVolumeZip,
    /// DOS or Windows executable carrying an embedded archive
    SelfExtracting,
    /// No known signature
    Unknown,
}

impl Format {
    /// Every variant, in declaration order
    pub const ALL: [Format; 17] = [
        Format::Zip,
        Format::ZipLegacyMethod,
        Format::SevenZip,
        Format::Arc,
        Format::Arj,
        Format::Lha,
        Format::Rar,
        Format::Tar,
        Format::Gzip,
        Format::GzipWrappedTar,
        Format::Bzip2,
        Format::Xz,
        Format::Zstd,
        Format::Cabinet,
        Format::MultiVolumeZip,
        Format::SelfExtracting,
        Format::Unknown,
    ];

    /// Short display name
    pub fn name(self) -> &'static str {
        match self {
            Format::Zip => "ZIP",
            Format::ZipLegacyMethod => "ZIP (legacy method)",
            Format::SevenZip => "7-Zip",
            Format::Arc => "ARC",
            Format::Arj => "ARJ",
            Format::Lha => "LHA",
            Format::Rar => "RAR",
            Format::Tar => "tar",
            Format::Gzip => "gzip",
            Format::GzipWrappedTar => "gzip tarball",
            Format::Bzip2 => "bzip2",
            Format::Xz => "xz",
            Format::Zstd => "zstd",
            Format::Cabinet => "Microsoft Cabinet",
            Format::MultiVolumeZip => "multi-volume ZIP",
            Format::SelfExtracting => "self-extracting",
            Format::Unknown => "unknown",
        }
    }

    /// Returns true for the PKZIP container family
    pub fn is_zip_family(self) -> bool {
        matches!(
            self,
            Format::Zip | Format::ZipLegacyMethod | Format::MultiVolumeZip
        )
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single extraction call: which archive, where to, and which entries
///
/// An empty `targets` list means every entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveRequest {
    /// The archive file to read
    pub source: PathBuf,
    /// Existing directory that receives the extracted entries
    pub destination: PathBuf,
    /// Entry names to extract, in order
    pub targets: Vec<String>,
}

impl ArchiveRequest {
    /// Request extraction of every entry
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            targets: Vec::new(),
        }
    }

    /// Restrict the request to the named entries
    #[must_use]
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if the request filters on entry names
    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    /// The source path
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The destination path
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}
