//! Request orchestration
//!
//! [`Extractor`] classifies a source, looks up its strategy and runs the steps
//! one after another until one succeeds. Every failed or skipped step is kept,
//! so an exhausted chain reports why each adapter did not produce the output.

use crate::adapters::{self, Adapter};
use crate::config::Config;
use crate::dispatch::{self, OnFailure, Step};
use crate::error::{Error, Result, StepFailure};
use crate::listing;
use crate::pkzip;
use crate::readme;
use crate::signature;
use crate::types::{ArchiveRequest, Format};
use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of a successful extraction
#[derive(Debug)]
pub struct Extraction {
    /// Detected format of the source
    pub format: Format,
    /// The adapter that produced the output
    pub adapter: Adapter,
    /// Steps that failed or were skipped before the successful one
    pub failures: Vec<StepFailure>,
}

impl Extraction {
    /// Returns true if the first step of the chain succeeded
    pub fn used_primary(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Entry point for extraction, listing and readme lookup
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: Config,
}

impl Extractor {
    /// Create an extractor with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract an archive into an existing directory
    ///
    /// Steps run strictly in order. A step failure that can only repeat on the
    /// next adapter, such as an invalid destination or an encrypted entry,
    /// ends the request at once with [`Error::Aborted`], which keeps the steps
    /// already tried. Otherwise the next step is tried, and when none is left
    /// the result is [`Error::AllFallbacksExhausted`] carrying every step's
    /// cause.
    pub async fn extract(&self, request: &ArchiveRequest) -> Result<Extraction> {
        let started = Instant::now();
        adapters::ensure_destination(request.destination()).await?;
        let format = self.classify_source(request.source()).await?;
        let steps = dispatch::strategy_for(format, request.source())?;

        info!(
            source = ?request.source(),
            destination = ?request.destination(),
            %format,
            targets = request.targets.len(),
            "extracting archive"
        );

        let legacy_methods = if format.is_zip_family() {
            self.has_legacy_methods(request.source(), format)
                .await
                .map_err(|cause| Error::Aborted {
                    format,
                    failures: Vec::new(),
                    cause: Box::new(cause),
                })?
        } else {
            false
        };

        let mut failures = Vec::new();
        for (index, step) in steps.iter().enumerate() {
            let Step { adapter, on_failure } = *step;

            if let Some(reason) = skip_reason(adapter, request, legacy_methods) {
                debug!(%adapter, step = index, reason, "skipping step");
                failures.push(StepFailure::skipped(adapter, reason));
                continue;
            }

            match adapters::invoke(adapter, request, &self.config).await {
                Ok(()) => {
                    info!(
                        source = ?request.source(),
                        %format,
                        %adapter,
                        step = index,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "extraction complete"
                    );
                    return Ok(Extraction {
                        format,
                        adapter,
                        failures,
                    });
                }
                Err(e) if !e.is_retryable() => {
                    warn!(%adapter, step = index, error = %e, "extraction step failed, stopping");
                    return Err(Error::Aborted {
                        format,
                        failures,
                        cause: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!(%adapter, step = index, error = %e, "extraction step failed");
                    failures.push(StepFailure::failed(adapter, e));
                    if on_failure == OnFailure::Abort {
                        break;
                    }
                }
            }
        }

        Err(Error::AllFallbacksExhausted { format, failures })
    }

    /// Extract every entry of `source` into `destination`
    pub async fn extract_all(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<Extraction> {
        let request = ArchiveRequest::new(source.as_ref(), destination.as_ref());
        self.extract(&request).await
    }

    /// Unpack `source` into its content directory and return that directory
    ///
    /// The directory sits under [`Config::content_dir`], named after the
    /// source plus a digest of its canonical path, and is reused as is once it
    /// holds anything. A source that is not an archive is copied in as `name`.
    /// Fails with [`Error::SourceTooLarge`] above [`Config::max_extract_bytes`].
    /// A failed extraction removes the directory again.
    pub async fn extract_source(&self, source: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        let source = source.as_ref();
        if Path::new(name).file_name() != Some(OsStr::new(name)) {
            return Err(Error::SourceInvalid {
                path: source.to_path_buf(),
                reason: format!("{name:?} is not a plain file name"),
            });
        }
        let size = source_metadata(source).await?.len();
        if size > self.config.max_extract_bytes {
            return Err(Error::SourceTooLarge {
                path: source.to_path_buf(),
                size,
                limit: self.config.max_extract_bytes,
            });
        }

        let dir = self.content_path(source).await?;
        tokio::fs::create_dir_all(&dir).await?;
        if tokio::fs::read_dir(&dir).await?.next_entry().await?.is_some() {
            debug!(?source, ?dir, "reusing content directory");
            return Ok(dir);
        }

        let unpacked = match self.extract_all(source, &dir).await {
            Ok(_) => Ok(()),
            Err(Error::NotAnArchive { .. }) => {
                debug!(?source, name, "not an archive, copying into content directory");
                tokio::fs::copy(source, dir.join(name))
                    .await
                    .map(|_| ())
                    .map_err(Error::from)
            }
            Err(e) => Err(e),
        };
        if let Err(e) = unpacked {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&dir).await {
                warn!(?dir, error = %cleanup, "failed to remove content directory");
            }
            return Err(e);
        }
        Ok(dir)
    }

    /// List the files of an archive
    ///
    /// The archive is unpacked with [`extract_source`](Self::extract_source)
    /// and the result is walked, giving `/` separated paths relative to the
    /// content directory. When that fails, the format's list command is parsed
    /// instead. A source that is not an archive lists as itself.
    pub async fn list(&self, source: impl AsRef<Path>) -> Result<Vec<String>> {
        let source = source.as_ref();
        source_metadata(source).await?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.extract_source(source, &name).await {
            Ok(dir) => tokio::task::spawn_blocking(move || walk_files(&dir))
                .await
                .map_err(|e| Error::Io(std::io::Error::other(format!("walk task panicked: {e}"))))?,
            Err(e) => {
                debug!(?source, error = %e, "unpacking failed, reading the list command");
                let format = self.classify_source(source).await?;
                listing::list(source, format, &self.config).await
            }
        }
    }

    /// The entry most likely to be the archive's readme, if any
    pub async fn readme(&self, source: impl AsRef<Path>) -> Result<Option<String>> {
        let source = source.as_ref();
        let entries = self.list(source).await?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(readme::best_readme(&name, &entries))
    }

    /// Classify the source
    ///
    /// A missing source is [`Error::SourceInvalid`]. A directory passed as the
    /// source is [`Error::DestinationInvalid`], the usual sign of swapped
    /// arguments. A source no signature matches is [`Error::NotAnArchive`].
    pub async fn classify(&self, source: impl AsRef<Path>) -> Result<Format> {
        self.classify_source(source.as_ref()).await
    }

    async fn classify_source(&self, source: &Path) -> Result<Format> {
        let metadata = source_metadata(source).await?;
        if metadata.len() == 0 {
            return Err(Error::NotAnArchive {
                path: source.to_path_buf(),
            });
        }

        let format = signature::classify_path(
            source,
            &self.config.signature,
            &self.config.programs,
            self.config.timeouts.lookup,
        )
        .await;
        if format == Format::Unknown {
            return Err(Error::NotAnArchive {
                path: source.to_path_buf(),
            });
        }
        Ok(format)
    }

    async fn content_path(&self, source: &Path) -> Result<PathBuf> {
        let canonical = tokio::fs::canonicalize(source).await?;
        let digest = Sha256::digest(canonical.as_os_str().as_encoded_bytes());
        let hash = format!("{:x}", digest);
        let stem = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.config.content_dir.join(format!("{stem}-{}", &hash[..16])))
    }

    /// Whether any entry needs a legacy-method adapter
    ///
    /// Encrypted entries fail the whole request. Other introspection failures
    /// leave the decision to the adapters.
    async fn has_legacy_methods(&self, source: &Path, format: Format) -> Result<bool> {
        let path = source.to_path_buf();
        let verdict = tokio::task::spawn_blocking(move || pkzip::is_usable_by_standard_tooling(&path))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(format!("introspection task panicked: {e}"))))?;
        match verdict {
            Ok(usable) => Ok(!usable),
            Err(Error::PasswordProtected { archive, .. }) => {
                Err(Error::PasswordProtected { archive, format })
            }
            Err(e) => {
                warn!(?source, error = %e, "cannot read zip entries, trying every adapter");
                Ok(false)
            }
        }
    }
}

/// Metadata of a source that is a file
///
/// A directory passed as the source is [`Error::DestinationInvalid`].
async fn source_metadata(source: &Path) -> Result<std::fs::Metadata> {
    let metadata = tokio::fs::metadata(source)
        .await
        .map_err(|e| Error::SourceInvalid {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    if metadata.is_dir() {
        return Err(Error::DestinationInvalid {
            path: source.to_path_buf(),
            reason: "source is a directory".to_string(),
        });
    }
    Ok(metadata)
}

/// Relative paths of every file below `dir`, sorted by name
fn walk_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(name);
    }
    Ok(files)
}

fn skip_reason(adapter: Adapter, request: &ArchiveRequest, legacy_methods: bool) -> Option<&'static str> {
    if request.has_targets() && !adapter.accepts_targets() {
        return Some("cannot extract individual entries");
    }
    if legacy_methods && adapter == Adapter::Unzip {
        return Some("archive uses legacy compression methods");
    }
    None
}
