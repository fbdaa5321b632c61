//! Scoped filesystem artifacts and the shared invocation path
//!
//! Programs without a destination option run inside the destination against a
//! temporary copy of the archive. Programs that insist on an extension get a
//! temporary link. Both artifacts are guards that remove themselves on drop,
//! so every exit path cleans up, including timeouts and cancellation.

use super::process::{self, Invocation};
use super::{Adapter, TargetSupport};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::ArchiveRequest;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A link to the source that carries a required extension
///
/// Removed on drop when this guard created it.
#[derive(Debug)]
pub struct ExtensionLink {
    path: PathBuf,
    created: bool,
}

impl ExtensionLink {
    /// Give `source` the `extension` it lacks
    ///
    /// When `source` already ends in `extension`, ignoring case, no link is made
    /// and [`path`](Self::path) is the source itself. An existing file at the
    /// linked name is reused and left in place afterwards.
    pub fn create(source: &Path, extension: &str) -> Result<Self> {
        validate_extension(extension)?;

        if has_extension(source, extension) {
            return Ok(Self {
                path: source.to_path_buf(),
                created: false,
            });
        }

        let linked = with_suffix(source.as_os_str(), extension);
        if fs::symlink_metadata(&linked).is_ok() {
            debug!(?linked, "reusing existing file with required extension");
            return Ok(Self {
                path: linked,
                created: false,
            });
        }

        if let Err(hard) = fs::hard_link(source, &linked) {
            debug!(?source, error = %hard, "hard link failed, trying a symbolic link");
            symlink_sibling(source, &linked)?;
        }
        debug!(?source, ?linked, "created extension link");
        Ok(Self {
            path: linked,
            created: true,
        })
    }

    /// The name to hand to the program
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the guard made a new link that it will remove
    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl Drop for ExtensionLink {
    fn drop(&mut self) {
        if !self.created {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = ?self.path, error = %e, "failed to remove extension link");
        }
    }
}

/// A copy of the source placed inside the destination directory
///
/// Removed on drop if it still exists. The program may consume it, as gzip
/// does when it decompresses in place. The copy never replaces an existing
/// file: when the destination already holds the name, including the source
/// itself, the copy gets a `<pid>-<n>-` prefix instead.
#[derive(Debug)]
pub struct ScopedCopy {
    path: PathBuf,
}

impl ScopedCopy {
    /// Copy `source` into `destination`, appending `required_extension` when missing
    pub fn create(source: &Path, destination: &Path, required_extension: Option<&str>) -> Result<Self> {
        let file_name = source.file_name().ok_or_else(|| Error::SourceInvalid {
            path: source.to_path_buf(),
            reason: "has no file name".to_string(),
        })?;

        let name = match required_extension {
            Some(ext) => {
                validate_extension(ext)?;
                if has_extension(source, ext) {
                    file_name.to_os_string()
                } else {
                    with_suffix(file_name, ext).into_os_string()
                }
            }
            None => file_name.to_os_string(),
        };

        let mut input = fs::File::open(source)?;
        let (path, mut output) = create_unique(destination, &name)?;
        let guard = Self { path };
        std::io::copy(&mut input, &mut output)?;
        debug!(?source, copy = ?guard.path, "copied source into destination");
        Ok(guard)
    }

    /// Full path of the copy
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the copy, relative to the destination
    pub fn file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or(self.path.as_os_str())
    }
}

impl Drop for ScopedCopy {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "failed to remove source copy"),
        }
    }
}

/// Fail with [`Error::DestinationInvalid`] unless `path` is an existing directory
pub(crate) async fn ensure_destination(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::DestinationInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if !metadata.is_dir() {
        return Err(Error::DestinationInvalid {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(())
}

/// Run one adapter against a request
///
/// Validates the destination, prepares the link or copy the adapter needs,
/// runs the program under its time bound and removes the artifacts again.
pub async fn invoke(adapter: Adapter, request: &ArchiveRequest, config: &Config) -> Result<()> {
    let descriptor = adapter.descriptor();
    ensure_destination(&request.destination).await?;

    let targets: &[String] = match descriptor.targets {
        TargetSupport::Entries => &request.targets,
        TargetSupport::Ignored => &[],
        TargetSupport::Unsupported if request.has_targets() => {
            return Err(Error::TargetsUnsupported {
                program: adapter.to_string(),
            });
        }
        TargetSupport::Unsupported => &[],
    };

    let program = adapter.program(&config.programs);
    let timeout = descriptor.timeout.duration(&config.timeouts);
    // resolve before touching the filesystem
    process::resolve(program)?;

    let output = if descriptor.supports_destination_flag {
        let link = match descriptor.required_extension {
            Some(ext) => Some(blocking_link(&request.source, ext).await?),
            None => None,
        };
        let source = link.as_ref().map_or(request.source.as_path(), ExtensionLink::path);
        let args = adapter.extract_args(source, &request.destination, targets);
        process::run_checked(Invocation {
            program,
            args,
            working_dir: None,
            timeout,
        })
        .await?
    } else {
        let copy = blocking_copy(&request.source, &request.destination, descriptor.required_extension).await?;
        let args = adapter.extract_args(Path::new(copy.file_name()), &request.destination, targets);
        process::run_checked(Invocation {
            program,
            args,
            working_dir: Some(&request.destination),
            timeout,
        })
        .await?
    };

    if descriptor.expects_stdout && output.stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::EmptyOutput {
            program: process::display_name(program),
        });
    }
    Ok(())
}

async fn blocking_link(source: &Path, extension: &'static str) -> Result<ExtensionLink> {
    let source = source.to_path_buf();
    tokio::task::spawn_blocking(move || ExtensionLink::create(&source, extension))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("link task panicked: {e}"))))?
}

async fn blocking_copy(
    source: &Path,
    destination: &Path,
    extension: Option<&'static str>,
) -> Result<ScopedCopy> {
    let source = source.to_path_buf();
    let destination = destination.to_path_buf();
    tokio::task::spawn_blocking(move || ScopedCopy::create(&source, &destination, extension))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("copy task panicked: {e}"))))?
}

fn validate_extension(extension: &str) -> Result<()> {
    if extension.len() < 2 || !extension.starts_with('.') {
        return Err(Error::InvalidExtension {
            extension: extension.to_string(),
        });
    }
    Ok(())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    name.len() > extension.len()
        && name
            .get(name.len() - extension.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(extension))
}

fn with_suffix(base: &OsStr, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base);
    name.push(suffix);
    PathBuf::from(name)
}

/// Create `dir/name`, or a prefixed variant when that name is taken
fn create_unique(dir: &Path, name: &OsStr) -> Result<(PathBuf, fs::File)> {
    const ATTEMPTS: u32 = 100;

    let mut candidate = dir.join(name);
    for n in 0..ATTEMPTS {
        match fs::OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(taken = ?candidate, "destination already holds the name");
                let mut prefixed = OsString::from(format!("{}-{}-", std::process::id(), n));
                prefixed.push(name);
                candidate = dir.join(prefixed);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::DestinationInvalid {
        path: dir.to_path_buf(),
        reason: format!("no free name for a copy of {}", name.to_string_lossy()),
    })
}

/// Symlink `link` to `source`, which sits in the same directory
///
/// The target is the bare file name, since a relative target resolves from
/// the link's own directory.
fn symlink_sibling(source: &Path, link: &Path) -> Result<()> {
    let target = source.file_name().ok_or_else(|| Error::SourceInvalid {
        path: source.to_path_buf(),
        reason: "has no file name".to_string(),
    })?;
    symlink(Path::new(target), link)
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(original, link)?;
    Ok(())
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(original, link)?;
    Ok(())
}
