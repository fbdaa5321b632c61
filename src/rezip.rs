//! Re-packing files as modern Deflate ZIPs
//!
//! The output is readable by any current tool, which makes it the usual last
//! step after unpacking a legacy archive. Both operations refuse to overwrite
//! an existing `dest` and remove a partially written one on failure.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Compress the single file `name` into a new ZIP at `dest`
///
/// The entry is stored under the file's base name. Returns the number of
/// uncompressed bytes written.
pub fn compress(name: &Path, dest: &Path) -> Result<u64> {
    let entry = name
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::SourceInvalid {
            path: name.to_path_buf(),
            reason: "has no file name".to_string(),
        })?;
    let mut source = File::open(name).map_err(|e| Error::SourceInvalid {
        path: name.to_path_buf(),
        reason: e.to_string(),
    })?;

    write_zip(dest, |writer| add_entry(writer, dest, &entry, &mut source))
}

/// Compress every file below `root` into a new ZIP at `dest`
///
/// Entries are named by their path relative to `root` with `/` separators,
/// in file name order. Directories get no entries of their own. Returns the
/// number of uncompressed bytes written.
pub fn compress_dir(root: &Path, dest: &Path) -> Result<u64> {
    if !root.is_dir() {
        return Err(Error::SourceInvalid {
            path: root.to_path_buf(),
            reason: "is not a directory".to_string(),
        });
    }

    write_zip(dest, |writer| {
        let mut written = 0;
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() || entry.path() == dest {
                continue;
            }
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let mut source = File::open(entry.path())?;
            written += add_entry(writer, dest, &name, &mut source)?;
        }
        Ok(written)
    })
}

fn write_zip<F>(dest: &Path, fill: F) -> Result<u64>
where
    F: FnOnce(&mut ZipWriter<File>) -> Result<u64>,
{
    let file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| Error::DestinationInvalid {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut writer = ZipWriter::new(file);
    let result = fill(&mut writer).and_then(|written| {
        writer.finish().map_err(|source| Error::ZipWrite {
            path: dest.to_path_buf(),
            source,
        })?;
        Ok(written)
    });

    match result {
        Ok(written) => {
            debug!(?dest, written, "wrote zip");
            Ok(written)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(dest) {
                warn!(?dest, error = %cleanup, "failed to remove partial zip");
            }
            Err(e)
        }
    }
}

fn add_entry(writer: &mut ZipWriter<File>, dest: &Path, name: &str, source: &mut File) -> Result<u64> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(name, options).map_err(|source| Error::ZipWrite {
        path: dest.to_path_buf(),
        source,
    })?;
    Ok(io::copy(source, writer)?)
}
