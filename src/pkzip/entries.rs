//! Direct reader for ZIP entry headers
//!
//! ## Layout
//!
//! The end of central directory record (EOCD) sits in the last 64 KiB of the
//! file and points at the central directory:
//! - 4 bytes: signature `PK\x05\x06`
//! - 6 bytes: disk numbers and entries on this disk
//! - 2 bytes: total entries
//! - 4 bytes: central directory size
//! - 4 bytes: central directory offset
//! - 2 bytes: comment length
//!
//! Each central directory record (`PK\x01\x02`) carries the general purpose
//! flags at +8, the method at +10 and the name lengths at +28. When the EOCD is
//! missing or points at garbage, the local headers (`PK\x03\x04`) are walked
//! from the start of the file instead, flags at +6 and method at +8.

use super::method::CompressionMethod;
use crate::error::{Error, Result};
use crate::types::Format;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOCAL_SIG: u32 = 0x0403_4b50;
const CENTRAL_SIG: u32 = 0x0201_4b50;
const EOCD_SIG: u32 = 0x0605_4b50;

const LOCAL_HEADER_LEN: usize = 30;
const CENTRAL_HEADER_LEN: usize = 46;
const EOCD_LEN: usize = 22;
const MAX_COMMENT_LEN: usize = u16::MAX as usize;

/// General purpose flag: entry is encrypted
const FLAG_ENCRYPTED: u16 = 1;
/// General purpose flag: sizes follow the data in a descriptor
const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// EOCD entry count that defers to a ZIP64 record
const ZIP64_ENTRIES: u16 = u16::MAX;

/// One entry header, as stored in the container
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZipEntryRecord {
    /// Entry name, decoded lossily
    pub name: String,
    /// Raw 16-bit compression method code
    pub method_code: u16,
    /// Raw general purpose bit flags
    pub flags: u16,
}

impl ZipEntryRecord {
    /// The compression method of the entry
    pub fn method(&self) -> CompressionMethod {
        CompressionMethod::from_code(self.method_code)
    }

    /// Returns true if the entry carries the encryption flag
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}

/// Read every entry record, in archive order
///
/// Encrypted entries are returned like any other; see [`methods`] for the
/// call that rejects them.
pub fn entries(path: &Path) -> Result<Vec<ZipEntryRecord>> {
    let file = File::open(path)?;
    read_entries(&mut BufReader::new(file), path)
}

/// Compression method of every entry, in archive order
///
/// Fails with [`Error::PasswordProtected`] if any entry is encrypted.
pub fn methods(path: &Path) -> Result<Vec<CompressionMethod>> {
    let records = entries(path)?;
    methods_of(&records, path)
}

/// Returns true if deflate and store only tooling can extract every entry
pub fn is_usable_by_standard_tooling(path: &Path) -> Result<bool> {
    Ok(methods(path)?.iter().all(|m| m.is_standard()))
}

pub(crate) fn methods_of(records: &[ZipEntryRecord], path: &Path) -> Result<Vec<CompressionMethod>> {
    if records.iter().any(ZipEntryRecord::is_encrypted) {
        return Err(Error::PasswordProtected {
            archive: path.to_path_buf(),
            format: Format::Zip,
        });
    }
    Ok(records.iter().map(ZipEntryRecord::method).collect())
}

/// Parse entry records from any seekable source
///
/// `path` only labels errors.
pub(crate) fn read_entries<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<Vec<ZipEntryRecord>> {
    let len = reader.seek(SeekFrom::End(0))?;

    let eocd = find_eocd(reader, len)?;
    if let Some(eocd) = &eocd {
        if let Some(records) = central_directory(reader, eocd)? {
            return Ok(records);
        }
        debug!(?path, "central directory is inconsistent, walking local headers");
    }

    let records = walk_local_headers(reader, len)?;
    if records.is_empty() {
        let reason = match eocd {
            Some(_) => "central directory is inconsistent and no local file header was found",
            None => "no end of central directory record or local file header",
        };
        return Err(invalid(path, reason));
    }
    Ok(records)
}

struct EndOfCentralDirectory {
    entries: u16,
    size: u32,
    offset: u32,
    position: u64,
}

fn find_eocd<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<Option<EndOfCentralDirectory>> {
    let window = len.min((EOCD_LEN + MAX_COMMENT_LEN) as u64);
    if (window as usize) < EOCD_LEN {
        return Ok(None);
    }
    let start = len - window;
    reader.seek(SeekFrom::Start(start))?;
    let mut tail = vec![0u8; window as usize];
    reader.read_exact(&mut tail)?;

    for pos in (0..=tail.len() - EOCD_LEN).rev() {
        if le_u32(&tail, pos) != Some(EOCD_SIG) {
            continue;
        }
        let (Some(entries), Some(size), Some(offset), Some(comment_len)) = (
            le_u16(&tail, pos + 10),
            le_u32(&tail, pos + 12),
            le_u32(&tail, pos + 16),
            le_u16(&tail, pos + 20),
        ) else {
            continue;
        };
        if pos + EOCD_LEN + usize::from(comment_len) > tail.len() {
            continue;
        }
        return Ok(Some(EndOfCentralDirectory {
            entries,
            size,
            offset,
            position: start + pos as u64,
        }));
    }
    Ok(None)
}

/// Read the central directory the EOCD points at
///
/// Self-extracting stubs shift every offset by the stub length, so the
/// directory is also looked for directly in front of the EOCD.
fn central_directory<R: Read + Seek>(
    reader: &mut R,
    eocd: &EndOfCentralDirectory,
) -> io::Result<Option<Vec<ZipEntryRecord>>> {
    let size = u64::from(eocd.size);
    if size > eocd.position {
        return Ok(None);
    }
    let declared = u64::from(eocd.offset);
    let adjacent = eocd.position - size;

    for start in [declared, adjacent] {
        if start + size > eocd.position {
            continue;
        }
        reader.seek(SeekFrom::Start(start))?;
        let mut directory = vec![0u8; size as usize];
        reader.read_exact(&mut directory)?;
        if let Some(records) = parse_central_directory(&directory, eocd.entries) {
            return Ok(Some(records));
        }
        if declared == adjacent {
            break;
        }
    }
    Ok(None)
}

fn parse_central_directory(data: &[u8], expected: u16) -> Option<Vec<ZipEntryRecord>> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        if le_u32(data, pos)? != CENTRAL_SIG {
            return None;
        }
        let flags = le_u16(data, pos + 8)?;
        let method_code = le_u16(data, pos + 10)?;
        let name_len = usize::from(le_u16(data, pos + 28)?);
        let extra_len = usize::from(le_u16(data, pos + 30)?);
        let comment_len = usize::from(le_u16(data, pos + 32)?);

        let name_start = pos + CENTRAL_HEADER_LEN;
        let name = data.get(name_start..name_start + name_len)?;
        records.push(ZipEntryRecord {
            name: String::from_utf8_lossy(name).into_owned(),
            method_code,
            flags,
        });
        pos = name_start + name_len + extra_len + comment_len;
    }

    if expected != ZIP64_ENTRIES && records.len() != usize::from(expected) {
        return None;
    }
    Some(records)
}

fn walk_local_headers<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<Vec<ZipEntryRecord>> {
    let mut records = Vec::new();
    let mut offset = 0u64;
    let mut header = [0u8; LOCAL_HEADER_LEN];

    while offset + LOCAL_HEADER_LEN as u64 <= len {
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(&mut header)?;
        let (Some(LOCAL_SIG), Some(flags), Some(method_code), Some(compressed), Some(name_len), Some(extra_len)) = (
            le_u32(&header, 0),
            le_u16(&header, 6),
            le_u16(&header, 8),
            le_u32(&header, 18),
            le_u16(&header, 26),
            le_u16(&header, 28),
        ) else {
            break;
        };

        let name_start = offset + LOCAL_HEADER_LEN as u64;
        if name_start + u64::from(name_len) > len {
            break;
        }
        let mut name = vec![0u8; usize::from(name_len)];
        reader.read_exact(&mut name)?;
        records.push(ZipEntryRecord {
            name: String::from_utf8_lossy(&name).into_owned(),
            method_code,
            flags,
        });

        // the size lives in a trailing descriptor, the next header cannot be located
        if flags & FLAG_DATA_DESCRIPTOR != 0 && compressed == 0 {
            break;
        }
        offset = name_start + u64::from(name_len) + u64::from(extra_len) + u64::from(compressed);
    }
    Ok(records)
}

fn invalid(path: &Path, reason: &str) -> Error {
    Error::InvalidZip {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
}

fn le_u16(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn le_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::CompressionMethod as ZipMethod;
    use zip::write::FileOptions;

    fn build_zip(entries: &[(&str, ZipMethod)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, method) in entries {
            let options = FileOptions::default().compression_method(*method);
            writer.start_file(*name, options).unwrap();
            writer
                .write_all(format!("contents of {name}\n").as_bytes())
                .unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// Overwrite a u16 field in every header carrying `sig`
    fn patch_u16(data: &mut [u8], sig: u32, field: usize, value: u16) {
        let sig = sig.to_le_bytes();
        let positions: Vec<usize> = data
            .windows(4)
            .enumerate()
            .filter(|(_, w)| *w == sig)
            .map(|(i, _)| i)
            .collect();
        for pos in positions {
            data[pos + field..pos + field + 2].copy_from_slice(&value.to_le_bytes());
        }
    }

    fn parse(data: Vec<u8>) -> Result<Vec<ZipEntryRecord>> {
        read_entries(&mut Cursor::new(data), Path::new("test.zip"))
    }

    #[test]
    fn methods_follow_archive_order() {
        let data = build_zip(&[
            ("TESTDAT1.TXT", ZipMethod::Stored),
            ("TESTDAT2.TXT", ZipMethod::Deflated),
        ]);
        let records = parse(data).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["TESTDAT1.TXT", "TESTDAT2.TXT"]);

        let methods = methods_of(&records, Path::new("test.zip")).unwrap();
        assert_eq!(
            methods,
            vec![CompressionMethod::Stored, CompressionMethod::Deflated]
        );
        assert!(methods.iter().all(|m| m.is_standard()));
    }

    #[test]
    fn shrunk_entry_is_reported() {
        let mut data = build_zip(&[
            ("TESTDAT1.TXT", ZipMethod::Stored),
            ("TESTDAT2.TXT", ZipMethod::Stored),
        ]);
        // central directory method at +10, local header method at +8
        patch_u16(&mut data, CENTRAL_SIG, 10, 1);
        patch_u16(&mut data, LOCAL_SIG, 8, 1);

        let records = parse(data).unwrap();
        let methods = methods_of(&records, Path::new("test.zip")).unwrap();
        assert_eq!(
            methods,
            vec![CompressionMethod::Shrunk, CompressionMethod::Shrunk]
        );
        assert!(!methods.iter().all(|m| m.is_standard()));
    }

    #[test]
    fn encrypted_entry_fails_the_whole_call() {
        let mut data = build_zip(&[
            ("PLAIN.TXT", ZipMethod::Stored),
            ("SECRET.TXT", ZipMethod::Stored),
        ]);
        patch_u16(&mut data, CENTRAL_SIG, 8, FLAG_ENCRYPTED);

        let records = parse(data).unwrap();
        assert!(records.iter().all(ZipEntryRecord::is_encrypted));
        let err = methods_of(&records, Path::new("test.zip")).unwrap_err();
        assert!(matches!(err, Error::PasswordProtected { .. }));
    }

    #[test]
    fn missing_eocd_falls_back_to_local_headers() {
        let data = build_zip(&[
            ("A.TXT", ZipMethod::Deflated),
            ("B.TXT", ZipMethod::Stored),
        ]);
        let truncated = data[..data.len() - EOCD_LEN].to_vec();
        let records = parse(truncated).unwrap();
        let methods: Vec<CompressionMethod> = records.iter().map(ZipEntryRecord::method).collect();
        assert_eq!(
            methods,
            vec![CompressionMethod::Deflated, CompressionMethod::Stored]
        );
    }

    #[test]
    fn stub_prefix_shifts_the_directory() {
        let mut data = b"MZ".to_vec();
        data.resize(512, 0x90);
        data.extend(build_zip(&[("README.TXT", ZipMethod::Stored)]));

        let records = parse(data).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "README.TXT");
    }

    #[test]
    fn empty_archive_has_no_entries() {
        let data = build_zip(&[]);
        assert!(parse(data).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_invalid() {
        let err = parse(b"this is not a zip file at all".to_vec()).unwrap_err();
        assert!(matches!(err, Error::InvalidZip { .. }), "{err:?}");
        assert!(matches!(parse(Vec::new()).unwrap_err(), Error::InvalidZip { .. }));
    }

    #[test]
    fn path_helpers_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("APP.ZIP");
        std::fs::write(
            &path,
            build_zip(&[
                ("FILE_ID.DIZ", ZipMethod::Stored),
                ("APP.EXE", ZipMethod::Deflated),
            ]),
        )
        .unwrap();

        assert_eq!(entries(&path).unwrap().len(), 2);
        assert!(is_usable_by_standard_tooling(&path).unwrap());
        assert!(matches!(
            methods(&dir.path().join("missing.zip")).unwrap_err(),
            Error::Io(_)
        ));
    }
}
