//! Fixed byte sequence probes
//!
//! Each probe looks at the leading bytes only. The gzip probe inflates at most
//! one tar header block to tell a tarball from a plain compressed stream.

use crate::types::Format;
use flate2::read::GzDecoder;
use std::io::Read;

const ZIP_LOCAL: &[u8; 4] = b"PK\x03\x04";
const ZIP_EMPTY: &[u8; 4] = b"PK\x05\x06";
const ZIP_SPANNED: &[u8; 4] = b"PK\x07\x08";
const ZIP_SPLIT: &[u8; 4] = b"PK00";
const SEVEN_ZIP: &[u8; 6] = b"7z\xBC\xAF\x27\x1C";
const RAR_V4: &[u8; 7] = b"Rar!\x1A\x07\x00";
const RAR_V5: &[u8; 8] = b"Rar!\x1A\x07\x01\x00";
const XZ: &[u8; 6] = b"\xFD7zXZ\x00";
const ZSTD: &[u8; 4] = b"\x28\xB5\x2F\xFD";
const CABINET: &[u8; 8] = b"MSCF\0\0\0\0";
const GZIP: &[u8; 2] = b"\x1F\x8B";
const ARJ: &[u8; 2] = b"\x60\xEA";

/// Offset of the compression method in a ZIP local file header
const ZIP_METHOD_OFFSET: usize = 8;

/// Offset of the "ustar" magic within a tar header block
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8; 5] = b"ustar";
const TAR_BLOCK: usize = 512;

/// Largest basic header an ARJ archive may declare
const ARJ_MAX_HEADER: u16 = 2600;

/// Highest ARC header type (ARC 6 and PAK extensions included)
const ARC_MAX_METHOD: u8 = 20;
/// ARC stores names in a fixed 13 byte field
const ARC_NAME_LEN: usize = 13;

/// DOS executables count their size in pages of this many bytes
const MZ_PAGE: usize = 512;

/// Classify a byte prefix
///
/// Pure function of the bytes. Returns [`Format::Unknown`] for anything too
/// short or unrecognized.
pub fn classify_bytes(data: &[u8]) -> Format {
    match data {
        [b'P', b'K', 3, 4, ..] => zip_local(data),
        _ if data.starts_with(ZIP_EMPTY) => Format::Zip,
        _ if data.starts_with(ZIP_SPANNED) || data.starts_with(ZIP_SPLIT) => {
            Format::MultiVolumeZip
        }
        _ if data.starts_with(SEVEN_ZIP) => Format::SevenZip,
        _ if data.starts_with(RAR_V4) || data.starts_with(RAR_V5) => Format::Rar,
        _ if data.starts_with(XZ) => Format::Xz,
        _ if data.starts_with(ZSTD) => Format::Zstd,
        _ if data.starts_with(CABINET) => Format::Cabinet,
        [b'B', b'Z', b'h', b'1'..=b'9', ..] => Format::Bzip2,
        _ if data.starts_with(GZIP) => gzip(data),
        _ if is_arj(data) => Format::Arj,
        _ if is_lha(data) => Format::Lha,
        _ if is_tar(data) => Format::Tar,
        _ if is_arc(data) => Format::Arc,
        [b'M', b'Z', ..] if has_embedded_archive(data) => Format::SelfExtracting,
        _ => Format::Unknown,
    }
}

fn zip_local(data: &[u8]) -> Format {
    match read_u16(data, ZIP_METHOD_OFFSET) {
        Some(1..=5) => Format::ZipLegacyMethod,
        _ => Format::Zip,
    }
}

fn gzip(data: &[u8]) -> Format {
    if inflates_to_tar(data) {
        Format::GzipWrappedTar
    } else {
        Format::Gzip
    }
}

/// Inflate up to one tar block and look for the ustar magic
///
/// A truncated stream is fine: whatever inflates before the input runs out is
/// inspected.
fn inflates_to_tar(data: &[u8]) -> bool {
    let mut decoder = GzDecoder::new(data);
    let mut block = [0u8; TAR_BLOCK];
    let mut filled = 0;
    while filled < block.len() {
        match decoder.read(&mut block[filled..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => filled += n,
        }
    }
    is_tar(&block[..filled])
}

fn is_tar(data: &[u8]) -> bool {
    data.get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()) == Some(TAR_MAGIC)
}

fn is_arj(data: &[u8]) -> bool {
    arj_at(data, 0)
}

fn arj_at(data: &[u8], offset: usize) -> bool {
    let Some(rest) = data.get(offset..) else {
        return false;
    };
    if !rest.starts_with(ARJ) {
        return false;
    }
    // basic header size, then the first header size which is never below 30
    match (read_u16(rest, 2), rest.get(4)) {
        (Some(size), Some(&first)) => {
            (1..=ARJ_MAX_HEADER).contains(&size) && first >= 30 && u16::from(first) <= size
        }
        _ => false,
    }
}

fn is_lha(data: &[u8]) -> bool {
    lha_method_at(data, 2)
}

/// `-lh?-` or `-lz?-`
fn lha_method_at(data: &[u8], offset: usize) -> bool {
    matches!(
        data.get(offset..offset + 5),
        Some([b'-', b'l', b'h' | b'z', _, b'-'])
    )
}

fn is_arc(data: &[u8]) -> bool {
    let [0x1A, method, name @ ..] = data else {
        return false;
    };
    if *method == 0 || *method > ARC_MAX_METHOD || name.len() < ARC_NAME_LEN {
        return false;
    }
    let field = &name[..ARC_NAME_LEN];
    match field.iter().position(|&b| b == 0) {
        Some(0) | None => false,
        Some(end) => field[..end].iter().all(|b| b.is_ascii_graphic()),
    }
}

/// Scan an executable for a payload signature after its load image
fn has_embedded_archive(data: &[u8]) -> bool {
    let Some(start) = mz_image_end(data) else {
        return false;
    };
    (start..data.len()).any(|i| {
        let rest = &data[i..];
        rest.starts_with(ZIP_LOCAL)
            || rest.starts_with(b"Rar!\x1A\x07")
            || rest.starts_with(CABINET)
            || arj_at(data, i)
            || lha_method_at(data, i)
    })
}

/// End of the load image a DOS header declares
///
/// `e_cp` counts 512 byte pages including a partial last page of `e_cblp`
/// bytes. A header declaring no pages is not an executable.
fn mz_image_end(data: &[u8]) -> Option<usize> {
    let last_page = usize::from(read_u16(data, 2)?);
    let pages = usize::from(read_u16(data, 4)?);
    match (pages, last_page) {
        (0, _) => None,
        (pages, 0) => Some(pages * MZ_PAGE),
        (pages, last) => Some((pages - 1) * MZ_PAGE + last),
    }
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}
