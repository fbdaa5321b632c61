//! Archive fixtures and byte patching helpers

use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::FileOptions;

const LOCAL_HEADER: [u8; 4] = *b"PK\x03\x04";
const CENTRAL_HEADER: [u8; 4] = *b"PK\x01\x02";

/// The three members every sample archive carries
pub const SAMPLE_MEMBERS: [&str; 3] = ["TESTDAT1.TXT", "TESTDAT2.TXT", "TESTDAT3.TXT"];

/// Build a ZIP with the given members, all stored or all deflated
pub fn zip_bytes(names: &[&str], method: CompressionMethod) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for name in names {
        let options = FileOptions::default().compression_method(method);
        writer.start_file(*name, options).expect("Failed to start zip entry");
        writer
            .write_all(format!("contents of {name}\n").as_bytes())
            .expect("Failed to write zip entry");
    }
    writer.finish().expect("Failed to finish zip").into_inner()
}

fn header_positions(data: &[u8], sig: [u8; 4]) -> Vec<usize> {
    data.windows(4)
        .enumerate()
        .filter(|(_, w)| *w == sig)
        .map(|(i, _)| i)
        .collect()
}

fn put_u16(data: &mut [u8], at: usize, value: u16) {
    data[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

/// Rewrite the method code of one entry in both its local and central header
///
/// Modern writers cannot produce Shrunk or Reduced entries, so tests fake them
/// by relabelling stored data. Only the headers matter to the introspector.
pub fn set_entry_method(data: &mut [u8], index: usize, code: u16) {
    let local = header_positions(data, LOCAL_HEADER)[index];
    let central = header_positions(data, CENTRAL_HEADER)[index];
    put_u16(data, local + 8, code);
    put_u16(data, central + 10, code);
}

/// Set the encryption bit on every entry
pub fn set_encrypted(data: &mut [u8]) {
    for local in header_positions(data, LOCAL_HEADER) {
        let flags = u16::from_le_bytes([data[local + 6], data[local + 7]]);
        put_u16(data, local + 6, flags | 1);
    }
    for central in header_positions(data, CENTRAL_HEADER) {
        let flags = u16::from_le_bytes([data[central + 8], data[central + 9]]);
        put_u16(data, central + 8, flags | 1);
    }
}

/// Leading bytes of an ARJ archive: main header with a sane size
pub fn arj_bytes() -> Vec<u8> {
    let mut data = vec![0x60, 0xEA];
    data.extend_from_slice(&40u16.to_le_bytes());
    data.push(34);
    data.resize(64, 0);
    data
}

/// Leading bytes of an ARC archive whose first member is TESTDAT1.TXT
pub fn arc_bytes() -> Vec<u8> {
    let mut data = vec![0x1A, 8];
    data.extend_from_slice(b"TESTDAT1.TXT\0");
    data.resize(64, 0);
    data
}

/// One tar member, header plus padded data, no end-of-archive blocks
pub fn tar_member(name: &str, contents: &[u8]) -> Vec<u8> {
    let mut header = [0u8; 512];
    header[..name.len()].copy_from_slice(name.as_bytes());
    header[100..108].copy_from_slice(b"0000644\0");
    header[108..116].copy_from_slice(b"0000000\0");
    header[116..124].copy_from_slice(b"0000000\0");
    header[124..136].copy_from_slice(format!("{:011o}\0", contents.len()).as_bytes());
    header[136..148].copy_from_slice(b"14750000000\0");
    header[156] = b'0';
    header[257..263].copy_from_slice(b"ustar\0");
    header[263..265].copy_from_slice(b"00");

    header[148..156].copy_from_slice(b"        ");
    let checksum: u32 = header.iter().map(|&b| u32::from(b)).sum();
    header[148..156].copy_from_slice(format!("{checksum:06o}\0 ").as_bytes());

    let mut member = header.to_vec();
    member.extend_from_slice(contents);
    let padding = (512 - contents.len() % 512) % 512;
    member.resize(member.len() + padding, 0);
    member
}

/// A complete tar archive of the sample members
pub fn tar_bytes() -> Vec<u8> {
    let mut data = Vec::new();
    for name in SAMPLE_MEMBERS {
        data.extend(tar_member(name, format!("contents of {name}\n").as_bytes()));
    }
    data.resize(data.len() + 1024, 0);
    data
}

/// Gzip-compress a byte buffer
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("Failed to compress");
    encoder.finish().expect("Failed to finish gzip stream")
}

/// Gzip-compress a byte buffer, recording `name` as the original file name
pub fn gzip_named(name: &str, data: &[u8]) -> Vec<u8> {
    let mut encoder = GzBuilder::new()
        .filename(name)
        .write(Vec::new(), Compression::default());
    encoder.write_all(data).expect("Failed to compress");
    encoder.finish().expect("Failed to finish gzip stream")
}

/// Write `data` to `dir/name`
pub fn write_archive(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("Failed to write archive fixture");
    path
}

/// Create and return `dir/name` as an empty directory
pub fn output_dir(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::create_dir(&path).expect("Failed to create output directory");
    path
}
