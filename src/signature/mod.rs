//! Signature classifier
//!
//! Resolves a file to exactly one [`Format`]. Byte probes run first, over a
//! small window and then a wider one. When both fail the `file` content
//! sniffer is asked for a description. Every failure along the way degrades to
//! [`Format::Unknown`] rather than an error.

mod bytes;
mod description;

pub use bytes::classify_bytes;

use crate::adapters::process::{self, Invocation};
use crate::config::{ProgramsConfig, SignatureConfig};
use crate::types::Format;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Classify the first `limit` bytes of a reader
///
/// Read errors and short streams classify whatever was read.
pub fn classify_reader<R: Read>(reader: R, limit: usize) -> Format {
    let mut header = Vec::with_capacity(limit.min(64 * 1024));
    // a partial read is still classified
    let _ = reader.take(limit as u64).read_to_end(&mut header);
    classify_bytes(&header)
}

/// Classify a file on disk
///
/// The `timeout` bounds the `file` probe, the byte probes are not bounded.
pub async fn classify_path(
    path: &Path,
    config: &SignatureConfig,
    programs: &ProgramsConfig,
    timeout: Duration,
) -> Format {
    let header = match read_header(path, config.retry_header_bytes.max(config.header_bytes)).await
    {
        Ok(header) => header,
        Err(e) => {
            debug!(?path, error = %e, "cannot read header");
            return Format::Unknown;
        }
    };

    let first = &header[..header.len().min(config.header_bytes)];
    let format = classify_bytes(first);
    if format != Format::Unknown {
        debug!(?path, %format, window = first.len(), "classified by signature");
        return format;
    }

    if header.len() > first.len() {
        let format = classify_bytes(&header);
        if format != Format::Unknown {
            debug!(?path, %format, window = header.len(), "classified by wider signature window");
            return format;
        }
    }

    if !config.use_file_probe || header.is_empty() {
        return Format::Unknown;
    }

    let format = probe_description(path, &programs.file, timeout).await;
    debug!(?path, %format, "classified by description");
    format
}

async fn read_header(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut header = Vec::with_capacity(limit.min(64 * 1024));
    file.take(limit as u64).read_to_end(&mut header).await?;
    Ok(header)
}

async fn probe_description(path: &Path, file_program: &Path, timeout: Duration) -> Format {
    let invocation = Invocation {
        program: file_program,
        args: vec!["--brief".into(), path.as_os_str().to_owned()],
        working_dir: None,
        timeout,
    };
    match process::run_checked(invocation).await {
        Ok(output) => Format::from_magic_description(&output.stdout_text()),
        Err(e) => {
            debug!(?path, error = %e, "description probe unavailable");
            Format::Unknown
        }
    }
}
