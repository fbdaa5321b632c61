//! Archive content listing through each format's list command

mod parsers;

use crate::adapters::ExtensionLink;
use crate::adapters::process::{self, Invocation};
use crate::config::{Config, ProgramsConfig};
use crate::error::{Error, Result};
use crate::types::Format;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, warn};

/// A list command and the parser for its output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Lister {
    ZipInfo,
    Unrar,
    BsdTar,
    Gcab,
    Arc,
    Arj,
    Lha,
    SevenZip,
    Gzip,
}

impl Lister {
    /// The lister for a format, `None` when the format cannot be listed
    pub(crate) fn for_format(format: Format) -> Option<Self> {
        match format {
            Format::Zip | Format::ZipLegacyMethod => Some(Self::ZipInfo),
            Format::SevenZip => Some(Self::SevenZip),
            Format::Arc => Some(Self::Arc),
            Format::Arj => Some(Self::Arj),
            Format::Lha => Some(Self::Lha),
            Format::Rar => Some(Self::Unrar),
            Format::Tar | Format::GzipWrappedTar | Format::Bzip2 | Format::Xz | Format::Zstd => {
                Some(Self::BsdTar)
            }
            Format::Cabinet => Some(Self::Gcab),
            Format::Gzip => Some(Self::Gzip),
            Format::MultiVolumeZip | Format::SelfExtracting | Format::Unknown => None,
        }
    }

    fn program(self, programs: &ProgramsConfig) -> &Path {
        match self {
            Self::ZipInfo => &programs.zipinfo,
            Self::Unrar => &programs.unrar,
            Self::BsdTar => &programs.bsdtar,
            Self::Gcab => &programs.gcab,
            Self::Arc => &programs.arc,
            Self::Arj => &programs.arj,
            Self::Lha => &programs.lha,
            Self::SevenZip => &programs.sevenzip,
            Self::Gzip => &programs.gzip,
        }
    }

    fn args(self, source: &Path) -> Vec<OsString> {
        let leading: &[&str] = match self {
            Self::ZipInfo => &["-1"],
            Self::Unrar => &["lb", "-ep", "-c-"],
            Self::BsdTar => &["-tf"],
            Self::Gcab => &["--list"],
            Self::Arc | Self::Arj | Self::SevenZip => &["l"],
            Self::Lha => &["-l"],
            Self::Gzip => &["-t"],
        };
        let mut args: Vec<OsString> = leading.iter().map(OsString::from).collect();
        args.push(source.into());
        args
    }

    /// Parse list output, `None` when the output says this is not an archive
    pub(crate) fn parse(self, source: &Path, output: &str) -> Option<Vec<String>> {
        use parsers::markers;

        let not_archive = match self {
            Self::Arc => markers::not_arc(output),
            Self::Arj => markers::not_arj(output),
            Self::Lha => markers::not_lha(output),
            Self::SevenZip => markers::not_seven_zip(output),
            Self::Gcab => markers::not_cabinet(output),
            Self::Gzip => markers::not_gzip(output),
            Self::ZipInfo | Self::Unrar | Self::BsdTar => output.trim().is_empty(),
        };
        if not_archive {
            return None;
        }

        Some(match self {
            Self::ZipInfo | Self::Unrar | Self::BsdTar | Self::Gcab => parsers::one_per_line(output),
            Self::Arc => parsers::arc_table(output),
            Self::Arj => parsers::arj_table(output),
            Self::Lha => parsers::lha_table(output),
            Self::SevenZip => parsers::seven_zip_table(output),
            Self::Gzip => parsers::gzip_name(source),
        })
    }
}

/// List the entry names of an already classified archive
pub(crate) async fn list(source: &Path, format: Format, config: &Config) -> Result<Vec<String>> {
    let Some(lister) = Lister::for_format(format) else {
        return Err(match format {
            Format::Unknown => Error::NotAnArchive {
                path: source.to_path_buf(),
            },
            _ => Error::FormatNotImplemented {
                path: source.to_path_buf(),
                format,
            },
        });
    };

    let program = lister.program(&config.programs);
    let name = process::display_name(program);

    // arj refuses to read archives without its extension
    let link = if lister == Lister::Arj {
        let source = source.to_path_buf();
        let link = tokio::task::spawn_blocking(move || ExtensionLink::create(&source, ".arj"))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(format!("link task panicked: {e}"))))??;
        Some(link)
    } else {
        None
    };
    let target = link.as_ref().map_or(source, ExtensionLink::path);

    let output = process::run(Invocation {
        program,
        args: lister.args(target),
        working_dir: None,
        timeout: config.timeouts.lookup,
    })
    .await?;
    drop(link);

    let stdout = output.stdout_text();
    if !output.status.success() {
        // zipinfo still lists the readable part of a damaged archive
        if lister == Lister::ZipInfo && !stdout.trim().is_empty() {
            warn!(?source, code = ?output.status.code(), "zipinfo reported errors, using partial listing");
        } else {
            return Err(Error::ProgramError {
                program: name,
                code: output.status.code(),
                stderr: output.stderr_text(),
            });
        }
    }

    let names = lister
        .parse(source, &stdout)
        .ok_or(Error::EmptyOutput { program: name })?;
    debug!(?source, %format, count = names.len(), "listed archive");
    Ok(names)
}
