//! External archiver adapters
//!
//! Every supported program is described once by a static [`AdapterDescriptor`]:
//! its argument convention, whether it can write into a destination directory,
//! whether it can extract individual entries and which time bound applies.
//! [`invoke`] runs any adapter against an [`ArchiveRequest`](crate::ArchiveRequest).

pub(crate) mod process;
mod shim;

pub use process::ProgramOutput;
pub use shim::{ExtensionLink, ScopedCopy, invoke};
pub(crate) use shim::ensure_destination;

use crate::config::{ProgramsConfig, TimeoutConfig};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// An external program that extracts one or more formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adapter {
    /// Info-ZIP unzip
    Unzip,
    /// hwzip, for Shrunk, Reduced and Imploded entries
    HwZip,
    /// libarchive bsdtar
    BsdTar,
    /// 7-Zip console
    SevenZip,
    /// SEA ARC
    Arc,
    /// ARJ
    Arj,
    /// LHa for UNIX or lhasa
    Lha,
    /// RARLAB unrar
    Unrar,
    /// GNU gzip
    Gzip,
    /// GNOME gcab
    Gcab,
}

/// Whether an adapter honours a list of entry names
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetSupport {
    /// Only the named entries are extracted
    Entries,
    /// The names are meaningless for the format and dropped
    Ignored,
    /// The program always extracts everything, so filtered requests skip it
    Unsupported,
}

/// Which configured bound applies to an adapter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutClass {
    /// Listing and probing
    Lookup,
    /// Maintained extraction tools
    Extract,
    /// DOS-era tools that are slow or hang
    Defunct,
}

impl TimeoutClass {
    /// The configured duration for this class
    pub fn duration(self, timeouts: &TimeoutConfig) -> Duration {
        match self {
            TimeoutClass::Lookup => timeouts.lookup,
            TimeoutClass::Extract => timeouts.extract,
            TimeoutClass::Defunct => timeouts.defunct,
        }
    }
}

/// Static description of one external program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdapterDescriptor {
    /// Default program name, resolved on `PATH`
    pub program_name: &'static str,
    /// The extract command or option that leads the argument list
    pub extract_verb: &'static str,
    /// False for programs that only ever extract into the working directory
    pub supports_destination_flag: bool,
    /// Entry name filtering
    pub targets: TargetSupport,
    /// Time bound class
    pub timeout: TimeoutClass,
    /// Extension the program insists the archive name carries
    pub required_extension: Option<&'static str>,
    /// Success requires something on standard output
    pub expects_stdout: bool,
}

const UNZIP: AdapterDescriptor = AdapterDescriptor {
    program_name: "unzip",
    extract_verb: "-qq",
    supports_destination_flag: true,
    targets: TargetSupport::Entries,
    timeout: TimeoutClass::Extract,
    required_extension: None,
    expects_stdout: false,
};

const HWZIP: AdapterDescriptor = AdapterDescriptor {
    program_name: "hwzip",
    extract_verb: "extract",
    supports_destination_flag: false,
    targets: TargetSupport::Unsupported,
    timeout: TimeoutClass::Defunct,
    required_extension: None,
    expects_stdout: false,
};

const BSDTAR: AdapterDescriptor = AdapterDescriptor {
    program_name: "bsdtar",
    extract_verb: "-x",
    supports_destination_flag: true,
    targets: TargetSupport::Entries,
    timeout: TimeoutClass::Extract,
    required_extension: None,
    expects_stdout: false,
};

const SEVEN_ZIP: AdapterDescriptor = AdapterDescriptor {
    program_name: "7zz",
    extract_verb: "x",
    supports_destination_flag: true,
    targets: TargetSupport::Entries,
    timeout: TimeoutClass::Extract,
    required_extension: None,
    expects_stdout: false,
};

const ARC: AdapterDescriptor = AdapterDescriptor {
    program_name: "arc",
    extract_verb: "x",
    supports_destination_flag: false,
    targets: TargetSupport::Entries,
    timeout: TimeoutClass::Defunct,
    required_extension: None,
    expects_stdout: false,
};

const ARJ: AdapterDescriptor = AdapterDescriptor {
    program_name: "arj",
    extract_verb: "x",
    supports_destination_flag: true,
    targets: TargetSupport::Entries,
    timeout: TimeoutClass::Defunct,
    required_extension: Some(".arj"),
    expects_stdout: false,
};

const LHA: AdapterDescriptor = AdapterDescriptor {
    program_name: "lha",
    extract_verb: "-efiw=",
    supports_destination_flag: true,
    targets: TargetSupport::Entries,
    timeout: TimeoutClass::Defunct,
    required_extension: None,
    expects_stdout: true,
};

const UNRAR: AdapterDescriptor = AdapterDescriptor {
    program_name: "unrar",
    extract_verb: "x",
    supports_destination_flag: true,
    targets: TargetSupport::Entries,
    timeout: TimeoutClass::Extract,
    required_extension: None,
    expects_stdout: false,
};

const GZIP: AdapterDescriptor = AdapterDescriptor {
    program_name: "gzip",
    extract_verb: "--decompress",
    supports_destination_flag: false,
    targets: TargetSupport::Ignored,
    timeout: TimeoutClass::Extract,
    required_extension: Some(".gz"),
    expects_stdout: false,
};

const GCAB: AdapterDescriptor = AdapterDescriptor {
    program_name: "gcab",
    extract_verb: "--extract",
    supports_destination_flag: false,
    targets: TargetSupport::Unsupported,
    timeout: TimeoutClass::Defunct,
    required_extension: None,
    expects_stdout: false,
};

impl Adapter {
    /// Every adapter
    pub const ALL: [Adapter; 10] = [
        Adapter::Unzip,
        Adapter::HwZip,
        Adapter::BsdTar,
        Adapter::SevenZip,
        Adapter::Arc,
        Adapter::Arj,
        Adapter::Lha,
        Adapter::Unrar,
        Adapter::Gzip,
        Adapter::Gcab,
    ];

    /// The static description of this adapter
    pub fn descriptor(self) -> &'static AdapterDescriptor {
        match self {
            Adapter::Unzip => &UNZIP,
            Adapter::HwZip => &HWZIP,
            Adapter::BsdTar => &BSDTAR,
            Adapter::SevenZip => &SEVEN_ZIP,
            Adapter::Arc => &ARC,
            Adapter::Arj => &ARJ,
            Adapter::Lha => &LHA,
            Adapter::Unrar => &UNRAR,
            Adapter::Gzip => &GZIP,
            Adapter::Gcab => &GCAB,
        }
    }

    /// The configured program name or path
    pub fn program(self, programs: &ProgramsConfig) -> &Path {
        match self {
            Adapter::Unzip => &programs.unzip,
            Adapter::HwZip => &programs.hwzip,
            Adapter::BsdTar => &programs.bsdtar,
            Adapter::SevenZip => &programs.sevenzip,
            Adapter::Arc => &programs.arc,
            Adapter::Arj => &programs.arj,
            Adapter::Lha => &programs.lha,
            Adapter::Unrar => &programs.unrar,
            Adapter::Gzip => &programs.gzip,
            Adapter::Gcab => &programs.gcab,
        }
    }

    /// Returns true if a request naming specific entries can use this adapter
    pub fn accepts_targets(self) -> bool {
        self.descriptor().targets != TargetSupport::Unsupported
    }

    /// Build the extraction argument list
    ///
    /// For adapters without a destination flag `source` is the name of the copy
    /// inside `destination`, and `destination` is only used as working directory.
    pub fn extract_args(self, source: &Path, destination: &Path, targets: &[String]) -> Vec<OsString> {
        let verb = self.descriptor().extract_verb;
        let mut args: Vec<OsString> = Vec::new();
        match self {
            Adapter::Unzip => {
                // quieter, no timestamps, allow control characters, overwrite
                args.extend([verb, "-DD", "-^", "-o"].map(OsString::from));
                args.push(source.into());
                args.extend(targets.iter().map(OsString::from));
                args.push("-d".into());
                args.push(destination.into());
            }
            Adapter::HwZip | Adapter::Gcab => {
                args.push(verb.into());
                args.push(source.into());
            }
            Adapter::BsdTar => {
                args.extend([verb, "--file"].map(OsString::from));
                args.push(source.into());
                args.extend(
                    [
                        "--no-acls",
                        "--no-fflags",
                        "--no-safe-writes",
                        "--modification-time",
                        "--no-same-owner",
                        "--no-same-permissions",
                        "--no-xattrs",
                        "--cd",
                    ]
                    .map(OsString::from),
                );
                args.push(destination.into());
                args.extend(targets.iter().map(OsString::from));
            }
            Adapter::SevenZip => {
                args.extend([verb, "-aoa", "-bb0", "-y"].map(OsString::from));
                args.push(prefixed("-o", destination));
                args.push(source.into());
                args.extend(targets.iter().map(OsString::from));
            }
            Adapter::Arc => {
                args.push(verb.into());
                args.push(source.into());
                args.extend(targets.iter().map(OsString::from));
            }
            Adapter::Arj => {
                args.extend([verb, "-y"].map(OsString::from));
                args.push(source.into());
                args.extend(targets.iter().map(OsString::from));
                args.push(prefixed("-ht", destination));
            }
            Adapter::Lha => {
                args.push(prefixed(verb, destination));
                args.push(source.into());
                // lha matches entry names in lower case
                args.extend(targets.iter().map(|t| OsString::from(t.to_lowercase())));
            }
            Adapter::Unrar => {
                args.extend([verb, "-ep", "-c-", "-or", "-y"].map(OsString::from));
                args.push(source.into());
                args.extend(targets.iter().map(OsString::from));
                args.push(prefixed("-op", destination));
            }
            Adapter::Gzip => {
                args.extend([verb, "--name", "--force"].map(OsString::from));
                args.push(source.into());
            }
        }
        args
    }
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().program_name)
    }
}

/// Join an option and a path into one argument, `-oDIR` style
fn prefixed(option: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(option);
    arg.push(path.as_os_str());
    arg
}
