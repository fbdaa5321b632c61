//! Configuration types for relic-unpack

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration passed to [`Extractor::new`](crate::Extractor::new)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Subprocess time bounds
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Names or paths of the external programs
    #[serde(default)]
    pub programs: ProgramsConfig,

    /// Signature classifier settings
    #[serde(default)]
    pub signature: SignatureConfig,

    /// Largest source unpacked into a content directory, in bytes (default: 150 MiB)
    #[serde(default = "default_max_extract_bytes")]
    pub max_extract_bytes: u64,

    /// Parent of the per-source content directories (default: `relic-unpack`
    /// under the system temporary directory)
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::default(),
            programs: ProgramsConfig::default(),
            signature: SignatureConfig::default(),
            max_extract_bytes: default_max_extract_bytes(),
            content_dir: default_content_dir(),
        }
    }
}

impl Config {
    /// Check the settings that cannot be expressed by types alone
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("timeouts.lookup", self.timeouts.lookup),
            ("timeouts.extract", self.timeouts.extract),
            ("timeouts.defunct", self.timeouts.defunct),
        ] {
            if value.is_zero() {
                return Err(Error::Config {
                    message: format!("{key} must be greater than zero"),
                    key: Some(key.to_string()),
                });
            }
        }

        if self.signature.header_bytes == 0 {
            return Err(Error::Config {
                message: "signature.header_bytes must be greater than zero".to_string(),
                key: Some("signature.header_bytes".to_string()),
            });
        }

        if self.signature.retry_header_bytes < self.signature.header_bytes {
            return Err(Error::Config {
                message: format!(
                    "signature.retry_header_bytes ({}) is smaller than signature.header_bytes ({})",
                    self.signature.retry_header_bytes, self.signature.header_bytes
                ),
                key: Some("signature.retry_header_bytes".to_string()),
            });
        }

        Ok(())
    }
}

/// Time bounds per operation class
///
/// Serialized as whole milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Listing, probing and integrity tests (default: 2 seconds)
    #[serde(default = "default_lookup", with = "duration_millis_serde")]
    pub lookup: Duration,

    /// Extraction with maintained tools (default: 15 seconds)
    #[serde(default = "default_extract", with = "duration_millis_serde")]
    pub extract: Duration,

    /// Extraction with DOS-era tools that are slow or prone to hang (default: 5 seconds)
    #[serde(default = "default_defunct", with = "duration_millis_serde")]
    pub defunct: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            lookup: default_lookup(),
            extract: default_extract(),
            defunct: default_defunct(),
        }
    }
}

/// External program names or paths
///
/// A bare name is resolved on `PATH` when the program is invoked, an explicit
/// path is used as given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramsConfig {
    /// ARC by SEA
    #[serde(default = "default_arc")]
    pub arc: PathBuf,
    /// ARJ32 or the open source arj
    #[serde(default = "default_arj")]
    pub arj: PathBuf,
    /// libarchive tar
    #[serde(default = "default_bsdtar")]
    pub bsdtar: PathBuf,
    /// GNOME cabinet tool
    #[serde(default = "default_gcab")]
    pub gcab: PathBuf,
    /// GNU gzip
    #[serde(default = "default_gzip")]
    pub gzip: PathBuf,
    /// hwzip, which handles Shrunk, Reduced and Imploded entries
    #[serde(default = "default_hwzip")]
    pub hwzip: PathBuf,
    /// LHa for UNIX
    #[serde(default = "default_lha")]
    pub lha: PathBuf,
    /// RARLAB unrar
    #[serde(default = "default_unrar")]
    pub unrar: PathBuf,
    /// Info-ZIP unzip
    #[serde(default = "default_unzip")]
    pub unzip: PathBuf,
    /// 7-Zip console
    #[serde(default = "default_sevenzip")]
    pub sevenzip: PathBuf,
    /// Info-ZIP zipinfo
    #[serde(default = "default_zipinfo")]
    pub zipinfo: PathBuf,
    /// file(1) content sniffer
    #[serde(default = "default_file")]
    pub file: PathBuf,
}

impl Default for ProgramsConfig {
    fn default() -> Self {
        Self {
            arc: default_arc(),
            arj: default_arj(),
            bsdtar: default_bsdtar(),
            gcab: default_gcab(),
            gzip: default_gzip(),
            hwzip: default_hwzip(),
            lha: default_lha(),
            unrar: default_unrar(),
            unzip: default_unzip(),
            sevenzip: default_sevenzip(),
            zipinfo: default_zipinfo(),
            file: default_file(),
        }
    }
}

/// Signature classifier settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureConfig {
    /// Bytes read for the first probe (default: 4096)
    #[serde(default = "default_header_bytes")]
    pub header_bytes: usize,

    /// Bytes read when the first probe finds nothing (default: 65536)
    #[serde(default = "default_retry_header_bytes")]
    pub retry_header_bytes: usize,

    /// Ask file(1) for a description when the byte probes fail (default: true)
    #[serde(default = "default_true")]
    pub use_file_probe: bool,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            header_bytes: default_header_bytes(),
            retry_header_bytes: default_retry_header_bytes(),
            use_file_probe: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_extract_bytes() -> u64 {
    150 * 1024 * 1024
}

fn default_content_dir() -> PathBuf {
    std::env::temp_dir().join("relic-unpack")
}

fn default_lookup() -> Duration {
    Duration::from_secs(2)
}

fn default_extract() -> Duration {
    Duration::from_secs(15)
}

fn default_defunct() -> Duration {
    Duration::from_secs(5)
}

fn default_header_bytes() -> usize {
    4096
}

fn default_retry_header_bytes() -> usize {
    65536
}

fn default_arc() -> PathBuf {
    PathBuf::from("arc")
}

fn default_arj() -> PathBuf {
    PathBuf::from("arj")
}

fn default_bsdtar() -> PathBuf {
    PathBuf::from("bsdtar")
}

fn default_gcab() -> PathBuf {
    PathBuf::from("gcab")
}

fn default_gzip() -> PathBuf {
    PathBuf::from("gzip")
}

fn default_hwzip() -> PathBuf {
    PathBuf::from("hwzip")
}

fn default_lha() -> PathBuf {
    PathBuf::from("lha")
}

fn default_unrar() -> PathBuf {
    PathBuf::from("unrar")
}

fn default_unzip() -> PathBuf {
    PathBuf::from("unzip")
}

fn default_sevenzip() -> PathBuf {
    PathBuf::from("7zz")
}

fn default_zipinfo() -> PathBuf {
    PathBuf::from("zipinfo")
}

fn default_file() -> PathBuf {
    PathBuf::from("file")
}

// Duration serialization helper
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
