use std::fmt;
use std::process::ExitStatus;

/// Diagnostic reading of an Info-ZIP style exit status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExitDiagnostic {
    /// 0
    Normal,
    /// 1, processing completed with warnings
    Warning,
    /// 2, generic error in the zipfile format
    ArchiveStructureError,
    /// 3, severe error in the zipfile format
    SevereArchiveError,
    /// 4 to 8
    InsufficientMemory,
    /// 81 and 82, unsupported method or bad decryption
    DecompressionFailure,
    /// 51
    PrematureEndOfArchive,
    /// 9
    ArchiveNotFound,
    /// 11
    NoMatchingEntries,
    /// 50
    DiskFull,
    /// 80, or terminated by a signal
    UserAbort,
    /// 10
    InvalidParameters,
    /// Anything else
    UnknownStatus,
}

impl ExitDiagnostic {
    /// Classify a termination code
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Normal,
            1 => Self::Warning,
            2 => Self::ArchiveStructureError,
            3 => Self::SevereArchiveError,
            4..=8 => Self::InsufficientMemory,
            9 => Self::ArchiveNotFound,
            10 => Self::InvalidParameters,
            11 => Self::NoMatchingEntries,
            50 => Self::DiskFull,
            51 => Self::PrematureEndOfArchive,
            80 => Self::UserAbort,
            81 | 82 => Self::DecompressionFailure,
            _ => Self::UnknownStatus,
        }
    }

    /// Classify a process status; a signal termination reads as an abort
    pub fn from_status(status: ExitStatus) -> Self {
        status.code().map_or(Self::UserAbort, Self::from_code)
    }

    /// Returns true if the archive was processed despite a possible warning
    pub fn is_benign(self) -> bool {
        matches!(self, Self::Normal | Self::Warning)
    }

    /// Human readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::Normal => "Normal, no errors or warnings detected",
            Self::Warning => "Warnings were encountered but processing completed",
            Self::ArchiveStructureError => "A generic error in the zipfile format was detected",
            Self::SevereArchiveError => "A severe error in the zipfile format was detected",
            Self::InsufficientMemory => "Insufficient memory",
            Self::DecompressionFailure => {
                "Unsupported compression method or bad decryption password"
            }
            Self::PrematureEndOfArchive => "The end of the zipfile was encountered prematurely",
            Self::ArchiveNotFound => "Zip file not found",
            Self::NoMatchingEntries => "No matching files were found",
            Self::DiskFull => "The disk is full",
            Self::UserAbort => "Processing was aborted",
            Self::InvalidParameters => "Invalid options were specified on the command line",
            Self::UnknownStatus => "Unknown exit status",
        }
    }
}

impl fmt::Display for ExitDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_codes() {
        assert_eq!(ExitDiagnostic::from_code(0), ExitDiagnostic::Normal);
        assert_eq!(ExitDiagnostic::from_code(1), ExitDiagnostic::Warning);
        assert_eq!(ExitDiagnostic::from_code(2), ExitDiagnostic::ArchiveStructureError);
        assert_eq!(ExitDiagnostic::from_code(3), ExitDiagnostic::SevereArchiveError);
        for code in 4..=8 {
            assert_eq!(ExitDiagnostic::from_code(code), ExitDiagnostic::InsufficientMemory);
        }
        assert_eq!(ExitDiagnostic::from_code(9), ExitDiagnostic::ArchiveNotFound);
        assert_eq!(ExitDiagnostic::from_code(10), ExitDiagnostic::InvalidParameters);
        assert_eq!(ExitDiagnostic::from_code(11), ExitDiagnostic::NoMatchingEntries);
        assert_eq!(ExitDiagnostic::from_code(50), ExitDiagnostic::DiskFull);
        assert_eq!(ExitDiagnostic::from_code(51), ExitDiagnostic::PrematureEndOfArchive);
        assert_eq!(ExitDiagnostic::from_code(80), ExitDiagnostic::UserAbort);
        assert_eq!(ExitDiagnostic::from_code(81), ExitDiagnostic::DecompressionFailure);
        assert_eq!(ExitDiagnostic::from_code(82), ExitDiagnostic::DecompressionFailure);
    }

    #[test]
    fn unrecognized_codes_are_unknown() {
        for code in [-1, 12, 49, 52, 79, 83, 255] {
            assert_eq!(ExitDiagnostic::from_code(code), ExitDiagnostic::UnknownStatus);
        }
    }

    #[test]
    fn only_normal_and_warning_are_benign() {
        assert!(ExitDiagnostic::Normal.is_benign());
        assert!(ExitDiagnostic::Warning.is_benign());
        assert!(!ExitDiagnostic::ArchiveNotFound.is_benign());
        assert!(!ExitDiagnostic::UnknownStatus.is_benign());
    }

    #[test]
    fn archive_not_found_description() {
        assert_eq!(ExitDiagnostic::from_code(9).to_string(), "Zip file not found");
    }

    #[cfg(unix)]
    #[test]
    fn status_from_a_real_process() {
        let status = std::process::Command::new("sh")
            .args(["-c", "exit 9"])
            .status()
            .unwrap();
        assert_eq!(ExitDiagnostic::from_status(status), ExitDiagnostic::ArchiveNotFound);

        let killed = std::process::Command::new("sh")
            .args(["-c", "kill -9 $$"])
            .status()
            .unwrap();
        assert_eq!(ExitDiagnostic::from_status(killed), ExitDiagnostic::UserAbort);
    }

    #[ignore] // Requires unzip in PATH
    #[test]
    fn unzip_reports_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let status = std::process::Command::new("unzip")
            .args(["-T", "archive.zip"])
            .current_dir(dir.path())
            .status()
            .unwrap();
        assert_eq!(ExitDiagnostic::from_status(status), ExitDiagnostic::ArchiveNotFound);
    }
}
