use super::exit_status::ExitDiagnostic;
use crate::adapters::process::{self, Invocation};
use crate::config::Config;
use crate::error::{Error, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Test a ZIP archive's integrity with `unzip -t`
///
/// Normal and warning statuses pass and are returned. Any other status fails
/// with [`Error::ProgramError`] carrying the diagnostic description.
pub async fn test_archive(path: &Path, config: &Config) -> Result<ExitDiagnostic> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| Error::SourceInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if metadata.is_dir() {
        return Err(Error::SourceInvalid {
            path: path.to_path_buf(),
            reason: "is a directory".to_string(),
        });
    }
    if metadata.len() == 0 {
        return Err(Error::SourceInvalid {
            path: path.to_path_buf(),
            reason: "is an empty file".to_string(),
        });
    }

    let program = &config.programs.unzip;
    let output = process::run(Invocation {
        program,
        args: vec!["-t".into(), path.as_os_str().to_owned()],
        working_dir: None,
        timeout: config.timeouts.lookup,
    })
    .await?;

    let diagnostic = ExitDiagnostic::from_status(output.status);
    if diagnostic.is_benign() {
        debug!(?path, %diagnostic, "integrity test passed");
        return Ok(diagnostic);
    }

    warn!(?path, %diagnostic, "integrity test failed");
    let stderr = output.stderr_text();
    Err(Error::ProgramError {
        program: process::display_name(program),
        code: output.status.code(),
        stderr: if stderr.is_empty() {
            diagnostic.to_string()
        } else {
            format!("{diagnostic}: {stderr}")
        },
    })
}
