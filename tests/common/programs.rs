//! Throwaway shell scripts standing in for the external archivers

use relic_unpack::Config;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Write an executable `#!/bin/sh` script and return its path
pub fn fake_program(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write fake program");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to mark fake program executable");
    path
}

/// A script that fails with `code` after printing `message` to stderr
pub fn failing_program(dir: &Path, name: &str, code: i32, message: &str) -> PathBuf {
    fake_program(dir, name, &format!("echo '{message}' >&2\nexit {code}"))
}

/// A script that leaves a marker file next to itself and succeeds
///
/// The marker proves whether a step ran at all.
pub fn marker_program(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    let marker = dir.join(format!("{name}.ran"));
    let program = fake_program(dir, name, &format!("touch '{}'", marker.display()));
    (program, marker)
}

/// A script that writes the sample members into its working directory
///
/// Fails unless its second argument names an existing file, the way a tool
/// run against a copied-in archive would.
pub fn cwd_extractor(dir: &Path, name: &str) -> PathBuf {
    fake_program(
        dir,
        name,
        "[ -f \"$2\" ] || exit 3\n\
         for n in 1 2 3; do echo \"contents $n\" > \"TESTDAT$n.TXT\"; done",
    )
}

/// A script that behaves like `gzip --decompress --name`
///
/// Decompresses its last argument in place: writes the name recorded in the
/// stream, here always NOTES.TXT, and deletes the input.
pub fn consuming_gunzip(dir: &Path, name: &str) -> PathBuf {
    fake_program(
        dir,
        name,
        "for last; do :; done\n\
         case \"$last\" in *.gz) ;; *) exit 1 ;; esac\n\
         [ -f \"$last\" ] || exit 1\n\
         echo 'release notes' > NOTES.TXT\n\
         rm -f \"$last\"",
    )
}

/// A script that extracts only the entries named after the archive
///
/// Expects `x ARCHIVE ENTRY...` and creates each entry in its working
/// directory, the way arc does with no destination option.
pub fn entry_extractor(dir: &Path, name: &str) -> PathBuf {
    fake_program(
        dir,
        name,
        "[ \"$1\" = x ] || exit 2\n\
         [ -f \"$2\" ] || exit 3\n\
         shift 2\n\
         for entry; do echo \"contents of $entry\" > \"$entry\"; done",
    )
}

/// Configuration whose programs all point at paths that do not exist
///
/// Tests replace the programs they need. The `file` probe is off so that
/// classification depends on signatures only. Content directories land in
/// `dir/content`.
pub fn offline_config(dir: &Path) -> Config {
    let missing = |name: &str| dir.join(format!("missing-{name}"));
    let mut config = Config::default();
    config.programs.arc = missing("arc");
    config.programs.arj = missing("arj");
    config.programs.bsdtar = missing("bsdtar");
    config.programs.gcab = missing("gcab");
    config.programs.gzip = missing("gzip");
    config.programs.hwzip = missing("hwzip");
    config.programs.lha = missing("lha");
    config.programs.unrar = missing("unrar");
    config.programs.unzip = missing("unzip");
    config.programs.sevenzip = missing("7zz");
    config.programs.zipinfo = missing("zipinfo");
    config.programs.file = missing("file");
    config.signature.use_file_probe = false;
    config.content_dir = dir.join("content");
    config.timeouts.extract = Duration::from_secs(10);
    config.timeouts.defunct = Duration::from_secs(10);
    config
}
