//! Parsers for archiver list output
//!
//! Each parser takes the whole standard output of one program's list command
//! and returns the entry names in order. Blank names are dropped.

use std::path::Path;

/// One entry name per line: zipinfo `-1`, unrar `lb`, bsdtar `-tf`, gcab `--list`
pub(crate) fn one_per_line(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// ARC `l` output
///
/// ```text
/// Name          Length    Date
/// ============  ========  =========
/// TESTDAT1.TXT      2009  14 Feb 25
///         ====  ========
/// Total      1      2009
/// ```
pub(crate) fn arc_table(output: &str) -> Vec<String> {
    const HEADER: &str = "Name          Length    Date";
    const RULE: &str = "============  ========  =========";
    const FOOTER: &str = "====  ========";

    let mut names = Vec::new();
    let mut in_table = false;
    for line in output.lines() {
        if line.starts_with(HEADER) || line.starts_with(RULE) {
            in_table = true;
            continue;
        }
        if line.trim().starts_with(FOOTER) {
            break;
        }
        if in_table {
            push_name(&mut names, fixed_name(line));
        }
    }
    names
}

/// ARJ `l` output
///
/// ```text
/// Filename       Original Compressed Ratio DateTime modified Attributes/GUA BPMGS
/// ------------ ---------- ---------- ----- ----------------- -------------- -----
/// TESTDAT1.TXT       2009        889 0.443 25-02-14 13:21:10                  1
/// ------------ ---------- ---------- -----
///      1 files       2009        889 0.443
/// ```
pub(crate) fn arj_table(output: &str) -> Vec<String> {
    ruled_table(
        output,
        "Filename       Original",
        "------------ ----------",
        fixed_name,
    )
}

/// LHA `-l` output, the name starts after the stamp column
///
/// ```text
/// PERMSSN    UID  GID      SIZE  RATIO     STAMP           NAME
/// ---------- ----------- ------- ------ ------------ --------------------
/// [generic]                 2009  48.8% Feb 14 13:21 testdat1.txt
/// ---------- ----------- ------- ------ ------------ --------------------
///  Total         1 file    2009  48.8% Feb 14 07:19
/// ```
pub(crate) fn lha_table(output: &str) -> Vec<String> {
    const NAME_COLUMN: usize = "---------- ----------- ------- ------ ------------ ".len();
    ruled_table(
        output,
        "PERMSSN    UID  GID",
        "---------- -----------",
        |line| line.get(NAME_COLUMN..).unwrap_or_default(),
    )
}

/// 7-Zip `l` output, the name starts after the compressed column
///
/// ```text
///    Date      Time    Attr         Size   Compressed  Name
/// ------------------- ----- ------------ ------------  ------------------------
/// 2025-02-15 00:21:10 ....A         2009        20465  TESTDAT1.TXT
/// ------------------- ----- ------------ ------------  ------------------------
/// ```
pub(crate) fn seven_zip_table(output: &str) -> Vec<String> {
    const NAME_COLUMN: usize = "------------------- ----- ------------ ------------  ".len();
    ruled_table(
        output,
        "   Date      Time  ",
        "-------------------",
        |line| line.get(NAME_COLUMN..).unwrap_or_default(),
    )
}

/// The single member of a gzip stream: the archive name minus its last suffix
pub(crate) fn gzip_name(source: &Path) -> Vec<String> {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match base.rfind('.') {
        Some(dot) => base[..dot].to_string(),
        None => base,
    };
    let mut names = Vec::new();
    push_name(&mut names, &stem);
    names
}

/// Rows between the first rule and the closing rule
///
/// Lines ahead of the header are preamble. The closing rule is the third
/// header or rule line seen.
fn ruled_table(output: &str, header: &str, rule: &str, column: impl Fn(&str) -> &str) -> Vec<String> {
    const TABLE_END: usize = 2;

    let mut names = Vec::new();
    let mut skipped = 0;
    for line in output.lines() {
        if line.starts_with(header) || line.starts_with(rule) {
            skipped += 1;
            continue;
        }
        if skipped == 0 {
            continue;
        }
        if skipped > TABLE_END {
            break;
        }
        push_name(&mut names, column(line));
    }
    names
}

/// DOS 8.3 names fill a fixed 12 character column
fn fixed_name(line: &str) -> &str {
    line.get(..12).unwrap_or(line)
}

fn push_name(names: &mut Vec<String>, name: &str) {
    let name = name.trim();
    if !name.is_empty() {
        names.push(name.to_string());
    }
}

/// Markers that mean the program did not recognise the archive
pub(crate) mod markers {
    fn squeezed(output: &str) -> String {
        output.replace("  ", "")
    }

    pub(crate) fn not_arc(output: &str) -> bool {
        output.trim().is_empty() || squeezed(output).contains("has a bad header")
    }

    pub(crate) fn not_arj(output: &str) -> bool {
        output.trim().is_empty() || output.contains("is not an ARJ archive")
    }

    pub(crate) fn not_lha(output: &str) -> bool {
        output.trim().is_empty() || squeezed(output).contains("Total 0 files 0")
    }

    pub(crate) fn not_seven_zip(output: &str) -> bool {
        !output.contains("Type = 7z")
    }

    pub(crate) fn not_cabinet(output: &str) -> bool {
        output.trim().is_empty() || output.contains("The input is not of cabinet format")
    }

    /// `gzip -t` is silent on success
    pub(crate) fn not_gzip(output: &str) -> bool {
        !output.trim().is_empty()
    }
}
