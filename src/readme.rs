//! Pick the entry most likely to describe an archive

use std::path::Path;

/// Candidate ranks, best first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    StemNfo,
    StemTxt,
    AnyNfo,
    FileIdDiz,
    StemDiz,
    AnyTxt,
    AnyDiz,
}

/// The best readme among `entries` for the archive called `archive_name`
///
/// `.nfo`, `.txt` and `.diz` entries are candidates. Entries named after the
/// archive stem rank above others of the same kind, and `FILE_ID.DIZ` sits
/// between the `.nfo` and plain `.txt` files. Matching ignores case and any
/// directory prefix on the entry. Among equal ranks the first entry wins.
///
/// ```
/// use relic_unpack::readme::best_readme;
///
/// let entries = ["DEMO.EXE", "FILE_ID.DIZ", "DEMO.NFO"];
/// assert_eq!(best_readme("DEMO.ZIP", &entries), Some("DEMO.NFO".to_string()));
/// ```
pub fn best_readme<S: AsRef<str>>(archive_name: &str, entries: &[S]) -> Option<String> {
    let stem = stem_of(archive_name);
    let mut best: Option<(Rank, &str)> = None;
    for entry in entries {
        let entry = entry.as_ref();
        let Some(rank) = rank(&stem, entry) else {
            continue;
        };
        if best.is_none_or(|(current, _)| rank < current) {
            best = Some((rank, entry));
        }
    }
    best.map(|(_, entry)| entry.to_string())
}

fn rank(archive_stem: &str, entry: &str) -> Option<Rank> {
    let base = entry.rsplit(['/', '\\']).next().unwrap_or(entry).to_lowercase();
    let (stem, ext) = base.rsplit_once('.')?;
    let own = stem == archive_stem;
    match ext {
        "nfo" if own => Some(Rank::StemNfo),
        "nfo" => Some(Rank::AnyNfo),
        "txt" if own => Some(Rank::StemTxt),
        "txt" => Some(Rank::AnyTxt),
        "diz" if base == "file_id.diz" => Some(Rank::FileIdDiz),
        "diz" if own => Some(Rank::StemDiz),
        "diz" => Some(Rank::AnyDiz),
        _ => None,
    }
}

fn stem_of(archive_name: &str) -> String {
    Path::new(archive_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
