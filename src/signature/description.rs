use crate::types::Format;

/// Lower-cased first field of a `file --brief` description and the format it names
const DESCRIPTIONS: &[(&str, Format)] = &[
    ("arc archive data", Format::Arc),
    ("arj archive data", Format::Arj),
    ("bzip2 compressed data", Format::Bzip2),
    ("gzip compressed data", Format::Gzip),
    ("rar archive data", Format::Rar),
    ("posix tar archive", Format::Tar),
    ("zip archive data", Format::Zip),
    ("7-zip archive data", Format::SevenZip),
    ("xz compressed data", Format::Xz),
    ("zstandard compressed data", Format::Zstd),
    ("microsoft cabinet archive data", Format::Cabinet),
];

impl Format {
    /// Map a textual type description, as printed by `file --brief`
    ///
    /// Only the first comma separated field is considered. LHA is recognized in
    /// both of its historical spellings, `LHarc ...` and `LHa [version] archive data`.
    pub fn from_magic_description(description: &str) -> Format {
        let first = description
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if is_lha_description(&first) {
            return Format::Lha;
        }

        DESCRIPTIONS
            .iter()
            .find(|(magic, _)| *magic == first)
            .map_or(Format::Unknown, |&(_, format)| format)
    }
}

fn is_lha_description(first: &str) -> bool {
    let words: Vec<&str> = first.split_whitespace().collect();
    match words.as_slice() {
        ["lharc", ..] => true,
        ["lha", "archive", "data", ..] => true,
        ["lha", _, "archive", "data", ..] => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_field_is_matched() {
        assert_eq!(
            Format::from_magic_description("Zip archive data, at least v1.0 to extract"),
            Format::Zip
        );
        assert_eq!(
            Format::from_magic_description("ARJ archive data, v11, slash-switched, original name: TESTDAT1.TXT"),
            Format::Arj
        );
        assert_eq!(
            Format::from_magic_description("gzip compressed data, was \"a.tar\", from Unix"),
            Format::Gzip
        );
        assert_eq!(
            Format::from_magic_description("7-zip archive data, version 0.4\n"),
            Format::SevenZip
        );
        assert_eq!(
            Format::from_magic_description("Microsoft Cabinet archive data, many, 1340 bytes, 3 files"),
            Format::Cabinet
        );
    }

    #[test]
    fn lha_spellings() {
        assert_eq!(
            Format::from_magic_description("LHarc 1.x/ARX archive data  [lh0]"),
            Format::Lha
        );
        assert_eq!(
            Format::from_magic_description("LHa (2.x) archive data [lh5], 0x0 OS"),
            Format::Lha
        );
        assert_eq!(
            Format::from_magic_description("LHa archive data [lh5]"),
            Format::Lha
        );
        assert_eq!(
            Format::from_magic_description("LHa 2.x? archive data [lh7]"),
            Format::Lha
        );
    }

    #[test]
    fn lha_does_not_match_unrelated_text() {
        assert_eq!(Format::from_magic_description("lha"), Format::Unknown);
        assert_eq!(
            Format::from_magic_description("lha is a nice archiver"),
            Format::Unknown
        );
        assert_eq!(
            Format::from_magic_description("ASCII text, with lha archive data"),
            Format::Unknown
        );
    }

    #[test]
    fn unknown_descriptions() {
        assert_eq!(Format::from_magic_description(""), Format::Unknown);
        assert_eq!(Format::from_magic_description("empty"), Format::Unknown);
        assert_eq!(
            Format::from_magic_description("PNG image data, 640 x 480"),
            Format::Unknown
        );
        assert_eq!(
            Format::from_magic_description("zip archive data with extra words"),
            Format::Unknown
        );
    }
}
