//! Extraction of the CSV member from the downloaded archive.

use std::io::{Read, Seek};

use chrono::{DateTime, Utc};
use zip::ZipArchive;
use zip::result::ZipError;

use super::error::FetchError;
use super::parse::{FetchedDataset, parse_dataset};

/// Read one named member from a zip archive.
pub fn extract_member<R: Read + Seek>(reader: R, member: &str) -> Result<Vec<u8>, FetchError> {
    let extract_error = |message: String| FetchError::Extract {
        member: member.to_string(),
        message,
    };

    let mut archive =
        ZipArchive::new(reader).map_err(|e| extract_error(format!("unreadable archive: {e}")))?;

    let mut entry = match archive.by_name(member) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(extract_error("member not found in archive".to_string()));
        }
        Err(e) => return Err(extract_error(e.to_string())),
    };

    let mut buf = Vec::new();
    entry
        .read_to_end(&mut buf)
        .map_err(|e| extract_error(format!("failed to read member: {e}")))?;

    Ok(buf)
}

/// Extract the CSV member and parse it into a dataset.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn dataset_from_archive<R: Read + Seek>(
    reader: R,
    member: &str,
    fetched_at: DateTime<Utc>,
) -> Result<FetchedDataset, FetchError> {
    let bytes = extract_member(reader, member)?;
    let text = String::from_utf8_lossy(&bytes);
    parse_dataset(&text, fetched_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const MEMBER: &str = "PLZO_CSV_LV03/PLZO_CSV_LV03.csv";

    /// Build an in-memory archive holding `files`.
    fn build_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, contents) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_named_member() {
        let archive = build_archive(&[
            ("readme.txt", b"ignore me"),
            (MEMBER, b"header\nrow"),
        ]);

        let bytes = extract_member(Cursor::new(archive), MEMBER).unwrap();
        assert_eq!(bytes, b"header\nrow");
    }

    #[test]
    fn missing_member_fails() {
        let archive = build_archive(&[("other.csv", b"x")]);

        let err = extract_member(Cursor::new(archive), MEMBER).unwrap_err();
        match err {
            FetchError::Extract { member, message } => {
                assert_eq!(member, MEMBER);
                assert_eq!(message, "member not found in archive");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let err = extract_member(Cursor::new(b"<html>maintenance</html>".to_vec()), MEMBER)
            .unwrap_err();
        assert!(matches!(err, FetchError::Extract { .. }));
        assert!(err.to_string().contains("unreadable archive"));
    }

    #[test]
    fn parses_dataset_from_archive() {
        let csv = "Ortschaftsname;PLZ4;Zusatzziffer;Gemeindename;BFS-Nr;Kantonskürzel;E;N\n\
                   Zürich;8001;0;Zürich;261;ZH;2683000;1247000\n";
        let archive = build_archive(&[(MEMBER, csv.as_bytes())]);

        let dataset = dataset_from_archive(Cursor::new(archive), MEMBER, Utc::now()).unwrap();
        let zip = crate::domain::ZipCode::parse("8001").unwrap();
        assert_eq!(dataset.index.get(zip).unwrap().canton, "ZH");
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut csv = b"header\n".to_vec();
        csv.extend_from_slice(b"Z\xfcrich;8001;0;Z\xfcrich;261;ZH;2683000;1247000\n");
        let archive = build_archive(&[(MEMBER, &csv)]);

        let dataset = dataset_from_archive(Cursor::new(archive), MEMBER, Utc::now()).unwrap();
        let zip = crate::domain::ZipCode::parse("8001").unwrap();
        assert_eq!(dataset.index.get(zip).unwrap().city, "Z\u{fffd}rich");
    }
}
