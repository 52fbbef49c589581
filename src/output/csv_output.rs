//! CSV export sink
//!
//! Writes canonical records to disk with a fixed header. Field escaping
//! (doubled quotes, quoted commas and newlines) is RFC-4180 via the `csv`
//! crate; output is UTF-8 throughout, including multi-byte content. An
//! empty record sequence still produces the header row so downstream
//! tooling always sees a well-formed file.

use crate::output::ExportResult;
use crate::records::CanonicalRecord;
use std::path::{Path, PathBuf};

/// Fixed header; column order is part of the output contract
const HEADER: [&str; 6] = ["rating", "text", "date", "reviewerName", "title", "verified"];

/// CSV sink for scrape outcomes and checkpoints
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }

    /// Writes `records` to `path` and returns the absolute path
    ///
    /// The parent directory must already exist; a missing directory
    /// surfaces as an IO error for the caller to classify.
    pub fn export(&self, records: &[CanonicalRecord], path: &str) -> ExportResult<PathBuf> {
        let path = Path::new(path);
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(HEADER)?;
        for record in records {
            let rating = format_rating(record.rating);
            writer.write_record([
                rating.as_str(),
                record.text.as_str(),
                record.date.as_str(),
                record.reviewer_name.as_str(),
                record.title.as_str(),
                if record.verified { "true" } else { "false" },
            ])?;
        }
        writer.flush()?;

        let absolute = std::fs::canonicalize(path)?;
        tracing::debug!("Wrote {} records to {}", records.len(), absolute.display());
        Ok(absolute)
    }

    /// Names a checkpoint beside the configured output file
    ///
    /// `reviews.csv` after 50 pages becomes `reviews_checkpoint_page50.csv`.
    pub fn checkpoint_path(output_path: &str, pages_processed: u32) -> PathBuf {
        let path = Path::new(output_path);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let name = match path.extension() {
            Some(ext) => format!(
                "{}_checkpoint_page{}.{}",
                stem,
                pages_processed,
                ext.to_string_lossy()
            ),
            None => format!("{}_checkpoint_page{}", stem, pages_processed),
        };

        path.with_file_name(name)
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer-valued ratings print without a trailing `.0`
fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{}", rating as i64)
    } else {
        format!("{}", rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rating: f64, text: &str, reviewer: &str) -> CanonicalRecord {
        CanonicalRecord {
            rating,
            text: text.to_string(),
            date: "2024-01-15".to_string(),
            reviewer_name: reviewer.to_string(),
            title: String::new(),
            verified: false,
        }
    }

    fn export_to_string(records: &[CanonicalRecord]) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let written = CsvExporter::new()
            .export(records, &path.to_string_lossy())
            .unwrap();
        std::fs::read_to_string(written).unwrap()
    }

    #[test]
    fn test_empty_export_is_exactly_the_header() {
        let content = export_to_string(&[]);
        assert_eq!(content, "rating,text,date,reviewerName,title,verified\n");
    }

    #[test]
    fn test_plain_record_row() {
        let content = export_to_string(&[record(5.0, "Simple text", "alice")]);
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("rating,text,date,reviewerName,title,verified")
        );
        assert_eq!(
            lines.next(),
            Some("5,Simple text,2024-01-15,alice,,false")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_decimal_rating_kept_integer_rating_bare() {
        let content = export_to_string(&[
            record(4.5, "Half star", "alice"),
            record(3.0, "Whole star", "bob"),
        ]);
        assert!(content.contains("\n4.5,"));
        assert!(content.contains("\n3,"));
    }

    #[test]
    fn test_commas_and_quotes_escaped() {
        let content = export_to_string(&[record(
            2.0,
            r#"Good, but the "deluxe" label is a stretch"#,
            "carol",
        )]);
        assert!(content.contains(r#""Good, but the ""deluxe"" label is a stretch""#));
    }

    #[test]
    fn test_embedded_newlines_quoted() {
        let content = export_to_string(&[record(4.0, "line one\nline two", "dave")]);
        assert!(content.contains("\"line one\nline two\""));
    }

    #[test]
    fn test_multibyte_and_emoji_roundtrip() {
        let content = export_to_string(&[record(5.0, "Şahane ürün 👍 très bon", "émile")]);
        assert!(content.contains("Şahane ürün 👍 très bon"));
        assert!(content.contains("émile"));
    }

    #[test]
    fn test_missing_parent_directory_is_an_error() {
        let result = CsvExporter::new().export(&[], "/nonexistent-dir/out.csv");
        assert!(result.is_err());
    }

    #[test]
    fn test_checkpoint_path_inserts_before_extension() {
        let path = CsvExporter::checkpoint_path("./data/reviews.csv", 50);
        assert_eq!(
            path,
            PathBuf::from("./data/reviews_checkpoint_page50.csv")
        );
    }

    #[test]
    fn test_checkpoint_path_without_extension() {
        let path = CsvExporter::checkpoint_path("reviews", 100);
        assert_eq!(path, PathBuf::from("reviews_checkpoint_page100"));
    }
}
