/// Review record types before and after normalization
///
/// A `RawRecord` is the extractor's output: field values exactly as they
/// appeared in the page. A `CanonicalRecord` is the typed, normalized form
/// that reaches the export sink.

/// One scraped review before normalization
///
/// Required fields (`rating`, `text`, `date`, `reviewer_name`) are
/// guaranteed non-empty by the extractor; a record missing any of them is
/// skipped during extraction rather than constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub rating: String,
    pub text: String,
    pub date: String,
    pub reviewer_name: String,
    pub title: Option<String>,
    pub verified: Option<String>,
}

/// One normalized review, ready for export
///
/// Ordering among canonical records reflects discovery order (page order,
/// then in-page order) and is preserved end-to-end.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    /// Rating in [1, 5]; 0.0 means the raw value was unparseable
    pub rating: f64,

    /// Trimmed, newline-normalized review body
    pub text: String,

    /// `YYYY-MM-DD` canonical form, or the original string if unparseable
    pub date: String,

    pub reviewer_name: String,

    /// Possibly empty
    pub title: String,

    pub verified: bool,
}

/// Deduplication key for canonical records
///
/// Listing sites can repeat entries across pages when lazy-loading races
/// with pagination; the `(text, reviewer, date)` tuple identifies a review
/// independently of which page it was seen on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    text: String,
    reviewer_name: String,
    date: String,
}

impl IdentityKey {
    pub fn of(record: &CanonicalRecord) -> Self {
        Self {
            text: record.text.clone(),
            reviewer_name: record.reviewer_name.clone(),
            date: record.date.clone(),
        }
    }
}

impl From<&CanonicalRecord> for IdentityKey {
    fn from(record: &CanonicalRecord) -> Self {
        Self::of(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, reviewer: &str, date: &str) -> CanonicalRecord {
        CanonicalRecord {
            rating: 4.0,
            text: text.to_string(),
            date: date.to_string(),
            reviewer_name: reviewer.to_string(),
            title: String::new(),
            verified: false,
        }
    }

    #[test]
    fn test_identity_key_equal_for_same_tuple() {
        let a = record("Great product", "alice", "2024-01-15");
        let mut b = record("Great product", "alice", "2024-01-15");
        // Fields outside the identity tuple do not affect the key
        b.rating = 1.0;
        b.verified = true;

        assert_eq!(IdentityKey::of(&a), IdentityKey::of(&b));
    }

    #[test]
    fn test_identity_key_differs_on_any_tuple_field() {
        let base = record("Great product", "alice", "2024-01-15");

        let other_text = record("Bad product", "alice", "2024-01-15");
        let other_reviewer = record("Great product", "bob", "2024-01-15");
        let other_date = record("Great product", "alice", "2024-01-16");

        assert_ne!(IdentityKey::of(&base), IdentityKey::of(&other_text));
        assert_ne!(IdentityKey::of(&base), IdentityKey::of(&other_reviewer));
        assert_ne!(IdentityKey::of(&base), IdentityKey::of(&other_date));
    }
}
