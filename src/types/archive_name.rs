// ABOUTME: Timestamp-derived archive directory names.
// ABOUTME: Lexicographic order of valid names equals chronological order.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use std::fmt;
use thiserror::Error;

/// strftime layout of an archive directory name.
pub const ARCHIVE_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Byte layout of `YYYY-MM-DD_HH-MM-SS`; `d` marks a digit.
const LAYOUT: &[u8; 19] = b"dddd-dd-dd_dd-dd-dd";

#[derive(Debug, Error)]
pub enum ArchiveNameError {
    #[error("archive name must look like YYYY-MM-DD_HH-MM-SS, got '{0}'")]
    Malformed(String),

    #[error("archive name is not a valid timestamp: '{0}'")]
    InvalidTimestamp(String),
}

/// Name of one directory under the previous-releases root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveName(String);

impl ArchiveName {
    pub fn parse(value: &str) -> Result<Self, ArchiveNameError> {
        let value = value.trim();
        let fits_layout = value.len() == LAYOUT.len()
            && value.bytes().zip(LAYOUT.iter()).all(|(b, l)| match l {
                b'd' => b.is_ascii_digit(),
                other => b == *other,
            });
        if !fits_layout {
            return Err(ArchiveNameError::Malformed(value.to_string()));
        }

        NaiveDateTime::parse_from_str(value, ARCHIVE_NAME_FORMAT)
            .map_err(|_| ArchiveNameError::InvalidTimestamp(value.to_string()))?;

        Ok(Self(value.to_string()))
    }

    /// Name for an archive created at `at`, at second resolution.
    pub fn from_datetime<Tz>(at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self(at.format(ARCHIVE_NAME_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        // Validated on construction.
        NaiveDateTime::parse_from_str(&self.0, ARCHIVE_NAME_FORMAT).unwrap_or_default()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn parses_well_formed_name() {
        let name = ArchiveName::parse("2023-01-01_00-00-00").unwrap();
        assert_eq!(name.as_str(), "2023-01-01_00-00-00");
    }

    #[test]
    fn rejects_wrong_separators() {
        assert!(ArchiveName::parse("2023-01-01 00:00:00").is_err());
        assert!(ArchiveName::parse("2023-1-1_0-0-0").is_err());
        assert!(ArchiveName::parse("lost+found").is_err());
    }

    #[test]
    fn rejects_impossible_dates() {
        let err = ArchiveName::parse("2023-13-45_25-61-61").unwrap_err();
        assert!(matches!(err, ArchiveNameError::InvalidTimestamp(_)));
    }

    #[test]
    fn formats_from_datetime() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(ArchiveName::from_datetime(&at).as_str(), "2024-03-09_07-05-01");
    }

    #[test]
    fn ordering_is_chronological() {
        let older = ArchiveName::parse("2023-02-28_23-59-59").unwrap();
        let newer = ArchiveName::parse("2023-03-01_00-00-00").unwrap();
        assert!(older < newer);
        assert!(older.timestamp() < newer.timestamp());
    }
}
