//! Capture-date resolution for photos.
//!
//! A date is looked up in the file's embedded EXIF metadata first. Only files
//! with the [`FILENAME_DATED_EXTENSION`](crate::file_category::FILENAME_DATED_EXTENSION) fall back to parsing a date out of
//! their filename when no metadata date is found.

use crate::file_category::{Category, uses_filename_fallback};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Format of the EXIF `DateTimeOriginal` field.
pub const CAPTURE_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Filename date patterns, in priority order.
///
/// 1. `YYYY-MM-DD` / `YYYY_MM_DD`
/// 2. `YYYYMMDD`
/// 3. `DD-MM-YYYY` / `DD_MM_YYYY`
static FILENAME_DATE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"([0-9]{4})[-_]([0-9]{2})[-_]([0-9]{2})",
        r"([0-9]{4})([0-9]{2})([0-9]{2})",
        r"([0-9]{2})[-_]([0-9]{2})[-_]([0-9]{4})",
    ]
    .map(|pattern| Regex::new(pattern).expect("filename date patterns are valid"))
});

/// Where a resolved date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Metadata,
    Filename,
}

/// A capture date, reduced to what placement needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    date: NaiveDate,
    source: DateSource,
}

impl ResolvedDate {
    pub fn new(date: NaiveDate, source: DateSource) -> Self {
        Self { date, source }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Month ordinal, 1 to 12.
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// Full English month name, e.g. `"May"`.
    pub fn month_name(&self) -> String {
        self.date.format("%B").to_string()
    }

    pub fn source(&self) -> DateSource {
        self.source
    }
}

/// Errors raised while reading embedded metadata.
///
/// These never escape [`DateResolver`]; they are logged and the file is
/// treated as undated.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unreadable EXIF data: {0}")]
    Exif(#[from] exif::Error),
}

/// Source of embedded image metadata.
pub trait MetadataReader {
    /// Returns the raw capture-date-original value, if the file carries one.
    fn capture_date_original(&self, path: &Path) -> Result<Option<String>, MetadataError>;
}

/// Reads EXIF `DateTimeOriginal` from JPEG, TIFF, PNG, WebP and HEIF containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadataReader;

impl MetadataReader for ExifMetadataReader {
    fn capture_date_original(&self, path: &Path) -> Result<Option<String>, MetadataError> {
        let file = File::open(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let exif = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = exif
            .get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)
            .and_then(|field| match field.value {
                exif::Value::Ascii(ref parts) => parts.first().cloned(),
                _ => None,
            })
            .map(|bytes| {
                String::from_utf8_lossy(&bytes)
                    .trim_end_matches('\0')
                    .to_string()
            });

        Ok(value)
    }
}

/// Parses an EXIF capture date such as `2021:07:04 12:30:00`.
pub fn parse_capture_date(value: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(value, CAPTURE_DATE_FORMAT)
        .ok()
        .map(|datetime| datetime.date())
}

/// Extracts a date from a filename.
///
/// Only the first pattern that matches the filename's shape is considered. If
/// its digits are not a real calendar date the result is `None`; lower
/// priority patterns are not tried.
///
/// When the first captured group is four digits long the date reads
/// year-first, otherwise day-first.
///
/// # Examples
///
/// ```
/// use ephem::date_resolver::resolve_from_filename;
///
/// let date = resolve_from_filename("IMG_2023-05-14.dng").unwrap();
/// assert_eq!((date.year(), date.month_name().as_str()), (2023, "May"));
///
/// let date = resolve_from_filename("scan_14-05-2023.dng").unwrap();
/// assert_eq!((date.year(), date.month()), (2023, 5));
///
/// assert!(resolve_from_filename("photo_99999999.jpg").is_none());
/// ```
pub fn resolve_from_filename(name: &str) -> Option<ResolvedDate> {
    let captures = FILENAME_DATE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(name))?;

    let (first, second, third) = (&captures[1], &captures[2], &captures[3]);
    let (year, month, day) = if first.len() == 4 {
        (first, second, third)
    } else {
        (third, second, first)
    };

    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    Some(ResolvedDate::new(date, DateSource::Filename))
}

/// Applies the date policy: metadata first, filename fallback for DNG only.
pub struct DateResolver {
    reader: Box<dyn MetadataReader>,
}

impl DateResolver {
    pub fn new(reader: Box<dyn MetadataReader>) -> Self {
        Self { reader }
    }

    /// Returns true if files with this extension take part in date resolution.
    pub fn is_dated(extension: &str) -> bool {
        Category::classify(extension) == Category::Photo || uses_filename_fallback(extension)
    }

    /// Reads the capture date from embedded metadata.
    ///
    /// Read and parse failures are logged and yield `None`.
    pub fn resolve_from_metadata(&self, path: &Path) -> Option<ResolvedDate> {
        let value = match self.reader.capture_date_original(path) {
            Ok(Some(value)) => value,
            Ok(None) => {
                tracing::debug!(path = %path.display(), "no capture date in metadata");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read metadata");
                return None;
            }
        };

        match parse_capture_date(&value) {
            Some(date) => Some(ResolvedDate::new(date, DateSource::Metadata)),
            None => {
                tracing::warn!(
                    path = %path.display(),
                    value = %value,
                    "capture date does not match {}",
                    CAPTURE_DATE_FORMAT
                );
                None
            }
        }
    }

    /// Resolves the capture date for a file.
    ///
    /// Returns `None` straight away for extensions outside the dated set.
    pub fn resolve(&self, path: &Path) -> Option<ResolvedDate> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if !Self::is_dated(&extension) {
            return None;
        }

        if let Some(date) = self.resolve_from_metadata(path) {
            return Some(date);
        }

        if uses_filename_fallback(&extension) {
            let name = path.file_name()?.to_string_lossy();
            let date = resolve_from_filename(&name);
            tracing::debug!(path = %path.display(), found = date.is_some(), "filename date fallback");
            return date;
        }

        None
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(Box::new(ExifMetadataReader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Serves capture dates from a fixed table keyed by file name.
    struct StubReader(HashMap<&'static str, Result<Option<&'static str>, ()>>);

    impl MetadataReader for StubReader {
        fn capture_date_original(&self, path: &Path) -> Result<Option<String>, MetadataError> {
            let name = path.file_name().unwrap().to_str().unwrap();
            match self.0.get(name) {
                Some(Ok(value)) => Ok(value.map(str::to_string)),
                Some(Err(())) => Err(MetadataError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::other("stub failure"),
                }),
                None => Ok(None),
            }
        }
    }

    fn stub(entries: &[(&'static str, Result<Option<&'static str>, ()>)]) -> DateResolver {
        DateResolver::new(Box::new(StubReader(entries.iter().cloned().collect())))
    }

    fn ymd(date: Option<ResolvedDate>) -> Option<(i32, u32)> {
        date.map(|d| (d.year(), d.month()))
    }

    #[test]
    fn test_filename_year_first_dash() {
        assert_eq!(ymd(resolve_from_filename("IMG_2023-05-14.dng")), Some((2023, 5)));
    }

    #[test]
    fn test_filename_year_first_underscore() {
        assert_eq!(ymd(resolve_from_filename("2019_12_31_party.dng")), Some((2019, 12)));
    }

    #[test]
    fn test_filename_compact() {
        assert_eq!(ymd(resolve_from_filename("DSC20210704.dng")), Some((2021, 7)));
    }

    #[test]
    fn test_filename_day_first() {
        assert_eq!(ymd(resolve_from_filename("scan_04-07-2021.dng")), Some((2021, 7)));
        assert_eq!(ymd(resolve_from_filename("scan_31_01_2020.dng")), Some((2020, 1)));
    }

    #[test]
    fn test_filename_without_date() {
        assert_eq!(resolve_from_filename("holiday.dng"), None);
        assert_eq!(resolve_from_filename("IMG_0042.dng"), None);
    }

    #[test]
    fn test_filename_invalid_compact_date() {
        assert_eq!(resolve_from_filename("photo_99999999.jpg"), None);
    }

    #[test]
    fn test_filename_stops_at_first_structural_match() {
        // Pattern 1 matches "2023-13-01" (month 13), so the valid compact date is never tried.
        assert_eq!(resolve_from_filename("2023-13-01_20230514.dng"), None);
    }

    #[test]
    fn test_filename_priority_prefers_year_first() {
        // Both a year-first and a compact date are present; year-first wins.
        assert_eq!(ymd(resolve_from_filename("20200101_2023-05-14.dng")), Some((2023, 5)));
    }

    #[test]
    fn test_filename_date_source() {
        let date = resolve_from_filename("2023-05-14.dng").unwrap();
        assert_eq!(date.source(), DateSource::Filename);
    }

    #[test]
    fn test_month_name_is_full_english_name() {
        let date = ResolvedDate::new(NaiveDate::from_ymd_opt(2022, 9, 3).unwrap(), DateSource::Metadata);
        assert_eq!(date.month_name(), "September");
    }

    #[test]
    fn test_parse_capture_date() {
        assert_eq!(
            parse_capture_date("2021:07:04 12:30:00"),
            NaiveDate::from_ymd_opt(2021, 7, 4)
        );
        assert_eq!(parse_capture_date("2021-07-04 12:30:00"), None);
        assert_eq!(parse_capture_date("2021:02:30 12:30:00"), None);
        assert_eq!(parse_capture_date(""), None);
    }

    #[test]
    fn test_resolve_uses_metadata_for_photos() {
        let resolver = stub(&[("a.jpg", Ok(Some("2018:03:09 08:00:00")))]);
        let date = resolver.resolve(Path::new("a.jpg")).unwrap();
        assert_eq!((date.year(), date.month()), (2018, 3));
        assert_eq!(date.source(), DateSource::Metadata);
    }

    #[test]
    fn test_resolve_photo_has_no_filename_fallback() {
        let resolver = stub(&[]);
        assert_eq!(resolver.resolve(Path::new("IMG_2023-05-14.jpg")), None);
    }

    #[test]
    fn test_resolve_dng_falls_back_to_filename() {
        let resolver = stub(&[]);
        assert_eq!(ymd(resolver.resolve(Path::new("IMG_2023-05-14.dng"))), Some((2023, 5)));
        assert_eq!(ymd(resolver.resolve(Path::new("IMG_2023-05-14.DNG"))), Some((2023, 5)));
    }

    #[test]
    fn test_resolve_dng_prefers_metadata() {
        let resolver = stub(&[("IMG_2023-05-14.dng", Ok(Some("2010:11:02 10:00:00")))]);
        let date = resolver.resolve(Path::new("IMG_2023-05-14.dng")).unwrap();
        assert_eq!((date.year(), date.month()), (2010, 11));
        assert_eq!(date.source(), DateSource::Metadata);
    }

    #[test]
    fn test_resolve_metadata_error_is_not_fatal() {
        let resolver = stub(&[
            ("broken.jpg", Err(())),
            ("2023-05-14.dng", Err(())),
        ]);
        assert_eq!(resolver.resolve(Path::new("broken.jpg")), None);
        assert_eq!(ymd(resolver.resolve(Path::new("2023-05-14.dng"))), Some((2023, 5)));
    }

    #[test]
    fn test_resolve_unparseable_metadata_is_undated() {
        let resolver = stub(&[("odd.jpg", Ok(Some("sometime in May")))]);
        assert_eq!(resolver.resolve(Path::new("odd.jpg")), None);
    }

    #[test]
    fn test_resolve_skips_other_categories() {
        let resolver = stub(&[
            ("2020-01-01.nef", Ok(Some("2020:01:01 00:00:00"))),
            ("2020-01-01.pdf", Ok(Some("2020:01:01 00:00:00"))),
        ]);
        assert_eq!(resolver.resolve(Path::new("2020-01-01.nef")), None);
        assert_eq!(resolver.resolve(Path::new("2020-01-01.pdf")), None);
    }

    #[test]
    fn test_exif_reader_missing_file() {
        let result = ExifMetadataReader.capture_date_original(Path::new("/no/such/file.jpg"));
        assert!(matches!(result, Err(MetadataError::Io { .. })));
    }

    #[test]
    fn test_exif_reader_non_image_is_undated() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("fake.jpg");
        std::fs::write(&path, "not an image").expect("Failed to write test file");

        let resolver = DateResolver::default();
        assert_eq!(resolver.resolve(&path), None);
    }
}
