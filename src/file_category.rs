//! File categorization by extension.
//!
//! Every file is placed into one of four broad categories based solely on its
//! (case-insensitive) extension. The lookup table is fixed at compile time.
//!
//! # Examples
//!
//! ```
//! use ephem::file_category::Category;
//!
//! assert_eq!(Category::classify("JPG"), Category::Photo);
//! assert_eq!(Category::classify("nef"), Category::Raw);
//! assert_eq!(Category::classify("pdf"), Category::Document);
//! assert_eq!(Category::classify("zip"), Category::Unsorted);
//! ```

/// Extensions sorted into dated photo folders.
pub const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "heic", "heif", "psd", "svg",
];

/// Camera raw formats, kept together in a flat `RAW/` folder.
pub const RAW_EXTENSIONS: &[&str] = &[
    "raw", "arw", "cr2", "nef", "orf", "sr2", "dng", "rw2", "pef", "srw", "x3f", "crw",
];

/// Documents and office files, collected under `Files/`.
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "txt", "doc", "docx", "odt", "rtf", "md", "html", "htm", "xml", "json", "csv", "xls",
    "xlsx", "ppt", "pptx",
];

/// The raw extension that also goes through date resolution, with a filename fallback.
pub const FILENAME_DATED_EXTENSION: &str = "dng";

/// Represents a broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Photos, placed by capture date when one can be found.
    Photo,
    /// Camera raw files.
    Raw,
    /// Documents (PDF, office formats, text, markup).
    Document,
    /// Anything else.
    Unsorted,
}

/// Associates an extension set with the category it maps to.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: Category,
    pub extensions: &'static [&'static str],
}

/// Rules are checked in order; the first set containing the extension wins.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Photo,
        extensions: PHOTO_EXTENSIONS,
    },
    CategoryRule {
        category: Category::Raw,
        extensions: RAW_EXTENSIONS,
    },
    CategoryRule {
        category: Category::Document,
        extensions: DOCUMENT_EXTENSIONS,
    },
];

impl CategoryRule {
    /// Returns true if `ext` (already lowercased) belongs to this rule.
    pub fn matches(&self, ext: &str) -> bool {
        self.extensions.contains(&ext)
    }
}

impl Category {
    /// Maps a file extension (without the leading dot) to its category.
    ///
    /// Matching is case-insensitive. Unknown or empty extensions are `Unsorted`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ephem::file_category::Category;
    ///
    /// assert_eq!(Category::classify("PDF"), Category::Document);
    /// assert_eq!(Category::classify(""), Category::Unsorted);
    /// ```
    pub fn classify(extension: &str) -> Category {
        let ext = extension.to_lowercase();
        CATEGORY_RULES
            .iter()
            .find(|rule| rule.matches(&ext))
            .map(|rule| rule.category)
            .unwrap_or(Category::Unsorted)
    }

    /// Returns the fixed folder name for this category.
    ///
    /// Photos are placed under `<year>/<month>/` when dated, so their fixed
    /// folder is the one used for undated photos.
    ///
    /// ```
    /// use ephem::file_category::Category;
    ///
    /// assert_eq!(Category::Raw.dir_name(), "RAW");
    /// assert_eq!(Category::Photo.dir_name(), "Unsorted");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Photo | Category::Unsorted => UNSORTED_DIR,
            Category::Raw => RAW_DIR,
            Category::Document => FILES_DIR,
        }
    }
}

pub const UNSORTED_DIR: &str = "Unsorted";
pub const FILES_DIR: &str = "Files";
pub const RAW_DIR: &str = "RAW";

/// Folders that always exist under the target root.
pub const SKELETON_DIRS: &[&str] = &[UNSORTED_DIR, FILES_DIR, RAW_DIR];

/// Returns true if files with this extension get a date from their filename
/// when embedded metadata is missing.
pub fn uses_filename_fallback(extension: &str) -> bool {
    extension.eq_ignore_ascii_case(FILENAME_DATED_EXTENSION)
}
