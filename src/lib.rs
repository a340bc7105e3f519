//! ephem - sort a folder tree into dated photo folders, RAW files and documents
//!
//! Photos are placed under `<year>/<Month>/` using their EXIF capture date,
//! raw camera files go to `RAW/`, documents to `Files/` and everything else,
//! including undated photos, to `Unsorted/`.

pub mod cli;
pub mod config;
pub mod date_resolver;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;

pub use config::{CompiledFilters, ConfigError, FilterConfig};
pub use date_resolver::{DateResolver, ExifMetadataReader, MetadataReader, ResolvedDate};
pub use file_category::Category;
pub use file_organizer::{FileOrganizer, FileRecord, OrganizeError, OrganizeReport};

pub use cli::{Cli, run_cli};
